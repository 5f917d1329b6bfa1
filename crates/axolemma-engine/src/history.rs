// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Bounded, down-sampled trace storage.
//!
//! Samples are kept oldest-first. A sample is accepted only once at least
//! `min_sample_interval` ms of simulated time has passed since the last kept
//! one, and the oldest sample is evicted when capacity is exceeded.

use std::collections::VecDeque;

use axolemma_membrane::StepOutput;

/// Tolerance for float round-off when comparing sample spacing (ms).
const SAMPLE_SPACING_EPSILON: f64 = 1e-9;

/// One retained point of the trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistorySample {
    pub time: f64,
    pub voltage: f64,
    pub i_na: f64,
    pub i_k: f64,
    pub i_l: f64,
    pub m: f64,
    pub h: f64,
    pub n: f64,
}

impl HistorySample {
    /// Sample for the state a step produced, stamped with the post-step clock.
    pub fn from_step(time: f64, out: &StepOutput) -> Self {
        Self {
            time,
            voltage: out.voltage,
            i_na: out.i_na,
            i_k: out.i_k,
            i_l: out.i_l,
            m: out.m,
            h: out.h,
            n: out.n,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    samples: VecDeque<HistorySample>,
    capacity: usize,
    min_sample_interval: f64,
}

impl HistoryBuffer {
    /// `capacity` is clamped to at least one sample.
    pub fn new(capacity: usize, min_sample_interval: f64) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            min_sample_interval,
        }
    }

    /// Offer a sample; returns whether it was kept.
    pub fn record(&mut self, sample: HistorySample) -> bool {
        if let Some(last) = self.samples.back() {
            if sample.time - last.time + SAMPLE_SPACING_EPSILON < self.min_sample_interval {
                return false;
            }
        }
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
        true
    }

    /// Drop everything and start again from `sample`.
    pub fn reseed(&mut self, sample: HistorySample) {
        self.samples.clear();
        self.samples.push_back(sample);
    }

    /// Keep only the most recent sample.
    pub fn truncate_to_latest(&mut self) {
        let keep_from = self.samples.len().saturating_sub(1);
        self.samples.drain(..keep_from);
    }

    pub fn latest(&self) -> Option<&HistorySample> {
        self.samples.back()
    }

    pub fn oldest_time(&self) -> Option<f64> {
        self.samples.front().map(|s| s.time)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistorySample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn min_sample_interval(&self) -> f64 {
        self.min_sample_interval
    }
}
