// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Real-time tick loop.

Runs a [`SharedEngine`] on a dedicated thread at a fixed frequency,
measuring the actual wall time between iterations and handing it to
`tick`. The engine's own cap keeps a stalled thread from turning into a
burst of simulation.

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::{EngineError, Result};
use crate::shared::SharedEngine;

/// Display-rate default
pub const DEFAULT_TICK_FREQUENCY_HZ: f64 = 60.0;

/// Shutdown responsiveness: the loop checks its flag at least this often.
const SLEEP_CHUNK: Duration = Duration::from_millis(50);

pub struct RealtimeRunner {
    engine: SharedEngine,
    frequency_hz: Arc<Mutex<f64>>,
    running: Arc<AtomicBool>,
    tick_count: Arc<AtomicU64>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

fn validate_frequency(frequency_hz: f64) -> Result<()> {
    if frequency_hz.is_finite() && frequency_hz > 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidSettings(format!(
            "tick frequency must be finite and > 0 Hz, got {}",
            frequency_hz
        )))
    }
}

impl RealtimeRunner {
    pub fn new(engine: SharedEngine, frequency_hz: f64) -> Result<Self> {
        validate_frequency(frequency_hz)?;
        Ok(Self {
            engine,
            frequency_hz: Arc::new(Mutex::new(frequency_hz)),
            running: Arc::new(AtomicBool::new(false)),
            tick_count: Arc::new(AtomicU64::new(0)),
            thread_handle: None,
        })
    }

    /// Takes effect from the next iteration; safe while running.
    pub fn set_frequency(&self, frequency_hz: f64) -> Result<()> {
        validate_frequency(frequency_hz)?;
        *self.frequency_hz.lock() = frequency_hz;
        info!("[TICK-RUNNER] Frequency set to {:.2} Hz", frequency_hz);
        Ok(())
    }

    pub fn frequency(&self) -> f64 {
        *self.frequency_hz.lock()
    }

    pub fn start(&mut self) -> Result<()> {
        if self.running.load(Ordering::Acquire) {
            return Err(EngineError::RunnerAlreadyRunning);
        }

        info!("[TICK-RUNNER] Starting tick loop at {:.2} Hz", self.frequency());
        self.running.store(true, Ordering::Release);

        let engine = self.engine.clone();
        let frequency = self.frequency_hz.clone();
        let running = self.running.clone();
        let tick_count = self.tick_count.clone();

        let spawned = thread::Builder::new()
            .name("axolemma-tick-loop".to_string())
            .spawn(move || tick_loop(engine, frequency, running, tick_count));

        match spawned {
            Ok(handle) => {
                self.thread_handle = Some(handle);
                info!("[TICK-RUNNER] ✅ Tick loop started");
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::Release);
                Err(EngineError::ThreadSpawn(e.to_string()))
            }
        }
    }

    /// Idempotent; waits for the loop thread to exit.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.thread_handle.take() {
            match handle.join() {
                Ok(()) => info!("[TICK-RUNNER] ✅ Tick loop stopped cleanly"),
                Err(_) => warn!("[TICK-RUNNER] ⚠️ Tick loop thread panicked"),
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Iterations completed since construction
    pub fn tick_count(&self) -> u64 {
        self.tick_count.load(Ordering::Relaxed)
    }

    pub fn engine(&self) -> &SharedEngine {
        &self.engine
    }
}

impl Drop for RealtimeRunner {
    fn drop(&mut self) {
        self.stop();
    }
}

fn tick_loop(
    engine: SharedEngine,
    frequency_hz: Arc<Mutex<f64>>,
    running: Arc<AtomicBool>,
    tick_count: Arc<AtomicU64>,
) {
    let mut last = Instant::now();

    while running.load(Ordering::Acquire) {
        let iteration_start = Instant::now();
        let elapsed = iteration_start.duration_since(last);
        last = iteration_start;

        match engine.tick(elapsed) {
            Ok(report) if report.steps > 0 => {
                debug!(
                    "[TICK-LOOP] {} steps, {} samples in {:?}",
                    report.steps,
                    report.samples_recorded,
                    iteration_start.elapsed()
                );
            }
            Ok(_) => {}
            Err(e) => warn!("[TICK-LOOP] ⚠️ Tick failed: {}", e),
        }
        tick_count.fetch_add(1, Ordering::Relaxed);

        // Read every iteration so set_frequency applies immediately.
        // None: the interval is too long to represent, sleep until stopped.
        let target_time = Duration::try_from_secs_f64(1.0 / *frequency_hz.lock())
            .ok()
            .and_then(|interval| iteration_start.checked_add(interval));

        // Chunked sleep for responsive shutdown
        loop {
            if !running.load(Ordering::Relaxed) {
                break;
            }
            let now = Instant::now();
            let remaining = match target_time {
                Some(target) if now >= target => break,
                Some(target) => target - now,
                None => SLEEP_CHUNK,
            };
            thread::sleep(remaining.min(SLEEP_CHUNK));
        }
    }

    info!(
        "[TICK-LOOP] 🛑 Tick loop stopped after {} ticks",
        tick_count.load(Ordering::Relaxed)
    );
}
