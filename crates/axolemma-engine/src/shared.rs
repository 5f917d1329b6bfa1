// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Thread-safe engine handle.
//!
//! Every entry point takes one `ReentrantMutex`, so calls from different
//! threads serialise. A call that re-enters from the thread already inside
//! the engine (typically a subscriber calling back during a notification)
//! finds the inner `RefCell` borrowed: that is a contract violation, caught
//! by `debug_assert!` in development builds and rejected with
//! [`EngineError::ReentrantCall`] otherwise.

use std::cell::RefCell;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::ReentrantMutex;
use tracing::warn;

use crate::engine::{RunState, SimulationEngine, TickReport};
use crate::error::{EngineError, Result};
use crate::notification::{HistorySnapshot, HistorySubscriber, SubscriptionId};
use crate::parameter_update_queue::{ParameterUpdate, ParameterUpdateQueue};
use crate::stimulus::{StimulusChannel, StimulusEvent};
use crate::EngineStats;

#[derive(Clone)]
pub struct SharedEngine {
    inner: Arc<ReentrantMutex<RefCell<SimulationEngine>>>,
    /// Held outside the lock so pushes never contend with a step batch
    parameter_queue: ParameterUpdateQueue,
}

fn reentrant(op: &'static str) -> EngineError {
    warn!("[SIM-ENGINE] ❌ Reentrant call to {} rejected", op);
    debug_assert!(false, "reentrant engine call: {}", op);
    EngineError::ReentrantCall(op)
}

impl SharedEngine {
    pub fn new(engine: SimulationEngine) -> Self {
        let parameter_queue = engine.parameter_queue();
        Self {
            inner: Arc::new(ReentrantMutex::new(RefCell::new(engine))),
            parameter_queue,
        }
    }

    fn with_mut<R>(&self, op: &'static str, f: impl FnOnce(&mut SimulationEngine) -> R) -> Result<R> {
        let guard = self.inner.lock();
        let mut engine = guard.try_borrow_mut().map_err(|_| reentrant(op))?;
        Ok(f(&mut engine))
    }

    /// Read-only access; still rejected while a mutation is in progress.
    pub fn with_engine<R>(&self, f: impl FnOnce(&SimulationEngine) -> R) -> Result<R> {
        let guard = self.inner.lock();
        let engine = guard.try_borrow().map_err(|_| reentrant("with_engine"))?;
        Ok(f(&engine))
    }

    pub fn tick(&self, wall_delta: Duration) -> Result<TickReport> {
        self.with_mut("tick", |e| e.tick(wall_delta))
    }

    pub fn run_for(&self, duration: f64) -> Result<()> {
        self.with_mut("run_for", |e| e.run_for(duration))?
    }

    pub fn stop(&self) -> Result<()> {
        self.with_mut("stop", |e| e.stop())
    }

    pub fn apply_stimulus(
        &self,
        channel: StimulusChannel,
        amplitude: Option<f64>,
        duration: Option<f64>,
    ) -> Result<StimulusEvent> {
        self.with_mut("apply_stimulus", |e| e.apply_stimulus(channel, amplitude, duration))?
    }

    pub fn reset(&self) -> Result<()> {
        self.with_mut("reset", |e| e.reset())
    }

    pub fn clear_history(&self) -> Result<()> {
        self.with_mut("clear_history", |e| e.clear_history())
    }

    pub fn update_parameters(&self, update: &ParameterUpdate) -> Result<()> {
        self.with_mut("update_parameters", |e| e.update_parameters(update))?
    }

    pub fn subscribe(&self, subscriber: Arc<dyn HistorySubscriber>) -> Result<SubscriptionId> {
        self.with_mut("subscribe", |e| e.subscribe(subscriber))
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> Result<bool> {
        self.with_mut("unsubscribe", |e| e.unsubscribe(id))
    }

    pub fn run_state(&self) -> Result<RunState> {
        self.with_engine(|e| e.run_state())
    }

    pub fn snapshot(&self) -> Result<HistorySnapshot> {
        self.with_engine(|e| e.snapshot())
    }

    pub fn stats(&self) -> Result<EngineStats> {
        self.with_engine(|e| e.stats())
    }

    /// Lock-free with respect to the engine; safe from any thread, including
    /// from inside a subscriber.
    pub fn parameter_queue(&self) -> ParameterUpdateQueue {
        self.parameter_queue.clone()
    }
}

impl std::fmt::Debug for SharedEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedEngine")
            .field("pending_updates", &self.parameter_queue.len())
            .finish()
    }
}
