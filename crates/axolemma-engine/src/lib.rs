// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! # Axolemma Simulation Engine
//!
//! Drives a Hodgkin-Huxley membrane against wall-clock time.
//!
//! ## Architecture
//! - `SimulationEngine` owns the model, the stimulus ledger and the history
//! - Hosts call `tick(Δwall)`; the engine never reads a clock
//! - Subscribers get one snapshot per step batch
//! - `SharedEngine` serialises access for multi-threaded hosts
//! - `RealtimeRunner` is a ready-made host: a dedicated thread ticking at a
//!   fixed frequency

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod engine;
pub mod error;
pub mod history;
pub mod notification;
pub mod parameter_update_queue;
pub mod runner;
pub mod settings;
pub mod shared;
pub mod stimulus;

pub use engine::{RunState, SimulationEngine, TickReport};
pub use error::{EngineError, Result};
pub use history::{HistoryBuffer, HistorySample};
pub use notification::{
    ChannelSubscriber, GatingTrace, HistorySnapshot, HistorySubscriber, SubscriberRegistry,
    SubscriptionId,
};
pub use parameter_update_queue::{ChannelDefaultsUpdate, ParameterUpdate, ParameterUpdateQueue};
pub use runner::{RealtimeRunner, DEFAULT_TICK_FREQUENCY_HZ};
pub use settings::EngineSettings;
pub use shared::SharedEngine;
pub use stimulus::{ChannelDefaults, StimulusChannel, StimulusDefaults, StimulusEvent, StimulusLedger};

/// Engine statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub total_ticks: u64,
    pub total_steps: u64,
    pub notifications_sent: u64,
    pub subscriber_failures: u64,
}

impl EngineStats {
    /// Average integration steps per tick
    pub fn avg_steps_per_tick(&self) -> f64 {
        if self.total_ticks == 0 {
            0.0
        } else {
            self.total_steps as f64 / self.total_ticks as f64
        }
    }
}
