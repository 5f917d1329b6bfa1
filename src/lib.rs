// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Axolemma - Hodgkin-Huxley membrane simulator
//!
//! A single-compartment Hodgkin-Huxley neuron driven against wall-clock
//! time, with two stimulus channels, a bounded history of voltage, ionic
//! currents and gating variables, and change notifications for whatever is
//! drawing the trace.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! axolemma = "0.1"
//! ```
//!
//! ```rust,no_run
//! use axolemma::prelude::*;
//! use std::time::Duration;
//!
//! let mut engine = SimulationEngine::new();
//! engine.apply_stimulus(StimulusChannel::One, None, None)?;
//!
//! // Headless: feed synthetic 60 Hz frames until the run ends
//! engine.run_until_idle(Duration::from_micros(16_667), 10_000);
//!
//! let snapshot = engine.snapshot();
//! println!("peak = {:?} mV", snapshot.voltage.iter().cloned().fold(f64::MIN, f64::max));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Feature Flags
//!
//! - **`observability`** (default): logging initialisation helpers
//! - **`file-logging`**: per-run rolling log files
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: axolemma-config                            │
//! │  (axolemma.toml, env + CLI overrides, validation)       │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Numerics: axolemma-membrane                            │
//! │  (gate kinetics, membrane model, forward Euler)         │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Engine: axolemma-engine                                │
//! │  (stimulus ledger, history, pacing, notifications)      │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Hosts: SharedEngine, RealtimeRunner, axolemma-run      │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## License
//!
//! Apache-2.0

pub use axolemma_config as config;
pub use axolemma_engine as engine;
pub use axolemma_membrane as membrane;

#[cfg(feature = "observability")]
pub use axolemma_observability as observability;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::membrane::{
        MembraneModel, MembraneParameters, MembranePatch, ParameterError, RESTING_VOLTAGE_MV,
    };

    pub use crate::engine::{
        ChannelSubscriber, EngineError, EngineSettings, HistorySnapshot, HistorySubscriber,
        ParameterUpdate, RealtimeRunner, RunState, SharedEngine, SimulationEngine,
        StimulusChannel, StimulusEvent,
    };

    pub use crate::config::{load_config, AxolemmaConfig};
}
