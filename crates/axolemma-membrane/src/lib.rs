// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Axolemma Membrane Numerics (Platform-Agnostic)
//!
//! ALL single-compartment membrane computation in one place:
//! - **Kinetics**: voltage-dependent α/β rate functions for the m, h, n gates
//! - **Parameters**: membrane constants, drug modifiers, validated partial updates
//! - **Model**: fixed-step forward-Euler integration of V, m, h, n
//!
//! ## Units
//! One convention end-to-end, no hidden rescaling:
//! - voltage: mV
//! - time: ms
//! - current density: µA/cm²
//! - conductance: mS/cm²
//! - capacitance: µF/cm²
//!
//! Nothing in this crate allocates, locks, or logs; every function is a pure
//! function of its inputs (the model mutates only itself).

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod kinetics;
pub mod model;
pub mod parameters;

// Re-export everything for convenience
pub use error::{ParameterError, Result};
pub use kinetics::{Gate, GateRates};
pub use model::{
    GateState, MembraneModel, MembraneState, StepOutput, DEFAULT_DT_MS, RESTING_VOLTAGE_MV,
};
pub use parameters::{MembraneParameters, MembranePatch};
