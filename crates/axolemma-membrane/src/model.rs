// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Hodgkin-Huxley Membrane Model
//!
//! Single-compartment patch advanced by explicit forward Euler at a fixed dt.
//!
//! ## Model Dynamics
//!
//! ```text
//! Gates (x ∈ {m, h, n}, rates evaluated at the pre-step voltage):
//!     x(t+dt) = x + dt · (αx(V) (1 - x) - βx(V) x)
//!     h ≡ 1 while pronase is set
//!
//! Conductances (post-step gates):
//!     gNa = gNaMax · m³ · h_eff · (1 - ttxBlock)
//!     gK  = gKMax  · n⁴ · (1 - teaBlock)
//!
//! Currents (outward positive):
//!     iNa = gNa (V - ENa),  iK = gK (V - EK),  iL = gL (V - EL)
//!
//! Membrane Potential Update:
//!     V(t+dt) = V + dt · (I_ext - (iNa + iK + iL)) / Cm
//! ```

use crate::error::{require_finite, require_positive, Result};
use crate::kinetics::Gate;
use crate::parameters::{MembraneParameters, MembranePatch};

/// Resting baseline voltage for the default parameter set (mV).
pub const RESTING_VOLTAGE_MV: f64 = -63.39;

/// Default integration step (ms).
pub const DEFAULT_DT_MS: f64 = 0.01;

/// Open fractions of the m, h, n gates.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GateState {
    pub m: f64,
    pub h: f64,
    pub n: f64,
}

impl GateState {
    /// Steady-state fractions at voltage `v`.
    pub fn steady_state(v: f64) -> Self {
        Self {
            m: Gate::M.steady_state(v),
            h: Gate::H.steady_state(v),
            n: Gate::N.steady_state(v),
        }
    }
}

/// Dynamic state of the patch.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MembraneState {
    /// Membrane voltage (mV)
    pub voltage: f64,
    pub gates: GateState,
    /// Simulated clock (ms)
    pub time: f64,
    /// Fixed integration step (ms)
    pub dt: f64,
}

/// Result of one integration step.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StepOutput {
    /// Post-step voltage (mV)
    pub voltage: f64,
    pub m: f64,
    pub h: f64,
    pub n: f64,
    /// Currents that drove this step (µA/cm²)
    pub i_na: f64,
    pub i_k: f64,
    pub i_l: f64,
}

/// Hodgkin-Huxley single-compartment model.
#[derive(Debug, Clone)]
pub struct MembraneModel {
    params: MembraneParameters,
    state: MembraneState,
    resting_voltage: f64,
}

impl Default for MembraneModel {
    fn default() -> Self {
        Self::new()
    }
}

impl MembraneModel {
    /// Default parameters at the resting baseline.
    pub fn new() -> Self {
        let params = MembraneParameters::default();
        Self {
            params,
            state: Self::baseline_state(&params, RESTING_VOLTAGE_MV, DEFAULT_DT_MS),
            resting_voltage: RESTING_VOLTAGE_MV,
        }
    }

    /// Custom parameters, baseline voltage and step. Everything is validated
    /// up front so `step()` never sees a non-finite constant.
    pub fn with_parameters(
        params: MembraneParameters,
        resting_voltage: f64,
        dt: f64,
    ) -> Result<Self> {
        params.validate()?;
        require_finite("V", resting_voltage)?;
        require_positive("dt", dt)?;
        Ok(Self {
            params,
            state: Self::baseline_state(&params, resting_voltage, dt),
            resting_voltage,
        })
    }

    fn baseline_state(params: &MembraneParameters, v: f64, dt: f64) -> MembraneState {
        let mut gates = GateState::steady_state(v);
        if params.pronase {
            gates.h = 1.0;
        }
        MembraneState {
            voltage: v,
            gates,
            time: 0.0,
            dt,
        }
    }

    pub fn parameters(&self) -> &MembraneParameters {
        &self.params
    }

    pub fn state(&self) -> &MembraneState {
        &self.state
    }

    pub fn voltage(&self) -> f64 {
        self.state.voltage
    }

    pub fn gates(&self) -> GateState {
        self.state.gates
    }

    pub fn time(&self) -> f64 {
        self.state.time
    }

    pub fn dt(&self) -> f64 {
        self.state.dt
    }

    pub fn resting_voltage(&self) -> f64 {
        self.resting_voltage
    }

    /// Back to the baseline voltage and gates at t = 0. Parameters are kept.
    pub fn reset(&mut self) {
        self.state = Self::baseline_state(&self.params, self.resting_voltage, self.state.dt);
    }

    /// Put every gate at its steady state for the present voltage.
    pub fn force_steady_state_gates(&mut self) {
        let mut gates = GateState::steady_state(self.state.voltage);
        if self.params.pronase {
            gates.h = 1.0;
        }
        self.state.gates = gates;
    }

    /// Ionic currents (iNa, iK, iL) at the present state, without stepping.
    pub fn ionic_currents(&self) -> (f64, f64, f64) {
        let v = self.state.voltage;
        let g = self.state.gates;
        let p = &self.params;
        (
            p.sodium_conductance(g.m, g.h) * (v - p.e_na),
            p.potassium_conductance(g.n) * (v - p.e_k),
            p.g_l * (v - p.e_l),
        )
    }

    /// Advance one forward-Euler step under `external_current` (µA/cm²).
    pub fn step(&mut self, external_current: f64) -> StepOutput {
        debug_assert!(
            external_current.is_finite(),
            "external current must be finite, got {}",
            external_current
        );

        let v = self.state.voltage;
        let dt = self.state.dt;
        let gates = &mut self.state.gates;

        gates.m = Gate::M.rates(v).euler_step(gates.m, dt);
        gates.h = if self.params.pronase {
            1.0
        } else {
            Gate::H.rates(v).euler_step(gates.h, dt)
        };
        gates.n = Gate::N.rates(v).euler_step(gates.n, dt);

        let (i_na, i_k, i_l) = self.ionic_currents();

        self.state.voltage = v + dt * (external_current - (i_na + i_k + i_l)) / self.params.cm;
        self.state.time += dt;

        let g = self.state.gates;
        StepOutput {
            voltage: self.state.voltage,
            m: g.m,
            h: g.h,
            n: g.n,
            i_na,
            i_k,
            i_l,
        }
    }

    /// Merge any subset of fields, then re-seat the gates at steady state for
    /// the (possibly new) voltage. Invalid patches leave the model untouched.
    pub fn update_parameters(&mut self, patch: &MembranePatch) -> Result<()> {
        patch.validate()?;
        let merged = self.params.merged(patch);
        merged.validate()?;

        self.params = merged;
        if let Some(v) = patch.voltage {
            self.state.voltage = v;
        }
        self.force_steady_state_gates();
        Ok(())
    }
}
