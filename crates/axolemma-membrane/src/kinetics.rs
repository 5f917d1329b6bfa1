// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Gate Kinetics
//!
//! Voltage-dependent opening (α) and closing (β) rates for the three
//! Hodgkin-Huxley gates, in 1/ms for V in mV.
//!
//! ## Rate Functions
//!
//! ```text
//! αm = 0.1 (V+40) / (1 - exp(-(V+40)/10))     βm = 4 exp(-(V+65)/18)
//! αh = 0.07 exp(-(V+65)/20)                   βh = 1 / (1 + exp(-(V+35)/10))
//! αn = 0.01 (V+55) / (1 - exp(-(V+55)/10))    βn = 0.125 exp(-(V+65)/80)
//!
//! g∞(V) = αg / (αg + βg)
//! τg(V) = 1 / (αg + βg)
//! ```
//!
//! αm and αn are 0/0 at V = -40 and V = -55 respectively. Within
//! [`SINGULARITY_TOLERANCE_MV`] of those voltages the analytic limit is
//! returned (1.0 and 0.1); elsewhere the quotient goes through `exp_m1`, which
//! keeps full precision right up to the guard band.

/// Half-width of the guard band around the αm/αn singular voltages (mV).
pub const SINGULARITY_TOLERANCE_MV: f64 = 1e-6;

/// Singular voltage of αm (mV).
pub const ALPHA_M_SINGULAR_MV: f64 = -40.0;
/// lim αm(V) as V → -40.
pub const ALPHA_M_LIMIT: f64 = 1.0;

/// Singular voltage of αn (mV).
pub const ALPHA_N_SINGULAR_MV: f64 = -55.0;
/// lim αn(V) as V → -55.
pub const ALPHA_N_LIMIT: f64 = 0.1;

/// `scale · x / (1 - exp(-x/10))`, with the x → 0 limit `10 · scale`.
#[inline(always)]
fn linoid(scale: f64, x: f64, limit: f64) -> f64 {
    if x.abs() < SINGULARITY_TOLERANCE_MV {
        return limit;
    }
    // 1 - exp(-x/10) == -expm1(-x/10)
    -scale * x / (-x / 10.0).exp_m1()
}

/// Na⁺ activation opening rate.
#[inline]
pub fn alpha_m(v: f64) -> f64 {
    linoid(0.1, v - ALPHA_M_SINGULAR_MV, ALPHA_M_LIMIT)
}

/// Na⁺ activation closing rate.
#[inline]
pub fn beta_m(v: f64) -> f64 {
    4.0 * (-(v + 65.0) / 18.0).exp()
}

/// Na⁺ inactivation opening rate.
#[inline]
pub fn alpha_h(v: f64) -> f64 {
    0.07 * (-(v + 65.0) / 20.0).exp()
}

/// Na⁺ inactivation closing rate.
#[inline]
pub fn beta_h(v: f64) -> f64 {
    1.0 / (1.0 + (-(v + 35.0) / 10.0).exp())
}

/// K⁺ activation opening rate.
#[inline]
pub fn alpha_n(v: f64) -> f64 {
    linoid(0.01, v - ALPHA_N_SINGULAR_MV, ALPHA_N_LIMIT)
}

/// K⁺ activation closing rate.
#[inline]
pub fn beta_n(v: f64) -> f64 {
    0.125 * (-(v + 65.0) / 80.0).exp()
}

/// The three Hodgkin-Huxley gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Gate {
    /// Na⁺ activation
    M,
    /// Na⁺ inactivation
    H,
    /// K⁺ activation
    N,
}

impl Gate {
    pub const ALL: [Gate; 3] = [Gate::M, Gate::H, Gate::N];

    /// Evaluate α and β together.
    #[inline]
    pub fn rates(self, v: f64) -> GateRates {
        match self {
            Gate::M => GateRates::new(alpha_m(v), beta_m(v)),
            Gate::H => GateRates::new(alpha_h(v), beta_h(v)),
            Gate::N => GateRates::new(alpha_n(v), beta_n(v)),
        }
    }

    /// g∞(V)
    #[inline]
    pub fn steady_state(self, v: f64) -> f64 {
        self.rates(v).steady_state()
    }

    /// τg(V) in ms
    #[inline]
    pub fn time_constant(self, v: f64) -> f64 {
        self.rates(v).time_constant()
    }

    pub fn name(self) -> &'static str {
        match self {
            Gate::M => "m",
            Gate::H => "h",
            Gate::N => "n",
        }
    }
}

/// One α/β evaluation. Steady state and time constant are both derived from
/// this pair so they can never disagree about the voltage they describe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateRates {
    pub alpha: f64,
    pub beta: f64,
}

impl GateRates {
    #[inline]
    pub fn new(alpha: f64, beta: f64) -> Self {
        Self { alpha, beta }
    }

    #[inline]
    pub fn steady_state(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    #[inline]
    pub fn time_constant(&self) -> f64 {
        1.0 / (self.alpha + self.beta)
    }

    /// Forward-Euler update of a gate fraction `x` over `dt` ms.
    #[inline(always)]
    pub fn euler_step(&self, x: f64, dt: f64) -> f64 {
        x + dt * (self.alpha * (1.0 - x) - self.beta * x)
    }
}
