// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Membrane constants, drug modifiers and validated partial updates.

use crate::error::{
    require_finite, require_fraction, require_non_negative, require_positive, Result,
};

/// Structural parameters of the membrane patch.
///
/// Defaults are the squid-axon values at 6.3 °C used throughout the project
/// (reversal potentials computed for that temperature, EL canonical).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MembraneParameters {
    /// Membrane capacitance (µF/cm²)
    pub cm: f64,
    /// Maximal Na⁺ conductance (mS/cm²)
    pub g_na_max: f64,
    /// Maximal K⁺ conductance (mS/cm²)
    pub g_k_max: f64,
    /// Leak conductance (mS/cm²)
    pub g_l: f64,
    /// Na⁺ reversal potential (mV)
    pub e_na: f64,
    /// K⁺ reversal potential (mV)
    pub e_k: f64,
    /// Leak reversal potential (mV)
    pub e_l: f64,
    /// Fraction of Na⁺ channels blocked by tetrodotoxin [0, 1]
    pub ttx_block: f64,
    /// Fraction of K⁺ channels blocked by tetraethylammonium [0, 1]
    pub tea_block: f64,
    /// Pronase removes Na⁺ inactivation: h is held at 1 while set
    pub pronase: bool,
}

impl Default for MembraneParameters {
    fn default() -> Self {
        Self {
            cm: 1.0,
            g_na_max: 120.0,
            g_k_max: 36.0,
            g_l: 0.3,
            e_na: 52.36,
            e_k: -72.17,
            e_l: -54.4,
            ttx_block: 0.0,
            tea_block: 0.0,
            pronase: false,
        }
    }
}

impl MembraneParameters {
    pub fn validate(&self) -> Result<()> {
        require_positive("Cm", self.cm)?;
        require_non_negative("gNaMax", self.g_na_max)?;
        require_non_negative("gKMax", self.g_k_max)?;
        require_non_negative("gL", self.g_l)?;
        require_finite("ENa", self.e_na)?;
        require_finite("EK", self.e_k)?;
        require_finite("EL", self.e_l)?;
        require_fraction("ttxBlock", self.ttx_block)?;
        require_fraction("teaBlock", self.tea_block)?;
        Ok(())
    }

    /// Effective Na⁺ conductance for the given gate fractions.
    #[inline(always)]
    pub fn sodium_conductance(&self, m: f64, h: f64) -> f64 {
        let h_eff = if self.pronase { 1.0 } else { h };
        self.g_na_max * m * m * m * h_eff * (1.0 - self.ttx_block)
    }

    /// Effective K⁺ conductance for the given gate fraction.
    #[inline(always)]
    pub fn potassium_conductance(&self, n: f64) -> f64 {
        let n2 = n * n;
        self.g_k_max * n2 * n2 * (1.0 - self.tea_block)
    }

    /// Return a copy with `patch` merged in (voltage is not a structural
    /// parameter and is ignored here).
    pub fn merged(&self, patch: &MembranePatch) -> Self {
        Self {
            cm: patch.cm.unwrap_or(self.cm),
            g_na_max: patch.g_na_max.unwrap_or(self.g_na_max),
            g_k_max: patch.g_k_max.unwrap_or(self.g_k_max),
            g_l: patch.g_l.unwrap_or(self.g_l),
            e_na: patch.e_na.unwrap_or(self.e_na),
            e_k: patch.e_k.unwrap_or(self.e_k),
            e_l: patch.e_l.unwrap_or(self.e_l),
            ttx_block: patch.ttx_block.unwrap_or(self.ttx_block),
            tea_block: patch.tea_block.unwrap_or(self.tea_block),
            pronase: patch.pronase.unwrap_or(self.pronase),
        }
    }
}

/// Any subset of membrane fields. `None` leaves the current value in place.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MembranePatch {
    pub cm: Option<f64>,
    /// Membrane voltage (mV); sets the dynamic state, not a parameter
    pub voltage: Option<f64>,
    pub g_na_max: Option<f64>,
    pub g_k_max: Option<f64>,
    pub g_l: Option<f64>,
    pub e_na: Option<f64>,
    pub e_k: Option<f64>,
    pub e_l: Option<f64>,
    pub ttx_block: Option<f64>,
    pub tea_block: Option<f64>,
    pub pronase: Option<bool>,
}

impl MembranePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Validate only the fields that are present.
    pub fn validate(&self) -> Result<()> {
        if let Some(v) = self.cm {
            require_positive("Cm", v)?;
        }
        if let Some(v) = self.voltage {
            require_finite("V", v)?;
        }
        if let Some(v) = self.g_na_max {
            require_non_negative("gNaMax", v)?;
        }
        if let Some(v) = self.g_k_max {
            require_non_negative("gKMax", v)?;
        }
        if let Some(v) = self.g_l {
            require_non_negative("gL", v)?;
        }
        if let Some(v) = self.e_na {
            require_finite("ENa", v)?;
        }
        if let Some(v) = self.e_k {
            require_finite("EK", v)?;
        }
        if let Some(v) = self.e_l {
            require_finite("EL", v)?;
        }
        if let Some(v) = self.ttx_block {
            require_fraction("ttxBlock", v)?;
        }
        if let Some(v) = self.tea_block {
            require_fraction("teaBlock", v)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParameterError;

    #[test]
    fn test_defaults_validate() {
        assert!(MembraneParameters::default().validate().is_ok());
    }

    #[test]
    fn test_merge_only_touches_present_fields() {
        let base = MembraneParameters::default();
        let patch = MembranePatch {
            ttx_block: Some(0.5),
            pronase: Some(true),
            ..Default::default()
        };
        let merged = base.merged(&patch);
        assert_eq!(merged.ttx_block, 0.5);
        assert!(merged.pronase);
        assert_eq!(merged.g_na_max, base.g_na_max);
        assert_eq!(merged.e_k, base.e_k);
    }

    #[test]
    fn test_patch_rejects_block_outside_unit_interval() {
        let patch = MembranePatch {
            tea_block: Some(-0.1),
            ..Default::default()
        };
        assert!(matches!(
            patch.validate(),
            Err(ParameterError::OutOfRange { field: "teaBlock", .. })
        ));
    }

    #[test]
    fn test_patch_rejects_non_finite_voltage() {
        let patch = MembranePatch {
            voltage: Some(f64::INFINITY),
            ..Default::default()
        };
        assert!(matches!(
            patch.validate(),
            Err(ParameterError::NonFinite { field: "V", .. })
        ));
    }

    #[test]
    fn test_full_ttx_block_zeroes_sodium_conductance() {
        let params = MembraneParameters {
            ttx_block: 1.0,
            ..Default::default()
        };
        assert_eq!(params.sodium_conductance(1.0, 1.0), 0.0);
    }

    #[test]
    fn test_pronase_ignores_h() {
        let params = MembraneParameters {
            pronase: true,
            ..Default::default()
        };
        assert_eq!(
            params.sodium_conductance(0.5, 0.0),
            params.g_na_max * 0.125
        );
    }
}
