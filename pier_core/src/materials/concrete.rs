//! # Concrete Material
//!
//! Elastic modulus of normal-weight concrete from its specified compressive
//! strength, plus the stress ↔ microstrain conversion used everywhere
//! theoretical and measured values are compared.
//!
//! ## Formula
//!
//! ```text
//! E_c = 4700 √f'c        (MPa, ACI 318 §19.2.2.1)
//! ε   = σ / E_c × 10⁶    (με)
//! σ   = ε / 10⁶ × E_c    (MPa)
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{MonitorError, MonitorResult};
use crate::units::{MegaPascals, Microstrain};

/// Empirical coefficient in E_c = 4700 √f'c
pub const MODULUS_COEFFICIENT: f64 = 4700.0;

/// Microstrain per unit strain
pub const MICROSTRAIN_PER_STRAIN: f64 = 1e6;

/// Default specified compressive strength (MPa)
pub const DEFAULT_COMPRESSIVE_STRENGTH_MPA: f64 = 40.0;

/// Concrete defined by its specified compressive strength.
///
/// ## JSON Example
///
/// ```json
/// { "compressive_strength_mpa": 40.0 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConcreteMaterial {
    /// Specified compressive strength f'c (MPa)
    pub compressive_strength_mpa: f64,
}

impl ConcreteMaterial {
    /// Create a concrete material, rejecting non-positive or non-finite strengths.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pier_core::materials::ConcreteMaterial;
    ///
    /// let concrete = ConcreteMaterial::new(40.0).unwrap();
    /// assert!((concrete.elastic_modulus_mpa() - 29_725.41).abs() < 0.01);
    /// ```
    pub fn new(compressive_strength_mpa: f64) -> MonitorResult<Self> {
        if !compressive_strength_mpa.is_finite() || compressive_strength_mpa <= 0.0 {
            return Err(MonitorError::invalid_input(
                "compressive_strength_mpa",
                compressive_strength_mpa.to_string(),
                "Compressive strength must be a positive number",
            ));
        }
        Ok(ConcreteMaterial {
            compressive_strength_mpa,
        })
    }

    /// Modulus of elasticity E_c = 4700 √f'c (MPa)
    pub fn elastic_modulus_mpa(&self) -> f64 {
        elastic_modulus_mpa(self.compressive_strength_mpa)
    }

    /// Strain converter bound to this material's modulus
    pub fn strain_converter(&self) -> StrainConverter {
        StrainConverter {
            modulus_mpa: self.elastic_modulus_mpa(),
        }
    }
}

impl Default for ConcreteMaterial {
    fn default() -> Self {
        ConcreteMaterial {
            compressive_strength_mpa: DEFAULT_COMPRESSIVE_STRENGTH_MPA,
        }
    }
}

/// E_c = 4700 √f'c (MPa)
#[inline]
pub fn elastic_modulus_mpa(compressive_strength_mpa: f64) -> f64 {
    MODULUS_COEFFICIENT * compressive_strength_mpa.sqrt()
}

/// ε = σ / E × 10⁶ (με)
#[inline]
pub fn strain_from_stress(stress_mpa: f64, modulus_mpa: f64) -> f64 {
    stress_mpa / modulus_mpa * MICROSTRAIN_PER_STRAIN
}

/// σ = ε / 10⁶ × E (MPa)
#[inline]
pub fn stress_from_strain(strain_ue: f64, modulus_mpa: f64) -> f64 {
    strain_ue / MICROSTRAIN_PER_STRAIN * modulus_mpa
}

/// Stress/strain conversion at a fixed modulus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrainConverter {
    /// Modulus of elasticity (MPa)
    pub modulus_mpa: f64,
}

impl StrainConverter {
    pub fn new(modulus_mpa: f64) -> MonitorResult<Self> {
        if !modulus_mpa.is_finite() || modulus_mpa <= 0.0 {
            return Err(MonitorError::invalid_input(
                "modulus_mpa",
                modulus_mpa.to_string(),
                "Modulus must be a positive number",
            ));
        }
        Ok(StrainConverter { modulus_mpa })
    }

    pub fn strain(&self, stress: MegaPascals) -> Microstrain {
        Microstrain(strain_from_stress(stress.0, self.modulus_mpa))
    }

    pub fn stress(&self, strain: Microstrain) -> MegaPascals {
        MegaPascals(stress_from_strain(strain.0, self.modulus_mpa))
    }
}
