//! # Materials
//!
//! Material definitions for pier sections. Piers are reinforced concrete;
//! only the gross concrete section is modeled, so the only material property
//! needed is the elastic modulus derived from f'c.
//!
//! ## Example
//!
//! ```rust
//! use pier_core::materials::ConcreteMaterial;
//! use pier_core::units::MegaPascals;
//!
//! let concrete = ConcreteMaterial::new(40.0).unwrap();
//! let conv = concrete.strain_converter();
//! let ue = conv.strain(MegaPascals(-3.0));
//! println!("ε = {:.2} με", ue.0);
//! ```

pub mod concrete;

pub use concrete::{
    elastic_modulus_mpa, strain_from_stress, stress_from_strain, ConcreteMaterial,
    StrainConverter, DEFAULT_COMPRESSIVE_STRENGTH_MPA,
};
