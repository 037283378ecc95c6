//! Canonical ISA-88 recipe model
//!
//! The vendor-neutral representation every parser produces and every
//! generator consumes.
//!
//! - `core`: procedural hierarchy (Procedure, UnitProcedure, Operation, Phase, Transition)
//! - `elements`: leaf records (Parameter, Material, Equipment, Signature, InterfacePoint)
//! - `vocabulary`: canonical enumerations with documented defaults
//! - `validation`: advisory structural checks

pub mod core;
pub mod elements;
pub mod validation;
pub mod vocabulary;

pub use self::core::*;
pub use elements::*;
pub use validation::{validate, ValidationReport};
pub use vocabulary::*;
