//! MES Recipe Bridge WASM API
//!
//! The JavaScript-facing surface of the converter.
//!
//! - `helpers`: console logging macros, serde bridging, error conversion
//! - `convert`: conversion, parsing, generation, detection and introspection

pub mod helpers;
pub mod convert;

pub use convert::*;
