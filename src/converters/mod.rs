//! Recipe conversion
//!
//! Errors, wire-facing option/result types and the orchestrator that chains
//! detection, parsing and generation.

pub mod errors;
pub mod orchestrator;
pub mod types;

pub use errors::{ConversionError, GenerateError, ParseError};
pub use orchestrator::{
    convert, generate, generate_multiple, generator_info, parse, parse_as, parser_info,
    supported_conversions, validate_procedure,
};
pub use types::*;
