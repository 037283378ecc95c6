//! Error types for recipe conversion
//!
//! Structural problems with a source document are fatal `ParseError`s;
//! unknown vocabulary inside a well-formed document never is. Orchestrator
//! failures (`ConversionError`) abort a single request and carry enough
//! context (valid ids) for the caller to retry.

use thiserror::Error;

use crate::systems::MesSystem;

/// Fatal failures while reading a vendor document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// No element could be recovered from the input
    #[error("Invalid XML: {0}")]
    InvalidXml(String),

    /// Root element does not belong to this format
    #[error("Unexpected root element <{found}>, expected <{expected}>")]
    UnexpectedRoot { expected: String, found: String },

    /// Root element matches but a different namespace is declared
    #[error("Namespace mismatch: expected '{expected}', found '{found}'")]
    NamespaceMismatch { expected: String, found: String },

    /// Strict validation was requested and the procedure has errors
    #[error("Strict validation failed: {}", .0.join("; "))]
    StrictValidation(Vec<String>),
}

/// Fatal failures while rendering a vendor document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    /// The procedure fails the generator's validation rules
    #[error("Procedure is not valid for this format: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Header template failed to render
    #[error("Template rendering failed: {0}")]
    Template(String),
}

/// Failures of the conversion orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("Input does not look like XML (expected '<?xml' or '<' at the start)")]
    NotXml,

    #[error("Could not detect the source MES system; specify one of: {}", .known.join(", "))]
    DetectionFailed { known: Vec<String> },

    #[error("Source and target system are both '{0}'; nothing to convert")]
    SameSystem(MesSystem),

    #[error("Unknown MES system '{id}'; valid ids are: {}", .valid.join(", "))]
    UnknownSystem { id: String, valid: Vec<String> },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Generate(#[from] GenerateError),
}
