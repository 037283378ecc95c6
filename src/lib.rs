//! MES Recipe Bridge WASM Module
//!
//! Converts pharmaceutical master recipes between five MES dialects
//! (Körber PAS-X, Emerson Syncade, Rockwell PharmaSuite, Siemens Opcenter and
//! Lonza MODA) through a vendor-neutral ISA-88 model. Every parser produces
//! a [`Procedure`]; every generator consumes one.

pub mod models;
pub mod xml;
pub mod systems;
pub mod vocabulary;
pub mod parsers;
pub mod generators;
pub mod detection;
pub mod converters;
pub mod config;
pub mod api;

// Re-export commonly used types
pub use config::{ConfigError, ConversionProfile};
pub use converters::{
    convert, generate, generate_multiple, generator_info, parse, parse_as, parser_info,
    supported_conversions, validate_procedure, ConversionError, ConversionRequest,
    ConversionResult, GenerateError, GeneratorOptions, GeneratorOutput, ParseError, ParseResult,
    ParserOptions, VendorOptions,
};
pub use detection::detect_mes_system;
pub use generators::{generator_for, RecipeGenerator};
pub use models::{Procedure, ValidationReport};
pub use parsers::{parser_for, RecipeParser};
pub use systems::MesSystem;

use wasm_bindgen::prelude::*;

// This is like the `main` function, but for WASM modules.
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    // A logger may already be installed when the module is re-initialised
    #[cfg(feature = "console_log")]
    let _ = console_log::init_with_level(log::Level::Debug);

    log::info!("MES Recipe Bridge WASM module initialized");
}
