//! Conversion operations for the WASM API
//!
//! Thin wrappers over [`crate::converters`]: arguments arrive as `JsValue`
//! objects with camelCase keys, results go back as plain JS objects, and
//! every Rust error surfaces as a thrown JS `Error`.

use wasm_bindgen::prelude::*;

use crate::api::helpers::{deserialize, deserialize_or_default, js_error, serialize};
use crate::converters::{self, ConversionRequest, GeneratorOptions, ParserOptions};
use crate::detection::detect_mes_system;
use crate::models::Procedure;
use crate::{wasm_info, wasm_log, wasm_warn};

// ============================================================================
// Conversion
// ============================================================================

/// Convert a vendor document into another vendor's dialect
///
/// # Parameters
/// - `xml`: source document
/// - `request`: `{ sourceSystem?, targetSystem, parserOptions?, generatorOptions? }`
#[wasm_bindgen(js_name = convertRecipe)]
pub fn convert_recipe(xml: &str, request: JsValue) -> Result<JsValue, JsValue> {
    let request: ConversionRequest = deserialize(request, "Invalid conversion request")?;
    wasm_info!(
        "convertRecipe called: {} bytes, {} -> {}",
        xml.len(),
        request.source_system.as_deref().unwrap_or("auto"),
        request.target_system
    );

    let result = converters::convert(xml, &request).map_err(js_error)?;
    for warning in &result.warnings {
        wasm_warn!("{}", warning);
    }
    wasm_info!("convertRecipe completed: {} bytes generated", result.content.len());
    serialize(&result, "Failed to serialize conversion result")
}

/// Identify the source format; `null` when nothing matches
#[wasm_bindgen(js_name = detectMesSystem)]
pub fn detect_mes_system_js(xml: &str) -> Result<JsValue, JsValue> {
    match detect_mes_system(xml) {
        Some(detection) => {
            wasm_log!("Detected {} ({:?}, {})", detection.system, detection.method, detection.confidence);
            serialize(&detection, "Failed to serialize detection result")
        }
        None => Ok(JsValue::NULL),
    }
}

// ============================================================================
// Parsing and generation
// ============================================================================

/// Parse a document into the canonical model
///
/// `systemId` may be omitted to detect the format.
#[wasm_bindgen(js_name = parseRecipe)]
pub fn parse_recipe(xml: &str, system_id: Option<String>, options: JsValue) -> Result<JsValue, JsValue> {
    let options: ParserOptions = deserialize_or_default(options, "Invalid parser options")?;
    let result = match system_id.as_deref() {
        Some(id) => converters::parse_as(xml, id, &options),
        None => converters::parse(xml, &options),
    }
    .map_err(js_error)?;

    wasm_info!(
        "parseRecipe: {} from {} ({} warnings)",
        result.procedure.name,
        result.source_system,
        result.warnings.len()
    );
    serialize(&result, "Failed to serialize parse result")
}

#[wasm_bindgen(js_name = generateRecipe)]
pub fn generate_recipe(system_id: &str, procedure: JsValue, options: JsValue) -> Result<JsValue, JsValue> {
    let procedure: Procedure = deserialize(procedure, "Invalid procedure")?;
    let options: GeneratorOptions = deserialize_or_default(options, "Invalid generator options")?;
    let output = converters::generate(system_id, &procedure, &options).map_err(js_error)?;
    wasm_info!("generateRecipe: {} bytes of {}", output.content.len(), output.format);
    serialize(&output, "Failed to serialize generator output")
}

/// Generate one procedure into several formats; failures are per entry
#[wasm_bindgen(js_name = generateMultiple)]
pub fn generate_multiple(system_ids: Vec<String>, procedure: JsValue, options: JsValue) -> Result<JsValue, JsValue> {
    let procedure: Procedure = deserialize(procedure, "Invalid procedure")?;
    let options: GeneratorOptions = deserialize_or_default(options, "Invalid generator options")?;
    let outputs = converters::generate_multiple(system_ids.as_slice(), &procedure, &options);
    for (id, output) in outputs.iter().filter(|(_, output)| output.is_error()) {
        wasm_warn!("generateMultiple: {} failed: {}", id, output.warnings.join("; "));
    }
    serialize(&outputs, "Failed to serialize generator outputs")
}

// ============================================================================
// Introspection
// ============================================================================

#[wasm_bindgen(js_name = getSupportedConversions)]
pub fn get_supported_conversions() -> Result<JsValue, JsValue> {
    serialize(&converters::supported_conversions(), "Failed to serialize conversions")
}

#[wasm_bindgen(js_name = getParserInfo)]
pub fn get_parser_info() -> Result<JsValue, JsValue> {
    serialize(&converters::parser_info(), "Failed to serialize parser info")
}

#[wasm_bindgen(js_name = getGeneratorInfo)]
pub fn get_generator_info() -> Result<JsValue, JsValue> {
    serialize(&converters::generator_info(), "Failed to serialize generator info")
}

/// Canonical validation report `{ valid, errors, warnings }`
#[wasm_bindgen(js_name = validateProcedure)]
pub fn validate_procedure(procedure: JsValue) -> Result<JsValue, JsValue> {
    let procedure: Procedure = deserialize(procedure, "Invalid procedure")?;
    serialize(&converters::validate_procedure(&procedure), "Failed to serialize validation report")
}
