//! WASM API test
//!
//! Exercises the exported JS functions in a browser (`wasm-pack test`).

#![cfg(target_arch = "wasm32")]

use mes_recipe_bridge::api::*;
use mes_recipe_bridge::converters::types::{ConversionResult, DetectionResult, GeneratorOutput};
use mes_recipe_bridge::models::{Operation, Phase, Procedure, UnitProcedure, ValidationReport};
use mes_recipe_bridge::MesSystem;
use serde::Serialize;
use std::collections::BTreeMap;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn procedure_js() -> JsValue {
    let mut procedure = Procedure::new("Blend");
    let mut up = UnitProcedure::new("Blending", 1);
    let mut op = Operation::new("Charge", 1);
    op.phases.push(Phase::new("Add excipient", 1));
    up.operations.push(op);
    procedure.unit_procedures.push(up);
    procedure
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .unwrap()
}

fn generated(system: &str) -> String {
    let output: GeneratorOutput =
        serde_wasm_bindgen::from_value(generate_recipe(system, procedure_js(), JsValue::UNDEFINED).unwrap()).unwrap();
    output.content
}

#[wasm_bindgen_test]
fn test_convert_recipe() {
    let xml = generated("pasx");
    let request = serde_wasm_bindgen::to_value(&serde_json::json!({ "targetSystem": "moda" })).unwrap();
    let result: ConversionResult = serde_wasm_bindgen::from_value(convert_recipe(&xml, request).unwrap()).unwrap();
    assert_eq!(result.source_system, MesSystem::PasX);
    assert_eq!(result.target_system, MesSystem::Moda);
    assert!(result.content.contains("<MODARecipe "));
}

#[wasm_bindgen_test]
fn test_same_system_throws() {
    let xml = generated("syncade");
    let request = serde_wasm_bindgen::to_value(&serde_json::json!({ "targetSystem": "syncade" })).unwrap();
    let err = convert_recipe(&xml, request).unwrap_err();
    assert!(err.is_instance_of::<js_sys::Error>());
}

#[wasm_bindgen_test]
fn test_detect_returns_null_for_unknown() {
    assert!(detect_mes_system_js("<Invoice/>").unwrap().is_null());
    let detection: DetectionResult =
        serde_wasm_bindgen::from_value(detect_mes_system_js(&generated("opcenter")).unwrap()).unwrap();
    assert_eq!(detection.system, MesSystem::Opcenter);
}

#[wasm_bindgen_test]
fn test_generate_multiple_returns_plain_object() {
    let ids = vec!["pasx".to_string(), "not-a-real-id".to_string()];
    let value = generate_multiple(ids, procedure_js(), JsValue::UNDEFINED).unwrap();
    assert!(!value.is_instance_of::<js_sys::Map>());
    let outputs: BTreeMap<String, GeneratorOutput> = serde_wasm_bindgen::from_value(value).unwrap();
    assert!(!outputs["pasx"].is_error());
    assert!(outputs["not-a-real-id"].is_error());
}

#[wasm_bindgen_test]
fn test_introspection() {
    let conversions = js_sys::Array::from(&get_supported_conversions().unwrap());
    assert_eq!(conversions.length(), 20);
    assert_eq!(js_sys::Array::from(&get_parser_info().unwrap()).length(), 5);
    assert_eq!(js_sys::Array::from(&get_generator_info().unwrap()).length(), 5);
}

#[wasm_bindgen_test]
fn test_validate_procedure() {
    let report: ValidationReport = serde_wasm_bindgen::from_value(validate_procedure(procedure_js()).unwrap()).unwrap();
    assert!(report.valid);
}
