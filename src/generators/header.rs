//! Provenance comment written at the top of generated documents
//!
//! Rendered from a Mustache template, then emitted line by line as XML
//! comments.

use chrono::Utc;
use serde::Serialize;

use crate::converters::errors::GenerateError;
use crate::models::Procedure;
use crate::systems::FormatInfo;
use crate::xml::markup;

const HEADER_TEMPLATE: &str = include_str!("templates/header.mustache");

/// Values available to the header template
#[derive(Debug, Clone, Serialize)]
pub struct HeaderContext {
    pub tool: &'static str,
    pub tool_version: &'static str,
    pub name: String,
    pub id: String,
    pub recipe_version: String,
    pub format_name: String,
    pub vendor: &'static str,
    pub schema_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    pub unit_procedures: usize,
    pub operations: usize,
    pub phases: usize,
    pub generated_at: String,
}

impl HeaderContext {
    pub fn new(procedure: &Procedure, info: &FormatInfo, format_name: &str, schema_version: &str) -> Self {
        let product = match (&procedure.product_code, &procedure.product_name) {
            (Some(code), Some(name)) => Some(format!("{} {}", code, name)),
            (Some(code), None) => Some(code.clone()),
            (None, Some(name)) => Some(name.clone()),
            (None, None) => None,
        };
        Self {
            tool: env!("CARGO_PKG_NAME"),
            tool_version: env!("CARGO_PKG_VERSION"),
            name: procedure.name.clone(),
            id: procedure.id.clone(),
            recipe_version: procedure.version.clone(),
            format_name: format_name.to_string(),
            vendor: info.vendor,
            schema_version: schema_version.to_string(),
            product,
            unit_procedures: procedure.unit_procedures.len(),
            operations: procedure.operations().count(),
            phases: procedure.phases().count(),
            generated_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Render the header as one comment line per template line
pub fn render_header(context: &HeaderContext) -> Result<String, GenerateError> {
    let template = mustache::compile_str(HEADER_TEMPLATE).map_err(|err| GenerateError::Template(err.to_string()))?;
    let text = template
        .render_to_string(context)
        .map_err(|err| GenerateError::Template(err.to_string()))?;

    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(markup::comment)
        .collect())
}
