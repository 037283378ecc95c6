//! Type definitions for the conversion pipeline
//!
//! - Options (`ParserOptions`, `GeneratorOptions`, `VendorOptions`)
//! - Parser and generator results with their statistics
//! - Detection and orchestrator results

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::Procedure;
use crate::systems::{FormatInfo, MesSystem};

// ============================================================================
// OPTIONS
// ============================================================================

/// Options recognized by every parser
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParserOptions {
    /// Fail the parse when the resulting procedure has validation errors
    pub strict_validation: bool,
    /// Keep format-specific sections with no canonical equivalent
    pub preserve_unmapped_data: bool,
    /// Version the caller expects; a mismatch is reported as a warning
    pub target_version: Option<String>,
}

/// Options recognized by every generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratorOptions {
    pub include_comments: bool,
    pub pretty_print: bool,
    pub encoding: String,
    pub target_version: Option<String>,
    #[serde(flatten)]
    pub vendor: VendorOptions,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            include_comments: true,
            pretty_print: true,
            encoding: "UTF-8".to_string(),
            target_version: None,
            vendor: VendorOptions::default(),
        }
    }
}

/// Vendor toggles; they only select optional XML sections
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VendorOptions {
    /// PAS-X electronic work instructions
    #[serde(rename = "includeEWI")]
    pub include_ewi: bool,
    /// PAS-X cleaning management block
    pub include_cleaning_management: bool,
    /// PAS-X genealogy rules
    pub include_genealogy: bool,
    /// Syncade workflow settings
    pub include_workflow_settings: bool,
    /// Syncade audit trail configuration
    pub include_audit_trail: bool,
    /// PharmaSuite: emit the B2MML grammar instead of the native one
    #[serde(rename = "includeB2MML")]
    pub include_b2mml: bool,
    /// Opcenter electronic batch record settings
    pub include_electronic_batch_record: bool,
    /// Opcenter compliance (21 CFR Part 11) settings
    pub include_compliance: bool,
    /// MODA sampling plans and limits
    pub include_sampling_plans: bool,
    pub plant_id: Option<String>,
    pub facility_id: Option<String>,
    pub site_id: Option<String>,
    pub area_id: Option<String>,
}

// ============================================================================
// STATISTICS
// ============================================================================

/// Node counts of a canonical procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeCounts {
    pub unit_procedures: usize,
    pub operations: usize,
    pub phases: usize,
    pub parameters: usize,
    pub materials: usize,
    pub signatures: usize,
    pub equipment: usize,
    pub transitions: usize,
    pub interface_points: usize,
}

impl RecipeCounts {
    pub fn of(procedure: &Procedure) -> Self {
        let mut counts = RecipeCounts {
            unit_procedures: procedure.unit_procedures.len(),
            transitions: procedure.transitions.len(),
            equipment: procedure.equipment_requirements.len(),
            ..Default::default()
        };
        if let Some(formula) = &procedure.formula {
            counts.parameters += formula.parameters.len();
            counts.materials += formula.materials.len();
        }
        for up in &procedure.unit_procedures {
            counts.operations += up.operations.len();
            counts.equipment += up.equipment.len();
            counts.parameters += up.parameters.len();
            counts.signatures += up.signatures.len();
            for op in &up.operations {
                counts.phases += op.phases.len();
                counts.signatures += op.signatures.len();
                for phase in &op.phases {
                    counts.parameters += phase.parameters.len();
                    counts.materials += phase.materials.len();
                    counts.signatures += phase.signatures.len();
                    counts.interface_points += phase.interface_points.len();
                }
            }
        }
        counts
    }
}

/// Statistics reported by a parser
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseStatistics {
    #[serde(flatten)]
    pub counts: RecipeCounts,
    pub unmapped_sections: usize,
    /// Vocabulary tokens that were not recognized and fell back to defaults
    pub defaulted_values: usize,
}

/// Statistics reported by a generator
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationStatistics {
    #[serde(flatten)]
    pub counts: RecipeCounts,
    pub output_bytes: usize,
}

// ============================================================================
// RESULTS
// ============================================================================

/// Output of a parser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    pub procedure: Procedure,
    pub source_system: MesSystem,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_version: Option<String>,
    pub statistics: ParseStatistics,
    pub warnings: Vec<String>,
    /// Verbatim XML of format-specific sections, keyed by element name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unmapped_data: Option<BTreeMap<String, String>>,
}

/// Generator metadata block
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationMetadata {
    pub statistics: GenerationStatistics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_version: Option<String>,
}

/// Output of a generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorOutput {
    pub content: String,
    pub format: String,
    pub mime_type: String,
    pub file_extension: String,
    pub metadata: GenerationMetadata,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl GeneratorOutput {
    /// Format marker of a failed entry in a batch generation
    pub const ERROR_FORMAT: &'static str = "Error";

    /// Entry standing in for a target that failed to generate
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            content: String::new(),
            format: Self::ERROR_FORMAT.to_string(),
            mime_type: "text/plain".to_string(),
            file_extension: String::new(),
            metadata: GenerationMetadata::default(),
            warnings: vec![message.into()],
        }
    }

    pub fn is_error(&self) -> bool {
        self.format == Self::ERROR_FORMAT
    }
}

/// How a detection result was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMethod {
    /// Root element and declared namespace both matched
    Namespace,
    /// Root element matched, no namespace declared
    Structural,
    /// Only distinctive vendor element names matched
    Heuristic,
}

/// Output of the detection engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub system: MesSystem,
    pub confidence: f64,
    pub method: DetectionMethod,
    pub root_element: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// One edge of the conversion matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionPair {
    pub source: MesSystem,
    pub target: MesSystem,
}

/// Public description of a registered parser or generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub vendor: &'static str,
    pub supported_versions: &'static [&'static str],
    pub root_element: &'static str,
    pub namespace: &'static str,
}

impl From<&FormatInfo> for ComponentInfo {
    fn from(info: &FormatInfo) -> Self {
        Self {
            id: info.id,
            name: info.name,
            vendor: info.vendor,
            supported_versions: info.supported_versions,
            root_element: info.root_element,
            namespace: info.namespace,
        }
    }
}

/// Conversion request
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversionRequest {
    /// Explicit source system id; detected when absent
    pub source_system: Option<String>,
    pub target_system: String,
    pub parser_options: ParserOptions,
    pub generator_options: GeneratorOptions,
}

/// Combined result of one source-to-target conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub source_system: MesSystem,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_version: Option<String>,
    /// Present when the source system was auto-detected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection: Option<DetectionResult>,
    pub target_system: MesSystem,
    pub content: String,
    pub mime_type: String,
    pub file_extension: String,
    pub parse_statistics: ParseStatistics,
    pub generation_statistics: GenerationStatistics,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unmapped_data: Option<BTreeMap<String, String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_deserialize_from_partial_json() {
        let options: GeneratorOptions =
            serde_json::from_str(r#"{"prettyPrint": false, "includeEWI": true, "plantId": "P100"}"#).unwrap();
        assert!(!options.pretty_print);
        assert!(options.include_comments);
        assert_eq!(options.encoding, "UTF-8");
        assert!(options.vendor.include_ewi);
        assert_eq!(options.vendor.plant_id.as_deref(), Some("P100"));
    }

    #[test]
    fn test_parser_options_default() {
        let options: ParserOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, ParserOptions::default());
    }

    #[test]
    fn test_failed_output_marker() {
        let failed = GeneratorOutput::failed("boom");
        assert!(failed.is_error());
        assert!(failed.content.is_empty());
        assert_eq!(failed.warnings, vec!["boom".to_string()]);
    }

    #[test]
    fn test_statistics_flatten_counts() {
        let stats = ParseStatistics {
            counts: RecipeCounts {
                phases: 3,
                ..Default::default()
            },
            ..Default::default()
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["phases"], 3);
        assert_eq!(json["defaultedValues"], 0);
    }
}
