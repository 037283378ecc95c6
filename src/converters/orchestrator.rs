//! Conversion orchestrator
//!
//! Glues detection, parsing and generation together. Every entry point is a
//! pure function over its inputs; the parser and generator registries are
//! static and read-only.

use std::collections::BTreeMap;

use crate::detection::detect_mes_system;
use crate::generators::{generator_for, generators};
use crate::models::{validate, Procedure, ValidationReport};
use crate::parsers::{parser_for, parsers};
use crate::systems::MesSystem;

use super::errors::ConversionError;
use super::types::{
    ComponentInfo, ConversionPair, ConversionRequest, ConversionResult, GeneratorOptions,
    GeneratorOutput, ParseResult, ParserOptions,
};

/// Cheap shape check before any parsing is attempted
fn looks_like_xml(input: &str) -> bool {
    let trimmed = input.trim_start_matches('\u{feff}').trim_start();
    trimmed.starts_with("<?xml") || trimmed.starts_with('<')
}

/// Convert a vendor document into another vendor's dialect
pub fn convert(xml: &str, request: &ConversionRequest) -> Result<ConversionResult, ConversionError> {
    if !looks_like_xml(xml) {
        return Err(ConversionError::NotXml);
    }

    let (source, detection) = match request.source_system.as_deref() {
        Some(id) => (id.parse::<MesSystem>()?, None),
        None => {
            let detection = detect_mes_system(xml).ok_or_else(|| ConversionError::DetectionFailed {
                known: MesSystem::known_ids(),
            })?;
            (detection.system, Some(detection))
        }
    };
    let target: MesSystem = request.target_system.parse()?;
    if source == target {
        return Err(ConversionError::SameSystem(source));
    }

    log::info!("Converting {} -> {}", source, target);
    let parsed = parser_for(source).parse(xml, &request.parser_options)?;
    let output = generator_for(target).generate(&parsed.procedure, &request.generator_options)?;

    let mut warnings = parsed.warnings;
    warnings.extend(output.warnings);

    Ok(ConversionResult {
        source_system: source,
        source_version: parsed.source_version,
        detection,
        target_system: target,
        content: output.content,
        mime_type: output.mime_type,
        file_extension: output.file_extension,
        parse_statistics: parsed.statistics,
        generation_statistics: output.metadata.statistics,
        warnings,
        unmapped_data: parsed.unmapped_data,
    })
}

/// Parse a document whose format is detected
pub fn parse(xml: &str, options: &ParserOptions) -> Result<ParseResult, ConversionError> {
    if !looks_like_xml(xml) {
        return Err(ConversionError::NotXml);
    }
    let detection = detect_mes_system(xml).ok_or_else(|| ConversionError::DetectionFailed {
        known: MesSystem::known_ids(),
    })?;
    Ok(parser_for(detection.system).parse(xml, options)?)
}

/// Parse a document as the named format
pub fn parse_as(xml: &str, system_id: &str, options: &ParserOptions) -> Result<ParseResult, ConversionError> {
    let system: MesSystem = system_id.parse()?;
    Ok(parser_for(system).parse(xml, options)?)
}

/// Generate the named format from a canonical procedure
pub fn generate(system_id: &str, procedure: &Procedure, options: &GeneratorOptions) -> Result<GeneratorOutput, ConversionError> {
    let system: MesSystem = system_id.parse()?;
    Ok(generator_for(system).generate(procedure, options)?)
}

/// Generate one procedure into several formats
///
/// A target that fails, including an unknown id, yields an error-marked entry
/// carrying the failure message; the other targets are unaffected.
pub fn generate_multiple<S: AsRef<str>>(
    system_ids: &[S],
    procedure: &Procedure,
    options: &GeneratorOptions,
) -> BTreeMap<String, GeneratorOutput> {
    system_ids
        .iter()
        .map(|id| {
            let id = id.as_ref();
            let output = generate(id, procedure, options).unwrap_or_else(|err| {
                log::warn!("Generation for '{}' failed: {}", id, err);
                GeneratorOutput::failed(err.to_string())
            });
            (id.to_string(), output)
        })
        .collect()
}

/// Every ordered source/target pair of distinct systems
pub fn supported_conversions() -> Vec<ConversionPair> {
    MesSystem::ALL
        .into_iter()
        .flat_map(|source| {
            MesSystem::ALL
                .into_iter()
                .filter(move |target| *target != source)
                .map(move |target| ConversionPair { source, target })
        })
        .collect()
}

pub fn parser_info() -> Vec<ComponentInfo> {
    parsers().map(|parser| ComponentInfo::from(parser.info())).collect()
}

pub fn generator_info() -> Vec<ComponentInfo> {
    generators().map(|generator| ComponentInfo::from(generator.info())).collect()
}

/// Canonical validation, independent of any target format
pub fn validate_procedure(procedure: &Procedure) -> ValidationReport {
    validate(procedure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converters::errors::ParseError;
    use crate::models::{Operation, Phase, UnitProcedure};

    fn procedure() -> Procedure {
        let mut procedure = Procedure::new("Blend");
        let mut up = UnitProcedure::new("Blending", 1);
        let mut op = Operation::new("Charge", 1);
        op.phases.push(Phase::new("Add excipient", 1));
        up.operations.push(op);
        procedure.unit_procedures.push(up);
        procedure
    }

    fn request(source: Option<&str>, target: &str) -> ConversionRequest {
        ConversionRequest {
            source_system: source.map(str::to_string),
            target_system: target.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_rejects_non_xml() {
        let err = convert("name,version\nBlend,1", &request(None, "moda")).unwrap_err();
        assert_eq!(err, ConversionError::NotXml);
    }

    #[test]
    fn test_detection_failure_lists_known_ids() {
        let err = convert("<Invoice/>", &request(None, "moda")).unwrap_err();
        match err {
            ConversionError::DetectionFailed { known } => assert_eq!(known.len(), 5),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_same_system_is_rejected() {
        let xml = generate("syncade", &procedure(), &GeneratorOptions::default()).unwrap().content;
        let err = convert(&xml, &request(Some("syncade"), "syncade")).unwrap_err();
        assert_eq!(err, ConversionError::SameSystem(MesSystem::Syncade));
    }

    #[test]
    fn test_convert_merges_warnings_and_statistics() {
        let xml = generate("pasx", &procedure(), &GeneratorOptions::default()).unwrap().content;
        let result = convert(&xml, &request(None, "opcenter")).unwrap();
        assert_eq!(result.source_system, MesSystem::PasX);
        assert_eq!(result.target_system, MesSystem::Opcenter);
        assert!(result.detection.is_some());
        assert!(result.content.contains("<OpcenterRecipe "));
        assert_eq!(result.parse_statistics.counts.phases, 1);
        assert_eq!(result.generation_statistics.counts.phases, 1);
        // Opcenter asks for a material number the source never had
        assert!(result.warnings.iter().any(|w| w.contains("material number")));
    }

    #[test]
    fn test_unknown_target_id() {
        let xml = generate("moda", &procedure(), &GeneratorOptions::default()).unwrap().content;
        let err = convert(&xml, &request(None, "sap")).unwrap_err();
        assert!(matches!(err, ConversionError::UnknownSystem { .. }));
    }

    #[test]
    fn test_generate_multiple_isolates_failures() {
        let outputs = generate_multiple(&["pasx", "not-a-real-id"], &procedure(), &GeneratorOptions::default());
        assert_eq!(outputs.len(), 2);
        assert!(!outputs["pasx"].is_error());
        let failed = &outputs["not-a-real-id"];
        assert!(failed.is_error());
        assert!(failed.content.is_empty());
        assert!(failed.warnings[0].contains("not-a-real-id"));
    }

    #[test]
    fn test_supported_conversions_matrix() {
        let pairs = supported_conversions();
        assert_eq!(pairs.len(), 20);
        assert!(pairs.iter().all(|pair| pair.source != pair.target));
    }

    #[test]
    fn test_component_info_follows_registry() {
        let ids: Vec<&str> = parser_info().iter().map(|info| info.id).collect();
        assert_eq!(ids, vec!["pasx", "syncade", "pharmasuite", "opcenter", "moda"]);
        assert_eq!(generator_info().len(), 5);
    }

    #[test]
    fn test_deeply_nested_source_is_invalid_xml() {
        let xml = format!("<MasterRecipe>{}{}</MasterRecipe>", "<a>".repeat(100_000), "</a>".repeat(100_000));

        match parse_as(&xml, "pasx", &ParserOptions::default()).unwrap_err() {
            ConversionError::Parse(ParseError::InvalidXml(message)) => assert!(message.contains("nested deeper")),
            other => panic!("unexpected {:?}", other),
        }
        assert!(!parser_for(MesSystem::PasX).can_parse(&xml));
        assert_eq!(
            convert(&xml, &request(None, "moda")).unwrap_err(),
            ConversionError::DetectionFailed {
                known: MesSystem::known_ids()
            }
        );
    }
}
