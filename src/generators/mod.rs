//! Vendor recipe generators
//!
//! Mirror of the parsers: one generator per [`MesSystem`], each rendering a
//! canonical procedure into its dialect by composing escaped string
//! fragments. The shared [`RecipeGenerator::generate`] pipeline validates,
//! resolves the schema version, writes the declaration and provenance
//! header, then optionally re-indents the result.

pub mod header;
pub mod moda;
pub mod opcenter;
pub mod pasx;
pub mod pharmasuite;
pub mod syncade;

pub use moda::ModaGenerator;
pub use opcenter::OpcenterGenerator;
pub use pasx::PasXGenerator;
pub use pharmasuite::PharmaSuiteGenerator;
pub use syncade::SyncadeGenerator;

use std::borrow::Cow;
use std::collections::HashSet;

use crate::converters::errors::GenerateError;
use crate::converters::types::{GenerationMetadata, GenerationStatistics, GeneratorOptions, GeneratorOutput, RecipeCounts};
use crate::models::{derive_transitions, Procedure, Transition, ValidationReport};
use crate::systems::{FormatInfo, MesSystem};
use crate::xml::{markup, pretty_print};

use self::header::{render_header, HeaderContext};

pub const XML_MIME_TYPE: &str = "application/xml";
pub const XML_EXTENSION: &str = ".xml";
const PRETTY_INDENT: usize = 2;

/// Contract shared by the five dialect generators
pub trait RecipeGenerator: Send + Sync {
    fn system(&self) -> MesSystem;

    fn info(&self) -> &'static FormatInfo {
        self.system().info()
    }

    /// Human-readable format label for the chosen options
    fn format_name(&self, _options: &GeneratorOptions) -> String {
        self.info().name.to_string()
    }

    /// Base rules; generators override to add format-specific checks
    fn validate(&self, procedure: &Procedure, _options: &GeneratorOptions) -> ValidationReport {
        base_validation(procedure)
    }

    /// Document body: the root element and everything inside it
    fn render(&self, procedure: &Procedure, options: &GeneratorOptions, version: &str, warnings: &mut Vec<String>) -> String;

    fn generate(&self, procedure: &Procedure, options: &GeneratorOptions) -> Result<GeneratorOutput, GenerateError> {
        let report = self.validate(procedure, options);
        if !report.valid {
            return Err(GenerateError::Validation(report.errors));
        }
        let mut warnings = report.warnings;
        let version = resolve_version(self.info(), options.target_version.as_deref(), &mut warnings);
        let format = self.format_name(options);

        let mut content = markup::declaration(&options.encoding);
        if options.include_comments {
            let context = HeaderContext::new(procedure, self.info(), &format, version);
            content.push_str(&render_header(&context)?);
        }
        content.push_str(&self.render(procedure, options, version, &mut warnings));
        if options.pretty_print {
            content = pretty_print(&content, PRETTY_INDENT);
        }

        let statistics = GenerationStatistics {
            counts: RecipeCounts::of(procedure),
            output_bytes: content.len(),
        };
        log::info!(
            "Generated {} document for '{}' ({} bytes, {} warnings)",
            self.system(),
            procedure.name,
            statistics.output_bytes,
            warnings.len()
        );

        Ok(GeneratorOutput {
            content,
            format,
            mime_type: XML_MIME_TYPE.to_string(),
            file_extension: XML_EXTENSION.to_string(),
            metadata: GenerationMetadata {
                statistics,
                target_version: Some(version.to_string()),
            },
            warnings,
        })
    }
}

/// Rules every generator enforces: a name, and a warning for an empty recipe
pub fn base_validation(procedure: &Procedure) -> ValidationReport {
    let mut report = ValidationReport::from_findings(Vec::new(), Vec::new());
    if procedure.name.trim().is_empty() {
        report.error("Procedure name is required");
    }
    if procedure.unit_procedures.is_empty() {
        report.warning("Procedure has no unit procedures");
    }
    report
}

/// Require every transition endpoint to name a node of the procedure
pub fn check_transition_endpoints(procedure: &Procedure, report: &mut ValidationReport) {
    let ids: HashSet<&str> = procedure.node_ids().into_iter().collect();
    for transition in &procedure.transitions {
        for endpoint in [&transition.source_id, &transition.target_id] {
            if !ids.contains(endpoint.as_str()) {
                report.error(format!("Transition {} references unknown id '{}'", transition.id, endpoint));
            }
        }
    }
}

/// Requested version when supported, otherwise the newest one with a warning
pub fn resolve_version(info: &'static FormatInfo, requested: Option<&str>, warnings: &mut Vec<String>) -> &'static str {
    match requested {
        Some(wanted) => match info.supported_versions.iter().copied().find(|version| *version == wanted) {
            Some(version) => version,
            None => {
                let latest = info.latest_version();
                warnings.push(format!(
                    "{} version {} is not supported; generating version {}",
                    info.name, wanted, latest
                ));
                latest
            }
        },
        None => info.latest_version(),
    }
}

/// Explicit edges of the procedure, or sequential ones when it has none
pub fn execution_edges(procedure: &Procedure) -> Cow<'_, [Transition]> {
    if procedure.transitions.is_empty() {
        Cow::Owned(derive_transitions(&procedure.unit_procedures))
    } else {
        Cow::Borrowed(&procedure.transitions)
    }
}

static PASX_GENERATOR: PasXGenerator = PasXGenerator;
static SYNCADE_GENERATOR: SyncadeGenerator = SyncadeGenerator;
static PHARMASUITE_GENERATOR: PharmaSuiteGenerator = PharmaSuiteGenerator;
static OPCENTER_GENERATOR: OpcenterGenerator = OpcenterGenerator;
static MODA_GENERATOR: ModaGenerator = ModaGenerator;

/// Registered generator for a system
pub fn generator_for(system: MesSystem) -> &'static dyn RecipeGenerator {
    match system {
        MesSystem::PasX => &PASX_GENERATOR,
        MesSystem::Syncade => &SYNCADE_GENERATOR,
        MesSystem::PharmaSuite => &PHARMASUITE_GENERATOR,
        MesSystem::Opcenter => &OPCENTER_GENERATOR,
        MesSystem::Moda => &MODA_GENERATOR,
    }
}

/// All generators in registry order
pub fn generators() -> impl Iterator<Item = &'static dyn RecipeGenerator> {
    MesSystem::ALL.into_iter().map(generator_for)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Operation, Phase, UnitProcedure};
    use crate::systems::SYNCADE_INFO;

    pub(crate) fn sample_procedure() -> Procedure {
        let mut procedure = Procedure::new("Granulation & Drying");
        let mut up = UnitProcedure::new("Set-up", 1);
        let mut op = Operation::new("Dispense", 1);
        op.phases.push(Phase::new("Weigh Material", 1));
        up.operations.push(op);
        procedure.unit_procedures.push(up);
        procedure
    }

    #[test]
    fn test_every_generator_emits_its_root_and_namespace() {
        let procedure = sample_procedure();
        for generator in generators() {
            let output = generator.generate(&procedure, &GeneratorOptions::default()).unwrap();
            let info = generator.info();
            assert!(output.content.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
            assert!(output.content.contains(&format!("<{} xmlns=\"{}\"", info.root_element, info.namespace)));
            assert!(output.content.contains("Granulation &amp; Drying"));
            assert_eq!(output.mime_type, "application/xml");
            assert_eq!(output.file_extension, ".xml");
            assert_eq!(output.metadata.statistics.counts.phases, 1);
            assert_eq!(output.metadata.statistics.output_bytes, output.content.len());
        }
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let mut procedure = sample_procedure();
        procedure.name.clear();
        for generator in generators() {
            let err = generator.generate(&procedure, &GeneratorOptions::default()).unwrap_err();
            assert!(matches!(err, GenerateError::Validation(_)));
        }
    }

    #[test]
    fn test_empty_recipe_only_warns() {
        let procedure = Procedure::new("Empty");
        let output = generator_for(MesSystem::Moda)
            .generate(&procedure, &GeneratorOptions::default())
            .unwrap();
        assert!(output.warnings.iter().any(|w| w.contains("no unit procedures")));
    }

    #[test]
    fn test_unsupported_version_falls_back_to_latest() {
        let mut warnings = Vec::new();
        assert_eq!(resolve_version(&SYNCADE_INFO, Some("5.1"), &mut warnings), "5.1");
        assert!(warnings.is_empty());
        assert_eq!(resolve_version(&SYNCADE_INFO, Some("9.9"), &mut warnings), "6.0");
        assert_eq!(warnings.len(), 1);
        assert_eq!(resolve_version(&SYNCADE_INFO, None, &mut warnings), "6.0");
    }

    #[test]
    fn test_comments_and_pretty_print_toggles() {
        let procedure = sample_procedure();
        let options = GeneratorOptions {
            include_comments: false,
            pretty_print: false,
            ..Default::default()
        };
        let output = generator_for(MesSystem::PasX).generate(&procedure, &options).unwrap();
        assert!(!output.content.contains("<!--"));
        assert!(output.content.lines().all(|line| !line.starts_with(' ')));

        let pretty = generator_for(MesSystem::PasX)
            .generate(&procedure, &GeneratorOptions::default())
            .unwrap();
        assert!(pretty.content.contains("<!-- Generated by"));
        assert!(pretty.content.lines().any(|line| line.starts_with("  <")));
    }

    #[test]
    fn test_execution_edges_fall_back_to_sequence() {
        let mut procedure = sample_procedure();
        procedure.unit_procedures[0].operations[0].phases.push(Phase::new("Blend", 2));
        assert_eq!(execution_edges(&procedure).len(), 1);
    }
}
