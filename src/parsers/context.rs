//! Per-parse state shared by all dialect walkers
//!
//! Collects warnings, unmapped sections and vocabulary fallbacks, keeps node
//! ids unique, and turns the finished procedure into a [`ParseResult`].

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};

use crate::converters::errors::ParseError;
use crate::converters::types::{ParseResult, ParseStatistics, ParserOptions, RecipeCounts};
use crate::models::{
    self, new_id, CleaningLevel, DataMapping, DataType, DurationEstimate, DurationUnit,
    InterfaceDirection, InterfaceSystem, MaterialType, PhaseType, Procedure, RecipeStatus,
    RecipeType, SignatureType, TransitionType,
};
use crate::systems::MesSystem;
use crate::vocabulary;
use crate::xml::{Element, XmlDocument};

pub struct ParseContext<'a, 'input> {
    system: MesSystem,
    doc: &'a XmlDocument<'input>,
    options: &'a ParserOptions,
    warnings: Vec<String>,
    unmapped: BTreeMap<String, String>,
    seen_ids: HashSet<String>,
    defaulted: usize,
}

impl<'a, 'input> ParseContext<'a, 'input> {
    pub fn new(system: MesSystem, doc: &'a XmlDocument<'input>, options: &'a ParserOptions) -> Self {
        let mut warnings = Vec::new();
        if let Some(error) = doc.recovery_error() {
            log::warn!("[{}] recovered a partial tree: {}", system, error);
            warnings.push(format!("Source document was truncated or malformed: {}", error));
        }
        Self {
            system,
            doc,
            options,
            warnings,
            unmapped: BTreeMap::new(),
            seen_ids: HashSet::new(),
            defaulted: 0,
        }
    }

    pub fn system(&self) -> MesSystem {
        self.system
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Record that an expected element is absent and defaults are used
    pub fn missing(&mut self, element: &str, context: &str) {
        self.warn(format!("Missing <{}> in {}; using defaults", element, context));
    }

    /// Keep the verbatim XML of a format-specific section when requested
    pub fn capture_unmapped(&mut self, element: Option<&Element>) {
        let Some(element) = element else { return };
        if !self.options.preserve_unmapped_data {
            log::debug!("Skipping unmapped section <{}>", element.name());
            return;
        }
        let raw = self.doc.raw(element).to_string();
        let key = element.name().to_string();
        match self.unmapped.get_mut(&key) {
            Some(existing) => {
                existing.push('\n');
                existing.push_str(&raw);
            }
            None => {
                self.unmapped.insert(key, raw);
            }
        }
    }

    /// Source id if present and not yet used, otherwise a fresh one
    pub fn node_id(&mut self, source_id: Option<String>, kind: &str) -> String {
        let id = match source_id {
            Some(id) if self.seen_ids.contains(&id) => {
                let fresh = new_id();
                self.warn(format!("Duplicate {} id '{}' replaced with '{}'", kind, id, fresh));
                fresh
            }
            Some(id) => id,
            None => new_id(),
        };
        self.seen_ids.insert(id.clone());
        id
    }

    /// Node name, or "<Kind> <sequence>" with a warning when the source has none
    pub fn node_name(&mut self, name: Option<String>, kind: &str, sequence: u32) -> String {
        name.unwrap_or_else(|| {
            let fallback = format!("{} {}", kind, sequence);
            self.warn(format!("{} {} has no name; using '{}'", kind, sequence, fallback));
            fallback
        })
    }

    /// 1-based sequence from the source, or the element's position
    pub fn sequence(&mut self, raw: Option<&str>, position: usize) -> u32 {
        let fallback = (position + 1) as u32;
        match raw {
            Some(text) => match text.trim().parse::<u32>() {
                Ok(sequence) if sequence > 0 => sequence,
                _ => {
                    self.warn(format!("Invalid sequence '{}', using position {}", text, fallback));
                    fallback
                }
            },
            None => fallback,
        }
    }

    // ------------------------------------------------------------------
    // Vocabulary resolution with documented defaults
    // ------------------------------------------------------------------

    fn resolve<T: Default + std::fmt::Display>(
        &mut self,
        field: &str,
        raw: Option<&str>,
        lookup: impl FnOnce(&str) -> Option<T>,
    ) -> T {
        let Some(token) = raw.map(str::trim).filter(|token| !token.is_empty()) else {
            return T::default();
        };
        match lookup(token) {
            Some(value) => value,
            None => {
                let fallback = T::default();
                log::debug!(
                    "[{}] unrecognized {} '{}', defaulting to '{}'",
                    self.system,
                    field,
                    token,
                    fallback
                );
                self.defaulted += 1;
                fallback
            }
        }
    }

    pub fn status(&mut self, raw: Option<&str>) -> RecipeStatus {
        let system = self.system;
        self.resolve("status", raw, |token| vocabulary::status_from(system, token))
    }

    pub fn recipe_type(&mut self, raw: Option<&str>) -> RecipeType {
        let system = self.system;
        self.resolve("recipe type", raw, |token| vocabulary::recipe_type_from(system, token))
    }

    pub fn phase_type(&mut self, raw: Option<&str>) -> PhaseType {
        let system = self.system;
        self.resolve("phase type", raw, |token| vocabulary::phase_type_from(system, token))
    }

    pub fn signature_type(&mut self, raw: Option<&str>) -> SignatureType {
        let system = self.system;
        self.resolve("signature type", raw, |token| vocabulary::signature_type_from(system, token))
    }

    pub fn data_type(&mut self, raw: Option<&str>) -> DataType {
        let system = self.system;
        self.resolve("data type", raw, |token| vocabulary::data_type_from(system, token))
    }

    pub fn material_type(&mut self, raw: Option<&str>) -> MaterialType {
        let system = self.system;
        self.resolve("material type", raw, |token| vocabulary::material_type_from(system, token))
    }

    pub fn interface_system(&mut self, raw: Option<&str>) -> InterfaceSystem {
        let system = self.system;
        self.resolve("interface system", raw, |token| vocabulary::interface_system_from(system, token))
    }

    pub fn direction(&mut self, raw: Option<&str>) -> InterfaceDirection {
        self.resolve("interface direction", raw, vocabulary::direction_from)
    }

    pub fn duration_unit(&mut self, raw: Option<&str>) -> DurationUnit {
        self.resolve("duration unit", raw, vocabulary::duration_unit_from)
    }

    pub fn transition_type(&mut self, raw: Option<&str>) -> TransitionType {
        self.resolve("transition type", raw, vocabulary::transition_type_from)
    }

    /// Cleaning level; absent means the operation carries none
    pub fn cleaning_level(&mut self, raw: Option<&str>) -> Option<CleaningLevel> {
        raw.map(|token| self.resolve("cleaning level", Some(token), vocabulary::cleaning_level_from))
    }

    // ------------------------------------------------------------------
    // Scalar readers
    // ------------------------------------------------------------------

    pub fn flag(&mut self, raw: Option<&str>, default: bool) -> bool {
        match raw.map(str::trim).filter(|token| !token.is_empty()) {
            Some(token) => vocabulary::bool_from(token).unwrap_or_else(|| {
                self.warn(format!("Invalid boolean '{}', using {}", token, default));
                default
            }),
            None => default,
        }
    }

    pub fn number(&mut self, raw: Option<&str>, field: &str) -> Option<f64> {
        let token = raw.map(str::trim).filter(|token| !token.is_empty())?;
        match token.parse::<f64>() {
            Ok(value) if value.is_finite() => Some(value),
            _ => {
                self.warn(format!("Invalid number '{}' for {}", token, field));
                None
            }
        }
    }

    pub fn integer(&mut self, raw: Option<&str>, field: &str) -> Option<u32> {
        let token = raw.map(str::trim).filter(|token| !token.is_empty())?;
        match token.parse::<u32>() {
            Ok(value) => Some(value),
            Err(_) => {
                self.warn(format!("Invalid integer '{}' for {}", token, field));
                None
            }
        }
    }

    /// RFC 3339 timestamp, "now" when absent or unparsable
    pub fn timestamp(&mut self, raw: Option<&str>) -> DateTime<Utc> {
        let Some(token) = raw.map(str::trim).filter(|token| !token.is_empty()) else {
            return Utc::now();
        };
        match DateTime::parse_from_rfc3339(token) {
            Ok(parsed) => parsed.with_timezone(&Utc),
            Err(_) => {
                self.warn(format!("Invalid timestamp '{}', using current time", token));
                Utc::now()
            }
        }
    }

    /// Duration estimate from a value and a unit token
    pub fn duration(&mut self, value: Option<&str>, unit: Option<&str>) -> Option<DurationEstimate> {
        let value = self.number(value, "duration")?;
        Some(DurationEstimate {
            value,
            unit: self.duration_unit(unit),
        })
    }

    /// Data mapping triple; source and target are required
    pub fn data_mapping(&mut self, source: Option<String>, target: Option<String>, transform: Option<String>) -> Option<DataMapping> {
        match (source, target) {
            (Some(source), Some(target)) => Some(DataMapping { source, target, transform }),
            _ => {
                self.warn("Interface mapping without source or target skipped");
                None
            }
        }
    }

    // ------------------------------------------------------------------
    // Result assembly
    // ------------------------------------------------------------------

    /// Validate the procedure and package it with statistics and warnings
    pub fn finish(mut self, procedure: Procedure, source_version: Option<String>) -> Result<ParseResult, ParseError> {
        let report = models::validate(&procedure);
        if self.options.strict_validation && !report.valid {
            return Err(ParseError::StrictValidation(report.errors));
        }
        self.warnings.extend(report.errors);
        self.warnings.extend(report.warnings);

        if let Some(wanted) = &self.options.target_version {
            if source_version.as_deref() != Some(wanted.as_str()) {
                self.warnings.push(format!(
                    "Requested version {} but document declares {}",
                    wanted,
                    source_version.as_deref().unwrap_or("no version")
                ));
            }
        }

        let statistics = ParseStatistics {
            counts: RecipeCounts::of(&procedure),
            unmapped_sections: self.unmapped.len(),
            defaulted_values: self.defaulted,
        };
        log::info!(
            "Parsed {} recipe '{}': {} unit procedures, {} phases, {} warnings",
            self.system,
            procedure.name,
            statistics.counts.unit_procedures,
            statistics.counts.phases,
            self.warnings.len()
        );

        let unmapped_data = if self.options.preserve_unmapped_data {
            Some(self.unmapped)
        } else {
            None
        };

        Ok(ParseResult {
            procedure,
            source_system: self.system,
            source_version,
            statistics,
            warnings: self.warnings,
            unmapped_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_one_based() {
        let doc = XmlDocument::parse("<Recipe/>").unwrap();
        let options = ParserOptions::default();
        let mut ctx = ParseContext::new(MesSystem::PasX, &doc, &options);

        assert_eq!(ctx.sequence(Some(" 3 "), 0), 3);
        assert_eq!(ctx.sequence(None, 4), 5);
        assert!(ctx.warnings.is_empty());

        assert_eq!(ctx.sequence(Some("0"), 1), 2);
        assert_eq!(ctx.sequence(Some("-1"), 0), 1);
        assert_eq!(ctx.sequence(Some("first"), 2), 3);
        assert_eq!(ctx.warnings.len(), 3);
        assert!(ctx.warnings[0].contains("Invalid sequence '0'"));
    }
}
