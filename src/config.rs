//! Conversion profiles
//!
//! A profile pins the parser and generator option sets for a deployment, so
//! a site can keep e.g. "always emit EWI and B2MML, plant P100" in one file
//! instead of repeating it per request. Profiles are YAML or JSON documents
//! using the same camelCase keys as the JS API.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::converters::types::{ConversionRequest, GeneratorOptions, ParserOptions};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read profile {path}: {message}")]
    Read { path: String, message: String },

    #[error("Failed to parse profile as YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse profile as JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parser and generator options applied to every conversion
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversionProfile {
    pub parser: ParserOptions,
    pub generator: GeneratorOptions,
}

impl ConversionProfile {
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a profile file; `.json` is read as JSON, anything else as YAML
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        let profile = match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json(&text)?,
            _ => Self::from_yaml(&text)?,
        };
        log::info!("Loaded conversion profile from {}", path.display());
        Ok(profile)
    }

    /// Request for `target` carrying this profile's options
    pub fn request(&self, source: Option<&str>, target: &str) -> ConversionRequest {
        ConversionRequest {
            source_system: source.map(str::to_string),
            target_system: target.to_string(),
            parser_options: self.parser.clone(),
            generator_options: self.generator.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
parser:
  strictValidation: true
  preserveUnmappedData: true
generator:
  prettyPrint: false
  targetVersion: "3.2"
  includeEWI: true
  includeB2MML: true
  plantId: P100
"#;

    #[test]
    fn test_profile_from_yaml() {
        let profile = ConversionProfile::from_yaml(YAML).unwrap();
        assert!(profile.parser.strict_validation);
        assert!(profile.parser.preserve_unmapped_data);
        assert!(!profile.generator.pretty_print);
        assert!(profile.generator.include_comments);
        assert_eq!(profile.generator.target_version.as_deref(), Some("3.2"));
        assert!(profile.generator.vendor.include_ewi);
        assert!(profile.generator.vendor.include_b2mml);
        assert_eq!(profile.generator.vendor.plant_id.as_deref(), Some("P100"));
    }

    #[test]
    fn test_profile_from_json_defaults_missing_sections() {
        let profile = ConversionProfile::from_json(r#"{"generator": {"encoding": "ISO-8859-1"}}"#).unwrap();
        assert_eq!(profile.parser, ParserOptions::default());
        assert_eq!(profile.generator.encoding, "ISO-8859-1");
    }

    #[test]
    fn test_malformed_profile_is_an_error() {
        assert!(matches!(ConversionProfile::from_json("{"), Err(ConfigError::Json(_))));
        assert!(matches!(ConversionProfile::from_yaml("parser: [1"), Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_request_carries_options() {
        let profile = ConversionProfile::from_yaml(YAML).unwrap();
        let request = profile.request(None, "pharmasuite");
        assert_eq!(request.source_system, None);
        assert_eq!(request.target_system, "pharmasuite");
        assert_eq!(request.generator_options, profile.generator);
    }

    #[test]
    fn test_load_missing_file() {
        let err = ConversionProfile::load(Path::new("/nonexistent/profile.yaml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/profile.yaml"));
    }
}
