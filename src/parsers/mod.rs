//! Vendor recipe parsers
//!
//! One parser per [`MesSystem`]. Each checks the root element and namespace,
//! walks its dialect's element tree through a [`ParseContext`] and produces a
//! canonical [`Procedure`](crate::models::Procedure).
//!
//! - `pasx` - Körber PAS-X master batch records
//! - `syncade` - Emerson Syncade recipes
//! - `pharmasuite` - Rockwell PharmaSuite, native and B2MML grammars
//! - `opcenter` - Siemens Opcenter Execution Pharma
//! - `moda` - Lonza MODA

pub mod context;
pub mod moda;
pub mod opcenter;
pub mod pasx;
pub mod pharmasuite;
pub mod syncade;

pub use context::ParseContext;
pub use moda::ModaParser;
pub use opcenter::OpcenterParser;
pub use pasx::PasXParser;
pub use pharmasuite::PharmaSuiteParser;
pub use syncade::SyncadeParser;

use crate::converters::errors::ParseError;
use crate::converters::types::{ParseResult, ParserOptions};
use crate::systems::{FormatInfo, Grammar, MesSystem};
use crate::xml::{Element, XmlDocument};

/// Contract shared by the five dialect parsers
pub trait RecipeParser: Send + Sync {
    fn system(&self) -> MesSystem;

    fn info(&self) -> &'static FormatInfo {
        self.system().info()
    }

    /// Grammar whose root and (declared) namespace match `root`
    fn accepts(&self, root: &Element) -> Option<Grammar> {
        self.info()
            .grammars()
            .find(|grammar| grammar.accepts(root.name(), root.namespace()))
    }

    /// True iff the root element matches and any declared namespace matches exactly
    fn can_parse(&self, xml: &str) -> bool {
        XmlDocument::parse(xml)
            .map(|doc| self.accepts(doc.root()).is_some())
            .unwrap_or(false)
    }

    fn parse(&self, xml: &str, options: &ParserOptions) -> Result<ParseResult, ParseError>;

    /// Schema version from the first candidate root attribute present
    fn detect_version(&self, xml: &str) -> Option<String> {
        let doc = XmlDocument::parse(xml).ok()?;
        version_attribute(self.info(), doc.root())
    }
}

/// Probe the format's version-bearing attributes in order
pub fn version_attribute(info: &FormatInfo, element: &Element) -> Option<String> {
    info.version_attributes
        .iter()
        .find_map(|name| element.attribute_text(name))
}

/// Parse `xml` and reject it unless its root belongs to `info`
pub fn open_document<'input>(info: &FormatInfo, xml: &'input str) -> Result<(XmlDocument<'input>, Grammar), ParseError> {
    let doc = XmlDocument::parse(xml).map_err(|err| ParseError::InvalidXml(err.to_string()))?;
    let root = doc.root();

    if let Some(grammar) = info.grammars().find(|grammar| grammar.accepts(root.name(), root.namespace())) {
        return Ok((doc, grammar));
    }

    match info.grammars().find(|grammar| grammar.root_element == root.name()) {
        Some(grammar) => Err(ParseError::NamespaceMismatch {
            expected: grammar.namespace.to_string(),
            found: root.namespace().unwrap_or_default().to_string(),
        }),
        None => Err(ParseError::UnexpectedRoot {
            expected: info
                .grammars()
                .map(|grammar| grammar.root_element)
                .collect::<Vec<_>>()
                .join(" or "),
            found: root.name().to_string(),
        }),
    }
}

static PASX_PARSER: PasXParser = PasXParser;
static SYNCADE_PARSER: SyncadeParser = SyncadeParser;
static PHARMASUITE_PARSER: PharmaSuiteParser = PharmaSuiteParser;
static OPCENTER_PARSER: OpcenterParser = OpcenterParser;
static MODA_PARSER: ModaParser = ModaParser;

/// Registered parser for a system
pub fn parser_for(system: MesSystem) -> &'static dyn RecipeParser {
    match system {
        MesSystem::PasX => &PASX_PARSER,
        MesSystem::Syncade => &SYNCADE_PARSER,
        MesSystem::PharmaSuite => &PHARMASUITE_PARSER,
        MesSystem::Opcenter => &OPCENTER_PARSER,
        MesSystem::Moda => &MODA_PARSER,
    }
}

/// All parsers in registry order
pub fn parsers() -> impl Iterator<Item = &'static dyn RecipeParser> {
    MesSystem::ALL.into_iter().map(parser_for)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_order() {
        let ids: Vec<&str> = parsers().map(|parser| parser.info().id).collect();
        assert_eq!(ids, vec!["pasx", "syncade", "pharmasuite", "opcenter", "moda"]);
    }

    #[test]
    fn test_can_parse_requires_matching_namespace() {
        let parser = parser_for(MesSystem::PasX);
        assert!(parser.can_parse("<MasterRecipe/>"));
        assert!(parser.can_parse(r#"<MasterRecipe xmlns="http://www.werum.com/pas-x/mbr"/>"#));
        assert!(!parser.can_parse(r#"<MasterRecipe xmlns="urn:someone-else"/>"#));
        assert!(!parser.can_parse("<SyncadeRecipe/>"));
        assert!(!parser.can_parse("not xml at all"));
    }

    #[test]
    fn test_open_document_reports_namespace_mismatch() {
        let err = open_document(&crate::systems::OPCENTER_INFO, r#"<OpcenterRecipe xmlns="urn:x"/>"#).unwrap_err();
        assert_eq!(
            err,
            ParseError::NamespaceMismatch {
                expected: "http://www.siemens.com/opcenter/execution/pharma".to_string(),
                found: "urn:x".to_string(),
            }
        );
    }

    #[test]
    fn test_open_document_lists_both_pharmasuite_roots() {
        let err = open_document(&crate::systems::PHARMASUITE_INFO, "<Recipe/>").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnexpectedRoot {
                expected: "PharmaSuiteRecipe or BatchInformation".to_string(),
                found: "Recipe".to_string(),
            }
        );
    }

    #[test]
    fn test_detect_version_probes_attributes_in_order() {
        let parser = parser_for(MesSystem::Moda);
        assert_eq!(parser.detect_version(r#"<MODARecipe modaVersion="4.1"/>"#).as_deref(), Some("4.1"));
        assert_eq!(
            parser.detect_version(r#"<MODARecipe version="4.0" modaVersion="4.1"/>"#).as_deref(),
            Some("4.0")
        );
        assert_eq!(parser.detect_version("<MODARecipe/>"), None);
    }
}
