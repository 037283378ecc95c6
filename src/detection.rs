//! Source format detection
//!
//! Two passes over the registry, first match wins:
//!
//! 1. Root element (and declared namespace) against each parser's grammars.
//!    A declared namespace that matches scores 1.0, a bare root 0.9.
//! 2. Distinctive vendor element names, matched textually (0.7). This pass
//!    also covers documents whose root was renamed or that fail to parse.
//!
//! Registry order decides between formats that both match; nothing ranks
//! candidates against each other.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::converters::types::{DetectionMethod, DetectionResult};
use crate::parsers::{parsers, version_attribute};
use crate::systems::MesSystem;
use crate::xml::{XmlDocument, XmlError};

pub const NAMESPACE_CONFIDENCE: f64 = 1.0;
pub const STRUCTURAL_CONFIDENCE: f64 = 0.9;
pub const HEURISTIC_CONFIDENCE: f64 = 0.7;

/// Element names that only occur in one vendor's schema, in registry order
const HEURISTIC_PATTERNS: [(MesSystem, &str); 5] = [
    (MesSystem::PasX, r"<(?:\w+:)?(?:RecipeHeader|BillOfMaterials|MaterialInputs)\b"),
    (MesSystem::Syncade, r"<(?:\w+:)?(?:Segment|ESignature|WorkflowSettings)\b"),
    (MesSystem::PharmaSuite, r"<(?:\w+:)?(?:RecipeElement|PhaseInstance|ProcedureLogic)\b"),
    (MesSystem::Opcenter, r"<(?:\w+:)?(?:ProcessStage|ProcessOperation|ProcessStep)\b"),
    (MesSystem::Moda, r"<(?:\w+:)?(?:Stage|Activity|SamplingPlans)\b"),
];

static HEURISTICS: Lazy<Vec<(MesSystem, Regex)>> = Lazy::new(|| {
    HEURISTIC_PATTERNS
        .iter()
        .filter_map(|(system, pattern)| Regex::new(pattern).ok().map(|regex| (*system, regex)))
        .collect()
});

/// First element name after any prolog, comments and doctype
static FIRST_TAG: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"<(?:\w+:)?([A-Za-z_][\w.\-]*)").ok());

/// Identify the MES dialect of `xml`, or `None` when nothing matches
pub fn detect_mes_system(xml: &str) -> Option<DetectionResult> {
    let doc = match XmlDocument::parse(xml) {
        Ok(doc) => Some(doc),
        Err(XmlError::TooDeep { .. }) => return None,
        Err(_) => None,
    };

    if let Some(doc) = &doc {
        let root = doc.root();
        for parser in parsers() {
            if parser.accepts(root).is_none() {
                continue;
            }
            let (confidence, method) = match root.namespace() {
                Some(_) => (NAMESPACE_CONFIDENCE, DetectionMethod::Namespace),
                None => (STRUCTURAL_CONFIDENCE, DetectionMethod::Structural),
            };
            log::info!("Detected {} by {:?} match on <{}>", parser.system(), method, root.name());
            return Some(DetectionResult {
                system: parser.system(),
                confidence,
                method,
                root_element: root.name().to_string(),
                namespace: root.namespace().map(str::to_string),
                version: version_attribute(parser.info(), root),
            });
        }
    }

    let (system, _) = HEURISTICS.iter().find(|(_, regex)| regex.is_match(xml))?;
    let root_element = match &doc {
        Some(doc) => doc.root().name().to_string(),
        None => first_tag(xml).unwrap_or_default(),
    };
    log::info!("Detected {} heuristically (root <{}>)", system, root_element);

    Some(DetectionResult {
        system: *system,
        confidence: HEURISTIC_CONFIDENCE,
        method: DetectionMethod::Heuristic,
        root_element,
        namespace: doc.as_ref().and_then(|doc| doc.root().namespace().map(str::to_string)),
        version: doc
            .as_ref()
            .and_then(|doc| version_attribute(system.info(), doc.root())),
    })
}

fn first_tag(xml: &str) -> Option<String> {
    let regex = FIRST_TAG.as_ref()?;
    regex
        .captures_iter(xml)
        .filter_map(|captures| captures.get(1))
        .map(|name| name.as_str().to_string())
        .next()
}
