//! The closed set of supported MES dialects
//!
//! Every lookup that branches per format matches on [`MesSystem`]
//! exhaustively, so adding a dialect fails to compile until every mapping
//! site handles it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::converters::errors::ConversionError;

/// Supported manufacturing execution systems, in registry order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MesSystem {
    PasX,
    Syncade,
    PharmaSuite,
    Opcenter,
    Moda,
}

impl MesSystem {
    /// Registry order; detection and listings follow it
    pub const ALL: [MesSystem; 5] = [
        MesSystem::PasX,
        MesSystem::Syncade,
        MesSystem::PharmaSuite,
        MesSystem::Opcenter,
        MesSystem::Moda,
    ];

    pub fn id(&self) -> &'static str {
        self.info().id
    }

    pub fn name(&self) -> &'static str {
        self.info().name
    }

    pub fn vendor(&self) -> &'static str {
        self.info().vendor
    }

    /// Static wire descriptor of this dialect
    pub fn info(&self) -> &'static FormatInfo {
        match self {
            MesSystem::PasX => &PASX_INFO,
            MesSystem::Syncade => &SYNCADE_INFO,
            MesSystem::PharmaSuite => &PHARMASUITE_INFO,
            MesSystem::Opcenter => &OPCENTER_INFO,
            MesSystem::Moda => &MODA_INFO,
        }
    }

    /// Every registered id, for error messages
    pub fn known_ids() -> Vec<String> {
        Self::ALL.iter().map(|system| system.id().to_string()).collect()
    }
}

impl fmt::Display for MesSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for MesSystem {
    type Err = ConversionError;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        let wanted = id.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|system| system.id() == wanted)
            .ok_or_else(|| ConversionError::UnknownSystem {
                id: id.to_string(),
                valid: Self::known_ids(),
            })
    }
}

/// A root element / namespace pair identifying one serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Grammar {
    pub root_element: &'static str,
    pub namespace: &'static str,
}

impl Grammar {
    /// Root name must match; a declared namespace must match exactly
    pub fn accepts(&self, root_element: &str, namespace: Option<&str>) -> bool {
        root_element == self.root_element && namespace.map_or(true, |ns| ns == self.namespace)
    }
}

/// Static description of one vendor dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub vendor: &'static str,
    pub root_element: &'static str,
    pub namespace: &'static str,
    pub supported_versions: &'static [&'static str],
    /// Root attributes probed, in order, for the schema version
    pub version_attributes: &'static [&'static str],
    /// Second serialization accepted under the same format id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternate_grammar: Option<Grammar>,
}

impl FormatInfo {
    pub fn grammar(&self) -> Grammar {
        Grammar {
            root_element: self.root_element,
            namespace: self.namespace,
        }
    }

    /// Primary grammar first, then the alternate one
    pub fn grammars(&self) -> impl Iterator<Item = Grammar> {
        std::iter::once(self.grammar()).chain(self.alternate_grammar)
    }

    /// Newest supported version; the list is kept in ascending order
    pub fn latest_version(&self) -> &'static str {
        self.supported_versions.last().copied().unwrap_or("1.0")
    }

    pub fn supports_version(&self, version: &str) -> bool {
        self.supported_versions.contains(&version)
    }
}

pub static PASX_INFO: FormatInfo = FormatInfo {
    id: "pasx",
    name: "PAS-X MBR",
    vendor: "Körber (Werum)",
    root_element: "MasterRecipe",
    namespace: "http://www.werum.com/pas-x/mbr",
    supported_versions: &["3.1", "3.2", "3.3"],
    version_attributes: &["version", "schemaVersion", "mbrVersion"],
    alternate_grammar: None,
};

pub static SYNCADE_INFO: FormatInfo = FormatInfo {
    id: "syncade",
    name: "Syncade",
    vendor: "Emerson",
    root_element: "SyncadeRecipe",
    namespace: "http://www.emerson.com/syncade/recipe",
    supported_versions: &["5.0", "5.1", "6.0"],
    version_attributes: &["version", "schemaVersion"],
    alternate_grammar: None,
};

pub const B2MML_GRAMMAR: Grammar = Grammar {
    root_element: "BatchInformation",
    namespace: "http://www.mesa.org/xml/B2MML-V0600",
};

pub static PHARMASUITE_INFO: FormatInfo = FormatInfo {
    id: "pharmasuite",
    name: "PharmaSuite",
    vendor: "Rockwell Automation",
    root_element: "PharmaSuiteRecipe",
    namespace: "http://www.rockwellautomation.com/pharmasuite/recipe",
    supported_versions: &["8.4", "9.0", "10.0"],
    version_attributes: &["version", "psVersion", "schemaVersion"],
    alternate_grammar: Some(B2MML_GRAMMAR),
};

pub static OPCENTER_INFO: FormatInfo = FormatInfo {
    id: "opcenter",
    name: "Opcenter Execution Pharma",
    vendor: "Siemens",
    root_element: "OpcenterRecipe",
    namespace: "http://www.siemens.com/opcenter/execution/pharma",
    supported_versions: &["2210", "2301", "2401"],
    version_attributes: &["version", "releaseVersion"],
    alternate_grammar: None,
};

pub static MODA_INFO: FormatInfo = FormatInfo {
    id: "moda",
    name: "MODA",
    vendor: "Lonza",
    root_element: "MODARecipe",
    namespace: "http://www.lonza.com/moda/recipe",
    supported_versions: &["3.2", "4.0", "4.1"],
    version_attributes: &["version", "modaVersion"],
    alternate_grammar: None,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_round_trip_through_from_str() {
        for system in MesSystem::ALL {
            assert_eq!(system.id().parse::<MesSystem>().unwrap(), system);
        }
        assert_eq!(" PASX ".parse::<MesSystem>().unwrap(), MesSystem::PasX);
    }

    #[test]
    fn test_unknown_id_lists_valid_ids() {
        match "not-a-real-id".parse::<MesSystem>() {
            Err(ConversionError::UnknownSystem { id, valid }) => {
                assert_eq!(id, "not-a-real-id");
                assert_eq!(valid, vec!["pasx", "syncade", "pharmasuite", "opcenter", "moda"]);
            }
            other => panic!("expected UnknownSystem, got {:?}", other),
        }
    }

    #[test]
    fn test_serde_name_matches_id() {
        for system in MesSystem::ALL {
            let json = serde_json::to_string(&system).unwrap();
            assert_eq!(json, format!("\"{}\"", system.id()));
        }
    }

    #[test]
    fn test_grammar_accepts_missing_namespace() {
        let grammar = PASX_INFO.grammar();
        assert!(grammar.accepts("MasterRecipe", None));
        assert!(grammar.accepts("MasterRecipe", Some("http://www.werum.com/pas-x/mbr")));
        assert!(!grammar.accepts("MasterRecipe", Some("urn:other")));
        assert!(!grammar.accepts("Recipe", None));
    }

    #[test]
    fn test_root_element_namespace_pairs_are_distinct() {
        let mut pairs: Vec<(&str, &str)> = MesSystem::ALL
            .iter()
            .flat_map(|system| system.info().grammars())
            .map(|grammar| (grammar.root_element, grammar.namespace))
            .collect();
        let total = pairs.len();
        pairs.sort();
        pairs.dedup();
        assert_eq!(pairs.len(), total);
    }
}
