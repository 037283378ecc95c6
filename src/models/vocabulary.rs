//! Canonical enumerations of the ISA-88 model
//!
//! Every enum has a documented default. Vendor vocabularies are mapped onto
//! these in `crate::vocabulary`; a token that matches nothing resolves to the
//! default instead of failing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipeStatus {
    #[default]
    Draft,
    Approved,
    Released,
    Obsolete,
}

/// ISA-88 recipe type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipeType {
    General,
    Site,
    #[default]
    Master,
    Control,
}

/// How a phase is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhaseType {
    #[default]
    Manual,
    Automatic,
    SemiAutomatic,
}

/// Meaning of an electronic signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureType {
    #[default]
    Perform,
    Verify,
    Approve,
    Review,
    Witness,
}

/// Value type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    #[default]
    String,
    Integer,
    Real,
    Boolean,
    Datetime,
    Duration,
    Enumeration,
}

/// Role of a material in the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialType {
    #[default]
    Raw,
    Intermediate,
    Finished,
    Packaging,
}

/// Cleaning scope of a cleaning operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CleaningLevel {
    #[default]
    Minor,
    Major,
    Campaign,
}

/// Unit of a duration estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    Seconds,
    #[default]
    Minutes,
    Hours,
}

/// External system a phase exchanges data with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InterfaceSystem {
    Sap,
    #[default]
    Mes,
    Lims,
    Dcs,
    Scada,
    Erp,
    Qms,
}

/// Data flow direction of an interface point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceDirection {
    #[default]
    Input,
    Output,
    Bidirectional,
}

/// Kind of execution edge between sibling nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionType {
    #[default]
    Sequential,
    Parallel,
    Selection,
    Loop,
}

macro_rules! canonical_names {
    ($ty:ty { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// All variants in declaration order
            pub const ALL: &'static [$ty] = &[$(<$ty>::$variant),+];

            /// Canonical lowercase name, identical to the serde form
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(<$ty>::$variant => $name),+
                }
            }

            /// Parse the canonical name, returning `None` for anything else
            pub fn from_canonical(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(<$ty>::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

canonical_names!(RecipeStatus {
    Draft => "draft",
    Approved => "approved",
    Released => "released",
    Obsolete => "obsolete",
});

canonical_names!(RecipeType {
    General => "general",
    Site => "site",
    Master => "master",
    Control => "control",
});

canonical_names!(PhaseType {
    Manual => "manual",
    Automatic => "automatic",
    SemiAutomatic => "semi-automatic",
});

canonical_names!(SignatureType {
    Perform => "perform",
    Verify => "verify",
    Approve => "approve",
    Review => "review",
    Witness => "witness",
});

canonical_names!(DataType {
    String => "string",
    Integer => "integer",
    Real => "real",
    Boolean => "boolean",
    Datetime => "datetime",
    Duration => "duration",
    Enumeration => "enumeration",
});

canonical_names!(MaterialType {
    Raw => "raw",
    Intermediate => "intermediate",
    Finished => "finished",
    Packaging => "packaging",
});

canonical_names!(CleaningLevel {
    Minor => "minor",
    Major => "major",
    Campaign => "campaign",
});

canonical_names!(DurationUnit {
    Seconds => "seconds",
    Minutes => "minutes",
    Hours => "hours",
});

canonical_names!(InterfaceSystem {
    Sap => "SAP",
    Mes => "MES",
    Lims => "LIMS",
    Dcs => "DCS",
    Scada => "SCADA",
    Erp => "ERP",
    Qms => "QMS",
});

canonical_names!(InterfaceDirection {
    Input => "input",
    Output => "output",
    Bidirectional => "bidirectional",
});

canonical_names!(TransitionType {
    Sequential => "sequential",
    Parallel => "parallel",
    Selection => "selection",
    Loop => "loop",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_fallbacks() {
        assert_eq!(RecipeStatus::default(), RecipeStatus::Draft);
        assert_eq!(PhaseType::default(), PhaseType::Manual);
        assert_eq!(SignatureType::default(), SignatureType::Perform);
        assert_eq!(RecipeType::default(), RecipeType::Master);
    }

    #[test]
    fn test_serde_names_match_as_str() {
        for phase_type in PhaseType::ALL {
            let json = serde_json::to_string(phase_type).unwrap();
            assert_eq!(json, format!("\"{}\"", phase_type.as_str()));
        }
        for system in InterfaceSystem::ALL {
            let json = serde_json::to_string(system).unwrap();
            assert_eq!(json, format!("\"{}\"", system.as_str()));
        }
    }

    #[test]
    fn test_from_canonical_rejects_unknown() {
        assert_eq!(SignatureType::from_canonical("verify"), Some(SignatureType::Verify));
        assert_eq!(SignatureType::from_canonical("countersign"), None);
    }
}
