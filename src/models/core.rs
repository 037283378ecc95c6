//! ISA-88 procedural hierarchy
//!
//! Procedure > UnitProcedure > Operation > Phase. Each level is numbered
//! 1..N among its siblings through `sequence`, which is assigned by the
//! producer (a parser or the step converter) and never recomputed downstream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::elements::{
    BatchSize, DurationEstimate, Equipment, Formula, InterfacePoint, Material, Parameter,
    ResourceRequirements, Signature,
};
use super::vocabulary::{CleaningLevel, PhaseType, RecipeStatus, RecipeType, TransitionType};

/// Fresh process-wide unique node id
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Root of a canonical recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Procedure {
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub status: RecipeStatus,
    #[serde(default)]
    pub recipe_type: RecipeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<BatchSize>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    #[serde(default)]
    pub unit_procedures: Vec<UnitProcedure>,
    #[serde(default)]
    pub transitions: Vec<Transition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<Formula>,
    #[serde(default)]
    pub equipment_requirements: Vec<Equipment>,
}

impl Procedure {
    /// Empty draft master recipe with a fresh id and version "1.0"
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            name: name.into(),
            version: "1.0".to_string(),
            status: RecipeStatus::default(),
            recipe_type: RecipeType::default(),
            description: None,
            product_code: None,
            product_name: None,
            author: None,
            batch_size: None,
            created: now,
            modified: now,
            unit_procedures: Vec::new(),
            transitions: Vec::new(),
            formula: None,
            equipment_requirements: Vec::new(),
        }
    }

    /// Iterate over every operation in document order
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.unit_procedures.iter().flat_map(|up| up.operations.iter())
    }

    /// Iterate over every phase in document order
    pub fn phases(&self) -> impl Iterator<Item = &Phase> {
        self.operations().flat_map(|op| op.phases.iter())
    }

    /// Collect the id of every node in the tree, the procedure included
    pub fn node_ids(&self) -> Vec<&str> {
        let mut ids = vec![self.id.as_str()];
        for up in &self.unit_procedures {
            ids.push(up.id.as_str());
            for op in &up.operations {
                ids.push(op.id.as_str());
                ids.extend(op.phases.iter().map(|phase| phase.id.as_str()));
            }
        }
        ids
    }
}

/// Unit procedure: a major processing sequence bound to one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitProcedure {
    pub id: String,
    pub name: String,
    pub sequence: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub operations: Vec<Operation>,
    #[serde(default)]
    pub equipment: Vec<Equipment>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub signatures: Vec<Signature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_requirements: Option<ResourceRequirements>,
}

impl UnitProcedure {
    pub fn new(name: impl Into<String>, sequence: u32) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            sequence,
            description: None,
            operations: Vec::new(),
            equipment: Vec::new(),
            parameters: Vec::new(),
            signatures: Vec::new(),
            resource_requirements: None,
        }
    }
}

/// Operation: an independent processing activity inside a unit procedure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub id: String,
    pub name: String,
    pub sequence: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub phases: Vec<Phase>,
    #[serde(default)]
    pub signatures: Vec<Signature>,
    #[serde(default)]
    pub is_cleaning: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleaning_level: Option<CleaningLevel>,
}

impl Operation {
    pub fn new(name: impl Into<String>, sequence: u32) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            sequence,
            description: None,
            phases: Vec::new(),
            signatures: Vec::new(),
            is_cleaning: false,
            cleaning_level: None,
        }
    }
}

/// Phase: the lowest executable element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    pub id: String,
    pub name: String,
    pub sequence: u32,
    #[serde(rename = "type", default)]
    pub phase_type: PhaseType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub signatures: Vec<Signature>,
    #[serde(default)]
    pub interface_points: Vec<InterfacePoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<DurationEstimate>,
}

impl Phase {
    pub fn new(name: impl Into<String>, sequence: u32) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            sequence,
            phase_type: PhaseType::default(),
            description: None,
            instructions: String::new(),
            parameters: Vec::new(),
            materials: Vec::new(),
            signatures: Vec::new(),
            interface_points: Vec::new(),
            duration: None,
        }
    }
}

/// Explicit execution edge between two sibling nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub id: String,
    #[serde(rename = "type", default)]
    pub transition_type: TransitionType,
    pub source_id: String,
    pub target_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl Transition {
    pub fn new(transition_type: TransitionType, source_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            transition_type,
            source_id: source_id.into(),
            target_id: target_id.into(),
            condition: None,
        }
    }
}

/// Chain sibling ids (already in sequence order) with sequential edges
pub fn sequential_transitions<'a, I>(sibling_ids: I) -> Vec<Transition>
where
    I: IntoIterator<Item = &'a str>,
{
    let ids: Vec<&str> = sibling_ids.into_iter().collect();
    ids.windows(2)
        .map(|pair| Transition::new(TransitionType::Sequential, pair[0], pair[1]))
        .collect()
}

/// Sequential edges for every level of the hierarchy
///
/// Used by producers whose source format carries execution order only
/// implicitly through element order.
pub fn derive_transitions(unit_procedures: &[UnitProcedure]) -> Vec<Transition> {
    let mut transitions = sequential_transitions(unit_procedures.iter().map(|up| up.id.as_str()));
    for up in unit_procedures {
        transitions.extend(sequential_transitions(up.operations.iter().map(|op| op.id.as_str())));
        for op in &up.operations {
            transitions.extend(sequential_transitions(op.phases.iter().map(|phase| phase.id.as_str())));
        }
    }
    transitions
}
