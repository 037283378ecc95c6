//! Leaf records attached to the ISA-88 hierarchy

use serde::{Deserialize, Serialize};

use super::vocabulary::{
    DataType, DurationUnit, InterfaceDirection, InterfaceSystem, MaterialType, SignatureType,
};

/// Process or recipe parameter
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    pub data_type: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default)]
    pub required: bool,
}

impl Parameter {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            ..Default::default()
        }
    }
}

/// Material consumed or produced by a phase or formula
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub code: String,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub material_type: MaterialType,
    #[serde(default)]
    pub scalable: bool,
    /// Symmetric tolerance (±) in `unit`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,
}

impl Material {
    pub fn new(code: impl Into<String>, name: impl Into<String>, quantity: f64, unit: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            quantity,
            unit: unit.into(),
            ..Default::default()
        }
    }
}

/// Equipment class or instance requirement
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    pub code: String,
    pub name: String,
    #[serde(rename = "type")]
    pub equipment_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<String>,
}

impl Equipment {
    pub fn new(code: impl Into<String>, name: impl Into<String>, equipment_type: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            equipment_type: equipment_type.into(),
            capabilities: Vec::new(),
        }
    }
}

/// Electronic signature requirement
///
/// `order` defines the signing sequence; consumers use it to enforce that a
/// different person signs step N+1.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    #[serde(rename = "type")]
    pub signature_type: SignatureType,
    pub role: String,
    pub order: u32,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meaning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_minutes: Option<u32>,
}

fn default_true() -> bool {
    true
}

impl Signature {
    pub fn new(signature_type: SignatureType, role: impl Into<String>, order: u32) -> Self {
        Self {
            signature_type,
            role: role.into(),
            order,
            required: true,
            meaning: None,
            time_limit_minutes: None,
        }
    }
}

/// One field mapping of an interface point
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataMapping {
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<String>,
}

/// Data exchange with an external system during a phase
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfacePoint {
    pub system: InterfaceSystem,
    pub direction: InterfaceDirection,
    #[serde(default)]
    pub data_mappings: Vec<DataMapping>,
}

/// Expected execution time of a phase
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DurationEstimate {
    pub value: f64,
    pub unit: DurationUnit,
}

/// Allowed batch size range
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSize {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nominal: Option<f64>,
    pub unit: String,
}

/// Recipe formula: bill of materials plus process parameters
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Formula {
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl Formula {
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty() && self.parameters.is_empty()
    }
}

/// Staffing and room needs of a unit procedure
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequirements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personnel: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_class: Option<String>,
}

impl ResourceRequirements {
    pub fn is_empty(&self) -> bool {
        self.personnel.is_none() && self.room_class.is_none()
    }
}
