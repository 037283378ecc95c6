//! Vendor vocabulary tables
//!
//! Each `*_from` function maps a vendor token onto the canonical enum and
//! returns `None` on a miss; callers substitute the documented default. Each
//! `*_token` function is the reverse direction used by generators. Lookups
//! are case-, space-, hyphen- and underscore-insensitive, and canonical
//! names are accepted in every dialect.

use crate::models::{
    CleaningLevel, DataType, DurationUnit, InterfaceDirection, InterfaceSystem, MaterialType,
    PhaseType, RecipeStatus, RecipeType, SignatureType, TransitionType,
};
use crate::systems::MesSystem;

/// Lowercase and drop everything but letters and digits
pub fn normalize(token: &str) -> String {
    token
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

// ============================================================================
// RECIPE STATUS
// ============================================================================

pub fn status_from(system: MesSystem, token: &str) -> Option<RecipeStatus> {
    let key = normalize(token);
    let vendor = match system {
        MesSystem::PasX => match key.as_str() {
            "inwork" => Some(RecipeStatus::Draft),
            "checked" => Some(RecipeStatus::Approved),
            "valid" => Some(RecipeStatus::Released),
            "archived" => Some(RecipeStatus::Obsolete),
            _ => None,
        },
        MesSystem::Syncade => match key.as_str() {
            "indevelopment" => Some(RecipeStatus::Draft),
            "effective" => Some(RecipeStatus::Released),
            "retired" | "superseded" => Some(RecipeStatus::Obsolete),
            _ => None,
        },
        MesSystem::PharmaSuite => match key.as_str() {
            "edit" | "underconstruction" => Some(RecipeStatus::Draft),
            "verified" => Some(RecipeStatus::Approved),
            "expired" => Some(RecipeStatus::Obsolete),
            _ => None,
        },
        MesSystem::Opcenter => match key.as_str() {
            "inwork" | "created" => Some(RecipeStatus::Draft),
            "productive" => Some(RecipeStatus::Released),
            "locked" => Some(RecipeStatus::Obsolete),
            _ => None,
        },
        MesSystem::Moda => match key.as_str() {
            "pendingapproval" => Some(RecipeStatus::Draft),
            "active" => Some(RecipeStatus::Released),
            "retired" => Some(RecipeStatus::Obsolete),
            _ => None,
        },
    };
    vendor.or_else(|| RecipeStatus::from_canonical(&key))
}

pub fn status_token(system: MesSystem, status: RecipeStatus) -> &'static str {
    match (system, status) {
        (MesSystem::PasX, RecipeStatus::Draft) => "InWork",
        (MesSystem::PasX, RecipeStatus::Approved) => "Checked",
        (MesSystem::PasX, RecipeStatus::Released) => "Valid",
        (MesSystem::PasX, RecipeStatus::Obsolete) => "Archived",
        (MesSystem::Syncade, RecipeStatus::Draft) => "In Development",
        (MesSystem::Syncade, RecipeStatus::Approved) => "Approved",
        (MesSystem::Syncade, RecipeStatus::Released) => "Effective",
        (MesSystem::Syncade, RecipeStatus::Obsolete) => "Retired",
        (MesSystem::PharmaSuite, RecipeStatus::Draft) => "Edit",
        (MesSystem::PharmaSuite, RecipeStatus::Approved) => "Verified",
        (MesSystem::PharmaSuite, RecipeStatus::Released) => "Released",
        (MesSystem::PharmaSuite, RecipeStatus::Obsolete) => "Expired",
        (MesSystem::Opcenter, RecipeStatus::Draft) => "InWork",
        (MesSystem::Opcenter, RecipeStatus::Approved) => "Approved",
        (MesSystem::Opcenter, RecipeStatus::Released) => "Productive",
        (MesSystem::Opcenter, RecipeStatus::Obsolete) => "Locked",
        (MesSystem::Moda, RecipeStatus::Draft) => "Draft",
        (MesSystem::Moda, RecipeStatus::Approved) => "Approved",
        (MesSystem::Moda, RecipeStatus::Released) => "Active",
        (MesSystem::Moda, RecipeStatus::Obsolete) => "Retired",
    }
}

// ============================================================================
// RECIPE TYPE
// ============================================================================

pub fn recipe_type_from(system: MesSystem, token: &str) -> Option<RecipeType> {
    let key = normalize(token);
    let stripped = key.strip_suffix("recipe").unwrap_or(&key);
    let vendor = match system {
        MesSystem::PasX | MesSystem::Moda => match stripped {
            "mbr" => Some(RecipeType::Master),
            "ebr" => Some(RecipeType::Control),
            _ => None,
        },
        MesSystem::Syncade | MesSystem::PharmaSuite | MesSystem::Opcenter => match stripped {
            "batch" => Some(RecipeType::Control),
            _ => None,
        },
    };
    vendor.or_else(|| RecipeType::from_canonical(stripped))
}

pub fn recipe_type_token(system: MesSystem, recipe_type: RecipeType) -> &'static str {
    match system {
        MesSystem::PasX | MesSystem::PharmaSuite | MesSystem::Moda => match recipe_type {
            RecipeType::General => "General",
            RecipeType::Site => "Site",
            RecipeType::Master => "Master",
            RecipeType::Control => "Control",
        },
        MesSystem::Syncade | MesSystem::Opcenter => match recipe_type {
            RecipeType::General => "GeneralRecipe",
            RecipeType::Site => "SiteRecipe",
            RecipeType::Master => "MasterRecipe",
            RecipeType::Control => "ControlRecipe",
        },
    }
}

// ============================================================================
// PHASE TYPE
// ============================================================================

pub fn phase_type_from(system: MesSystem, token: &str) -> Option<PhaseType> {
    let key = normalize(token);
    let vendor = match system {
        MesSystem::PasX => match key.as_str() {
            "semiautomatic" | "semiauto" => Some(PhaseType::SemiAutomatic),
            _ => None,
        },
        MesSystem::Syncade => match key.as_str() {
            "automated" => Some(PhaseType::Automatic),
            "assisted" => Some(PhaseType::SemiAutomatic),
            _ => None,
        },
        MesSystem::PharmaSuite => match key.as_str() {
            "manualinstruction" => Some(PhaseType::Manual),
            "equipmentphase" => Some(PhaseType::Automatic),
            "guidedinstruction" => Some(PhaseType::SemiAutomatic),
            _ => None,
        },
        MesSystem::Opcenter => match key.as_str() {
            "guided" | "semiautomatic" => Some(PhaseType::SemiAutomatic),
            _ => None,
        },
        MesSystem::Moda => match key.as_str() {
            "hybrid" => Some(PhaseType::SemiAutomatic),
            _ => None,
        },
    };
    vendor.or_else(|| match key.as_str() {
        "manual" => Some(PhaseType::Manual),
        "automatic" => Some(PhaseType::Automatic),
        "semiautomatic" => Some(PhaseType::SemiAutomatic),
        _ => None,
    })
}

pub fn phase_type_token(system: MesSystem, phase_type: PhaseType) -> &'static str {
    match (system, phase_type) {
        (MesSystem::PasX, PhaseType::Manual) => "Manual",
        (MesSystem::PasX, PhaseType::Automatic) => "Automatic",
        (MesSystem::PasX, PhaseType::SemiAutomatic) => "SemiAutomatic",
        (MesSystem::Syncade, PhaseType::Manual) => "Manual",
        (MesSystem::Syncade, PhaseType::Automatic) => "Automated",
        (MesSystem::Syncade, PhaseType::SemiAutomatic) => "Assisted",
        (MesSystem::PharmaSuite, PhaseType::Manual) => "ManualInstruction",
        (MesSystem::PharmaSuite, PhaseType::Automatic) => "EquipmentPhase",
        (MesSystem::PharmaSuite, PhaseType::SemiAutomatic) => "GuidedInstruction",
        (MesSystem::Opcenter, PhaseType::Manual) => "Manual",
        (MesSystem::Opcenter, PhaseType::Automatic) => "Automatic",
        (MesSystem::Opcenter, PhaseType::SemiAutomatic) => "Guided",
        (MesSystem::Moda, PhaseType::Manual) => "Manual",
        (MesSystem::Moda, PhaseType::Automatic) => "Automatic",
        (MesSystem::Moda, PhaseType::SemiAutomatic) => "Hybrid",
    }
}

// ============================================================================
// SIGNATURE TYPE
// ============================================================================

pub fn signature_type_from(system: MesSystem, token: &str) -> Option<SignatureType> {
    let key = normalize(token);
    let vendor = match system {
        MesSystem::PasX => match key.as_str() {
            "execute" | "execution" => Some(SignatureType::Perform),
            "doublecheck" => Some(SignatureType::Verify),
            _ => None,
        },
        MesSystem::Syncade => match key.as_str() {
            "performedby" | "doneby" => Some(SignatureType::Perform),
            "checkedby" | "verifiedby" => Some(SignatureType::Verify),
            "approvedby" => Some(SignatureType::Approve),
            "reviewedby" => Some(SignatureType::Review),
            "witnessedby" => Some(SignatureType::Witness),
            _ => None,
        },
        MesSystem::PharmaSuite => match key.as_str() {
            "performer" | "done" => Some(SignatureType::Perform),
            "verifier" | "checked" => Some(SignatureType::Verify),
            "approver" => Some(SignatureType::Approve),
            "reviewer" => Some(SignatureType::Review),
            _ => None,
        },
        MesSystem::Opcenter => match key.as_str() {
            "execution" => Some(SignatureType::Perform),
            "verification" => Some(SignatureType::Verify),
            "approval" | "release" => Some(SignatureType::Approve),
            _ => None,
        },
        MesSystem::Moda => match key.as_str() {
            "performed" => Some(SignatureType::Perform),
            "verified" => Some(SignatureType::Verify),
            "approved" => Some(SignatureType::Approve),
            "reviewed" => Some(SignatureType::Review),
            "witnessed" => Some(SignatureType::Witness),
            _ => None,
        },
    };
    vendor.or_else(|| SignatureType::from_canonical(&key))
}

pub fn signature_type_token(system: MesSystem, signature_type: SignatureType) -> &'static str {
    match system {
        MesSystem::PasX => match signature_type {
            SignatureType::Perform => "Execute",
            SignatureType::Verify => "Verify",
            SignatureType::Approve => "Approve",
            SignatureType::Review => "Review",
            SignatureType::Witness => "Witness",
        },
        MesSystem::Syncade => match signature_type {
            SignatureType::Perform => "PerformedBy",
            SignatureType::Verify => "CheckedBy",
            SignatureType::Approve => "ApprovedBy",
            SignatureType::Review => "ReviewedBy",
            SignatureType::Witness => "WitnessedBy",
        },
        MesSystem::PharmaSuite => match signature_type {
            SignatureType::Perform => "Performer",
            SignatureType::Verify => "Verifier",
            SignatureType::Approve => "Approver",
            SignatureType::Review => "Reviewer",
            SignatureType::Witness => "Witness",
        },
        MesSystem::Opcenter => match signature_type {
            SignatureType::Perform => "Execution",
            SignatureType::Verify => "Verification",
            SignatureType::Approve => "Approval",
            SignatureType::Review => "Review",
            SignatureType::Witness => "Witness",
        },
        MesSystem::Moda => match signature_type {
            SignatureType::Perform => "Performed",
            SignatureType::Verify => "Verified",
            SignatureType::Approve => "Approved",
            SignatureType::Review => "Reviewed",
            SignatureType::Witness => "Witnessed",
        },
    }
}

// ============================================================================
// PARAMETER DATA TYPE
// ============================================================================

pub fn data_type_from(system: MesSystem, token: &str) -> Option<DataType> {
    let key = normalize(token);
    let vendor = match system {
        MesSystem::PasX => match key.as_str() {
            "text" => Some(DataType::String),
            "float" | "decimal" => Some(DataType::Real),
            "list" => Some(DataType::Enumeration),
            _ => None,
        },
        MesSystem::Syncade => match key.as_str() {
            "text" => Some(DataType::String),
            "enumerated" => Some(DataType::Enumeration),
            _ => None,
        },
        MesSystem::PharmaSuite => match key.as_str() {
            "double" | "float" | "decimal" => Some(DataType::Real),
            "int" | "long" => Some(DataType::Integer),
            "bool" => Some(DataType::Boolean),
            "date" => Some(DataType::Datetime),
            _ => None,
        },
        MesSystem::Opcenter => match key.as_str() {
            "float" => Some(DataType::Real),
            "timespan" => Some(DataType::Duration),
            _ => None,
        },
        MesSystem::Moda => match key.as_str() {
            "text" => Some(DataType::String),
            "number" => Some(DataType::Real),
            "checkbox" => Some(DataType::Boolean),
            "date" => Some(DataType::Datetime),
            "choice" => Some(DataType::Enumeration),
            _ => None,
        },
    };
    vendor.or_else(|| DataType::from_canonical(&key))
}

pub fn data_type_token(system: MesSystem, data_type: DataType) -> &'static str {
    match system {
        MesSystem::PasX => match data_type {
            DataType::String => "String",
            DataType::Integer => "Integer",
            DataType::Real => "Float",
            DataType::Boolean => "Boolean",
            DataType::Datetime => "DateTime",
            DataType::Duration => "Duration",
            DataType::Enumeration => "List",
        },
        MesSystem::Syncade => match data_type {
            DataType::String => "Text",
            DataType::Integer => "Integer",
            DataType::Real => "Real",
            DataType::Boolean => "Boolean",
            DataType::Datetime => "DateTime",
            DataType::Duration => "Duration",
            DataType::Enumeration => "Enumerated",
        },
        MesSystem::PharmaSuite => match data_type {
            DataType::String => "string",
            DataType::Integer => "integer",
            DataType::Real => "double",
            DataType::Boolean => "boolean",
            DataType::Datetime => "dateTime",
            DataType::Duration => "duration",
            DataType::Enumeration => "enumeration",
        },
        MesSystem::Opcenter => match data_type {
            DataType::String => "String",
            DataType::Integer => "Integer",
            DataType::Real => "Float",
            DataType::Boolean => "Boolean",
            DataType::Datetime => "DateTime",
            DataType::Duration => "TimeSpan",
            DataType::Enumeration => "Enumeration",
        },
        MesSystem::Moda => match data_type {
            DataType::String => "Text",
            DataType::Integer => "Integer",
            DataType::Real => "Number",
            DataType::Boolean => "Checkbox",
            DataType::Datetime => "Date",
            DataType::Duration => "Duration",
            DataType::Enumeration => "Choice",
        },
    }
}

// ============================================================================
// MATERIAL TYPE
// ============================================================================

pub fn material_type_from(system: MesSystem, token: &str) -> Option<MaterialType> {
    let key = normalize(token);
    let vendor = match system {
        MesSystem::PasX => match key.as_str() {
            "rawmaterial" => Some(MaterialType::Raw),
            "finishedgood" => Some(MaterialType::Finished),
            "packagingmaterial" => Some(MaterialType::Packaging),
            _ => None,
        },
        MesSystem::Syncade => match key.as_str() {
            "product" => Some(MaterialType::Finished),
            _ => None,
        },
        MesSystem::PharmaSuite => match key.as_str() {
            "consumed" => Some(MaterialType::Raw),
            "produced" => Some(MaterialType::Finished),
            _ => None,
        },
        MesSystem::Opcenter => match key.as_str() {
            "rawmaterial" => Some(MaterialType::Raw),
            "semifinished" => Some(MaterialType::Intermediate),
            "finishedproduct" => Some(MaterialType::Finished),
            "packagingmaterial" => Some(MaterialType::Packaging),
            _ => None,
        },
        MesSystem::Moda => None,
    };
    vendor.or_else(|| MaterialType::from_canonical(&key))
}

pub fn material_type_token(system: MesSystem, material_type: MaterialType) -> &'static str {
    match system {
        MesSystem::PasX => match material_type {
            MaterialType::Raw => "RawMaterial",
            MaterialType::Intermediate => "Intermediate",
            MaterialType::Finished => "FinishedGood",
            MaterialType::Packaging => "Packaging",
        },
        MesSystem::Syncade => match material_type {
            MaterialType::Raw => "Raw",
            MaterialType::Intermediate => "Intermediate",
            MaterialType::Finished => "Product",
            MaterialType::Packaging => "Packaging",
        },
        MesSystem::PharmaSuite => match material_type {
            MaterialType::Raw => "Consumed",
            MaterialType::Intermediate => "Intermediate",
            MaterialType::Finished => "Produced",
            MaterialType::Packaging => "Packaging",
        },
        MesSystem::Opcenter => match material_type {
            MaterialType::Raw => "RawMaterial",
            MaterialType::Intermediate => "SemiFinished",
            MaterialType::Finished => "FinishedProduct",
            MaterialType::Packaging => "PackagingMaterial",
        },
        MesSystem::Moda => match material_type {
            MaterialType::Raw => "Raw",
            MaterialType::Intermediate => "Intermediate",
            MaterialType::Finished => "Finished",
            MaterialType::Packaging => "Packaging",
        },
    }
}

// ============================================================================
// INTERFACE SYSTEM
// ============================================================================

pub fn interface_system_from(system: MesSystem, token: &str) -> Option<InterfaceSystem> {
    let key = normalize(token);
    let vendor = match system {
        MesSystem::PasX => match key.as_str() {
            "saperp" | "s4hana" => Some(InterfaceSystem::Sap),
            _ => None,
        },
        MesSystem::Syncade => match key.as_str() {
            "deltav" => Some(InterfaceSystem::Dcs),
            _ => None,
        },
        MesSystem::PharmaSuite => match key.as_str() {
            "factorytalk" | "factorytalkbatch" => Some(InterfaceSystem::Scada),
            _ => None,
        },
        MesSystem::Opcenter => match key.as_str() {
            "pcs7" | "simaticpcs7" => Some(InterfaceSystem::Dcs),
            "wincc" => Some(InterfaceSystem::Scada),
            _ => None,
        },
        MesSystem::Moda => match key.as_str() {
            "labware" | "labvantage" => Some(InterfaceSystem::Lims),
            "trackwise" => Some(InterfaceSystem::Qms),
            _ => None,
        },
    };
    vendor.or_else(|| {
        InterfaceSystem::ALL
            .iter()
            .copied()
            .find(|candidate| candidate.as_str().eq_ignore_ascii_case(&key))
    })
}

/// Interface systems are written with their canonical acronym in every dialect
pub fn interface_system_token(system: MesSystem, interface: InterfaceSystem) -> &'static str {
    match system {
        MesSystem::PasX
        | MesSystem::Syncade
        | MesSystem::PharmaSuite
        | MesSystem::Opcenter
        | MesSystem::Moda => interface.as_str(),
    }
}

// ============================================================================
// SHARED TABLES
// ============================================================================

pub fn direction_from(token: &str) -> Option<InterfaceDirection> {
    match normalize(token).as_str() {
        "input" | "in" | "read" | "inbound" => Some(InterfaceDirection::Input),
        "output" | "out" | "write" | "outbound" => Some(InterfaceDirection::Output),
        "bidirectional" | "both" | "inout" | "readwrite" => Some(InterfaceDirection::Bidirectional),
        _ => None,
    }
}

pub fn direction_token(direction: InterfaceDirection) -> &'static str {
    match direction {
        InterfaceDirection::Input => "Input",
        InterfaceDirection::Output => "Output",
        InterfaceDirection::Bidirectional => "Bidirectional",
    }
}

pub fn cleaning_level_from(token: &str) -> Option<CleaningLevel> {
    match normalize(token).as_str() {
        "minor" | "partial" | "light" => Some(CleaningLevel::Minor),
        "major" | "full" => Some(CleaningLevel::Major),
        "campaign" | "endofcampaign" => Some(CleaningLevel::Campaign),
        _ => None,
    }
}

pub fn cleaning_level_token(level: CleaningLevel) -> &'static str {
    match level {
        CleaningLevel::Minor => "Minor",
        CleaningLevel::Major => "Major",
        CleaningLevel::Campaign => "Campaign",
    }
}

pub fn duration_unit_from(token: &str) -> Option<DurationUnit> {
    match normalize(token).as_str() {
        "s" | "sec" | "secs" | "second" | "seconds" => Some(DurationUnit::Seconds),
        "m" | "min" | "mins" | "minute" | "minutes" => Some(DurationUnit::Minutes),
        "h" | "hr" | "hrs" | "hour" | "hours" => Some(DurationUnit::Hours),
        _ => None,
    }
}

pub fn transition_type_from(token: &str) -> Option<TransitionType> {
    match normalize(token).as_str() {
        "sequential" | "sequence" | "next" | "serial" => Some(TransitionType::Sequential),
        "parallel" | "and" | "split" => Some(TransitionType::Parallel),
        "selection" | "or" | "branch" | "alternative" => Some(TransitionType::Selection),
        "loop" | "repeat" => Some(TransitionType::Loop),
        _ => None,
    }
}

pub fn transition_type_token(transition_type: TransitionType) -> &'static str {
    match transition_type {
        TransitionType::Sequential => "Sequential",
        TransitionType::Parallel => "Parallel",
        TransitionType::Selection => "Selection",
        TransitionType::Loop => "Loop",
    }
}

/// Vendor booleans: true/yes/y/1/x/on
pub fn bool_from(token: &str) -> Option<bool> {
    match normalize(token).as_str() {
        "true" | "yes" | "y" | "1" | "x" | "on" => Some(true),
        "false" | "no" | "n" | "0" | "off" => Some(false),
        _ => None,
    }
}
