//! Emerson Syncade recipe generator

use crate::converters::types::{GeneratorOptions, VendorOptions};
use crate::models::{
    Equipment, Material, Operation, Parameter, Phase, Procedure, Signature, UnitProcedure,
    ValidationReport,
};
use crate::systems::MesSystem;
use crate::vocabulary;
use crate::xml::markup::{self, leaf, leaf_opt, leaf_text, number, section, Tag};

use super::{base_validation, check_transition_endpoints, execution_edges, RecipeGenerator};

pub struct SyncadeGenerator;

impl RecipeGenerator for SyncadeGenerator {
    fn system(&self) -> MesSystem {
        MesSystem::Syncade
    }

    /// Syncade stores execution order as edges, so they must resolve
    fn validate(&self, procedure: &Procedure, _options: &GeneratorOptions) -> ValidationReport {
        let mut report = base_validation(procedure);
        check_transition_endpoints(procedure, &mut report);
        report
    }

    fn render(&self, procedure: &Procedure, options: &GeneratorOptions, version: &str, _warnings: &mut Vec<String>) -> String {
        let vendor = &options.vendor;
        let root = Tag::new("SyncadeRecipe")
            .attr("xmlns", self.info().namespace)
            .attr("version", version);

        let mut body = header(procedure);
        if let Some(formula) = procedure.formula.as_ref().filter(|formula| !formula.is_empty()) {
            let mut inner: String = formula.materials.iter().map(material).collect();
            inner.push_str(&parameters(&formula.parameters));
            body.push_str(&Tag::new("Formula").wrap(&inner));
        }
        body.push_str(&section("EquipmentRequirements", &equipment(&procedure.equipment_requirements)));

        let segments: String = procedure
            .unit_procedures
            .iter()
            .map(|up| unit_procedure(up, options))
            .collect();
        body.push_str(&Tag::new("Procedure").wrap(&segments));

        let transitions: String = execution_edges(procedure)
            .iter()
            .map(|transition| {
                Tag::new("Transition")
                    .attr("id", &transition.id)
                    .attr("type", vocabulary::transition_type_token(transition.transition_type))
                    .attr("from", &transition.source_id)
                    .attr("to", &transition.target_id)
                    .attr_opt("condition", transition.condition.as_deref())
                    .empty()
            })
            .collect();
        body.push_str(&section("Transitions", &transitions));

        if vendor.include_workflow_settings {
            body.push_str(&workflow_settings(procedure, vendor));
        }
        if vendor.include_audit_trail {
            body.push_str(
                &Tag::new("AuditTrailConfig")
                    .attr("level", "full")
                    .attr("reasonForChange", "required")
                    .empty(),
            );
        }
        root.wrap(&body)
    }
}

fn header(procedure: &Procedure) -> String {
    let mut inner = String::new();
    inner.push_str(&leaf("Identifier", &procedure.id));
    inner.push_str(&leaf("Name", &procedure.name));
    inner.push_str(&leaf("Revision", &procedure.version));
    inner.push_str(&leaf("State", vocabulary::status_token(MesSystem::Syncade, procedure.status)));
    inner.push_str(&leaf(
        "Classification",
        vocabulary::recipe_type_token(MesSystem::Syncade, procedure.recipe_type),
    ));
    if procedure.product_code.is_some() || procedure.product_name.is_some() {
        inner.push_str(
            &Tag::new("Product")
                .attr_opt("code", procedure.product_code.as_deref())
                .attr_opt("name", procedure.product_name.as_deref())
                .empty(),
        );
    }
    inner.push_str(&leaf_opt("Originator", procedure.author.as_deref()));
    inner.push_str(&leaf_opt("Description", procedure.description.as_deref()));
    if let Some(batch) = &procedure.batch_size {
        inner.push_str(
            &Tag::new("BatchSize")
                .attr_opt("min", batch.min.map(number))
                .attr_opt("max", batch.max.map(number))
                .attr_opt("nominal", batch.nominal.map(number))
                .attr("unit", &batch.unit)
                .empty(),
        );
    }
    inner.push_str(&leaf("Created", procedure.created.to_rfc3339()));
    inner.push_str(&leaf("LastModified", procedure.modified.to_rfc3339()));
    Tag::new("Header").wrap(&inner)
}

fn unit_procedure(up: &UnitProcedure, options: &GeneratorOptions) -> String {
    let mut inner = String::new();
    if options.include_comments {
        inner.push_str(&markup::comment(&format!("Unit procedure {}: {}", up.sequence, up.name)));
    }
    inner.push_str(&leaf("Name", &up.name));
    inner.push_str(&leaf_opt("Description", up.description.as_deref()));
    inner.push_str(&equipment(&up.equipment));
    inner.push_str(&parameters(&up.parameters));
    inner.push_str(&signatures(&up.signatures));
    if let Some(resources) = up.resource_requirements.as_ref().filter(|r| !r.is_empty()) {
        inner.push_str(
            &Tag::new("Resources")
                .attr_opt("personnel", resources.personnel)
                .attr_opt("roomClass", resources.room_class.as_deref())
                .empty(),
        );
    }
    for op in &up.operations {
        inner.push_str(&operation(op));
    }

    Tag::new("Segment")
        .attr("id", &up.id)
        .attr("type", "UnitProcedure")
        .attr("sequence", up.sequence)
        .wrap(&inner)
}

fn operation(op: &Operation) -> String {
    let mut inner = String::new();
    inner.push_str(&leaf("Name", &op.name));
    inner.push_str(&leaf_opt("Description", op.description.as_deref()));
    inner.push_str(&signatures(&op.signatures));
    for phase in &op.phases {
        inner.push_str(&step(phase));
    }

    let mut tag = Tag::new("Segment")
        .attr("id", &op.id)
        .attr("type", "Operation")
        .attr("sequence", op.sequence);
    if op.is_cleaning {
        tag = tag.attr("cleaning", "true");
    }
    tag.attr_opt("cleaningLevel", op.cleaning_level.map(vocabulary::cleaning_level_token))
        .wrap(&inner)
}

fn step(phase: &Phase) -> String {
    let mut inner = String::new();
    inner.push_str(&leaf("Name", &phase.name));
    inner.push_str(&leaf_opt("Description", phase.description.as_deref()));
    inner.push_str(&leaf_text("WorkInstruction", &phase.instructions));
    if let Some(duration) = &phase.duration {
        inner.push_str(
            &Tag::new("Duration")
                .attr("value", number(duration.value))
                .attr("unit", duration.unit)
                .empty(),
        );
    }
    inner.push_str(&parameters(&phase.parameters));
    for item in &phase.materials {
        inner.push_str(&material(item));
    }
    inner.push_str(&signatures(&phase.signatures));
    for point in &phase.interface_points {
        let maps: String = point
            .data_mappings
            .iter()
            .map(|mapping| {
                Tag::new("Map")
                    .attr("source", &mapping.source)
                    .attr("target", &mapping.target)
                    .attr_opt("transform", mapping.transform.as_deref())
                    .empty()
            })
            .collect();
        inner.push_str(
            &Tag::new("DataExchange")
                .attr("system", vocabulary::interface_system_token(MesSystem::Syncade, point.system))
                .attr("direction", vocabulary::direction_token(point.direction))
                .wrap(&maps),
        );
    }

    Tag::new("Step")
        .attr("id", &phase.id)
        .attr("sequence", phase.sequence)
        .attr("mode", vocabulary::phase_type_token(MesSystem::Syncade, phase.phase_type))
        .wrap(&inner)
}

fn parameters(parameters: &[Parameter]) -> String {
    parameters
        .iter()
        .map(|parameter| {
            let mut inner = String::new();
            inner.push_str(&leaf_opt("Value", parameter.value.as_deref()));
            inner.push_str(&leaf_opt("Default", parameter.default_value.as_deref()));
            inner.push_str(&leaf_opt("Unit", parameter.unit.as_deref()));
            inner.push_str(&leaf_opt("Min", parameter.min.map(number)));
            inner.push_str(&leaf_opt("Max", parameter.max.map(number)));
            Tag::new("Parameter")
                .attr("name", &parameter.name)
                .attr("dataType", vocabulary::data_type_token(MesSystem::Syncade, parameter.data_type))
                .attr("required", parameter.required)
                .wrap(&inner)
        })
        .collect()
}

fn material(material: &Material) -> String {
    let mut inner = leaf("Name", &material.name);
    inner.push_str(&Tag::new("Quantity").attr("unit", &material.unit).text(&number(material.quantity)));
    Tag::new("MaterialRequirement")
        .attr("code", &material.code)
        .attr("type", vocabulary::material_type_token(MesSystem::Syncade, material.material_type))
        .attr("scalable", material.scalable)
        .attr_opt("tolerance", material.tolerance.map(number))
        .wrap(&inner)
}

fn equipment(equipment: &[Equipment]) -> String {
    equipment
        .iter()
        .map(|item| {
            let mut inner = leaf("Name", &item.name);
            for capability in &item.capabilities {
                inner.push_str(&leaf("Capability", capability));
            }
            Tag::new("Equipment")
                .attr("code", &item.code)
                .attr("type", &item.equipment_type)
                .wrap(&inner)
        })
        .collect()
}

fn signatures(signatures: &[Signature]) -> String {
    signatures
        .iter()
        .map(|signature| {
            let mut inner = leaf("Role", &signature.role);
            inner.push_str(&leaf_opt("Meaning", signature.meaning.as_deref()));
            inner.push_str(&leaf_opt("TimeLimit", signature.time_limit_minutes));
            Tag::new("ESignature")
                .attr("type", vocabulary::signature_type_token(MesSystem::Syncade, signature.signature_type))
                .attr("order", signature.order)
                .attr("required", signature.required)
                .wrap(&inner)
        })
        .collect()
}

/// Review and signature enforcement derived from the recipe's sign-offs
fn workflow_settings(procedure: &Procedure, vendor: &VendorOptions) -> String {
    let multi_signer = procedure
        .phases()
        .any(|phase| phase.signatures.len() > 1);
    let mut inner = Tag::new("SignatureEnforcement")
        .attr("distinctSigners", multi_signer)
        .empty();
    inner.push_str(&Tag::new("ReviewByException").attr("enabled", true).empty());
    Tag::new("WorkflowSettings")
        .attr_opt("facility", vendor.facility_id.as_deref())
        .attr_opt("area", vendor.area_id.as_deref())
        .wrap(&inner)
}
