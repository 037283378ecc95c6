//! Siemens Opcenter Execution Pharma recipe generator

use crate::converters::types::{GeneratorOptions, VendorOptions};
use crate::models::{
    Equipment, Material, Operation, Parameter, Phase, Procedure, Signature, UnitProcedure,
    ValidationReport,
};
use crate::systems::MesSystem;
use crate::vocabulary;
use crate::xml::markup::{self, leaf, leaf_opt, leaf_text, number, section, Tag};

use super::{base_validation, check_transition_endpoints, execution_edges, RecipeGenerator};

const SYSTEM: MesSystem = MesSystem::Opcenter;

pub struct OpcenterGenerator;

impl RecipeGenerator for OpcenterGenerator {
    fn system(&self) -> MesSystem {
        SYSTEM
    }

    fn validate(&self, procedure: &Procedure, _options: &GeneratorOptions) -> ValidationReport {
        let mut report = base_validation(procedure);
        check_transition_endpoints(procedure, &mut report);
        if procedure.product_code.is_none() {
            report.warning("Opcenter master recipes should reference a material number");
        }
        report
    }

    fn render(&self, procedure: &Procedure, options: &GeneratorOptions, version: &str, _warnings: &mut Vec<String>) -> String {
        let vendor = &options.vendor;
        let root = Tag::new("OpcenterRecipe")
            .attr("xmlns", self.info().namespace)
            .attr("version", version)
            .attr_opt("plant", vendor.plant_id.as_deref());

        let mut body = identification(procedure);
        if let Some(formula) = &procedure.formula {
            body.push_str(&section(
                "BillOfMaterials",
                &formula.materials.iter().map(material).collect::<String>(),
            ));
            body.push_str(&section("RecipeParameters", &parameters(&formula.parameters)));
        }
        body.push_str(&section("EquipmentRequirements", &equipment(&procedure.equipment_requirements)));

        let stages: String = procedure
            .unit_procedures
            .iter()
            .map(|up| stage(up, options))
            .collect();
        body.push_str(&Tag::new("ProcessDefinition").wrap(&stages));

        let transitions: String = execution_edges(procedure)
            .iter()
            .map(|transition| {
                Tag::new("Transition")
                    .attr("id", &transition.id)
                    .attr("kind", vocabulary::transition_type_token(transition.transition_type))
                    .attr("from", &transition.source_id)
                    .attr("to", &transition.target_id)
                    .attr_opt("condition", transition.condition.as_deref())
                    .empty()
            })
            .collect();
        body.push_str(&section("StepSequence", &transitions));

        if vendor.include_electronic_batch_record {
            body.push_str(&electronic_batch_record(procedure));
        }
        if vendor.include_compliance {
            body.push_str(&compliance_settings(vendor));
        }
        root.wrap(&body)
    }
}

fn identification(procedure: &Procedure) -> String {
    let mut inner = String::new();
    inner.push_str(&leaf("MasterRecipeId", &procedure.id));
    inner.push_str(&leaf("Name", &procedure.name));
    inner.push_str(&leaf("Revision", &procedure.version));
    inner.push_str(&leaf("LifecycleState", vocabulary::status_token(SYSTEM, procedure.status)));
    inner.push_str(&leaf("RecipeCategory", vocabulary::recipe_type_token(SYSTEM, procedure.recipe_type)));
    if procedure.product_code.is_some() || procedure.product_name.is_some() {
        inner.push_str(
            &Tag::new("Material")
                .attr_opt("number", procedure.product_code.as_deref())
                .attr_opt("description", procedure.product_name.as_deref())
                .empty(),
        );
    }
    inner.push_str(&leaf_opt("Owner", procedure.author.as_deref()));
    inner.push_str(&leaf_opt("Description", procedure.description.as_deref()));
    if let Some(batch) = &procedure.batch_size {
        inner.push_str(
            &Tag::new("BatchQuantity")
                .attr_opt("min", batch.min.map(number))
                .attr_opt("max", batch.max.map(number))
                .attr_opt("nominal", batch.nominal.map(number))
                .attr("uom", &batch.unit)
                .empty(),
        );
    }
    inner.push_str(&leaf("CreationDate", procedure.created.to_rfc3339()));
    inner.push_str(&leaf("ChangeDate", procedure.modified.to_rfc3339()));
    Tag::new("RecipeIdentification").wrap(&inner)
}

fn stage(up: &UnitProcedure, options: &GeneratorOptions) -> String {
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
            &Tag::new("Staffing")
                .attr_opt("personnel", resources.personnel)
                .attr_opt("roomClass", resources.room_class.as_deref())
                .empty(),
        );
    }
    for op in &up.operations {
        inner.push_str(&operation(op));
    }
    Tag::new("ProcessStage")
        .attr("id", &up.id)
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

    let mut tag = Tag::new("ProcessOperation").attr("id", &op.id).attr("sequence", op.sequence);
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
            &Tag::new("PlannedDuration")
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
        let mappings: String = point
            .data_mappings
            .iter()
            .map(|mapping| {
                Tag::new("FieldMapping")
                    .attr("source", &mapping.source)
                    .attr("target", &mapping.target)
                    .attr_opt("transform", mapping.transform.as_deref())
                    .empty()
            })
            .collect();
        inner.push_str(
            &Tag::new("Integration")
                .attr("system", vocabulary::interface_system_token(SYSTEM, point.system))
                .attr("direction", vocabulary::direction_token(point.direction))
                .wrap(&mappings),
        );
    }
    Tag::new("ProcessStep")
        .attr("id", &phase.id)
        .attr("sequence", phase.sequence)
        .attr("executionMode", vocabulary::phase_type_token(SYSTEM, phase.phase_type))
        .wrap(&inner)
}

fn parameters(parameters: &[Parameter]) -> String {
    parameters
        .iter()
        .map(|parameter| {
            let mut inner = leaf_opt("Setpoint", parameter.value.as_deref());
            inner.push_str(&leaf_opt("DefaultValue", parameter.default_value.as_deref()));
            Tag::new("ProcessParameter")
                .attr("name", &parameter.name)
                .attr("dataType", vocabulary::data_type_token(SYSTEM, parameter.data_type))
                .attr_opt("uom", parameter.unit.as_deref())
                .attr("required", parameter.required)
                .attr_opt("lowLimit", parameter.min.map(number))
                .attr_opt("highLimit", parameter.max.map(number))
                .wrap(&inner)
        })
        .collect()
}

fn material(material: &Material) -> String {
    Tag::new("MaterialConsumption")
        .attr("materialNumber", &material.code)
        .attr("type", vocabulary::material_type_token(SYSTEM, material.material_type))
        .attr("quantity", number(material.quantity))
        .attr("uom", &material.unit)
        .attr("scalable", material.scalable)
        .attr_opt("tolerance", material.tolerance.map(number))
        .wrap(&leaf("Description", &material.name))
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
                .attr("id", &item.code)
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
            Tag::new("ElectronicSignature")
                .attr("purpose", vocabulary::signature_type_token(SYSTEM, signature.signature_type))
                .attr("sequence", signature.order)
                .attr("required", signature.required)
                .wrap(&inner)
        })
        .collect()
}

/// One record point per phase that collects a sign-off
fn electronic_batch_record(procedure: &Procedure) -> String {
    let points: String = procedure
        .phases()
        .filter(|phase| !phase.signatures.is_empty())
        .map(|phase| {
            Tag::new("RecordPoint")
                .attr("step", &phase.id)
                .attr("signatures", phase.signatures.len())
                .empty()
        })
        .collect();
    Tag::new("ElectronicBatchRecord")
        .attr("reviewByException", true)
        .wrap(&points)
}

fn compliance_settings(vendor: &VendorOptions) -> String {
    let mut inner = Tag::new("Regulation").attr("name", "part11").empty();
    inner.push_str(&Tag::new("Regulation").attr("name", "annex11").empty());
    Tag::new("ComplianceSettings")
        .attr_opt("site", vendor.site_id.as_deref())
        .wrap(&inner)
}
