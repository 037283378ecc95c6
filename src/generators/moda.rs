//! Lonza MODA recipe generator
//!
//! Names and ordering live in attributes; optional sampling plans and a
//! limits table are derived from the recipe's bounded parameters.

use crate::converters::types::GeneratorOptions;
use crate::models::{
    Equipment, Material, Operation, Parameter, Phase, Procedure, Signature, UnitProcedure,
    ValidationReport,
};
use crate::systems::MesSystem;
use crate::vocabulary;
use crate::xml::markup::{self, leaf, leaf_opt, leaf_text, number, section, Tag};

use super::{base_validation, RecipeGenerator};

const SYSTEM: MesSystem = MesSystem::Moda;

pub struct ModaGenerator;

impl RecipeGenerator for ModaGenerator {
    fn system(&self) -> MesSystem {
        SYSTEM
    }

    /// Approvals are routed by role, so an unassigned one cannot be signed
    fn validate(&self, procedure: &Procedure, _options: &GeneratorOptions) -> ValidationReport {
        let mut report = base_validation(procedure);
        let unassigned = procedure
            .unit_procedures
            .iter()
            .flat_map(|up| up.signatures.iter())
            .chain(procedure.operations().flat_map(|op| op.signatures.iter()))
            .chain(procedure.phases().flat_map(|phase| phase.signatures.iter()))
            .filter(|signature| signature.role.trim().is_empty())
            .count();
        if unassigned > 0 {
            report.warning(format!("{} approval(s) have no role assigned", unassigned));
        }
        report
    }

    fn render(&self, procedure: &Procedure, options: &GeneratorOptions, version: &str, _warnings: &mut Vec<String>) -> String {
        let root = Tag::new("MODARecipe")
            .attr("xmlns", self.info().namespace)
            .attr("version", version)
            .attr_opt("site", options.vendor.site_id.as_deref());

        let mut body = definition(procedure);
        if let Some(formula) = procedure.formula.as_ref().filter(|formula| !formula.is_empty()) {
            let mut inner: String = formula.materials.iter().map(material).collect();
            inner.push_str(&fields(&formula.parameters));
            body.push_str(&Tag::new("Formula").wrap(&inner));
        }
        body.push_str(&section("Resources", &resources(&procedure.equipment_requirements)));

        let stages: String = procedure
            .unit_procedures
            .iter()
            .map(|up| stage(up, options))
            .collect();
        body.push_str(&Tag::new("Workflow").wrap(&stages));

        if options.vendor.include_sampling_plans {
            body.push_str(&sampling_plans(procedure));
            body.push_str(&limits_configuration(procedure));
        }
        root.wrap(&body)
    }
}

fn definition(procedure: &Procedure) -> String {
    let mut inner = leaf_opt("Description", procedure.description.as_deref());
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
    inner.push_str(&leaf("Modified", procedure.modified.to_rfc3339()));

    Tag::new("RecipeDefinition")
        .attr("code", &procedure.id)
        .attr("name", &procedure.name)
        .attr("revision", &procedure.version)
        .attr("status", vocabulary::status_token(SYSTEM, procedure.status))
        .attr("category", vocabulary::recipe_type_token(SYSTEM, procedure.recipe_type))
        .attr_opt("productCode", procedure.product_code.as_deref())
        .attr_opt("productName", procedure.product_name.as_deref())
        .attr_opt("author", procedure.author.as_deref())
        .wrap(&inner)
}

fn stage(up: &UnitProcedure, options: &GeneratorOptions) -> String {
    let mut inner = String::new();
    if options.include_comments {
        inner.push_str(&markup::comment(&format!("Unit procedure {}: {}", up.sequence, up.name)));
    }
    inner.push_str(&leaf_opt("Description", up.description.as_deref()));
    inner.push_str(&resources(&up.equipment));
    inner.push_str(&fields(&up.parameters));
    inner.push_str(&approvals(&up.signatures));
    if let Some(staffing) = up.resource_requirements.as_ref().filter(|r| !r.is_empty()) {
        inner.push_str(
            &Tag::new("Staffing")
                .attr_opt("personnel", staffing.personnel)
                .attr_opt("roomClass", staffing.room_class.as_deref())
                .empty(),
        );
    }
    for op in &up.operations {
        inner.push_str(&task(op));
    }
    Tag::new("Stage")
        .attr("id", &up.id)
        .attr("order", up.sequence)
        .attr("name", &up.name)
        .wrap(&inner)
}

fn task(op: &Operation) -> String {
    let mut inner = leaf_opt("Description", op.description.as_deref());
    inner.push_str(&approvals(&op.signatures));
    for phase in &op.phases {
        inner.push_str(&activity(phase));
    }

    let mut tag = Tag::new("Task")
        .attr("id", &op.id)
        .attr("order", op.sequence)
        .attr("name", &op.name);
    if op.is_cleaning {
        tag = tag.attr("cleaning", "true");
    }
    tag.attr_opt("cleaningLevel", op.cleaning_level.map(vocabulary::cleaning_level_token))
        .wrap(&inner)
}

fn activity(phase: &Phase) -> String {
    let mut inner = leaf_opt("Description", phase.description.as_deref());
    inner.push_str(&leaf_text("Instructions", &phase.instructions));
    if let Some(duration) = &phase.duration {
        inner.push_str(
            &Tag::new("EstimatedDuration")
                .attr("value", number(duration.value))
                .attr("unit", duration.unit)
                .empty(),
        );
    }
    inner.push_str(&fields(&phase.parameters));
    for item in &phase.materials {
        inner.push_str(&material(item));
    }
    inner.push_str(&approvals(&phase.signatures));
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
            &Tag::new("Integration")
                .attr("system", vocabulary::interface_system_token(SYSTEM, point.system))
                .attr("direction", vocabulary::direction_token(point.direction))
                .wrap(&maps),
        );
    }
    Tag::new("Activity")
        .attr("id", &phase.id)
        .attr("order", phase.sequence)
        .attr("name", &phase.name)
        .attr("kind", vocabulary::phase_type_token(SYSTEM, phase.phase_type))
        .wrap(&inner)
}

fn fields(parameters: &[Parameter]) -> String {
    parameters
        .iter()
        .map(|parameter| {
            let mut inner = leaf_opt("Value", parameter.value.as_deref());
            inner.push_str(&leaf_opt("Default", parameter.default_value.as_deref()));
            Tag::new("Field")
                .attr("name", &parameter.name)
                .attr("type", vocabulary::data_type_token(SYSTEM, parameter.data_type))
                .attr_opt("unit", parameter.unit.as_deref())
                .attr_opt("min", parameter.min.map(number))
                .attr_opt("max", parameter.max.map(number))
                .attr("required", parameter.required)
                .wrap(&inner)
        })
        .collect()
}

fn material(material: &Material) -> String {
    Tag::new("MaterialUsage")
        .attr("code", &material.code)
        .attr("name", &material.name)
        .attr("type", vocabulary::material_type_token(SYSTEM, material.material_type))
        .attr("quantity", number(material.quantity))
        .attr("unit", &material.unit)
        .attr("scalable", material.scalable)
        .attr_opt("tolerance", material.tolerance.map(number))
        .empty()
}

fn resources(equipment: &[Equipment]) -> String {
    equipment
        .iter()
        .map(|item| {
            let capabilities: String = item
                .capabilities
                .iter()
                .map(|capability| leaf("Capability", capability))
                .collect();
            Tag::new("Resource")
                .attr("code", &item.code)
                .attr("type", &item.equipment_type)
                .attr("name", &item.name)
                .wrap(&capabilities)
        })
        .collect()
}

fn approvals(signatures: &[Signature]) -> String {
    signatures
        .iter()
        .map(|signature| {
            let mut inner = leaf_opt("Meaning", signature.meaning.as_deref());
            inner.push_str(&leaf_opt("TimeLimit", signature.time_limit_minutes));
            Tag::new("Approval")
                .attr("type", vocabulary::signature_type_token(SYSTEM, signature.signature_type))
                .attr("order", signature.order)
                .attr("required", signature.required)
                .attr("role", &signature.role)
                .wrap(&inner)
        })
        .collect()
}

/// Every parameter with a numeric bound, wherever it is declared
fn bounded_parameters(procedure: &Procedure) -> impl Iterator<Item = &Parameter> {
    procedure
        .formula
        .iter()
        .flat_map(|formula| formula.parameters.iter())
        .chain(procedure.unit_procedures.iter().flat_map(|up| up.parameters.iter()))
        .chain(procedure.phases().flat_map(|phase| phase.parameters.iter()))
        .filter(|parameter| parameter.min.is_some() || parameter.max.is_some())
}

/// One in-process sample per activity that records a bounded value
fn sampling_plans(procedure: &Procedure) -> String {
    let plans: String = procedure
        .phases()
        .filter(|phase| phase.parameters.iter().any(|p| p.min.is_some() || p.max.is_some()))
        .enumerate()
        .map(|(index, phase)| {
            Tag::new("Plan")
                .attr("id", format!("SP-{}", index + 1))
                .attr("activity", &phase.id)
                .attr("frequency", "per-batch")
                .empty()
        })
        .collect();
    section("SamplingPlans", &plans)
}

fn limits_configuration(procedure: &Procedure) -> String {
    let limits: String = bounded_parameters(procedure)
        .map(|parameter| {
            Tag::new("Limit")
                .attr("field", &parameter.name)
                .attr_opt("lower", parameter.min.map(number))
                .attr_opt("upper", parameter.max.map(number))
                .attr_opt("unit", parameter.unit.as_deref())
                .empty()
        })
        .collect();
    section("LimitsConfiguration", &limits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::tests::sample_procedure;
    use crate::models::{DataType, SignatureType};

    #[test]
    fn test_names_are_attributes() {
        let output = ModaGenerator
            .generate(&sample_procedure(), &GeneratorOptions::default())
            .unwrap();
        assert!(output.content.contains(r#"name="Granulation &amp; Drying""#));
        assert!(output.content.contains(r#"<Activity id="#));
        assert!(output.content.contains(r#"name="Weigh Material""#));
    }

    #[test]
    fn test_unassigned_approval_warns() {
        let mut procedure = sample_procedure();
        procedure.unit_procedures[0].operations[0]
            .signatures
            .push(Signature::new(SignatureType::Approve, "  ", 1));
        let report = ModaGenerator.validate(&procedure, &GeneratorOptions::default());
        assert!(report.valid);
        assert_eq!(report.warnings, vec!["1 approval(s) have no role assigned".to_string()]);
    }

    #[test]
    fn test_sampling_plans_follow_bounded_fields() {
        let mut procedure = sample_procedure();
        let mut ph = Parameter::new("pH", DataType::Real);
        ph.min = Some(6.8);
        ph.max = Some(7.4);
        procedure.unit_procedures[0].operations[0].phases[0].parameters.push(ph);
        procedure.unit_procedures[0].operations[0].phases[0]
            .parameters
            .push(Parameter::new("Operator note", DataType::String));

        let mut options = GeneratorOptions::default();
        options.vendor.include_sampling_plans = true;
        let output = ModaGenerator.generate(&procedure, &options).unwrap();
        assert_eq!(output.content.matches("<Plan ").count(), 1);
        assert_eq!(output.content.matches("<Limit ").count(), 1);
        assert!(output.content.contains(r#"lower="6.8" upper="7.4""#));
    }
}
