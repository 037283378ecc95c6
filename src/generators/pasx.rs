//! Körber PAS-X master batch record generator

use crate::converters::types::{GeneratorOptions, VendorOptions};
use crate::models::{
    Equipment, InterfacePoint, Material, Operation, Parameter, Phase, Procedure, Signature,
    UnitProcedure, ValidationReport,
};
use crate::systems::MesSystem;
use crate::vocabulary;
use crate::xml::markup::{self, leaf, leaf_opt, leaf_text, number, section, Tag};

use super::{base_validation, RecipeGenerator};

pub struct PasXGenerator;

impl RecipeGenerator for PasXGenerator {
    fn system(&self) -> MesSystem {
        MesSystem::PasX
    }

    fn validate(&self, procedure: &Procedure, _options: &GeneratorOptions) -> ValidationReport {
        let mut report = base_validation(procedure);
        if procedure.version.trim().is_empty() {
            report.error("PAS-X master recipes require a version");
        }
        for op in procedure.operations() {
            if op.phases.is_empty() {
                report.warning(format!("Operation '{}' has no phases and cannot be released in PAS-X", op.name));
            }
        }
        report
    }

    fn render(&self, procedure: &Procedure, options: &GeneratorOptions, version: &str, _warnings: &mut Vec<String>) -> String {
        let vendor = &options.vendor;
        let root = Tag::new("MasterRecipe")
            .attr("xmlns", self.info().namespace)
            .attr("version", version)
            .attr_opt("plantId", vendor.plant_id.as_deref())
            .attr_opt("siteId", vendor.site_id.as_deref());

        let mut body = header(procedure);
        if let Some(formula) = &procedure.formula {
            body.push_str(&section(
                "BillOfMaterials",
                &formula.materials.iter().map(material).collect::<String>(),
            ));
            body.push_str(&parameters(&formula.parameters));
        }
        body.push_str(&equipment(&procedure.equipment_requirements));

        let unit_procedures: String = procedure
            .unit_procedures
            .iter()
            .map(|up| unit_procedure(up, options))
            .collect();
        body.push_str(&Tag::new("UnitProcedures").wrap(&unit_procedures));

        if vendor.include_cleaning_management {
            body.push_str(&cleaning_management(procedure));
        }
        if vendor.include_genealogy {
            body.push_str(&genealogy(procedure));
        }
        root.wrap(&body)
    }
}

fn header(procedure: &Procedure) -> String {
    let mut inner = String::new();
    inner.push_str(&leaf("RecipeId", &procedure.id));
    inner.push_str(&leaf("RecipeName", &procedure.name));
    inner.push_str(&leaf("RecipeVersion", &procedure.version));
    inner.push_str(&leaf("Status", vocabulary::status_token(MesSystem::PasX, procedure.status)));
    inner.push_str(&leaf(
        "RecipeType",
        vocabulary::recipe_type_token(MesSystem::PasX, procedure.recipe_type),
    ));
    inner.push_str(&leaf_opt("ProductCode", procedure.product_code.as_deref()));
    inner.push_str(&leaf_opt("ProductName", procedure.product_name.as_deref()));
    inner.push_str(&leaf_opt("Author", procedure.author.as_deref()));
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
    inner.push_str(&leaf("CreatedDate", procedure.created.to_rfc3339()));
    inner.push_str(&leaf("ModifiedDate", procedure.modified.to_rfc3339()));
    Tag::new("RecipeHeader").wrap(&inner)
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
            &Tag::new("ResourceRequirements")
                .attr_opt("personnel", resources.personnel)
                .attr_opt("roomClass", resources.room_class.as_deref())
                .empty(),
        );
    }
    let operations: String = up.operations.iter().map(|op| operation(op, &options.vendor)).collect();
    inner.push_str(&Tag::new("Operations").wrap(&operations));

    Tag::new("UnitProcedure")
        .attr("id", &up.id)
        .attr("sequence", up.sequence)
        .wrap(&inner)
}

fn operation(op: &Operation, vendor: &VendorOptions) -> String {
    let mut inner = String::new();
    inner.push_str(&leaf("Name", &op.name));
    inner.push_str(&leaf_opt("Description", op.description.as_deref()));
    inner.push_str(&signatures(&op.signatures));
    let phases: String = op.phases.iter().map(|phase| self::phase(phase, vendor)).collect();
    inner.push_str(&Tag::new("Phases").wrap(&phases));

    let mut tag = Tag::new("Operation").attr("id", &op.id).attr("sequence", op.sequence);
    if op.is_cleaning {
        tag = tag.attr("cleaning", "true");
    }
    tag.attr_opt("cleaningLevel", op.cleaning_level.map(vocabulary::cleaning_level_token))
        .wrap(&inner)
}

fn phase(phase: &Phase, vendor: &VendorOptions) -> String {
    let mut inner = String::new();
    inner.push_str(&leaf("Name", &phase.name));
    inner.push_str(&leaf_opt("Description", phase.description.as_deref()));
    inner.push_str(&leaf_text("Instructions", &phase.instructions));
    if let Some(duration) = &phase.duration {
        inner.push_str(
            &Tag::new("Duration")
                .attr("value", number(duration.value))
                .attr("unit", duration.unit)
                .empty(),
        );
    }
    inner.push_str(&parameters(&phase.parameters));
    inner.push_str(&section(
        "MaterialInputs",
        &phase.materials.iter().map(material).collect::<String>(),
    ));
    inner.push_str(&signatures(&phase.signatures));
    inner.push_str(&section(
        "Interfaces",
        &phase.interface_points.iter().map(interface).collect::<String>(),
    ));
    if vendor.include_ewi {
        inner.push_str(&electronic_work_instruction(phase));
    }

    Tag::new("Phase")
        .attr("id", &phase.id)
        .attr("sequence", phase.sequence)
        .attr("type", vocabulary::phase_type_token(MesSystem::PasX, phase.phase_type))
        .wrap(&inner)
}

fn parameters(parameters: &[Parameter]) -> String {
    let items: String = parameters
        .iter()
        .map(|parameter| {
            let mut inner = String::new();
            inner.push_str(&leaf_opt("Value", parameter.value.as_deref()));
            inner.push_str(&leaf_opt("DefaultValue", parameter.default_value.as_deref()));
            inner.push_str(&leaf_opt("Unit", parameter.unit.as_deref()));
            inner.push_str(&leaf_opt("MinValue", parameter.min.map(number)));
            inner.push_str(&leaf_opt("MaxValue", parameter.max.map(number)));
            Tag::new("ProcessParameter")
                .attr("name", &parameter.name)
                .attr("dataType", vocabulary::data_type_token(MesSystem::PasX, parameter.data_type))
                .attr("required", parameter.required)
                .wrap(&inner)
        })
        .collect();
    section("ProcessParameters", &items)
}

fn material(material: &Material) -> String {
    let mut inner = leaf("Name", &material.name);
    inner.push_str(&Tag::new("Quantity").attr("unit", &material.unit).text(&number(material.quantity)));
    Tag::new("MaterialItem")
        .attr("code", &material.code)
        .attr("type", vocabulary::material_type_token(MesSystem::PasX, material.material_type))
        .attr("scalable", material.scalable)
        .attr_opt("tolerance", material.tolerance.map(number))
        .wrap(&inner)
}

fn equipment(equipment: &[Equipment]) -> String {
    let items: String = equipment
        .iter()
        .map(|item| {
            let mut inner = leaf("Name", &item.name);
            for capability in &item.capabilities {
                inner.push_str(&leaf("Capability", capability));
            }
            Tag::new("EquipmentClass")
                .attr("code", &item.code)
                .attr("type", &item.equipment_type)
                .wrap(&inner)
        })
        .collect();
    section("EquipmentRequirements", &items)
}

fn signatures(signatures: &[Signature]) -> String {
    let items: String = signatures
        .iter()
        .map(|signature| {
            let mut inner = leaf("Role", &signature.role);
            inner.push_str(&leaf_opt("Meaning", signature.meaning.as_deref()));
            inner.push_str(&leaf_opt("TimeLimit", signature.time_limit_minutes));
            Tag::new("Signature")
                .attr("type", vocabulary::signature_type_token(MesSystem::PasX, signature.signature_type))
                .attr("order", signature.order)
                .attr("required", signature.required)
                .wrap(&inner)
        })
        .collect();
    section("Signatures", &items)
}

fn interface(point: &InterfacePoint) -> String {
    let mappings: String = point
        .data_mappings
        .iter()
        .map(|mapping| {
            Tag::new("Mapping")
                .attr("source", &mapping.source)
                .attr("target", &mapping.target)
                .attr_opt("transform", mapping.transform.as_deref())
                .empty()
        })
        .collect();
    Tag::new("Interface")
        .attr("system", vocabulary::interface_system_token(MesSystem::PasX, point.system))
        .attr("direction", vocabulary::direction_token(point.direction))
        .wrap(&mappings)
}

/// One EWI step per non-empty instruction line
fn electronic_work_instruction(phase: &Phase) -> String {
    let steps: String = phase
        .instructions
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(index, line)| Tag::new("Step").attr("order", index + 1).text(line))
        .collect();
    section("EWI", &steps)
}

fn cleaning_management(procedure: &Procedure) -> String {
    let operations: String = procedure
        .operations()
        .filter(|op| op.is_cleaning)
        .map(|op| {
            Tag::new("CleaningOperation")
                .attr("ref", &op.id)
                .attr_opt("level", op.cleaning_level.map(vocabulary::cleaning_level_token))
                .empty()
        })
        .collect();
    Tag::new("CleaningManagement").wrap(&operations)
}

fn genealogy(procedure: &Procedure) -> String {
    let formula = procedure.formula.iter().flat_map(|formula| formula.materials.iter());
    let phases = procedure.phases().flat_map(|phase| phase.materials.iter());
    let tracked: String = formula
        .chain(phases)
        .map(|material| {
            Tag::new("TrackedMaterial")
                .attr("code", &material.code)
                .attr("type", vocabulary::material_type_token(MesSystem::PasX, material.material_type))
                .empty()
        })
        .collect();
    Tag::new("Genealogy").wrap(&tracked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::tests::sample_procedure;
    use crate::models::{PhaseType, SignatureType};

    #[test]
    fn test_scenario_block_counts() {
        let mut procedure = sample_procedure();
        let phase = &mut procedure.unit_procedures[0].operations[0].phases[0];
        phase.phase_type = PhaseType::Manual;
        phase.signatures.push(Signature::new(SignatureType::Perform, "Operator", 1));
        phase.signatures.push(Signature::new(SignatureType::Verify, "Supervisor", 2));

        let output = PasXGenerator.generate(&procedure, &GeneratorOptions::default()).unwrap();
        assert!(output.content.contains("<RecipeId>"));
        assert_eq!(output.content.matches("<UnitProcedure ").count(), 1);
        assert_eq!(output.content.matches("<Signature ").count(), 2);
        assert!(output.content.contains(r#"type="Execute" order="1""#));
        assert!(output.content.contains(r#"type="Verify" order="2""#));
    }

    #[test]
    fn test_vendor_sections_follow_toggles() {
        let mut procedure = sample_procedure();
        procedure.unit_procedures[0].operations[0].is_cleaning = true;
        procedure.unit_procedures[0].operations[0].phases[0].instructions = "Tare\nWeigh".to_string();

        let plain = PasXGenerator.generate(&procedure, &GeneratorOptions::default()).unwrap();
        assert!(!plain.content.contains("<EWI>"));
        assert!(!plain.content.contains("<CleaningManagement"));

        let mut options = GeneratorOptions::default();
        options.vendor.include_ewi = true;
        options.vendor.include_cleaning_management = true;
        options.vendor.plant_id = Some("PL-01".to_string());
        let full = PasXGenerator.generate(&procedure, &options).unwrap();
        assert!(full.content.contains(r#"<Step order="2">Weigh</Step>"#));
        assert!(full.content.contains("<CleaningOperation ref="));
        assert!(full.content.contains(r#"plantId="PL-01""#));
    }

    #[test]
    fn test_missing_version_is_a_pasx_error() {
        let mut procedure = sample_procedure();
        procedure.version.clear();
        assert!(!PasXGenerator.validate(&procedure, &GeneratorOptions::default()).valid);
    }
}
