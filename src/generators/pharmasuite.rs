//! Rockwell PharmaSuite recipe generator
//!
//! Emits the native `PharmaSuiteRecipe` grammar by default, or the ISA-95
//! B2MML `BatchInformation` grammar when `includeB2MML` is set.

use crate::converters::types::{GeneratorOptions, VendorOptions};
use crate::models::{
    Equipment, Material, Operation, Parameter, Phase, Procedure, Signature, UnitProcedure,
    ValidationReport,
};
use crate::systems::{MesSystem, B2MML_GRAMMAR};
use crate::vocabulary;
use crate::xml::markup::{self, leaf, leaf_opt, leaf_text, number, section, Tag};

use super::{base_validation, check_transition_endpoints, execution_edges, RecipeGenerator};

const SYSTEM: MesSystem = MesSystem::PharmaSuite;

pub struct PharmaSuiteGenerator;

impl RecipeGenerator for PharmaSuiteGenerator {
    fn system(&self) -> MesSystem {
        SYSTEM
    }

    fn format_name(&self, options: &GeneratorOptions) -> String {
        if options.vendor.include_b2mml {
            format!("{} (B2MML)", self.info().name)
        } else {
            self.info().name.to_string()
        }
    }

    fn validate(&self, procedure: &Procedure, options: &GeneratorOptions) -> ValidationReport {
        let mut report = base_validation(procedure);
        if options.vendor.include_b2mml {
            check_transition_endpoints(procedure, &mut report);
            return report;
        }
        // Native recipes carry no edges, so a dangling one is never written
        let mut edges = ValidationReport::from_findings(Vec::new(), Vec::new());
        check_transition_endpoints(procedure, &mut edges);
        for error in edges.errors {
            report.warning(format!("{} (not written by the native grammar)", error));
        }
        report
    }

    fn render(&self, procedure: &Procedure, options: &GeneratorOptions, version: &str, _warnings: &mut Vec<String>) -> String {
        if options.vendor.include_b2mml {
            b2mml::render(procedure, options, version)
        } else {
            native::render(procedure, options, version, self.info().namespace)
        }
    }
}

mod native {
    use super::*;

    pub(super) fn render(procedure: &Procedure, options: &GeneratorOptions, version: &str, namespace: &str) -> String {
        let root = Tag::new("PharmaSuiteRecipe")
            .attr("xmlns", namespace)
            .attr("version", version)
            .attr_opt("siteId", options.vendor.site_id.as_deref());

        let mut body = info(procedure);
        if let Some(formula) = procedure.formula.as_ref().filter(|formula| !formula.is_empty()) {
            let mut inner: String = formula.materials.iter().map(material).collect();
            inner.push_str(&parameters(&formula.parameters));
            body.push_str(&Tag::new("Formula").wrap(&inner));
        }
        body.push_str(&equipment(&procedure.equipment_requirements));

        let structure: String = procedure
            .unit_procedures
            .iter()
            .map(|up| unit_procedure(up, options))
            .collect();
        body.push_str(&Tag::new("RecipeStructure").wrap(&structure));
        root.wrap(&body)
    }

    fn info(procedure: &Procedure) -> String {
        let mut inner = String::new();
        inner.push_str(&leaf("RecipeID", &procedure.id));
        inner.push_str(&leaf("RecipeName", &procedure.name));
        inner.push_str(&leaf("RecipeVersion", &procedure.version));
        inner.push_str(&leaf("Status", vocabulary::status_token(SYSTEM, procedure.status)));
        inner.push_str(&leaf("RecipeType", vocabulary::recipe_type_token(SYSTEM, procedure.recipe_type)));
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
        inner.push_str(&leaf("CreationDate", procedure.created.to_rfc3339()));
        inner.push_str(&leaf("ModificationDate", procedure.modified.to_rfc3339()));
        Tag::new("RecipeInfo").wrap(&inner)
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
        Tag::new("UnitProcedure")
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
            inner.push_str(&phase_instance(phase));
        }
        let mut tag = Tag::new("Operation").attr("id", &op.id).attr("sequence", op.sequence);
        if op.is_cleaning {
            tag = tag.attr("cleaning", "true");
        }
        tag.attr_opt("cleaningLevel", op.cleaning_level.map(vocabulary::cleaning_level_token))
            .wrap(&inner)
    }

    fn phase_instance(phase: &Phase) -> String {
        let mut inner = String::new();
        inner.push_str(&leaf("Name", &phase.name));
        inner.push_str(&leaf_opt("Description", phase.description.as_deref()));
        inner.push_str(&leaf_text("Instruction", &phase.instructions));
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
            let mappings: String = point
                .data_mappings
                .iter()
                .map(|mapping| {
                    Tag::new("DataMapping")
                        .attr("source", &mapping.source)
                        .attr("target", &mapping.target)
                        .attr_opt("transform", mapping.transform.as_deref())
                        .empty()
                })
                .collect();
            inner.push_str(
                &Tag::new("SystemInterface")
                    .attr("system", vocabulary::interface_system_token(SYSTEM, point.system))
                    .attr("direction", vocabulary::direction_token(point.direction))
                    .wrap(&mappings),
            );
        }
        Tag::new("PhaseInstance")
            .attr("id", &phase.id)
            .attr("sequence", phase.sequence)
            .attr("buildingBlock", vocabulary::phase_type_token(SYSTEM, phase.phase_type))
            .wrap(&inner)
    }

    fn parameters(parameters: &[Parameter]) -> String {
        parameters
            .iter()
            .map(|parameter| {
                let mut inner = String::new();
                inner.push_str(&leaf_opt("Value", parameter.value.as_deref()));
                inner.push_str(&leaf_opt("DefaultValue", parameter.default_value.as_deref()));
                inner.push_str(&leaf_opt("Unit", parameter.unit.as_deref()));
                inner.push_str(&leaf_opt("LowerLimit", parameter.min.map(number)));
                inner.push_str(&leaf_opt("UpperLimit", parameter.max.map(number)));
                Tag::new("ParameterValue")
                    .attr("name", &parameter.name)
                    .attr("dataType", vocabulary::data_type_token(SYSTEM, parameter.data_type))
                    .attr("required", parameter.required)
                    .wrap(&inner)
            })
            .collect()
    }

    fn material(material: &Material) -> String {
        let mut inner = leaf("Name", &material.name);
        inner.push_str(&Tag::new("Quantity").attr("unit", &material.unit).text(&number(material.quantity)));
        Tag::new("MaterialInput")
            .attr("code", &material.code)
            .attr("type", vocabulary::material_type_token(SYSTEM, material.material_type))
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
                Tag::new("EquipmentRequirement")
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
                Tag::new("SignatureRequirement")
                    .attr("type", vocabulary::signature_type_token(SYSTEM, signature.signature_type))
                    .attr("order", signature.order)
                    .attr("required", signature.required)
                    .wrap(&inner)
            })
            .collect()
    }
}

mod b2mml {
    use super::*;

    pub(super) fn render(procedure: &Procedure, options: &GeneratorOptions, version: &str) -> String {
        let root = Tag::new(B2MML_GRAMMAR.root_element)
            .attr("xmlns", B2MML_GRAMMAR.namespace)
            .attr("schemaVersion", version);

        let mut recipe = String::new();
        recipe.push_str(&leaf("ID", &procedure.id));
        recipe.push_str(&leaf("Version", &procedure.version));
        recipe.push_str(&leaf("Description", &procedure.name));
        recipe.push_str(&header(procedure));
        if let Some(formula) = procedure.formula.as_ref().filter(|formula| !formula.is_empty()) {
            let mut inner = parameters(&formula.parameters);
            inner.push_str(&section(
                "MaterialBill",
                &formula.materials.iter().map(material).collect::<String>(),
            ));
            recipe.push_str(&Tag::new("Formula").wrap(&inner));
        }
        recipe.push_str(&equipment(&procedure.equipment_requirements));

        let links: String = execution_edges(procedure)
            .iter()
            .map(|transition| {
                let mut inner = leaf("ID", &transition.id);
                inner.push_str(&leaf("FromID", &transition.source_id));
                inner.push_str(&leaf("ToID", &transition.target_id));
                inner.push_str(&leaf("LinkType", vocabulary::transition_type_token(transition.transition_type)));
                inner.push_str(&leaf_opt("Condition", transition.condition.as_deref()));
                Tag::new("Link").wrap(&inner)
            })
            .collect();
        recipe.push_str(&section("ProcedureLogic", &links));

        for up in &procedure.unit_procedures {
            recipe.push_str(&unit_procedure(up, options));
        }

        let mut body = Tag::new("MasterRecipe").wrap(&recipe);
        body.push_str(&other_information(&options.vendor));
        root.wrap(&body)
    }

    fn header(procedure: &Procedure) -> String {
        let mut inner = String::new();
        inner.push_str(&leaf_opt("ProductID", procedure.product_code.as_deref()));
        inner.push_str(&leaf_opt("ProductName", procedure.product_name.as_deref()));
        inner.push_str(&leaf("Status", vocabulary::status_token(SYSTEM, procedure.status)));
        inner.push_str(&leaf("RecipeType", vocabulary::recipe_type_token(SYSTEM, procedure.recipe_type)));
        inner.push_str(&leaf_opt("Author", procedure.author.as_deref()));
        inner.push_str(&leaf_opt("Description", procedure.description.as_deref()));
        if let Some(batch) = &procedure.batch_size {
            let mut size = String::new();
            size.push_str(&leaf_opt("Min", batch.min.map(number)));
            size.push_str(&leaf_opt("Max", batch.max.map(number)));
            size.push_str(&leaf_opt("Nominal", batch.nominal.map(number)));
            size.push_str(&leaf("UnitOfMeasure", &batch.unit));
            inner.push_str(&Tag::new("BatchSize").wrap(&size));
        }
        inner.push_str(&leaf("CreatedDate", procedure.created.to_rfc3339()));
        inner.push_str(&leaf("ModifiedDate", procedure.modified.to_rfc3339()));
        Tag::new("Header").wrap(&inner)
    }

    /// Opening lines shared by every `RecipeElement`
    fn element_head(id: &str, name: &str, element_type: &str, sequence: u32) -> String {
        let mut inner = leaf("ID", id);
        inner.push_str(&leaf("Description", name));
        inner.push_str(&leaf("RecipeElementType", element_type));
        inner.push_str(&leaf("Sequence", sequence));
        inner
    }

    fn unit_procedure(up: &UnitProcedure, options: &GeneratorOptions) -> String {
        let mut inner = String::new();
        if options.include_comments {
            inner.push_str(&markup::comment(&format!("Unit procedure {}: {}", up.sequence, up.name)));
        }
        inner.push_str(&element_head(&up.id, &up.name, "UnitProcedure", up.sequence));
        inner.push_str(&equipment(&up.equipment));
        inner.push_str(&parameters(&up.parameters));
        inner.push_str(&signatures(&up.signatures));
        if let Some(resources) = up.resource_requirements.as_ref().filter(|r| !r.is_empty()) {
            let mut requirement = leaf_opt("Personnel", resources.personnel);
            requirement.push_str(&leaf_opt("RoomClass", resources.room_class.as_deref()));
            inner.push_str(&Tag::new("ResourceRequirement").wrap(&requirement));
        }
        for op in &up.operations {
            inner.push_str(&operation(op));
        }
        Tag::new("RecipeElement").wrap(&inner)
    }

    fn operation(op: &Operation) -> String {
        let mut inner = element_head(&op.id, &op.name, "Operation", op.sequence);
        if op.is_cleaning {
            inner.push_str(&leaf("Cleaning", true));
        }
        inner.push_str(&leaf_opt("CleaningLevel", op.cleaning_level.map(vocabulary::cleaning_level_token)));
        inner.push_str(&signatures(&op.signatures));
        for phase in &op.phases {
            inner.push_str(&phase_element(phase));
        }
        Tag::new("RecipeElement").wrap(&inner)
    }

    fn phase_element(phase: &Phase) -> String {
        let mut inner = element_head(&phase.id, &phase.name, "Phase", phase.sequence);
        inner.push_str(&leaf("ExecutionType", vocabulary::phase_type_token(SYSTEM, phase.phase_type)));
        inner.push_str(&leaf_text("Instruction", &phase.instructions));
        if let Some(duration) = &phase.duration {
            let mut value = leaf("Value", number(duration.value));
            value.push_str(&leaf("Unit", duration.unit));
            inner.push_str(&Tag::new("Duration").wrap(&value));
        }
        inner.push_str(&parameters(&phase.parameters));
        for item in &phase.materials {
            inner.push_str(&material(item));
        }
        inner.push_str(&signatures(&phase.signatures));
        for point in &phase.interface_points {
            let mut content = leaf("System", vocabulary::interface_system_token(SYSTEM, point.system));
            content.push_str(&leaf("Direction", vocabulary::direction_token(point.direction)));
            for mapping in &point.data_mappings {
                let mut fields = leaf("Source", &mapping.source);
                fields.push_str(&leaf("Target", &mapping.target));
                fields.push_str(&leaf_opt("Transform", mapping.transform.as_deref()));
                content.push_str(&Tag::new("Mapping").wrap(&fields));
            }
            inner.push_str(&Tag::new("InterfacePoint").wrap(&content));
        }
        Tag::new("RecipeElement").wrap(&inner)
    }

    fn parameters(parameters: &[Parameter]) -> String {
        parameters
            .iter()
            .map(|parameter| {
                let mut value = leaf_opt("ValueString", parameter.value.as_deref());
                value.push_str(&leaf("DataType", vocabulary::data_type_token(SYSTEM, parameter.data_type)));
                value.push_str(&leaf_opt("UnitOfMeasure", parameter.unit.as_deref()));

                let mut inner = leaf("ID", &parameter.name);
                inner.push_str(&Tag::new("Value").wrap(&value));
                inner.push_str(&leaf_opt("Default", parameter.default_value.as_deref()));
                inner.push_str(&leaf_opt("Minimum", parameter.min.map(number)));
                inner.push_str(&leaf_opt("Maximum", parameter.max.map(number)));
                inner.push_str(&leaf("Required", parameter.required));
                Tag::new("Parameter").wrap(&inner)
            })
            .collect()
    }

    fn material(material: &Material) -> String {
        let mut quantity = leaf("QuantityString", number(material.quantity));
        quantity.push_str(&leaf("UnitOfMeasure", &material.unit));

        let mut inner = leaf("MaterialDefinitionID", &material.code);
        inner.push_str(&leaf("Description", &material.name));
        inner.push_str(&leaf(
            "MaterialType",
            vocabulary::material_type_token(SYSTEM, material.material_type),
        ));
        inner.push_str(&Tag::new("Quantity").wrap(&quantity));
        inner.push_str(&leaf("Scalable", material.scalable));
        inner.push_str(&leaf_opt("Tolerance", material.tolerance.map(number)));
        Tag::new("MaterialBillItem").wrap(&inner)
    }

    fn equipment(equipment: &[Equipment]) -> String {
        equipment
            .iter()
            .map(|item| {
                let mut inner = leaf("ID", &item.code);
                inner.push_str(&leaf("Description", &item.name));
                inner.push_str(&leaf("EquipmentClassID", &item.equipment_type));
                for capability in &item.capabilities {
                    inner.push_str(&leaf("Capability", capability));
                }
                Tag::new("EquipmentRequirement").wrap(&inner)
            })
            .collect()
    }

    fn signatures(signatures: &[Signature]) -> String {
        signatures
            .iter()
            .map(|signature| {
                let mut inner = leaf(
                    "Type",
                    vocabulary::signature_type_token(SYSTEM, signature.signature_type),
                );
                inner.push_str(&leaf("Role", &signature.role));
                inner.push_str(&leaf("Order", signature.order));
                inner.push_str(&leaf("Required", signature.required));
                inner.push_str(&leaf_opt("Meaning", signature.meaning.as_deref()));
                inner.push_str(&leaf_opt("TimeLimit", signature.time_limit_minutes));
                Tag::new("Signature").wrap(&inner)
            })
            .collect()
    }

    /// Plant hierarchy identifiers as B2MML other-information pairs
    fn other_information(vendor: &VendorOptions) -> String {
        [
            ("PlantID", &vendor.plant_id),
            ("FacilityID", &vendor.facility_id),
            ("SiteID", &vendor.site_id),
            ("AreaID", &vendor.area_id),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|value| (key, value)))
        .map(|(key, value)| {
            let mut inner = leaf("OtherInfoID", key);
            inner.push_str(&leaf("OtherValue", value));
            Tag::new("OtherInformation").wrap(&inner)
        })
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::tests::sample_procedure;

    #[test]
    fn test_native_grammar_by_default() {
        let output = PharmaSuiteGenerator
            .generate(&sample_procedure(), &GeneratorOptions::default())
            .unwrap();
        assert!(output.content.contains("<PharmaSuiteRecipe "));
        assert!(output.content.contains("<PhaseInstance "));
        assert_eq!(output.format, "PharmaSuite");
    }

    #[test]
    fn test_b2mml_grammar_on_request() {
        let mut options = GeneratorOptions::default();
        options.vendor.include_b2mml = true;
        options.vendor.site_id = Some("S-1".to_string());
        let output = PharmaSuiteGenerator.generate(&sample_procedure(), &options).unwrap();
        assert!(output.content.contains(r#"<BatchInformation xmlns="http://www.mesa.org/xml/B2MML-V0600""#));
        assert_eq!(output.content.matches("<RecipeElement>").count(), 3);
        assert!(output.content.contains("<OtherValue>S-1</OtherValue>"));
        assert_eq!(output.format, "PharmaSuite (B2MML)");
    }

    #[test]
    fn test_dangling_transition_only_blocks_b2mml() {
        use crate::models::{Transition, TransitionType};

        let mut procedure = sample_procedure();
        procedure
            .transitions
            .push(Transition::new(TransitionType::Sequential, "nowhere", "nothing"));

        let native = PharmaSuiteGenerator
            .generate(&procedure, &GeneratorOptions::default())
            .unwrap();
        assert!(!native.content.contains("nowhere"));
        assert_eq!(
            native
                .warnings
                .iter()
                .filter(|w| w.contains("not written by the native grammar"))
                .count(),
            2
        );

        let mut options = GeneratorOptions::default();
        options.vendor.include_b2mml = true;
        let report = PharmaSuiteGenerator.validate(&procedure, &options);
        assert_eq!(report.errors.len(), 2);
        assert!(PharmaSuiteGenerator.generate(&procedure, &options).is_err());
    }
}
