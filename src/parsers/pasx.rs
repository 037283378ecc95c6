//! Körber PAS-X master batch record (MBR) parser
//!
//! ```text
//! MasterRecipe
//! ├── RecipeHeader
//! ├── BillOfMaterials / ProcessParameters / EquipmentRequirements
//! └── UnitProcedures/UnitProcedure
//!     └── Operations/Operation
//!         └── Phases/Phase
//! ```
//!
//! `ProcessParameters`, `Signatures` and `EquipmentRequirements` appear at
//! several depths, so every level reads them as direct children only. PAS-X
//! has no explicit execution edges; transitions are derived from sequence.

use crate::converters::errors::ParseError;
use crate::converters::types::{ParseResult, ParserOptions};
use crate::models::{
    derive_transitions, BatchSize, Equipment, Formula, InterfacePoint, Material, Operation,
    Parameter, Phase, Procedure, ResourceRequirements, Signature, UnitProcedure,
};
use crate::systems::MesSystem;
use crate::xml::Element;

use super::{open_document, version_attribute, ParseContext, RecipeParser};

pub struct PasXParser;

impl RecipeParser for PasXParser {
    fn system(&self) -> MesSystem {
        MesSystem::PasX
    }

    fn parse(&self, xml: &str, options: &ParserOptions) -> Result<ParseResult, ParseError> {
        let (doc, _) = open_document(self.info(), xml)?;
        let root = doc.root();
        let mut ctx = ParseContext::new(self.system(), &doc, options);
        let version = version_attribute(self.info(), root);

        let mut procedure = Procedure::new(String::new());
        match root.child("RecipeHeader") {
            Some(header) => read_header(&mut ctx, header, &mut procedure),
            None => ctx.missing("RecipeHeader", "MasterRecipe"),
        }

        let formula = Formula {
            materials: root
                .child("BillOfMaterials")
                .map(|bom| bom.children_named("MaterialItem").map(|item| read_material(&mut ctx, item)).collect())
                .unwrap_or_default(),
            parameters: read_parameters(&mut ctx, root),
        };
        procedure.formula = (!formula.is_empty()).then_some(formula);
        procedure.equipment_requirements = read_equipment(root);

        match root.child("UnitProcedures") {
            Some(list) => {
                procedure.unit_procedures = list
                    .children_named("UnitProcedure")
                    .enumerate()
                    .map(|(position, element)| read_unit_procedure(&mut ctx, element, position))
                    .collect();
            }
            None => ctx.missing("UnitProcedures", "MasterRecipe"),
        }
        procedure.transitions = derive_transitions(&procedure.unit_procedures);

        ctx.capture_unmapped(root.child("CleaningManagement"));
        ctx.capture_unmapped(root.child("Genealogy"));

        ctx.finish(procedure, version)
    }
}

fn read_header(ctx: &mut ParseContext, header: &Element, procedure: &mut Procedure) {
    procedure.id = ctx.node_id(header.child_text("RecipeId"), "recipe");
    match header.child_text("RecipeName") {
        Some(name) => procedure.name = name,
        None => ctx.missing("RecipeName", "RecipeHeader"),
    }
    match header.child_text("RecipeVersion") {
        Some(version) => procedure.version = version,
        None => ctx.missing("RecipeVersion", "RecipeHeader"),
    }
    procedure.status = ctx.status(header.child_text("Status").as_deref());
    procedure.recipe_type = ctx.recipe_type(header.child_text("RecipeType").as_deref());
    procedure.description = header.child_text("Description");
    procedure.product_code = header.child_text("ProductCode");
    procedure.product_name = header.child_text("ProductName");
    procedure.author = header.child_text("Author");
    procedure.batch_size = header.child("BatchSize").map(|batch| BatchSize {
        min: ctx.number(batch.attribute("min"), "batch size min"),
        max: ctx.number(batch.attribute("max"), "batch size max"),
        nominal: ctx.number(batch.attribute("nominal"), "batch size nominal"),
        unit: batch.attribute_text("unit").unwrap_or_default(),
    });
    procedure.created = ctx.timestamp(header.child_text("CreatedDate").as_deref());
    procedure.modified = ctx.timestamp(header.child_text("ModifiedDate").as_deref());
}

fn read_unit_procedure(ctx: &mut ParseContext, element: &Element, position: usize) -> UnitProcedure {
    let sequence = ctx.sequence(element.attribute("sequence"), position);
    let name = ctx.node_name(element.child_text("Name"), "Unit Procedure", sequence);
    let mut up = UnitProcedure::new(name, sequence);
    up.id = ctx.node_id(element.attribute_text("id"), "unit procedure");
    up.description = element.child_text("Description");
    up.equipment = read_equipment(element);
    up.parameters = read_parameters(ctx, element);
    up.signatures = read_signatures(ctx, element);
    up.resource_requirements = element.child("ResourceRequirements").map(|resources| ResourceRequirements {
        personnel: ctx.integer(resources.attribute("personnel"), "personnel"),
        room_class: resources.attribute_text("roomClass"),
    });

    match element.child("Operations") {
        Some(list) => {
            up.operations = list
                .children_named("Operation")
                .enumerate()
                .map(|(position, element)| read_operation(ctx, element, position))
                .collect();
        }
        None => ctx.missing("Operations", &format!("unit procedure '{}'", up.name)),
    }
    up
}

fn read_operation(ctx: &mut ParseContext, element: &Element, position: usize) -> Operation {
    let sequence = ctx.sequence(element.attribute("sequence"), position);
    let name = ctx.node_name(element.child_text("Name"), "Operation", sequence);
    let mut op = Operation::new(name, sequence);
    op.id = ctx.node_id(element.attribute_text("id"), "operation");
    op.description = element.child_text("Description");
    op.is_cleaning = ctx.flag(element.attribute("cleaning"), false);
    op.cleaning_level = ctx.cleaning_level(element.attribute("cleaningLevel"));
    op.signatures = read_signatures(ctx, element);

    match element.child("Phases") {
        Some(list) => {
            op.phases = list
                .children_named("Phase")
                .enumerate()
                .map(|(position, element)| read_phase(ctx, element, position))
                .collect();
        }
        None => ctx.missing("Phases", &format!("operation '{}'", op.name)),
    }
    op
}

fn read_phase(ctx: &mut ParseContext, element: &Element, position: usize) -> Phase {
    let sequence = ctx.sequence(element.attribute("sequence"), position);
    let name = ctx.node_name(element.child_text("Name"), "Phase", sequence);
    let mut phase = Phase::new(name, sequence);
    phase.id = ctx.node_id(element.attribute_text("id"), "phase");
    phase.phase_type = ctx.phase_type(element.attribute("type"));
    phase.description = element.child_text("Description");
    phase.instructions = element.child_text("Instructions").unwrap_or_default();
    phase.duration = element
        .child("Duration")
        .and_then(|duration| ctx.duration(duration.attribute("value"), duration.attribute("unit")));
    phase.parameters = read_parameters(ctx, element);
    phase.materials = element
        .child("MaterialInputs")
        .map(|inputs| inputs.children_named("MaterialItem").map(|item| read_material(ctx, item)).collect())
        .unwrap_or_default();
    phase.signatures = read_signatures(ctx, element);
    phase.interface_points = element
        .child("Interfaces")
        .map(|list| list.children_named("Interface").map(|item| read_interface(ctx, item)).collect())
        .unwrap_or_default();
    ctx.capture_unmapped(element.child("EWI"));
    phase
}

/// Direct `ProcessParameters/ProcessParameter` children of `parent`
fn read_parameters(ctx: &mut ParseContext, parent: &Element) -> Vec<Parameter> {
    let Some(list) = parent.child("ProcessParameters") else {
        return Vec::new();
    };
    list.children_named("ProcessParameter")
        .filter_map(|element| {
            let Some(name) = element.attribute_text("name") else {
                ctx.warn("ProcessParameter without name skipped");
                return None;
            };
            let mut parameter = Parameter::new(name, ctx.data_type(element.attribute("dataType")));
            parameter.value = element.child_text("Value");
            parameter.default_value = element.child_text("DefaultValue");
            parameter.unit = element.child_text("Unit");
            parameter.min = ctx.number(element.child_text("MinValue").as_deref(), "parameter minimum");
            parameter.max = ctx.number(element.child_text("MaxValue").as_deref(), "parameter maximum");
            parameter.required = ctx.flag(element.attribute("required"), false);
            Some(parameter)
        })
        .collect()
}

fn read_material(ctx: &mut ParseContext, item: &Element) -> Material {
    let code = item.attribute_text("code").unwrap_or_else(|| {
        ctx.warn("MaterialItem without code");
        String::new()
    });
    let name = item.child_text("Name").unwrap_or_else(|| code.clone());
    let quantity = item.child("Quantity");
    let mut material = Material::new(
        code,
        name,
        ctx.number(quantity.and_then(Element::trimmed_text).as_deref(), "material quantity")
            .unwrap_or(0.0),
        quantity.and_then(|q| q.attribute_text("unit")).unwrap_or_default(),
    );
    material.material_type = ctx.material_type(item.attribute("type"));
    material.scalable = ctx.flag(item.attribute("scalable"), false);
    material.tolerance = ctx.number(item.attribute("tolerance"), "material tolerance");
    material
}

fn read_equipment(parent: &Element) -> Vec<Equipment> {
    let Some(list) = parent.child("EquipmentRequirements") else {
        return Vec::new();
    };
    list.children_named("EquipmentClass")
        .map(|element| {
            let code = element.attribute_text("code").unwrap_or_default();
            let name = element.child_text("Name").unwrap_or_else(|| code.clone());
            let mut equipment = Equipment::new(code, name, element.attribute_text("type").unwrap_or_default());
            equipment.capabilities = element
                .children_named("Capability")
                .filter_map(Element::trimmed_text)
                .collect();
            equipment
        })
        .collect()
}

fn read_signatures(ctx: &mut ParseContext, parent: &Element) -> Vec<Signature> {
    let Some(list) = parent.child("Signatures") else {
        return Vec::new();
    };
    list.children_named("Signature")
        .enumerate()
        .map(|(position, element)| {
            let order = ctx.sequence(element.attribute("order"), position);
            let mut signature = Signature::new(
                ctx.signature_type(element.attribute("type")),
                element.child_text("Role").unwrap_or_default(),
                order,
            );
            signature.required = ctx.flag(element.attribute("required"), true);
            signature.meaning = element.child_text("Meaning");
            signature.time_limit_minutes = ctx.integer(element.child_text("TimeLimit").as_deref(), "signature time limit");
            signature
        })
        .collect()
}

fn read_interface(ctx: &mut ParseContext, element: &Element) -> InterfacePoint {
    InterfacePoint {
        system: ctx.interface_system(element.attribute("system")),
        direction: ctx.direction(element.attribute("direction")),
        data_mappings: element
            .children_named("Mapping")
            .filter_map(|mapping| {
                ctx.data_mapping(
                    mapping.attribute_text("source"),
                    mapping.attribute_text("target"),
                    mapping.attribute_text("transform"),
                )
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PhaseType, RecipeStatus, SignatureType};

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<MasterRecipe xmlns="http://www.werum.com/pas-x/mbr" version="3.3">
  <RecipeHeader>
    <RecipeId>MBR-001</RecipeId>
    <RecipeName>Granulation</RecipeName>
    <RecipeVersion>2.1</RecipeVersion>
    <Status>Valid</Status>
    <BatchSize min="100" max="500" nominal="250" unit="kg"/>
  </RecipeHeader>
  <BillOfMaterials>
    <MaterialItem code="API-1" type="RawMaterial" scalable="true">
      <Name>Active ingredient</Name>
      <Quantity unit="kg">12.5</Quantity>
    </MaterialItem>
  </BillOfMaterials>
  <UnitProcedures>
    <UnitProcedure id="UP-1" sequence="1">
      <Name>Set-up</Name>
      <Signatures>
        <Signature type="Approve" order="1"><Role>QA</Role></Signature>
      </Signatures>
      <Operations>
        <Operation id="OP-1" sequence="1">
          <Name>Dispense</Name>
          <Phases>
            <Phase id="PH-1" sequence="1" type="Manual">
              <Name>Weigh Material</Name>
              <Instructions>Weigh &amp; record</Instructions>
              <Signatures>
                <Signature type="Execute" order="1"><Role>Operator</Role></Signature>
                <Signature type="Verify" order="2"><Role>Supervisor</Role></Signature>
              </Signatures>
              <EWI><Step>Tare scale</Step></EWI>
            </Phase>
            <Phase id="PH-2" sequence="2" type="Automatic">
              <Name>Blend</Name>
            </Phase>
          </Phases>
        </Operation>
      </Operations>
    </UnitProcedure>
  </UnitProcedures>
  <Genealogy><Rule>lot-tracking</Rule></Genealogy>
</MasterRecipe>"#;

    #[test]
    fn test_parse_header_and_hierarchy() {
        let result = PasXParser.parse(SAMPLE, &ParserOptions::default()).unwrap();
        let procedure = &result.procedure;
        assert_eq!(procedure.id, "MBR-001");
        assert_eq!(procedure.name, "Granulation");
        assert_eq!(procedure.version, "2.1");
        assert_eq!(procedure.status, RecipeStatus::Released);
        assert_eq!(procedure.batch_size.as_ref().and_then(|b| b.nominal), Some(250.0));
        assert_eq!(result.source_version.as_deref(), Some("3.3"));

        let up = &procedure.unit_procedures[0];
        assert_eq!(up.name, "Set-up");
        assert_eq!(up.signatures.len(), 1);
        let op = &up.operations[0];
        assert_eq!(op.phases.len(), 2);
        assert_eq!(op.phases[0].instructions, "Weigh & record");
        assert_eq!(op.phases[1].phase_type, PhaseType::Automatic);
    }

    #[test]
    fn test_nested_signatures_stay_at_their_level() {
        let result = PasXParser.parse(SAMPLE, &ParserOptions::default()).unwrap();
        let phase = &result.procedure.unit_procedures[0].operations[0].phases[0];
        let tuples: Vec<(SignatureType, &str, u32)> = phase
            .signatures
            .iter()
            .map(|s| (s.signature_type, s.role.as_str(), s.order))
            .collect();
        assert_eq!(
            tuples,
            vec![(SignatureType::Perform, "Operator", 1), (SignatureType::Verify, "Supervisor", 2)]
        );
        assert_eq!(result.statistics.counts.signatures, 3);
    }

    #[test]
    fn test_transitions_are_derived() {
        let result = PasXParser.parse(SAMPLE, &ParserOptions::default()).unwrap();
        assert_eq!(result.procedure.transitions.len(), 1);
        assert_eq!(result.procedure.transitions[0].source_id, "PH-1");
        assert_eq!(result.procedure.transitions[0].target_id, "PH-2");
    }

    #[test]
    fn test_unmapped_sections_are_kept_on_request() {
        let options = ParserOptions {
            preserve_unmapped_data: true,
            ..Default::default()
        };
        let result = PasXParser.parse(SAMPLE, &options).unwrap();
        let unmapped = result.unmapped_data.unwrap();
        assert!(unmapped["Genealogy"].contains("lot-tracking"));
        assert!(unmapped["EWI"].starts_with("<EWI>"));
        assert_eq!(result.statistics.unmapped_sections, 2);
    }

    #[test]
    fn test_unknown_vocabulary_falls_back_silently() {
        let xml = SAMPLE.replace("<Status>Valid</Status>", "<Status>Bogus</Status>");
        let result = PasXParser.parse(&xml, &ParserOptions::default()).unwrap();
        assert_eq!(result.procedure.status, RecipeStatus::Draft);
        assert_eq!(result.statistics.defaulted_values, 1);
        assert!(!result.warnings.iter().any(|w| w.contains("Bogus")));
    }

    #[test]
    fn test_missing_header_warns() {
        let result = PasXParser.parse("<MasterRecipe/>", &ParserOptions::default()).unwrap();
        assert!(result.warnings.iter().any(|w| w.contains("RecipeHeader")));
        assert!(result.warnings.iter().any(|w| w.contains("Procedure name is required")));
    }

    #[test]
    fn test_strict_validation_fails_on_errors() {
        let options = ParserOptions {
            strict_validation: true,
            ..Default::default()
        };
        let err = PasXParser.parse("<MasterRecipe/>", &options).unwrap_err();
        assert!(matches!(err, ParseError::StrictValidation(_)));
    }

    #[test]
    fn test_duplicate_ids_are_replaced() {
        let xml = SAMPLE.replace(r#"id="PH-2""#, r#"id="PH-1""#);
        let result = PasXParser.parse(&xml, &ParserOptions::default()).unwrap();
        let phases = &result.procedure.unit_procedures[0].operations[0].phases;
        assert_eq!(phases[0].id, "PH-1");
        assert_ne!(phases[1].id, "PH-1");
        assert!(result.warnings.iter().any(|w| w.contains("Duplicate phase id 'PH-1'")));
    }

    #[test]
    fn test_truncated_document_yields_partial_tree() {
        let cut = &SAMPLE[..SAMPLE.find("<Phase id=\"PH-2\"").unwrap()];
        let result = PasXParser.parse(cut, &ParserOptions::default()).unwrap();
        assert!(result.warnings.iter().any(|w| w.contains("truncated or malformed")));
        assert_eq!(result.procedure.unit_procedures[0].operations[0].phases.len(), 1);
    }
}
