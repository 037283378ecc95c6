//! Siemens Opcenter Execution Pharma recipe parser
//!
//! `ProcessDefinition/ProcessStage/ProcessOperation/ProcessStep`, with
//! execution order in `StepSequence/Transition`. Parameter limits and
//! material quantities are carried as attributes.

use crate::converters::errors::ParseError;
use crate::converters::types::{ParseResult, ParserOptions};
use crate::models::{
    derive_transitions, BatchSize, Equipment, Formula, InterfacePoint, Material, Operation,
    Parameter, Phase, Procedure, ResourceRequirements, Signature, Transition, UnitProcedure,
};
use crate::systems::MesSystem;
use crate::xml::Element;

use super::{open_document, version_attribute, ParseContext, RecipeParser};

pub struct OpcenterParser;

impl RecipeParser for OpcenterParser {
    fn system(&self) -> MesSystem {
        MesSystem::Opcenter
    }

    fn parse(&self, xml: &str, options: &ParserOptions) -> Result<ParseResult, ParseError> {
        let (doc, _) = open_document(self.info(), xml)?;
        let root = doc.root();
        let mut ctx = ParseContext::new(self.system(), &doc, options);
        let version = version_attribute(self.info(), root);

        let mut procedure = Procedure::new(String::new());
        match root.child("RecipeIdentification") {
            Some(identification) => read_identification(&mut ctx, identification, &mut procedure),
            None => ctx.missing("RecipeIdentification", "OpcenterRecipe"),
        }

        let formula = Formula {
            materials: root
                .child("BillOfMaterials")
                .map(|bom| read_materials(&mut ctx, bom))
                .unwrap_or_default(),
            parameters: root
                .child("RecipeParameters")
                .map(|list| read_parameters(&mut ctx, list))
                .unwrap_or_default(),
        };
        procedure.formula = (!formula.is_empty()).then_some(formula);
        procedure.equipment_requirements = root
            .child("EquipmentRequirements")
            .map(read_equipment)
            .unwrap_or_default();

        match root.child("ProcessDefinition") {
            Some(definition) => {
                procedure.unit_procedures = definition
                    .children_named("ProcessStage")
                    .enumerate()
                    .map(|(position, stage)| read_stage(&mut ctx, stage, position))
                    .collect();
            }
            None => ctx.missing("ProcessDefinition", "OpcenterRecipe"),
        }

        procedure.transitions = match root.child("StepSequence") {
            Some(sequence) => sequence
                .children_named("Transition")
                .filter_map(|element| read_transition(&mut ctx, element))
                .collect(),
            None => derive_transitions(&procedure.unit_procedures),
        };

        ctx.capture_unmapped(root.child("ElectronicBatchRecord"));
        ctx.capture_unmapped(root.child("ComplianceSettings"));

        ctx.finish(procedure, version)
    }
}

fn read_identification(ctx: &mut ParseContext, identification: &Element, procedure: &mut Procedure) {
    procedure.id = ctx.node_id(identification.child_text("MasterRecipeId"), "recipe");
    match identification.child_text("Name") {
        Some(name) => procedure.name = name,
        None => ctx.missing("Name", "RecipeIdentification"),
    }
    match identification.child_text("Revision") {
        Some(revision) => procedure.version = revision,
        None => ctx.missing("Revision", "RecipeIdentification"),
    }
    procedure.status = ctx.status(identification.child_text("LifecycleState").as_deref());
    procedure.recipe_type = ctx.recipe_type(identification.child_text("RecipeCategory").as_deref());
    if let Some(material) = identification.child("Material") {
        procedure.product_code = material.attribute_text("number");
        procedure.product_name = material.attribute_text("description");
    }
    procedure.author = identification.child_text("Owner");
    procedure.description = identification.child_text("Description");
    procedure.batch_size = identification.child("BatchQuantity").map(|batch| BatchSize {
        min: ctx.number(batch.attribute("min"), "batch quantity min"),
        max: ctx.number(batch.attribute("max"), "batch quantity max"),
        nominal: ctx.number(batch.attribute("nominal"), "batch quantity nominal"),
        unit: batch.attribute_text("uom").unwrap_or_default(),
    });
    procedure.created = ctx.timestamp(identification.child_text("CreationDate").as_deref());
    procedure.modified = ctx.timestamp(identification.child_text("ChangeDate").as_deref());
}

fn read_stage(ctx: &mut ParseContext, stage: &Element, position: usize) -> UnitProcedure {
    let sequence = ctx.sequence(stage.attribute("sequence"), position);
    let name = ctx.node_name(stage.child_text("Name"), "Stage", sequence);
    let mut up = UnitProcedure::new(name, sequence);
    up.id = ctx.node_id(stage.attribute_text("id"), "stage");
    up.description = stage.child_text("Description");
    up.equipment = read_equipment(stage);
    up.parameters = read_parameters(ctx, stage);
    up.signatures = read_signatures(ctx, stage);
    up.resource_requirements = stage.child("Staffing").map(|staffing| ResourceRequirements {
        personnel: ctx.integer(staffing.attribute("personnel"), "personnel"),
        room_class: staffing.attribute_text("roomClass"),
    });

    if !stage.has_child("ProcessOperation") {
        ctx.missing("ProcessOperation", &format!("stage '{}'", up.name));
    }
    up.operations = stage
        .children_named("ProcessOperation")
        .enumerate()
        .map(|(position, element)| read_operation(ctx, element, position))
        .collect();
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

    if !element.has_child("ProcessStep") {
        ctx.missing("ProcessStep", &format!("operation '{}'", op.name));
    }
    op.phases = element
        .children_named("ProcessStep")
        .enumerate()
        .map(|(position, step)| read_step(ctx, step, position))
        .collect();
    op
}

fn read_step(ctx: &mut ParseContext, step: &Element, position: usize) -> Phase {
    let sequence = ctx.sequence(step.attribute("sequence"), position);
    let name = ctx.node_name(step.child_text("Name"), "Step", sequence);
    let mut phase = Phase::new(name, sequence);
    phase.id = ctx.node_id(step.attribute_text("id"), "step");
    phase.phase_type = ctx.phase_type(step.attribute("executionMode"));
    phase.description = step.child_text("Description");
    phase.instructions = step.child_text("WorkInstruction").unwrap_or_default();
    phase.duration = step
        .child("PlannedDuration")
        .and_then(|duration| ctx.duration(duration.attribute("value"), duration.attribute("unit")));
    phase.parameters = read_parameters(ctx, step);
    phase.materials = read_materials(ctx, step);
    phase.signatures = read_signatures(ctx, step);
    phase.interface_points = step
        .children_named("Integration")
        .map(|integration| InterfacePoint {
            system: ctx.interface_system(integration.attribute("system")),
            direction: ctx.direction(integration.attribute("direction")),
            data_mappings: integration
                .children_named("FieldMapping")
                .filter_map(|mapping| {
                    ctx.data_mapping(
                        mapping.attribute_text("source"),
                        mapping.attribute_text("target"),
                        mapping.attribute_text("transform"),
                    )
                })
                .collect(),
        })
        .collect();
    phase
}

fn read_parameters(ctx: &mut ParseContext, parent: &Element) -> Vec<Parameter> {
    parent
        .children_named("ProcessParameter")
        .filter_map(|element| {
            let Some(name) = element.attribute_text("name") else {
                ctx.warn("ProcessParameter without name skipped");
                return None;
            };
            let mut parameter = Parameter::new(name, ctx.data_type(element.attribute("dataType")));
            parameter.value = element.child_text("Setpoint");
            parameter.default_value = element.child_text("DefaultValue");
            parameter.unit = element.attribute_text("uom");
            parameter.min = ctx.number(element.attribute("lowLimit"), "parameter low limit");
            parameter.max = ctx.number(element.attribute("highLimit"), "parameter high limit");
            parameter.required = ctx.flag(element.attribute("required"), false);
            Some(parameter)
        })
        .collect()
}

fn read_materials(ctx: &mut ParseContext, parent: &Element) -> Vec<Material> {
    parent
        .children_named("MaterialConsumption")
        .map(|element| {
            let code = element.attribute_text("materialNumber").unwrap_or_default();
            let name = element.child_text("Description").unwrap_or_else(|| code.clone());
            let mut material = Material::new(
                code,
                name,
                ctx.number(element.attribute("quantity"), "material quantity").unwrap_or(0.0),
                element.attribute_text("uom").unwrap_or_default(),
            );
            material.material_type = ctx.material_type(element.attribute("type"));
            material.scalable = ctx.flag(element.attribute("scalable"), false);
            material.tolerance = ctx.number(element.attribute("tolerance"), "material tolerance");
            material
        })
        .collect()
}

fn read_equipment(parent: &Element) -> Vec<Equipment> {
    parent
        .children_named("Equipment")
        .map(|element| {
            let code = element.attribute_text("id").unwrap_or_default();
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
    parent
        .children_named("ElectronicSignature")
        .enumerate()
        .map(|(position, element)| {
            let order = ctx.sequence(element.attribute("sequence"), position);
            let mut signature = Signature::new(
                ctx.signature_type(element.attribute("purpose")),
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

fn read_transition(ctx: &mut ParseContext, element: &Element) -> Option<Transition> {
    let (Some(from), Some(to)) = (element.attribute_text("from"), element.attribute_text("to")) else {
        ctx.warn("Transition without from/to skipped");
        return None;
    };
    let mut transition = Transition::new(ctx.transition_type(element.attribute("kind")), from, to);
    transition.id = ctx.node_id(element.attribute_text("id"), "transition");
    transition.condition = element.attribute_text("condition");
    Some(transition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DataType, MaterialType, PhaseType, RecipeStatus};

    const SAMPLE: &str = r#"<OpcenterRecipe xmlns="http://www.siemens.com/opcenter/execution/pharma" version="2401">
  <RecipeIdentification>
    <MasterRecipeId>OPC-42</MasterRecipeId>
    <Name>Filling</Name>
    <Revision>B</Revision>
    <LifecycleState>Productive</LifecycleState>
    <Material number="FG-9" description="Vials 10ml"/>
  </RecipeIdentification>
  <ProcessDefinition>
    <ProcessStage id="ST-1" sequence="1">
      <Name>Aseptic filling</Name>
      <ProcessOperation id="OP-1" sequence="1" cleaning="true" cleaningLevel="major">
        <Name>Line clearance</Name>
        <ProcessStep id="PS-1" sequence="1" executionMode="Guided">
          <Name>Inspect line</Name>
          <ProcessParameter name="Fill volume" dataType="Float" uom="ml" lowLimit="9.8" highLimit="10.2">
            <Setpoint>10</Setpoint>
          </ProcessParameter>
          <MaterialConsumption materialNumber="VIAL-10" type="PackagingMaterial" quantity="1000" uom="pcs"/>
        </ProcessStep>
      </ProcessOperation>
    </ProcessStage>
  </ProcessDefinition>
  <ComplianceSettings part11="true"/>
</OpcenterRecipe>"#;

    #[test]
    fn test_parse_stage_hierarchy() {
        let result = OpcenterParser.parse(SAMPLE, &ParserOptions::default()).unwrap();
        let procedure = &result.procedure;
        assert_eq!(procedure.id, "OPC-42");
        assert_eq!(procedure.status, RecipeStatus::Released);
        assert_eq!(procedure.product_name.as_deref(), Some("Vials 10ml"));

        let op = &procedure.unit_procedures[0].operations[0];
        assert!(op.is_cleaning);
        let phase = &op.phases[0];
        assert_eq!(phase.phase_type, PhaseType::SemiAutomatic);
        assert_eq!(phase.parameters[0].data_type, DataType::Real);
        assert_eq!(phase.parameters[0].min, Some(9.8));
        assert_eq!(phase.parameters[0].value.as_deref(), Some("10"));
        assert_eq!(phase.materials[0].material_type, MaterialType::Packaging);
        assert_eq!(phase.materials[0].quantity, 1000.0);
    }

    #[test]
    fn test_compliance_settings_are_unmapped() {
        let options = ParserOptions {
            preserve_unmapped_data: true,
            ..Default::default()
        };
        let result = OpcenterParser.parse(SAMPLE, &options).unwrap();
        let unmapped = result.unmapped_data.unwrap();
        assert!(unmapped["ComplianceSettings"].contains("part11"));
    }

    #[test]
    fn test_rejects_foreign_root() {
        let err = OpcenterParser
            .parse("<MODARecipe/>", &ParserOptions::default())
            .unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedRoot { .. }));
    }

    #[test]
    fn test_target_version_mismatch_warns() {
        let options = ParserOptions {
            target_version: Some("2210".to_string()),
            ..Default::default()
        };
        let result = OpcenterParser.parse(SAMPLE, &options).unwrap();
        assert!(result.warnings.iter().any(|w| w.contains("2210") && w.contains("2401")));
    }
}
