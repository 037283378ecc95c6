//! Lonza MODA recipe parser
//!
//! MODA is attribute-heavy: `Workflow/Stage/Task/Activity`, each level named
//! and ordered through attributes. Activities capture data through `Field`
//! elements and sign-offs through `Approval`.

use crate::converters::errors::ParseError;
use crate::converters::types::{ParseResult, ParserOptions};
use crate::models::{
    derive_transitions, BatchSize, Equipment, Formula, InterfacePoint, Material, Operation,
    Parameter, Phase, Procedure, ResourceRequirements, Signature, UnitProcedure,
};
use crate::systems::MesSystem;
use crate::xml::Element;

use super::{open_document, version_attribute, ParseContext, RecipeParser};

pub struct ModaParser;

impl RecipeParser for ModaParser {
    fn system(&self) -> MesSystem {
        MesSystem::Moda
    }

    fn parse(&self, xml: &str, options: &ParserOptions) -> Result<ParseResult, ParseError> {
        let (doc, _) = open_document(self.info(), xml)?;
        let root = doc.root();
        let mut ctx = ParseContext::new(self.system(), &doc, options);
        let version = version_attribute(self.info(), root);

        let mut procedure = Procedure::new(String::new());
        match root.child("RecipeDefinition") {
            Some(definition) => read_definition(&mut ctx, definition, &mut procedure),
            None => ctx.missing("RecipeDefinition", "MODARecipe"),
        }

        procedure.formula = root.child("Formula").map(|formula| Formula {
            materials: read_materials(&mut ctx, formula),
            parameters: read_fields(&mut ctx, formula),
        });
        procedure.equipment_requirements = root.child("Resources").map(read_resources).unwrap_or_default();

        match root.child("Workflow") {
            Some(workflow) => {
                procedure.unit_procedures = workflow
                    .children_named("Stage")
                    .enumerate()
                    .map(|(position, stage)| read_stage(&mut ctx, stage, position))
                    .collect();
            }
            None => ctx.missing("Workflow", "MODARecipe"),
        }
        procedure.transitions = derive_transitions(&procedure.unit_procedures);

        ctx.capture_unmapped(root.child("SamplingPlans"));
        ctx.capture_unmapped(root.child("LimitsConfiguration"));

        ctx.finish(procedure, version)
    }
}

fn read_definition(ctx: &mut ParseContext, definition: &Element, procedure: &mut Procedure) {
    procedure.id = ctx.node_id(definition.attribute_text("code"), "recipe");
    match definition.attribute_text("name") {
        Some(name) => procedure.name = name,
        None => ctx.warn("RecipeDefinition has no name attribute"),
    }
    match definition.attribute_text("revision") {
        Some(revision) => procedure.version = revision,
        None => ctx.warn("RecipeDefinition has no revision attribute; using 1.0"),
    }
    procedure.status = ctx.status(definition.attribute("status"));
    procedure.recipe_type = ctx.recipe_type(definition.attribute("category"));
    procedure.product_code = definition.attribute_text("productCode");
    procedure.product_name = definition.attribute_text("productName");
    procedure.author = definition.attribute_text("author");
    procedure.description = definition.child_text("Description");
    procedure.batch_size = definition.child("BatchSize").map(|batch| BatchSize {
        min: ctx.number(batch.attribute("min"), "batch size min"),
        max: ctx.number(batch.attribute("max"), "batch size max"),
        nominal: ctx.number(batch.attribute("nominal"), "batch size nominal"),
        unit: batch.attribute_text("unit").unwrap_or_default(),
    });
    procedure.created = ctx.timestamp(definition.child_text("Created").as_deref());
    procedure.modified = ctx.timestamp(definition.child_text("Modified").as_deref());
}

fn read_stage(ctx: &mut ParseContext, stage: &Element, position: usize) -> UnitProcedure {
    let sequence = ctx.sequence(stage.attribute("order"), position);
    let name = ctx.node_name(stage.attribute_text("name"), "Stage", sequence);
    let mut up = UnitProcedure::new(name, sequence);
    up.id = ctx.node_id(stage.attribute_text("id"), "stage");
    up.description = stage.child_text("Description");
    up.equipment = read_resources(stage);
    up.parameters = read_fields(ctx, stage);
    up.signatures = read_approvals(ctx, stage);
    up.resource_requirements = stage.child("Staffing").map(|staffing| ResourceRequirements {
        personnel: ctx.integer(staffing.attribute("personnel"), "personnel"),
        room_class: staffing.attribute_text("roomClass"),
    });

    if !stage.has_child("Task") {
        ctx.missing("Task", &format!("stage '{}'", up.name));
    }
    up.operations = stage
        .children_named("Task")
        .enumerate()
        .map(|(position, task)| read_task(ctx, task, position))
        .collect();
    up
}

fn read_task(ctx: &mut ParseContext, task: &Element, position: usize) -> Operation {
    let sequence = ctx.sequence(task.attribute("order"), position);
    let name = ctx.node_name(task.attribute_text("name"), "Task", sequence);
    let mut op = Operation::new(name, sequence);
    op.id = ctx.node_id(task.attribute_text("id"), "task");
    op.description = task.child_text("Description");
    op.is_cleaning = ctx.flag(task.attribute("cleaning"), false);
    op.cleaning_level = ctx.cleaning_level(task.attribute("cleaningLevel"));
    op.signatures = read_approvals(ctx, task);

    if !task.has_child("Activity") {
        ctx.missing("Activity", &format!("task '{}'", op.name));
    }
    op.phases = task
        .children_named("Activity")
        .enumerate()
        .map(|(position, activity)| read_activity(ctx, activity, position))
        .collect();
    op
}

fn read_activity(ctx: &mut ParseContext, activity: &Element, position: usize) -> Phase {
    let sequence = ctx.sequence(activity.attribute("order"), position);
    let name = ctx.node_name(activity.attribute_text("name"), "Activity", sequence);
    let mut phase = Phase::new(name, sequence);
    phase.id = ctx.node_id(activity.attribute_text("id"), "activity");
    phase.phase_type = ctx.phase_type(activity.attribute("kind"));
    phase.description = activity.child_text("Description");
    phase.instructions = activity.child_text("Instructions").unwrap_or_default();
    phase.duration = activity
        .child("EstimatedDuration")
        .and_then(|duration| ctx.duration(duration.attribute("value"), duration.attribute("unit")));
    phase.parameters = read_fields(ctx, activity);
    phase.materials = read_materials(ctx, activity);
    phase.signatures = read_approvals(ctx, activity);
    phase.interface_points = activity
        .children_named("Integration")
        .map(|integration| InterfacePoint {
            system: ctx.interface_system(integration.attribute("system")),
            direction: ctx.direction(integration.attribute("direction")),
            data_mappings: integration
                .children_named("Map")
                .filter_map(|map| {
                    ctx.data_mapping(
                        map.attribute_text("source"),
                        map.attribute_text("target"),
                        map.attribute_text("transform"),
                    )
                })
                .collect(),
        })
        .collect();
    phase
}

/// `Field` elements are MODA's data-capture parameters
fn read_fields(ctx: &mut ParseContext, parent: &Element) -> Vec<Parameter> {
    parent
        .children_named("Field")
        .filter_map(|field| {
            let Some(name) = field.attribute_text("name") else {
                ctx.warn("Field without name skipped");
                return None;
            };
            let mut parameter = Parameter::new(name, ctx.data_type(field.attribute("type")));
            parameter.value = field.child_text("Value");
            parameter.default_value = field.child_text("Default");
            parameter.unit = field.attribute_text("unit");
            parameter.min = ctx.number(field.attribute("min"), "field minimum");
            parameter.max = ctx.number(field.attribute("max"), "field maximum");
            parameter.required = ctx.flag(field.attribute("required"), false);
            Some(parameter)
        })
        .collect()
}

fn read_materials(ctx: &mut ParseContext, parent: &Element) -> Vec<Material> {
    parent
        .children_named("MaterialUsage")
        .map(|usage| {
            let code = usage.attribute_text("code").unwrap_or_default();
            let name = usage.attribute_text("name").unwrap_or_else(|| code.clone());
            let mut material = Material::new(
                code,
                name,
                ctx.number(usage.attribute("quantity"), "material quantity").unwrap_or(0.0),
                usage.attribute_text("unit").unwrap_or_default(),
            );
            material.material_type = ctx.material_type(usage.attribute("type"));
            material.scalable = ctx.flag(usage.attribute("scalable"), false);
            material.tolerance = ctx.number(usage.attribute("tolerance"), "material tolerance");
            material
        })
        .collect()
}

fn read_resources(parent: &Element) -> Vec<Equipment> {
    parent
        .children_named("Resource")
        .map(|resource| {
            let code = resource.attribute_text("code").unwrap_or_default();
            let name = resource.attribute_text("name").unwrap_or_else(|| code.clone());
            let mut equipment = Equipment::new(code, name, resource.attribute_text("type").unwrap_or_default());
            equipment.capabilities = resource
                .children_named("Capability")
                .filter_map(Element::trimmed_text)
                .collect();
            equipment
        })
        .collect()
}

fn read_approvals(ctx: &mut ParseContext, parent: &Element) -> Vec<Signature> {
    parent
        .children_named("Approval")
        .enumerate()
        .map(|(position, approval)| {
            let order = ctx.sequence(approval.attribute("order"), position);
            let mut signature = Signature::new(
                ctx.signature_type(approval.attribute("type")),
                approval.attribute_text("role").unwrap_or_default(),
                order,
            );
            signature.required = ctx.flag(approval.attribute("required"), true);
            signature.meaning = approval.child_text("Meaning");
            signature.time_limit_minutes = ctx.integer(approval.child_text("TimeLimit").as_deref(), "approval time limit");
            signature
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DataType, PhaseType, SignatureType};

    const SAMPLE: &str = r#"<MODARecipe xmlns="http://www.lonza.com/moda/recipe" version="4.0">
  <RecipeDefinition code="MODA-3" name="Media prep" revision="7" status="Active">
    <Description>Cell culture media</Description>
  </RecipeDefinition>
  <Workflow>
    <Stage id="S1" order="1" name="Preparation">
      <Task id="T1" order="1" name="Mix">
        <Activity id="A1" order="1" name="Add water" kind="Hybrid">
          <Field name="pH" type="Number" min="6.8" max="7.4"><Value>7.1</Value></Field>
          <Field name="Clear" type="Checkbox" required="yes"/>
          <Approval type="Performed" order="1" role="Technician"/>
          <Approval type="Witnessed" order="2" role="QA"/>
        </Activity>
      </Task>
    </Stage>
  </Workflow>
  <SamplingPlans><Plan id="SP1"/></SamplingPlans>
</MODARecipe>"#;

    #[test]
    fn test_parse_attribute_named_hierarchy() {
        let result = ModaParser.parse(SAMPLE, &ParserOptions::default()).unwrap();
        let procedure = &result.procedure;
        assert_eq!(procedure.id, "MODA-3");
        assert_eq!(procedure.name, "Media prep");
        assert_eq!(procedure.version, "7");
        let stage = &procedure.unit_procedures[0];
        assert_eq!(stage.name, "Preparation");
        let activity = &stage.operations[0].phases[0];
        assert_eq!(activity.phase_type, PhaseType::SemiAutomatic);
        assert_eq!(activity.parameters[0].data_type, DataType::Real);
        assert_eq!(activity.parameters[1].data_type, DataType::Boolean);
        assert!(activity.parameters[1].required);
        assert_eq!(activity.signatures[1].signature_type, SignatureType::Witness);
        assert_eq!(activity.signatures[1].role, "QA");
    }

    #[test]
    fn test_unknown_activity_kind_defaults_to_manual() {
        let xml = SAMPLE.replace(r#"kind="Hybrid""#, r#"kind="Robotic""#);
        let result = ModaParser.parse(&xml, &ParserOptions::default()).unwrap();
        let activity = &result.procedure.unit_procedures[0].operations[0].phases[0];
        assert_eq!(activity.phase_type, PhaseType::Manual);
        assert_eq!(result.statistics.defaulted_values, 1);
    }
}
