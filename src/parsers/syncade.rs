//! Emerson Syncade recipe parser
//!
//! Syncade nests `Segment` inside `Segment`: the outer segments are unit
//! procedures, the inner ones operations, and `Step` elements are phases.
//! Only direct children are read at each level so the two segment levels are
//! never merged. Execution order is carried by explicit `Transitions`.

use crate::converters::errors::ParseError;
use crate::converters::types::{ParseResult, ParserOptions};
use crate::models::{
    derive_transitions, BatchSize, Equipment, Formula, InterfacePoint, Material, Operation,
    Parameter, Phase, Procedure, ResourceRequirements, Signature, Transition, UnitProcedure,
};
use crate::systems::MesSystem;
use crate::xml::Element;

use super::{open_document, version_attribute, ParseContext, RecipeParser};

const UNIT_PROCEDURE_SEGMENT: &str = "UnitProcedure";
const OPERATION_SEGMENT: &str = "Operation";

pub struct SyncadeParser;

impl RecipeParser for SyncadeParser {
    fn system(&self) -> MesSystem {
        MesSystem::Syncade
    }

    fn parse(&self, xml: &str, options: &ParserOptions) -> Result<ParseResult, ParseError> {
        let (doc, _) = open_document(self.info(), xml)?;
        let root = doc.root();
        let mut ctx = ParseContext::new(self.system(), &doc, options);
        let version = version_attribute(self.info(), root);

        let mut procedure = Procedure::new(String::new());
        match root.child("Header") {
            Some(header) => read_header(&mut ctx, header, &mut procedure),
            None => ctx.missing("Header", "SyncadeRecipe"),
        }

        procedure.formula = root.child("Formula").map(|formula| Formula {
            materials: read_materials(&mut ctx, formula),
            parameters: read_parameters(&mut ctx, formula),
        });
        procedure.equipment_requirements = root
            .child("EquipmentRequirements")
            .map(read_equipment)
            .unwrap_or_default();

        match root.child("Procedure") {
            Some(body) => {
                let segments = typed_segments(&mut ctx, body, UNIT_PROCEDURE_SEGMENT);
                procedure.unit_procedures = segments
                    .into_iter()
                    .enumerate()
                    .map(|(position, segment)| read_unit_procedure(&mut ctx, segment, position))
                    .collect();
            }
            None => ctx.missing("Procedure", "SyncadeRecipe"),
        }

        procedure.transitions = match root.child("Transitions") {
            Some(list) => list
                .children_named("Transition")
                .filter_map(|element| read_transition(&mut ctx, element))
                .collect(),
            None => derive_transitions(&procedure.unit_procedures),
        };

        ctx.capture_unmapped(root.child("WorkflowSettings"));
        ctx.capture_unmapped(root.child("AuditTrailConfig"));

        ctx.finish(procedure, version)
    }
}

fn read_header(ctx: &mut ParseContext, header: &Element, procedure: &mut Procedure) {
    procedure.id = ctx.node_id(header.child_text("Identifier"), "recipe");
    match header.child_text("Name") {
        Some(name) => procedure.name = name,
        None => ctx.missing("Name", "Header"),
    }
    match header.child_text("Revision") {
        Some(revision) => procedure.version = revision,
        None => ctx.missing("Revision", "Header"),
    }
    procedure.status = ctx.status(header.child_text("State").as_deref());
    procedure.recipe_type = ctx.recipe_type(header.child_text("Classification").as_deref());
    if let Some(product) = header.child("Product") {
        procedure.product_code = product.attribute_text("code");
        procedure.product_name = product.attribute_text("name");
    }
    procedure.author = header.child_text("Originator");
    procedure.description = header.child_text("Description");
    procedure.batch_size = header.child("BatchSize").map(|batch| BatchSize {
        min: ctx.number(batch.attribute("min"), "batch size min"),
        max: ctx.number(batch.attribute("max"), "batch size max"),
        nominal: ctx.number(batch.attribute("nominal"), "batch size nominal"),
        unit: batch.attribute_text("unit").unwrap_or_default(),
    });
    procedure.created = ctx.timestamp(header.child_text("Created").as_deref());
    procedure.modified = ctx.timestamp(header.child_text("LastModified").as_deref());
}

/// Direct `Segment` children of the expected type
///
/// An untyped segment is accepted at the level it sits on; a segment of
/// another type is skipped with a warning.
fn typed_segments<'e>(ctx: &mut ParseContext, parent: &'e Element, expected: &str) -> Vec<&'e Element> {
    parent
        .children_named("Segment")
        .filter(|segment| match segment.attribute("type").map(str::trim) {
            Some(kind) if kind.eq_ignore_ascii_case(expected) => true,
            Some(kind) => {
                ctx.warn(format!("Skipping Segment of type '{}' where {} was expected", kind, expected));
                false
            }
            None => {
                ctx.warn(format!("Segment without type treated as {}", expected));
                true
            }
        })
        .collect()
}

fn read_unit_procedure(ctx: &mut ParseContext, segment: &Element, position: usize) -> UnitProcedure {
    let sequence = ctx.sequence(segment.attribute("sequence"), position);
    let name = ctx.node_name(segment.child_text("Name"), "Unit Procedure", sequence);
    let mut up = UnitProcedure::new(name, sequence);
    up.id = ctx.node_id(segment.attribute_text("id"), "unit procedure");
    up.description = segment.child_text("Description");
    up.equipment = read_equipment(segment);
    up.parameters = read_parameters(ctx, segment);
    up.signatures = read_signatures(ctx, segment);
    up.resource_requirements = segment.child("Resources").map(|resources| ResourceRequirements {
        personnel: ctx.integer(resources.attribute("personnel"), "personnel"),
        room_class: resources.attribute_text("roomClass"),
    });

    let operations = typed_segments(ctx, segment, OPERATION_SEGMENT);
    if operations.is_empty() {
        ctx.missing("Segment", &format!("unit procedure '{}'", up.name));
    }
    up.operations = operations
        .into_iter()
        .enumerate()
        .map(|(position, element)| read_operation(ctx, element, position))
        .collect();
    up
}

fn read_operation(ctx: &mut ParseContext, segment: &Element, position: usize) -> Operation {
    let sequence = ctx.sequence(segment.attribute("sequence"), position);
    let name = ctx.node_name(segment.child_text("Name"), "Operation", sequence);
    let mut op = Operation::new(name, sequence);
    op.id = ctx.node_id(segment.attribute_text("id"), "operation");
    op.description = segment.child_text("Description");
    op.is_cleaning = ctx.flag(segment.attribute("cleaning"), false);
    op.cleaning_level = ctx.cleaning_level(segment.attribute("cleaningLevel"));
    op.signatures = read_signatures(ctx, segment);

    if !segment.has_child("Step") {
        ctx.missing("Step", &format!("operation '{}'", op.name));
    }
    op.phases = segment
        .children_named("Step")
        .enumerate()
        .map(|(position, element)| read_step(ctx, element, position))
        .collect();
    op
}

fn read_step(ctx: &mut ParseContext, step: &Element, position: usize) -> Phase {
    let sequence = ctx.sequence(step.attribute("sequence"), position);
    let name = ctx.node_name(step.child_text("Name"), "Step", sequence);
    let mut phase = Phase::new(name, sequence);
    phase.id = ctx.node_id(step.attribute_text("id"), "step");
    phase.phase_type = ctx.phase_type(step.attribute("mode"));
    phase.description = step.child_text("Description");
    phase.instructions = step.child_text("WorkInstruction").unwrap_or_default();
    phase.duration = step
        .child("Duration")
        .and_then(|duration| ctx.duration(duration.attribute("value"), duration.attribute("unit")));
    phase.parameters = read_parameters(ctx, step);
    phase.materials = read_materials(ctx, step);
    phase.signatures = read_signatures(ctx, step);
    phase.interface_points = step
        .children_named("DataExchange")
        .map(|exchange| InterfacePoint {
            system: ctx.interface_system(exchange.attribute("system")),
            direction: ctx.direction(exchange.attribute("direction")),
            data_mappings: exchange
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

fn read_parameters(ctx: &mut ParseContext, parent: &Element) -> Vec<Parameter> {
    parent
        .children_named("Parameter")
        .filter_map(|element| {
            let Some(name) = element.attribute_text("name") else {
                ctx.warn("Parameter without name skipped");
                return None;
            };
            let mut parameter = Parameter::new(name, ctx.data_type(element.attribute("dataType")));
            parameter.value = element.child_text("Value");
            parameter.default_value = element.child_text("Default");
            parameter.unit = element.child_text("Unit");
            parameter.min = ctx.number(element.child_text("Min").as_deref(), "parameter minimum");
            parameter.max = ctx.number(element.child_text("Max").as_deref(), "parameter maximum");
            parameter.required = ctx.flag(element.attribute("required"), false);
            Some(parameter)
        })
        .collect()
}

fn read_materials(ctx: &mut ParseContext, parent: &Element) -> Vec<Material> {
    parent
        .children_named("MaterialRequirement")
        .map(|element| {
            let code = element.attribute_text("code").unwrap_or_default();
            let name = element.child_text("Name").unwrap_or_else(|| code.clone());
            let quantity = element.child("Quantity");
            let mut material = Material::new(
                code,
                name,
                ctx.number(quantity.and_then(Element::trimmed_text).as_deref(), "material quantity")
                    .unwrap_or(0.0),
                quantity.and_then(|q| q.attribute_text("unit")).unwrap_or_default(),
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
    parent
        .children_named("ESignature")
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

fn read_transition(ctx: &mut ParseContext, element: &Element) -> Option<Transition> {
    let (Some(from), Some(to)) = (element.attribute_text("from"), element.attribute_text("to")) else {
        ctx.warn("Transition without from/to skipped");
        return None;
    };
    let mut transition = Transition::new(ctx.transition_type(element.attribute("type")), from, to);
    transition.id = ctx.node_id(element.attribute_text("id"), "transition");
    transition.condition = element.attribute_text("condition");
    Some(transition)
}
