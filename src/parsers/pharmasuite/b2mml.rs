//! B2MML `BatchInformation` grammar
//!
//! ISA-95 style: values live in child elements rather than attributes, every
//! hierarchy level is a `RecipeElement` distinguished by `RecipeElementType`,
//! and execution order is given by `ProcedureLogic/Link` edges.

use crate::models::{
    derive_transitions, BatchSize, Equipment, Formula, InterfacePoint, Material, Operation,
    Parameter, Phase, Procedure, ResourceRequirements, Signature, Transition, UnitProcedure,
};
use crate::parsers::ParseContext;
use crate::xml::Element;

const UNIT_PROCEDURE: &str = "UnitProcedure";
const OPERATION: &str = "Operation";
const PHASE: &str = "Phase";

pub(super) fn read_batch_information(ctx: &mut ParseContext, root: &Element) -> Procedure {
    let mut procedure = Procedure::new(String::new());
    ctx.capture_unmapped(root.child("OtherInformation"));

    let Some(recipe) = root.child("MasterRecipe") else {
        ctx.missing("MasterRecipe", "BatchInformation");
        return procedure;
    };

    procedure.id = ctx.node_id(recipe.child_text("ID"), "recipe");
    match recipe.child_text("Description") {
        Some(name) => procedure.name = name,
        None => ctx.missing("Description", "MasterRecipe"),
    }
    match recipe.child_text("Version") {
        Some(version) => procedure.version = version,
        None => ctx.missing("Version", "MasterRecipe"),
    }
    if let Some(header) = recipe.child("Header") {
        read_header(ctx, header, &mut procedure);
    }

    procedure.formula = recipe.child("Formula").map(|formula| Formula {
        materials: formula
            .child("MaterialBill")
            .map(|bill| read_materials(ctx, bill))
            .unwrap_or_default(),
        parameters: read_parameters(ctx, formula),
    });
    procedure.equipment_requirements = read_equipment(recipe);

    let unit_procedures = typed_elements(ctx, recipe, UNIT_PROCEDURE);
    if unit_procedures.is_empty() {
        ctx.missing("RecipeElement", "MasterRecipe");
    }
    procedure.unit_procedures = unit_procedures
        .into_iter()
        .enumerate()
        .map(|(position, element)| read_unit_procedure(ctx, element, position))
        .collect();

    procedure.transitions = match recipe.child("ProcedureLogic") {
        Some(logic) => logic
            .children_named("Link")
            .filter_map(|link| read_link(ctx, link))
            .collect(),
        None => derive_transitions(&procedure.unit_procedures),
    };
    procedure
}

fn read_header(ctx: &mut ParseContext, header: &Element, procedure: &mut Procedure) {
    procedure.status = ctx.status(header.child_text("Status").as_deref());
    procedure.recipe_type = ctx.recipe_type(header.child_text("RecipeType").as_deref());
    procedure.product_code = header.child_text("ProductID");
    procedure.product_name = header.child_text("ProductName");
    procedure.author = header.child_text("Author");
    procedure.description = header.child_text("Description");
    procedure.batch_size = header.child("BatchSize").map(|batch| BatchSize {
        min: ctx.number(batch.child_text("Min").as_deref(), "batch size min"),
        max: ctx.number(batch.child_text("Max").as_deref(), "batch size max"),
        nominal: ctx.number(batch.child_text("Nominal").as_deref(), "batch size nominal"),
        unit: batch.child_text("UnitOfMeasure").unwrap_or_default(),
    });
    procedure.created = ctx.timestamp(header.child_text("CreatedDate").as_deref());
    procedure.modified = ctx.timestamp(header.child_text("ModifiedDate").as_deref());
}

/// Direct `RecipeElement` children of one element type
fn typed_elements<'e>(ctx: &mut ParseContext, parent: &'e Element, expected: &str) -> Vec<&'e Element> {
    parent
        .children_named("RecipeElement")
        .filter(|element| match element.child_text("RecipeElementType") {
            Some(kind) if kind.eq_ignore_ascii_case(expected) => true,
            Some(kind) => {
                ctx.warn(format!("Skipping RecipeElement of type '{}' where {} was expected", kind, expected));
                false
            }
            None => {
                ctx.warn(format!("RecipeElement without RecipeElementType treated as {}", expected));
                true
            }
        })
        .collect()
}

fn read_unit_procedure(ctx: &mut ParseContext, element: &Element, position: usize) -> UnitProcedure {
    let sequence = ctx.sequence(element.child_text("Sequence").as_deref(), position);
    let name = ctx.node_name(element.child_text("Description"), "Unit Procedure", sequence);
    let mut up = UnitProcedure::new(name, sequence);
    up.id = ctx.node_id(element.child_text("ID"), "unit procedure");
    up.equipment = read_equipment(element);
    up.parameters = read_parameters(ctx, element);
    up.signatures = read_signatures(ctx, element);
    up.resource_requirements = element.child("ResourceRequirement").map(|resources| ResourceRequirements {
        personnel: ctx.integer(resources.child_text("Personnel").as_deref(), "personnel"),
        room_class: resources.child_text("RoomClass"),
    });

    let operations = typed_elements(ctx, element, OPERATION);
    if operations.is_empty() {
        ctx.missing("RecipeElement", &format!("unit procedure '{}'", up.name));
    }
    up.operations = operations
        .into_iter()
        .enumerate()
        .map(|(position, element)| read_operation(ctx, element, position))
        .collect();
    up
}

fn read_operation(ctx: &mut ParseContext, element: &Element, position: usize) -> Operation {
    let sequence = ctx.sequence(element.child_text("Sequence").as_deref(), position);
    let name = ctx.node_name(element.child_text("Description"), "Operation", sequence);
    let mut op = Operation::new(name, sequence);
    op.id = ctx.node_id(element.child_text("ID"), "operation");
    op.is_cleaning = ctx.flag(element.child_text("Cleaning").as_deref(), false);
    op.cleaning_level = ctx.cleaning_level(element.child_text("CleaningLevel").as_deref());
    op.signatures = read_signatures(ctx, element);

    let phases = typed_elements(ctx, element, PHASE);
    if phases.is_empty() {
        ctx.missing("RecipeElement", &format!("operation '{}'", op.name));
    }
    op.phases = phases
        .into_iter()
        .enumerate()
        .map(|(position, element)| read_phase(ctx, element, position))
        .collect();
    op
}

fn read_phase(ctx: &mut ParseContext, element: &Element, position: usize) -> Phase {
    let sequence = ctx.sequence(element.child_text("Sequence").as_deref(), position);
    let name = ctx.node_name(element.child_text("Description"), "Phase", sequence);
    let mut phase = Phase::new(name, sequence);
    phase.id = ctx.node_id(element.child_text("ID"), "phase");
    phase.phase_type = ctx.phase_type(element.child_text("ExecutionType").as_deref());
    phase.instructions = element.child_text("Instruction").unwrap_or_default();
    phase.duration = element.child("Duration").and_then(|duration| {
        ctx.duration(
            duration.child_text("Value").as_deref(),
            duration.child_text("Unit").as_deref(),
        )
    });
    phase.parameters = read_parameters(ctx, element);
    phase.materials = read_materials(ctx, element);
    phase.signatures = read_signatures(ctx, element);
    phase.interface_points = element
        .children_named("InterfacePoint")
        .map(|point| InterfacePoint {
            system: ctx.interface_system(point.child_text("System").as_deref()),
            direction: ctx.direction(point.child_text("Direction").as_deref()),
            data_mappings: point
                .children_named("Mapping")
                .filter_map(|mapping| {
                    ctx.data_mapping(
                        mapping.child_text("Source"),
                        mapping.child_text("Target"),
                        mapping.child_text("Transform"),
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
            let Some(name) = element.child_text("ID") else {
                ctx.warn("Parameter without ID skipped");
                return None;
            };
            let value = element.child("Value");
            let data_type = ctx.data_type(value.and_then(|v| v.child_text("DataType")).as_deref());
            let mut parameter = Parameter::new(name, data_type);
            parameter.value = value.and_then(|v| v.child_text("ValueString"));
            parameter.unit = value.and_then(|v| v.child_text("UnitOfMeasure"));
            parameter.default_value = element.child_text("Default");
            parameter.min = ctx.number(element.child_text("Minimum").as_deref(), "parameter minimum");
            parameter.max = ctx.number(element.child_text("Maximum").as_deref(), "parameter maximum");
            parameter.required = ctx.flag(element.child_text("Required").as_deref(), false);
            Some(parameter)
        })
        .collect()
}

fn read_materials(ctx: &mut ParseContext, parent: &Element) -> Vec<Material> {
    parent
        .children_named("MaterialBillItem")
        .map(|element| {
            let code = element.child_text("MaterialDefinitionID").unwrap_or_default();
            let name = element.child_text("Description").unwrap_or_else(|| code.clone());
            let quantity = element.child("Quantity");
            let mut material = Material::new(
                code,
                name,
                ctx.number(quantity.and_then(|q| q.child_text("QuantityString")).as_deref(), "material quantity")
                    .unwrap_or(0.0),
                quantity.and_then(|q| q.child_text("UnitOfMeasure")).unwrap_or_default(),
            );
            material.material_type = ctx.material_type(element.child_text("MaterialType").as_deref());
            material.scalable = ctx.flag(element.child_text("Scalable").as_deref(), false);
            material.tolerance = ctx.number(element.child_text("Tolerance").as_deref(), "material tolerance");
            material
        })
        .collect()
}

fn read_equipment(parent: &Element) -> Vec<Equipment> {
    parent
        .children_named("EquipmentRequirement")
        .map(|element| {
            let code = element.child_text("ID").unwrap_or_default();
            let name = element.child_text("Description").unwrap_or_else(|| code.clone());
            let mut equipment = Equipment::new(code, name, element.child_text("EquipmentClassID").unwrap_or_default());
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
        .children_named("Signature")
        .enumerate()
        .map(|(position, element)| {
            let order = ctx.sequence(element.child_text("Order").as_deref(), position);
            let mut signature = Signature::new(
                ctx.signature_type(element.child_text("Type").as_deref()),
                element.child_text("Role").unwrap_or_default(),
                order,
            );
            signature.required = ctx.flag(element.child_text("Required").as_deref(), true);
            signature.meaning = element.child_text("Meaning");
            signature.time_limit_minutes = ctx.integer(element.child_text("TimeLimit").as_deref(), "signature time limit");
            signature
        })
        .collect()
}

fn read_link(ctx: &mut ParseContext, link: &Element) -> Option<Transition> {
    let (Some(from), Some(to)) = (link.child_text("FromID"), link.child_text("ToID")) else {
        ctx.warn("Link without FromID/ToID skipped");
        return None;
    };
    let mut transition = Transition::new(ctx.transition_type(link.child_text("LinkType").as_deref()), from, to);
    transition.id = ctx.node_id(link.child_text("ID"), "link");
    transition.condition = link.child_text("Condition");
    Some(transition)
}
