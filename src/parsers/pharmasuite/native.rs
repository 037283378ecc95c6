//! Native `PharmaSuiteRecipe` grammar
//!
//! `RecipeStructure/UnitProcedure/Operation/PhaseInstance`; the phase type
//! comes from the building block the instance was created from.

use crate::models::{
    derive_transitions, BatchSize, Equipment, Formula, InterfacePoint, Material, Operation,
    Parameter, Phase, Procedure, ResourceRequirements, Signature, UnitProcedure,
};
use crate::parsers::ParseContext;
use crate::xml::Element;

pub(super) fn read_recipe(ctx: &mut ParseContext, root: &Element) -> Procedure {
    let mut procedure = Procedure::new(String::new());
    match root.child("RecipeInfo") {
        Some(info) => read_info(ctx, info, &mut procedure),
        None => ctx.missing("RecipeInfo", "PharmaSuiteRecipe"),
    }

    procedure.formula = root.child("Formula").map(|formula| Formula {
        materials: read_materials(ctx, formula),
        parameters: read_parameters(ctx, formula),
    });
    procedure.equipment_requirements = read_equipment(root);

    match root.child("RecipeStructure") {
        Some(structure) => {
            procedure.unit_procedures = structure
                .children_named("UnitProcedure")
                .enumerate()
                .map(|(position, element)| read_unit_procedure(ctx, element, position))
                .collect();
        }
        None => ctx.missing("RecipeStructure", "PharmaSuiteRecipe"),
    }
    procedure.transitions = derive_transitions(&procedure.unit_procedures);

    ctx.capture_unmapped(root.child("ExceptionHandling"));
    procedure
}

fn read_info(ctx: &mut ParseContext, info: &Element, procedure: &mut Procedure) {
    procedure.id = ctx.node_id(info.child_text("RecipeID"), "recipe");
    match info.child_text("RecipeName") {
        Some(name) => procedure.name = name,
        None => ctx.missing("RecipeName", "RecipeInfo"),
    }
    match info.child_text("RecipeVersion") {
        Some(version) => procedure.version = version,
        None => ctx.missing("RecipeVersion", "RecipeInfo"),
    }
    procedure.status = ctx.status(info.child_text("Status").as_deref());
    procedure.recipe_type = ctx.recipe_type(info.child_text("RecipeType").as_deref());
    procedure.product_code = info.child_text("ProductCode");
    procedure.product_name = info.child_text("ProductName");
    procedure.author = info.child_text("Author");
    procedure.description = info.child_text("Description");
    procedure.batch_size = info.child("BatchSize").map(|batch| BatchSize {
        min: ctx.number(batch.attribute("min"), "batch size min"),
        max: ctx.number(batch.attribute("max"), "batch size max"),
        nominal: ctx.number(batch.attribute("nominal"), "batch size nominal"),
        unit: batch.attribute_text("unit").unwrap_or_default(),
    });
    procedure.created = ctx.timestamp(info.child_text("CreationDate").as_deref());
    procedure.modified = ctx.timestamp(info.child_text("ModificationDate").as_deref());
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
    up.resource_requirements = element.child("Resources").map(|resources| ResourceRequirements {
        personnel: ctx.integer(resources.attribute("personnel"), "personnel"),
        room_class: resources.attribute_text("roomClass"),
    });

    if !element.has_child("Operation") {
        ctx.missing("Operation", &format!("unit procedure '{}'", up.name));
    }
    up.operations = element
        .children_named("Operation")
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

    if !element.has_child("PhaseInstance") {
        ctx.missing("PhaseInstance", &format!("operation '{}'", op.name));
    }
    op.phases = element
        .children_named("PhaseInstance")
        .enumerate()
        .map(|(position, element)| read_phase(ctx, element, position))
        .collect();
    op
}

fn read_phase(ctx: &mut ParseContext, element: &Element, position: usize) -> Phase {
    let sequence = ctx.sequence(element.attribute("sequence"), position);
    let name = ctx.node_name(element.child_text("Name"), "Phase", sequence);
    let mut phase = Phase::new(name, sequence);
    phase.id = ctx.node_id(element.attribute_text("id"), "phase");
    phase.phase_type = ctx.phase_type(element.attribute("buildingBlock"));
    phase.description = element.child_text("Description");
    phase.instructions = element.child_text("Instruction").unwrap_or_default();
    phase.duration = element
        .child("Duration")
        .and_then(|duration| ctx.duration(duration.attribute("value"), duration.attribute("unit")));
    phase.parameters = read_parameters(ctx, element);
    phase.materials = read_materials(ctx, element);
    phase.signatures = read_signatures(ctx, element);
    phase.interface_points = element
        .children_named("SystemInterface")
        .map(|interface| InterfacePoint {
            system: ctx.interface_system(interface.attribute("system")),
            direction: ctx.direction(interface.attribute("direction")),
            data_mappings: interface
                .children_named("DataMapping")
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
        .children_named("ParameterValue")
        .filter_map(|element| {
            let Some(name) = element.attribute_text("name") else {
                ctx.warn("ParameterValue without name skipped");
                return None;
            };
            let mut parameter = Parameter::new(name, ctx.data_type(element.attribute("dataType")));
            parameter.value = element.child_text("Value");
            parameter.default_value = element.child_text("DefaultValue");
            parameter.unit = element.child_text("Unit");
            parameter.min = ctx.number(element.child_text("LowerLimit").as_deref(), "parameter lower limit");
            parameter.max = ctx.number(element.child_text("UpperLimit").as_deref(), "parameter upper limit");
            parameter.required = ctx.flag(element.attribute("required"), false);
            Some(parameter)
        })
        .collect()
}

fn read_materials(ctx: &mut ParseContext, parent: &Element) -> Vec<Material> {
    parent
        .children_named("MaterialInput")
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
        .children_named("EquipmentRequirement")
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
        .children_named("SignatureRequirement")
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
