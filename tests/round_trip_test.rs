// Generate every dialect from one canonical procedure and read it back

use mes_recipe_bridge::models::{
    DataType, Material, Operation, Parameter, Phase, PhaseType, Procedure, Signature,
    SignatureType, UnitProcedure,
};
use mes_recipe_bridge::{generator_for, parser_for, GeneratorOptions, MesSystem, ParserOptions};

fn signature_tuples(phase: &Phase) -> Vec<(SignatureType, String, u32)> {
    phase
        .signatures
        .iter()
        .map(|signature| (signature.signature_type, signature.role.clone(), signature.order))
        .collect()
}

/// Two unit procedures, three operations, five phases with mixed signatures
fn granulation() -> Procedure {
    let mut procedure = Procedure::new("Wet Granulation");
    procedure.product_code = Some("FG-100".to_string());
    procedure.product_name = Some("Tablet 10 mg".to_string());

    let mut dispensing = UnitProcedure::new("Dispensing", 1);
    let mut weigh = Operation::new("Weigh", 1);
    let mut api = Phase::new("Weigh API", 1);
    api.instructions = "Tare the container, then weigh".to_string();
    api.signatures.push(Signature::new(SignatureType::Perform, "Operator", 1));
    api.signatures.push(Signature::new(SignatureType::Verify, "Supervisor", 2));
    api.materials.push(Material::new("API-7", "Active ingredient", 12.5, "kg"));
    let mut excipient = Phase::new("Weigh excipient", 2);
    excipient.phase_type = PhaseType::SemiAutomatic;
    excipient.signatures.push(Signature::new(SignatureType::Witness, "QA", 1));
    weigh.phases.push(api);
    weigh.phases.push(excipient);
    dispensing.operations.push(weigh);

    let mut granulating = UnitProcedure::new("Granulation", 2);
    let mut mix = Operation::new("Mix", 1);
    let mut blend = Phase::new("Blend", 1);
    blend.phase_type = PhaseType::Automatic;
    let mut speed = Parameter::new("Impeller speed", DataType::Integer);
    speed.value = Some("250".to_string());
    speed.min = Some(200.0);
    speed.max = Some(300.0);
    speed.unit = Some("rpm".to_string());
    blend.parameters.push(speed);
    mix.phases.push(blend);
    let mut dry = Operation::new("Dry", 2);
    let mut fluid_bed = Phase::new("Fluid bed drying", 1);
    fluid_bed.signatures.push(Signature::new(SignatureType::Approve, "QA Manager", 1));
    dry.phases.push(fluid_bed);
    dry.phases.push(Phase::new("Cool down", 2));
    granulating.operations.push(mix);
    granulating.operations.push(dry);

    procedure.unit_procedures.push(dispensing);
    procedure.unit_procedures.push(granulating);
    procedure
}

fn assert_structure_preserved(original: &Procedure, parsed: &Procedure, label: &str) {
    assert_eq!(parsed.unit_procedures.len(), original.unit_procedures.len(), "{}", label);
    for (up, parsed_up) in original.unit_procedures.iter().zip(&parsed.unit_procedures) {
        assert_eq!(parsed_up.sequence, up.sequence, "{}", label);
        assert_eq!(parsed_up.name, up.name, "{}", label);
        assert_eq!(parsed_up.operations.len(), up.operations.len(), "{}", label);
        for (op, parsed_op) in up.operations.iter().zip(&parsed_up.operations) {
            assert_eq!(parsed_op.sequence, op.sequence, "{}", label);
            assert_eq!(parsed_op.phases.len(), op.phases.len(), "{}", label);
            for (phase, parsed_phase) in op.phases.iter().zip(&parsed_op.phases) {
                assert_eq!(parsed_phase.sequence, phase.sequence, "{}", label);
                assert_eq!(parsed_phase.phase_type, phase.phase_type, "{}", label);
                assert_eq!(signature_tuples(parsed_phase), signature_tuples(phase), "{}", label);
            }
        }
    }
}

#[test]
fn test_round_trip_every_dialect() {
    let original = granulation();
    for system in MesSystem::ALL {
        let output = generator_for(system)
            .generate(&original, &GeneratorOptions::default())
            .expect("generation should succeed");
        let parsed = parser_for(system)
            .parse(&output.content, &ParserOptions::default())
            .expect("generated document should parse");

        assert_eq!(parsed.source_system, system);
        assert_eq!(parsed.procedure.name, original.name);
        assert_eq!(parsed.procedure.id, original.id);
        assert_eq!(parsed.source_version.as_deref(), Some(system.info().latest_version()));
        assert_structure_preserved(&original, &parsed.procedure, system.id());
    }
}

#[test]
fn test_round_trip_pharmasuite_b2mml() {
    let original = granulation();
    let mut options = GeneratorOptions::default();
    options.vendor.include_b2mml = true;
    let output = generator_for(MesSystem::PharmaSuite).generate(&original, &options).unwrap();
    assert!(output.content.contains("<BatchInformation "));

    let parsed = parser_for(MesSystem::PharmaSuite)
        .parse(&output.content, &ParserOptions::default())
        .unwrap();
    assert_structure_preserved(&original, &parsed.procedure, "b2mml");
    assert_eq!(parsed.procedure.product_code.as_deref(), Some("FG-100"));
}

#[test]
fn test_parameters_and_materials_survive() {
    let original = granulation();
    for system in MesSystem::ALL {
        let output = generator_for(system)
            .generate(&original, &GeneratorOptions::default())
            .unwrap();
        let parsed = parser_for(system).parse(&output.content, &ParserOptions::default()).unwrap();
        let procedure = parsed.procedure;

        let api = &procedure.unit_procedures[0].operations[0].phases[0];
        assert_eq!(api.materials.len(), 1, "{}", system);
        assert_eq!(api.materials[0].code, "API-7", "{}", system);
        assert_eq!(api.materials[0].quantity, 12.5, "{}", system);
        assert_eq!(api.instructions, "Tare the container, then weigh", "{}", system);

        let blend = &procedure.unit_procedures[1].operations[0].phases[0];
        let speed = &blend.parameters[0];
        assert_eq!(speed.name, "Impeller speed", "{}", system);
        assert_eq!(speed.data_type, DataType::Integer, "{}", system);
        assert_eq!(speed.value.as_deref(), Some("250"), "{}", system);
        assert_eq!((speed.min, speed.max), (Some(200.0), Some(300.0)), "{}", system);
    }
}

#[test]
fn test_escaping_round_trip() {
    let tricky = r#"<b>&"'</b>"#;
    let mut original = granulation();
    original.name = format!("Blend {}", tricky);
    original.description = Some(tricky.to_string());
    original.unit_procedures[0].operations[0].phases[0].instructions = tricky.to_string();
    // The provenance header is a comment, where markup characters are legal
    let options = GeneratorOptions {
        include_comments: false,
        ..Default::default()
    };

    for system in MesSystem::ALL {
        let output = generator_for(system).generate(&original, &options).unwrap();
        assert!(!output.content.contains(tricky), "{} leaked raw markup", system);
        assert!(output.content.contains("&lt;b&gt;&amp;"), "{}", system);

        let parsed = parser_for(system).parse(&output.content, &ParserOptions::default()).unwrap();
        assert_eq!(parsed.procedure.name, original.name, "{}", system);
        assert_eq!(parsed.procedure.description.as_deref(), Some(tricky), "{}", system);
        assert_eq!(
            parsed.procedure.unit_procedures[0].operations[0].phases[0].instructions,
            tricky,
            "{}",
            system
        );
    }
}

#[test]
fn test_sequential_transitions_are_synthesized() {
    let original = granulation();
    for system in MesSystem::ALL {
        let output = generator_for(system)
            .generate(&original, &GeneratorOptions::default())
            .unwrap();
        let parsed = parser_for(system).parse(&output.content, &ParserOptions::default()).unwrap();
        // 2 UPs, 2 ops in UP 2, 2 phases in Weigh, 2 phases in Dry
        assert_eq!(parsed.procedure.transitions.len(), 4, "{}", system);
    }
}
