// Orchestrator behavior across the whole conversion matrix

use mes_recipe_bridge::converters::types::DetectionMethod;
use mes_recipe_bridge::models::{Operation, Phase, Procedure, Signature, SignatureType, UnitProcedure};
use mes_recipe_bridge::{
    convert, detect_mes_system, generate, generate_multiple, generator_info, parser_info,
    supported_conversions, ConversionError, ConversionRequest, GeneratorOptions, MesSystem,
    ParserOptions,
};

fn weigh_procedure() -> Procedure {
    let mut procedure = Procedure::new("Dispensing");
    let mut up = UnitProcedure::new("Set-up", 1);
    let mut op = Operation::new("Dispense", 1);
    let mut phase = Phase::new("Weigh Material", 1);
    phase.signatures.push(Signature::new(SignatureType::Perform, "Operator", 1));
    phase.signatures.push(Signature::new(SignatureType::Verify, "Supervisor", 2));
    op.phases.push(phase);
    up.operations.push(op);
    procedure.unit_procedures.push(up);
    procedure
}

fn document(system: MesSystem) -> String {
    generate(system.id(), &weigh_procedure(), &GeneratorOptions::default())
        .expect("generation should succeed")
        .content
}

fn request(source: Option<MesSystem>, target: &str) -> ConversionRequest {
    ConversionRequest {
        source_system: source.map(|system| system.id().to_string()),
        target_system: target.to_string(),
        ..Default::default()
    }
}

#[test]
fn test_same_system_is_always_rejected() {
    for system in MesSystem::ALL {
        let xml = document(system);
        let explicit = convert(&xml, &request(Some(system), system.id()));
        assert_eq!(explicit.unwrap_err(), ConversionError::SameSystem(system));

        let detected = convert(&xml, &request(None, system.id()));
        assert_eq!(detected.unwrap_err(), ConversionError::SameSystem(system));
    }
}

#[test]
fn test_every_pair_converts() {
    let pairs = supported_conversions();
    assert_eq!(pairs.len(), 20);

    for pair in pairs {
        let xml = document(pair.source);
        let result = convert(&xml, &request(None, pair.target.id()))
            .unwrap_or_else(|err| panic!("{} -> {} failed: {}", pair.source, pair.target, err));
        assert_eq!(result.source_system, pair.source);
        assert_eq!(result.target_system, pair.target);
        assert_eq!(result.parse_statistics.counts.signatures, 2);
        assert_eq!(result.generation_statistics.counts.signatures, 2);

        let reparsed = detect_mes_system(&result.content).expect("output should be detectable");
        assert_eq!(reparsed.system, pair.target);
    }
}

#[test]
fn test_generated_documents_detect_by_namespace() {
    for system in MesSystem::ALL {
        let detection = detect_mes_system(&document(system)).unwrap();
        assert_eq!(detection.system, system);
        assert_eq!(detection.confidence, 1.0);
        assert_eq!(detection.method, DetectionMethod::Namespace);
        assert_eq!(detection.namespace.as_deref(), Some(system.info().namespace));
        assert_eq!(detection.version.as_deref(), Some(system.info().latest_version()));
    }
}

#[test]
fn test_detection_failure_is_actionable() {
    let err = convert("<PurchaseOrder/>", &request(None, "moda")).unwrap_err();
    assert!(err.to_string().contains("pasx, syncade, pharmasuite, opcenter, moda"));
}

#[test]
fn test_unknown_source_id_lists_valid_ids() {
    let mut bad = request(None, "moda");
    bad.source_system = Some("mes9000".to_string());
    match convert(&document(MesSystem::PasX), &bad).unwrap_err() {
        ConversionError::UnknownSystem { id, valid } => {
            assert_eq!(id, "mes9000");
            assert_eq!(valid.len(), 5);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_explicit_source_skips_detection() {
    let result = convert(&document(MesSystem::Moda), &request(Some(MesSystem::Moda), "syncade")).unwrap();
    assert!(result.detection.is_none());
}

#[test]
fn test_preserved_sections_reach_the_result() {
    let mut options = GeneratorOptions::default();
    options.vendor.include_sampling_plans = true;
    let mut procedure = weigh_procedure();
    let mut ph = mes_recipe_bridge::models::Parameter::new("pH", mes_recipe_bridge::models::DataType::Real);
    ph.min = Some(6.5);
    procedure.unit_procedures[0].operations[0].phases[0].parameters.push(ph);
    let xml = generate("moda", &procedure, &options).unwrap().content;

    let mut req = request(None, "pasx");
    req.parser_options = ParserOptions {
        preserve_unmapped_data: true,
        ..Default::default()
    };
    let result = convert(&xml, &req).unwrap();
    let unmapped = result.unmapped_data.expect("unmapped data requested");
    assert!(unmapped.contains_key("SamplingPlans"));
    assert!(unmapped.contains_key("LimitsConfiguration"));
}

#[test]
fn test_generate_multiple_isolates_bad_ids() {
    let outputs = generate_multiple(&["pasx", "not-a-real-id"], &weigh_procedure(), &GeneratorOptions::default());
    assert_eq!(outputs.len(), 2);

    let pasx = &outputs["pasx"];
    assert!(!pasx.is_error());
    assert!(pasx.content.contains("<MasterRecipe "));

    let failed = &outputs["not-a-real-id"];
    assert_eq!(failed.format, "Error");
    assert!(failed.content.is_empty());
    assert_eq!(failed.warnings.len(), 1);
}

#[test]
fn test_generate_multiple_isolates_validation_failures() {
    let mut procedure = weigh_procedure();
    procedure.transitions.push(mes_recipe_bridge::models::Transition::new(
        mes_recipe_bridge::models::TransitionType::Sequential,
        "ghost",
        procedure.unit_procedures[0].id.clone(),
    ));
    let ids: Vec<&str> = MesSystem::ALL.iter().map(|system| system.id()).collect();
    let outputs = generate_multiple(&ids, &procedure, &GeneratorOptions::default());

    // Formats that store explicit edges refuse the dangling one
    for id in ["syncade", "opcenter"] {
        assert!(outputs[id].is_error(), "{}", id);
    }
    for id in ["pasx", "pharmasuite", "moda"] {
        assert!(!outputs[id].is_error(), "{}", id);
    }
}

#[test]
fn test_component_info() {
    let parsers = parser_info();
    let generators = generator_info();
    assert_eq!(parsers, generators);
    let pharmasuite = &parsers[2];
    assert_eq!(pharmasuite.id, "pharmasuite");
    assert_eq!(pharmasuite.vendor, "Rockwell Automation");
    assert_eq!(pharmasuite.root_element, "PharmaSuiteRecipe");
    assert!(!pharmasuite.supported_versions.is_empty());
}
