//! Rockwell PharmaSuite recipe parser
//!
//! PharmaSuite exports recipes in two unrelated serializations under the
//! same format id: its native `PharmaSuiteRecipe` grammar and an ISA-95
//! B2MML `BatchInformation` document. The root element picks one of two
//! independent walkers; both build the same canonical procedure.

mod b2mml;
mod native;

use crate::converters::errors::ParseError;
use crate::converters::types::{ParseResult, ParserOptions};
use crate::systems::{MesSystem, B2MML_GRAMMAR};

use super::{open_document, version_attribute, ParseContext, RecipeParser};

pub struct PharmaSuiteParser;

impl RecipeParser for PharmaSuiteParser {
    fn system(&self) -> MesSystem {
        MesSystem::PharmaSuite
    }

    fn parse(&self, xml: &str, options: &ParserOptions) -> Result<ParseResult, ParseError> {
        let (doc, grammar) = open_document(self.info(), xml)?;
        let root = doc.root();
        let mut ctx = ParseContext::new(self.system(), &doc, options);
        let version = version_attribute(self.info(), root);

        let procedure = if grammar == B2MML_GRAMMAR {
            log::debug!("PharmaSuite document uses the B2MML grammar");
            b2mml::read_batch_information(&mut ctx, root)
        } else {
            native::read_recipe(&mut ctx, root)
        };

        ctx.finish(procedure, version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NATIVE: &str = r#"<PharmaSuiteRecipe xmlns="http://www.rockwellautomation.com/pharmasuite/recipe" version="9.0">
  <RecipeInfo>
    <RecipeID>PS-1</RecipeID>
    <RecipeName>Blending</RecipeName>
    <RecipeVersion>3</RecipeVersion>
  </RecipeInfo>
  <RecipeStructure>
    <UnitProcedure id="U1" sequence="1">
      <Name>Set-up</Name>
      <Operation id="O1" sequence="1">
        <Name>Prepare</Name>
        <PhaseInstance id="P1" sequence="1" buildingBlock="ManualInstruction">
          <Name>Weigh Material</Name>
          <SignatureRequirement type="Performer" order="1"><Role>Operator</Role></SignatureRequirement>
          <SignatureRequirement type="Verifier" order="2"><Role>Supervisor</Role></SignatureRequirement>
        </PhaseInstance>
      </Operation>
    </UnitProcedure>
  </RecipeStructure>
</PharmaSuiteRecipe>"#;

    const B2MML: &str = r#"<BatchInformation xmlns="http://www.mesa.org/xml/B2MML-V0600" schemaVersion="10.0">
  <MasterRecipe>
    <ID>PS-1</ID>
    <Version>3</Version>
    <Description>Blending</Description>
    <RecipeElement>
      <ID>U1</ID>
      <Description>Set-up</Description>
      <RecipeElementType>UnitProcedure</RecipeElementType>
      <Sequence>1</Sequence>
      <RecipeElement>
        <ID>O1</ID>
        <Description>Prepare</Description>
        <RecipeElementType>Operation</RecipeElementType>
        <Sequence>1</Sequence>
        <RecipeElement>
          <ID>P1</ID>
          <Description>Weigh Material</Description>
          <RecipeElementType>Phase</RecipeElementType>
          <Sequence>1</Sequence>
          <ExecutionType>ManualInstruction</ExecutionType>
          <Signature><Type>Performer</Type><Role>Operator</Role><Order>1</Order></Signature>
          <Signature><Type>Verifier</Type><Role>Supervisor</Role><Order>2</Order></Signature>
        </RecipeElement>
      </RecipeElement>
    </RecipeElement>
  </MasterRecipe>
</BatchInformation>"#;

    #[test]
    fn test_both_grammars_converge() {
        let native = PharmaSuiteParser.parse(NATIVE, &ParserOptions::default()).unwrap();
        let b2mml = PharmaSuiteParser.parse(B2MML, &ParserOptions::default()).unwrap();

        for result in [&native, &b2mml] {
            let procedure = &result.procedure;
            assert_eq!(procedure.id, "PS-1");
            assert_eq!(procedure.name, "Blending");
            assert_eq!(procedure.version, "3");
            let phase = &procedure.unit_procedures[0].operations[0].phases[0];
            assert_eq!(phase.id, "P1");
            assert_eq!(phase.name, "Weigh Material");
            assert_eq!(phase.signatures.len(), 2);
            assert_eq!(phase.signatures[1].role, "Supervisor");
        }
        assert_eq!(native.statistics.counts, b2mml.statistics.counts);
        assert_eq!(native.source_version.as_deref(), Some("9.0"));
        assert_eq!(b2mml.source_version.as_deref(), Some("10.0"));
    }

    #[test]
    fn test_can_parse_both_roots() {
        assert!(PharmaSuiteParser.can_parse(NATIVE));
        assert!(PharmaSuiteParser.can_parse(B2MML));
        assert!(!PharmaSuiteParser.can_parse(r#"<BatchInformation xmlns="urn:other"/>"#));
    }
}
