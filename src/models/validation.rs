//! Advisory validation of a canonical procedure
//!
//! Missing identity fields and dangling transition endpoints are errors;
//! empty levels of the hierarchy are only warnings. Callers decide whether
//! to abort on errors.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::core::Procedure;

/// Outcome of [`validate`]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn from_findings(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.valid = false;
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

/// Check a procedure against the canonical model rules
pub fn validate(procedure: &Procedure) -> ValidationReport {
    let mut report = ValidationReport::from_findings(Vec::new(), Vec::new());

    if procedure.name.trim().is_empty() {
        report.error("Procedure name is required");
    }
    if procedure.version.trim().is_empty() {
        report.error("Procedure version is required");
    }

    if procedure.unit_procedures.is_empty() {
        report.warning("Procedure has no unit procedures");
    }
    for up in &procedure.unit_procedures {
        if up.operations.is_empty() {
            report.warning(format!("Unit procedure '{}' has no operations", up.name));
        }
        for op in &up.operations {
            if op.phases.is_empty() {
                report.warning(format!("Operation '{}' has no phases", op.name));
            }
        }
    }

    let ids: HashSet<&str> = procedure.node_ids().into_iter().collect();
    for transition in &procedure.transitions {
        if !ids.contains(transition.source_id.as_str()) {
            report.error(format!(
                "Transition {} references unknown source id '{}'",
                transition.id, transition.source_id
            ));
        }
        if !ids.contains(transition.target_id.as_str()) {
            report.error(format!(
                "Transition {} references unknown target id '{}'",
                transition.id, transition.target_id
            ));
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Operation, Phase, Transition, TransitionType, UnitProcedure};

    fn complete_procedure() -> Procedure {
        let mut procedure = Procedure::new("Tablet Compression");
        let mut up = UnitProcedure::new("Compression", 1);
        let mut op = Operation::new("Press", 1);
        op.phases.push(Phase::new("Start press", 1));
        up.operations.push(op);
        procedure.unit_procedures.push(up);
        procedure
    }

    #[test]
    fn test_complete_procedure_is_valid() {
        let report = validate(&complete_procedure());
        assert!(report.valid);
        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_empty_name_is_error() {
        let mut procedure = complete_procedure();
        procedure.name = "  ".to_string();
        let report = validate(&procedure);
        assert!(!report.valid);
        assert!(report.errors.iter().any(|e| e.contains("name")));
    }

    #[test]
    fn test_missing_version_is_error() {
        let mut procedure = complete_procedure();
        procedure.version.clear();
        assert!(!validate(&procedure).valid);
    }

    #[test]
    fn test_empty_levels_are_warnings_only() {
        let mut procedure = Procedure::new("Empty");
        let report = validate(&procedure);
        assert!(report.valid);
        assert_eq!(report.warnings.len(), 1);

        procedure.unit_procedures.push(UnitProcedure::new("Idle", 1));
        procedure.unit_procedures[0].operations.push(Operation::new("Idle op", 1));
        let report = validate(&procedure);
        assert!(report.valid);
        assert!(report.warnings.iter().any(|w| w.contains("no phases")));
    }

    #[test]
    fn test_dangling_transition_is_error() {
        let mut procedure = complete_procedure();
        let up_id = procedure.unit_procedures[0].id.clone();
        procedure
            .transitions
            .push(Transition::new(TransitionType::Sequential, up_id, "missing-node"));
        let report = validate(&procedure);
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("missing-node"));
    }
}
