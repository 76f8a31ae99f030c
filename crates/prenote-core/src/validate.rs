//! Output contract validation.
//!
//! Standard schema validation plus the pipeline invariants a generic schema
//! cannot express: the safety assertion is literally `true`, the risk fields
//! equal the supplied risk metadata field-for-field, and the two list fields
//! stay within the five-item bound. Violations are returned as an ordered
//! list so one repair prompt can address every issue at once.

use jsonschema::Validator;
use serde_json::Value;
use tracing::debug;

use crate::errors::SchemaError;
use crate::model::{codes, OutputRecord, RiskMetadata, ValidationOutcome, Violation};
use crate::schema;

const LIST_BOUND: usize = 5;
const BOUNDED_LISTS: [&str; 2] = ["missing_info", "followup_questions"];

pub struct OutputValidator {
    schema: Validator,
}

impl OutputValidator {
    /// Compile a validator from an Output schema document.
    pub fn new(schema_json: &str) -> Result<Self, SchemaError> {
        Ok(Self {
            schema: schema::compile(schema_json)?,
        })
    }

    /// Validator for the Output schema shipped with this crate.
    pub fn embedded() -> Result<Self, SchemaError> {
        Self::new(schema::OUTPUT_SCHEMA_JSON)
    }

    pub fn from_compiled(schema: Validator) -> Self {
        Self { schema }
    }

    /// Validate one parsed model response against the Output contract.
    pub fn validate(&self, parsed: &Value, risk: &RiskMetadata) -> ValidationOutcome {
        let mut violations: Vec<Violation> = self
            .schema
            .iter_errors(parsed)
            .map(|e| Violation::new(codes::E_SCHEMA, e.instance_path().to_string(), e.to_string()))
            .collect();

        self.check_safety_assertion(parsed, &mut violations);
        self.check_risk_integrity(parsed, risk, &mut violations);
        self.check_list_bounds(parsed, &mut violations);

        if !violations.is_empty() {
            debug!(count = violations.len(), "output rejected");
            return ValidationOutcome::Rejected(violations);
        }

        match serde_json::from_value::<OutputRecord>(parsed.clone()) {
            Ok(record) => ValidationOutcome::Accepted(Box::new(record)),
            // Schema-valid JSON that still fails typed deserialization is a
            // contract drift between schema and model types; reject, never
            // panic, so the case fails visibly instead of the batch.
            Err(e) => ValidationOutcome::Rejected(vec![Violation::new(
                codes::E_SCHEMA,
                "",
                format!("output deserialization failed: {e}"),
            )]),
        }
    }

    /// `safety.no_diagnosis_or_treatment` must be exactly `true`.
    fn check_safety_assertion(&self, parsed: &Value, violations: &mut Vec<Violation>) {
        let path = "/safety/no_diagnosis_or_treatment";
        let ok = parsed.pointer(path) == Some(&Value::Bool(true));
        if !ok && !violations.iter().any(|v| v.path == path) {
            violations.push(Violation::new(
                codes::E_SAFETY_ASSERTION,
                path,
                "safety.no_diagnosis_or_treatment must be exactly true",
            ));
        }
    }

    /// Output risk fields must equal the supplied risk metadata verbatim.
    /// Divergence is fatal to the attempt even if everything else is valid:
    /// the model must never originate or mutate risk assessment.
    fn check_risk_integrity(
        &self,
        parsed: &Value,
        risk: &RiskMetadata,
        violations: &mut Vec<Violation>,
    ) {
        let expected_level = serde_json::to_value(risk.risk_level).unwrap_or(Value::Null);
        if let Some(actual) = parsed.get("risk_level") {
            if *actual != expected_level {
                violations.push(Violation::new(
                    codes::E_RISK_ALTERED,
                    "/risk_level",
                    format!(
                        "risk_level must be copied verbatim: expected {expected_level}, got {actual}"
                    ),
                ));
            }
        }

        let expected_flags = serde_json::to_value(&risk.risk_flags).unwrap_or(Value::Null);
        if let Some(actual) = parsed.get("risk_flags") {
            if *actual != expected_flags {
                violations.push(Violation::new(
                    codes::E_RISK_ALTERED,
                    "/risk_flags",
                    format!(
                        "risk_flags must be copied verbatim: expected {expected_flags}, got {actual}"
                    ),
                ));
            }
        }
    }

    /// `missing_info` and `followup_questions` carry at most five entries.
    fn check_list_bounds(&self, parsed: &Value, violations: &mut Vec<Violation>) {
        for field in BOUNDED_LISTS {
            let path = format!("/{field}");
            if let Some(items) = parsed.get(field).and_then(Value::as_array) {
                if items.len() > LIST_BOUND && !violations.iter().any(|v| v.path == path) {
                    violations.push(Violation::new(
                        codes::E_LIST_BOUNDS,
                        path,
                        format!("{field} has {} entries, maximum is {LIST_BOUND}", items.len()),
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RiskLevel;
    use serde_json::json;

    fn risk() -> RiskMetadata {
        RiskMetadata {
            risk_level: RiskLevel::High,
            risk_flags: vec!["dyspnea_at_rest".into()],
        }
    }

    fn valid_output() -> Value {
        json!({
            "summary": "Adult with chest pressure since yesterday.",
            "draft_note": "Complaint: chest pressure. Timeline: 2026-03-01 pressure appeared.",
            "missing_info": ["smoking status unknown"],
            "followup_questions": ["When exactly did the pressure start?"],
            "risk_level": "HIGH",
            "risk_flags": ["dyspnea_at_rest"],
            "safety": {"no_diagnosis_or_treatment": true},
            "measurements": {"temperature": "unknown"}
        })
    }

    fn validator() -> OutputValidator {
        OutputValidator::embedded().unwrap()
    }

    #[test]
    fn accepts_compliant_output() {
        match validator().validate(&valid_output(), &risk()) {
            ValidationOutcome::Accepted(record) => {
                assert_eq!(record.risk_level, RiskLevel::High);
                assert_eq!(record.risk_flags, vec!["dyspnea_at_rest".to_string()]);
                assert_eq!(record.measurements.temperature, "unknown");
            }
            ValidationOutcome::Rejected(v) => panic!("expected acceptance, got {v:?}"),
        }
    }

    #[test]
    fn rejects_missing_safety_assertion() {
        let mut out = valid_output();
        out["safety"] = json!({});
        let outcome = validator().validate(&out, &risk());
        let ValidationOutcome::Rejected(violations) = outcome else {
            panic!("expected rejection");
        };
        assert!(violations
            .iter()
            .any(|v| v.path == "/safety/no_diagnosis_or_treatment"));
    }

    #[test]
    fn safety_assertion_false_is_rejected() {
        let mut out = valid_output();
        out["safety"]["no_diagnosis_or_treatment"] = json!(false);
        let outcome = validator().validate(&out, &risk());
        assert!(matches!(outcome, ValidationOutcome::Rejected(_)));
    }

    #[test]
    fn altered_risk_level_is_rejected_even_when_otherwise_valid() {
        let mut out = valid_output();
        out["risk_level"] = json!("LOW");
        let ValidationOutcome::Rejected(violations) = validator().validate(&out, &risk()) else {
            panic!("expected rejection");
        };
        assert!(violations
            .iter()
            .any(|v| v.code == codes::E_RISK_ALTERED && v.path == "/risk_level"));
    }

    #[test]
    fn altered_risk_flags_are_rejected() {
        let mut out = valid_output();
        out["risk_flags"] = json!(["dyspnea_at_rest", "invented_flag"]);
        let ValidationOutcome::Rejected(violations) = validator().validate(&out, &risk()) else {
            panic!("expected rejection");
        };
        assert!(violations
            .iter()
            .any(|v| v.code == codes::E_RISK_ALTERED && v.path == "/risk_flags"));
    }

    #[test]
    fn list_boundary_five_accepted_six_rejected() {
        let five: Vec<String> = (0..5).map(|i| format!("item {i}")).collect();
        let mut out = valid_output();
        out["missing_info"] = json!(five);
        out["followup_questions"] = json!([]);
        assert!(matches!(
            validator().validate(&out, &risk()),
            ValidationOutcome::Accepted(_)
        ));

        let six: Vec<String> = (0..6).map(|i| format!("item {i}")).collect();
        out["followup_questions"] = json!(six);
        let ValidationOutcome::Rejected(violations) = validator().validate(&out, &risk()) else {
            panic!("expected rejection");
        };
        assert!(violations.iter().any(|v| v.path == "/followup_questions"));
    }

    #[test]
    fn empty_lists_accepted() {
        let mut out = valid_output();
        out["missing_info"] = json!([]);
        out["followup_questions"] = json!([]);
        assert!(matches!(
            validator().validate(&out, &risk()),
            ValidationOutcome::Accepted(_)
        ));
    }

    #[test]
    fn missing_temperature_echo_names_the_field() {
        let mut out = valid_output();
        out["measurements"] = json!({});
        let ValidationOutcome::Rejected(violations) = validator().validate(&out, &risk()) else {
            panic!("expected rejection");
        };
        assert!(violations.iter().any(|v| {
            v.path.contains("measurements") || v.message.contains("temperature")
        }));
    }

    #[test]
    fn schema_violations_carry_the_instance_path() {
        let mut out = valid_output();
        out["summary"] = json!("x".repeat(801));
        let ValidationOutcome::Rejected(violations) = validator().validate(&out, &risk()) else {
            panic!("expected rejection");
        };
        assert!(violations
            .iter()
            .any(|v| v.code == codes::E_SCHEMA && v.path == "/summary"));
    }

    #[test]
    fn all_violations_reported_together() {
        let out = json!({
            "summary": "s",
            "draft_note": "d",
            "missing_info": (0..6).map(|i| format!("m{i}")).collect::<Vec<_>>(),
            "followup_questions": [],
            "risk_level": "LOW",
            "risk_flags": [],
            "safety": {},
            "measurements": {"temperature": "unknown"}
        });
        let ValidationOutcome::Rejected(violations) = validator().validate(&out, &risk()) else {
            panic!("expected rejection");
        };
        // Safety, risk_level, risk_flags, and the list bound all at once.
        assert!(violations.len() >= 3, "got {violations:?}");
        assert!(violations.iter().any(|v| v.code == codes::E_RISK_ALTERED));
        assert!(violations
            .iter()
            .any(|v| v.path == "/safety/no_diagnosis_or_treatment"));
    }
}
