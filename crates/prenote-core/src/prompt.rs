//! Deterministic prompt assembly.
//!
//! Fixed order: system instruction, task template (placeholders substituted
//! with the risk metadata and the intake record serialized verbatim), then —
//! on repair attempts only — the prior violation list as corrective feedback.
//! Pure: identical inputs yield byte-identical prompt text.

use crate::model::{IntakeRecord, RiskMetadata, Violation};

/// Bumped whenever the embedded templates change meaning.
pub const PROMPT_VERSION: &str = "v3";

pub const SYSTEM_PROMPT: &str = include_str!("../prompts/system.md");
pub const TASK_TEMPLATE: &str = include_str!("../prompts/task.md");

/// The two prompt texts a pipeline runs with. Defaults to the embedded
/// templates; callers may substitute their own revisions.
#[derive(Debug, Clone)]
pub struct PromptSet {
    pub system: String,
    pub task_template: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            system: SYSTEM_PROMPT.to_string(),
            task_template: TASK_TEMPLATE.to_string(),
        }
    }
}

/// Build the full prompt for one attempt.
///
/// `prior_violations` is empty on the first attempt; on repair attempts it is
/// the immediately preceding attempt's violation list, rendered verbatim so
/// the model can address every issue in one pass.
pub fn build_prompt(
    system: &str,
    task_template: &str,
    risk: &RiskMetadata,
    intake: &IntakeRecord,
    prior_violations: &[Violation],
) -> String {
    let risk_level = risk.risk_level.as_str();
    // Struct field order makes these serializations stable.
    let risk_flags = serde_json::to_string(&risk.risk_flags).unwrap_or_else(|_| "[]".into());
    let intake_json =
        serde_json::to_string(intake).unwrap_or_else(|_| "{}".into());

    let task = render_template(
        task_template,
        &[
            ("RISK_LEVEL", risk_level),
            ("RISK_FLAGS", risk_flags.as_str()),
            ("INTAKE_JSON", intake_json.as_str()),
        ],
    );

    let mut prompt = format!("{}\n\n{}", system.trim(), task.trim());

    if !prior_violations.is_empty() {
        prompt.push_str(
            "\n\nYour previous response violated the output contract. \
             Fix ALL of the following and return ONLY the corrected JSON object:\n",
        );
        for v in prior_violations {
            prompt.push_str(&format!("- {}\n", v));
        }
    }

    prompt
}

/// `{{KEY}}` substitution, recovered template mechanism of the task prompt.
fn render_template(template: &str, substitutions: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in substitutions {
        out = out.replace(&format!("{{{{{}}}}}", key), value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{codes, ChiefComplaint, RiskLevel, TimelineEvent};

    fn intake() -> IntakeRecord {
        IntakeRecord {
            patient: None,
            chief_complaint_category: ChiefComplaint::Rash,
            timeline: vec![TimelineEvent {
                date: "2026-03-01".parse().unwrap(),
                description: "rash appeared".into(),
                change: None,
                severity: None,
            }],
            measurements: None,
            modules: None,
            attachments: vec![],
        }
    }

    fn risk() -> RiskMetadata {
        RiskMetadata {
            risk_level: RiskLevel::Med,
            risk_flags: vec!["spreading_rash".into()],
        }
    }

    #[test]
    fn identical_inputs_yield_identical_prompts() {
        let violations = vec![Violation::new(codes::E_SCHEMA, "/summary", "missing")];
        let a = build_prompt(SYSTEM_PROMPT, TASK_TEMPLATE, &risk(), &intake(), &violations);
        let b = build_prompt(SYSTEM_PROMPT, TASK_TEMPLATE, &risk(), &intake(), &violations);
        assert_eq!(a, b, "prompt builder must be byte-deterministic");
    }

    #[test]
    fn substitutes_risk_and_intake_verbatim() {
        let p = build_prompt(SYSTEM_PROMPT, TASK_TEMPLATE, &risk(), &intake(), &[]);
        assert!(p.contains("risk_level: MED"));
        assert!(p.contains("\"spreading_rash\""));
        assert!(p.contains("\"chief_complaint_category\":\"rash\""));
        assert!(!p.contains("{{RISK_LEVEL}}"));
        assert!(!p.contains("{{INTAKE_JSON}}"));
    }

    #[test]
    fn first_attempt_has_no_feedback_section() {
        let p = build_prompt(SYSTEM_PROMPT, TASK_TEMPLATE, &risk(), &intake(), &[]);
        assert!(!p.contains("previous response violated"));
    }

    #[test]
    fn repair_attempt_lists_every_prior_violation() {
        let violations = vec![
            Violation::new(codes::E_SCHEMA, "/summary", "\"summary\" is a required property"),
            Violation::new(codes::E_RISK_ALTERED, "/risk_level", "risk_level altered"),
        ];
        let p = build_prompt(SYSTEM_PROMPT, TASK_TEMPLATE, &risk(), &intake(), &violations);
        assert!(p.contains("previous response violated"));
        assert!(p.contains("/summary"));
        assert!(p.contains(codes::E_RISK_ALTERED));
    }
}
