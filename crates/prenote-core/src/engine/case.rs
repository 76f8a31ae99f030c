//! Per-case repair loop.
//!
//! Drafting → Validating → {Accepted | Repairing | Exhausted}. A parse
//! failure folds into a rejection with a single synthetic unparsable-output
//! violation and drives a repair like any schema violation. A model-call
//! failure is terminal: re-prompting with the same inputs cannot fix a
//! transport problem (a timeout optionally spends an attempt instead, see
//! `PipelineConfig::retry_timeouts`).

use std::time::Instant;

use chrono::Utc;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

use super::Pipeline;
use crate::errors::ModelError;
use crate::extract::extract_output_object;
use crate::model::{
    codes, AttemptRecord, Case, CaseResult, CaseStatus, Provenance, ValidationOutcome, Violation,
};
use crate::prompt::build_prompt;

impl Pipeline {
    /// Drive one case to a terminal state. Never panics, never returns an
    /// error: every failure mode lands in the `CaseResult` as data.
    pub async fn run_case(&self, case: &Case) -> CaseResult {
        let max_attempts = self.config.retry_limit.max(1);
        let mut attempts: Vec<AttemptRecord> = Vec::new();
        let mut prior: Vec<Violation> = Vec::new();

        for attempt_no in 1..=max_attempts {
            let prompt = build_prompt(
                &self.prompts.system,
                &self.prompts.task_template,
                &case.risk,
                &case.intake,
                &prior,
            );

            let started = Instant::now();
            let generated = self.generate_with_deadline(&prompt).await;
            let duration_ms = Some(started.elapsed().as_millis() as u64);

            let raw = match generated {
                Ok(raw) => raw,
                Err(e) => {
                    attempts.push(AttemptRecord {
                        attempt_no,
                        prompt,
                        raw_text: None,
                        violations: vec![],
                        model_error: Some(e.to_string()),
                        duration_ms,
                    });

                    if e.is_timeout() && self.config.retry_timeouts && attempt_no < max_attempts {
                        warn!(case_id = %case.id, attempt_no, "model call timed out, retrying");
                        continue;
                    }

                    warn!(case_id = %case.id, attempt_no, error = %e, "model call failed, case terminal");
                    return CaseResult {
                        case_id: case.id.clone(),
                        status: CaseStatus::ModelCallFailure,
                        output: None,
                        attempts,
                        message: e.to_string(),
                    };
                }
            };

            let outcome = match extract_output_object(&raw) {
                Ok(parsed) => self.validator.validate(&parsed, &case.risk),
                Err(e) => ValidationOutcome::Rejected(vec![Violation::new(
                    codes::E_UNPARSABLE_OUTPUT,
                    "",
                    e.to_string(),
                )]),
            };

            match outcome {
                ValidationOutcome::Accepted(mut record) => {
                    record.provenance = Some(Provenance {
                        model: self.config.model.clone(),
                        prompt_version: self.config.prompt_version.clone(),
                        generated_at: Utc::now(),
                        attempt: attempt_no,
                    });
                    attempts.push(AttemptRecord {
                        attempt_no,
                        prompt,
                        raw_text: Some(raw),
                        violations: vec![],
                        model_error: None,
                        duration_ms,
                    });
                    info!(case_id = %case.id, attempt_no, "output accepted");
                    return CaseResult {
                        case_id: case.id.clone(),
                        status: CaseStatus::Success,
                        output: Some(*record),
                        attempts,
                        message: format!("accepted on attempt {attempt_no}"),
                    };
                }
                ValidationOutcome::Rejected(violations) => {
                    debug!(
                        case_id = %case.id,
                        attempt_no,
                        violations = violations.len(),
                        "output rejected"
                    );
                    attempts.push(AttemptRecord {
                        attempt_no,
                        prompt,
                        raw_text: Some(raw),
                        violations: violations.clone(),
                        model_error: None,
                        duration_ms,
                    });
                    // Repairing: the next prompt carries this violation list.
                    prior = violations;
                }
            }
        }

        let message = match prior.first() {
            Some(first) => format!(
                "retry limit of {max_attempts} exhausted; last attempt had {} violation(s), first: {first}",
                prior.len()
            ),
            None => format!("retry limit of {max_attempts} exhausted"),
        };
        warn!(case_id = %case.id, %message, "case exhausted");
        CaseResult {
            case_id: case.id.clone(),
            status: CaseStatus::SchemaFailureExhausted,
            output: None,
            attempts,
            message,
        }
    }

    async fn generate_with_deadline(&self, prompt: &str) -> Result<String, ModelError> {
        let deadline = Duration::from_secs(self.config.model_timeout_secs);
        match timeout(deadline, self.client.generate(prompt, self.config.max_tokens)).await {
            Ok(result) => result,
            Err(_) => Err(ModelError::Timeout {
                timeout_secs: self.config.model_timeout_secs,
            }),
        }
    }
}
