//! Batch orchestration.
//!
//! Cases are independent units of work; a worker pool bounded by
//! `PipelineConfig::parallel` drives each case's repair loop. The report
//! preserves input order by slotting results by index, regardless of
//! completion timing. One case's terminal failure never aborts the batch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use super::Pipeline;
use crate::model::{Case, CaseResult, CaseStatus};
use crate::report::{ProgressEvent, ProgressSink, RunReport};

/// Cooperative cancellation handle for a whole run. Cancelling stops
/// launching new cases; in-flight attempts finish and are reported.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl Pipeline {
    /// Run a batch of cases to completion and assemble the report.
    ///
    /// The only error path is internal task plumbing; per-case failures are
    /// recorded in the report, never raised.
    pub async fn run_batch(
        &self,
        cases: Vec<Case>,
        cancel: &CancelFlag,
        progress: Option<ProgressSink>,
    ) -> anyhow::Result<RunReport> {
        let started_at = Utc::now();
        let total = cases.len();
        let case_ids: Vec<String> = cases.iter().map(|c| c.id.clone()).collect();

        let parallel = self.config.parallel.max(1);
        let sem = Arc::new(Semaphore::new(parallel));
        let mut join_set = JoinSet::new();
        let mut slots: Vec<Option<CaseResult>> = std::iter::repeat_with(|| None)
            .take(total)
            .collect();

        info!(total, parallel, model = %self.config.model, "starting batch run");

        for (idx, case) in cases.into_iter().enumerate() {
            if cancel.is_cancelled() {
                slots[idx] = Some(cancelled_result(&case.id));
                continue;
            }
            let permit = sem.clone().acquire_owned().await?;
            // A cancel may have landed while we waited for a worker slot.
            if cancel.is_cancelled() {
                slots[idx] = Some(cancelled_result(&case.id));
                continue;
            }
            let this = self.clone();
            join_set.spawn(async move {
                let _permit = permit;
                let result = this.run_case(&case).await;
                (idx, result)
            });
        }

        let mut done = slots.iter().filter(|s| s.is_some()).count();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, result)) => {
                    slots[idx] = Some(result);
                    done += 1;
                    if let Some(ref sink) = progress {
                        sink(ProgressEvent { done, total });
                    }
                }
                Err(e) => {
                    // The slot is back-filled below; we no longer know which
                    // index the lost task carried.
                    warn!(error = %e, "case task failed to complete");
                }
            }
        }

        let results: Vec<CaseResult> = slots
            .into_iter()
            .enumerate()
            .map(|(idx, slot)| {
                slot.unwrap_or_else(|| CaseResult {
                    case_id: case_ids[idx].clone(),
                    status: CaseStatus::ModelCallFailure,
                    output: None,
                    attempts: vec![],
                    message: "case task did not complete".to_string(),
                })
            })
            .collect();

        let report = RunReport::from_cases(
            started_at,
            Utc::now(),
            self.config.model.clone(),
            self.config.prompt_version.clone(),
            results,
        );
        info!(
            succeeded = report.cases_succeeded,
            failed = report.cases_failed,
            cancelled = report.cases_cancelled,
            "batch run finished"
        );
        Ok(report)
    }
}

fn cancelled_result(case_id: &str) -> CaseResult {
    CaseResult {
        case_id: case_id.to_string(),
        status: CaseStatus::Cancelled,
        output: None,
        attempts: vec![],
        message: "run cancelled before this case was launched".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::errors::ModelError;
    use crate::model::{ChiefComplaint, IntakeRecord, RiskLevel, RiskMetadata, TimelineEvent};
    use crate::prompt::PromptSet;
    use crate::providers::llm::ModelClient;
    use crate::validate::OutputValidator;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

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

    fn case(id: &str) -> Case {
        Case {
            id: id.into(),
            intake: intake(),
            risk: RiskMetadata {
                risk_level: RiskLevel::Low,
                risk_flags: vec![],
            },
        }
    }

    fn compliant_json() -> String {
        json!({
            "summary": "Rash since 2026-03-01.",
            "draft_note": "Complaint: rash. Timeline: 2026-03-01 rash appeared.",
            "missing_info": [],
            "followup_questions": [],
            "risk_level": "LOW",
            "risk_flags": [],
            "safety": {"no_diagnosis_or_treatment": true},
            "measurements": {"temperature": "unknown"}
        })
        .to_string()
    }

    /// Scripted client: pops one response per call; a response of `ERR`
    /// fails the call instead.
    struct ScriptedClient {
        responses: Mutex<Vec<String>>,
        delay_ms: u64,
    }

    #[async_trait]
    impl ModelClient for ScriptedClient {
        async fn generate(&self, _prompt: &str, _max_tokens: u32) -> Result<String, ModelError> {
            if self.delay_ms > 0 {
                tokio::time::sleep(tokio::time::Duration::from_millis(self.delay_ms)).await;
            }
            let mut resps = self.responses.lock().unwrap();
            if resps.is_empty() {
                return Err(ModelError::Unavailable("no more scripted responses".into()));
            }
            let text = resps.remove(0);
            if text == "ERR" {
                return Err(ModelError::Unavailable("scripted failure".into()));
            }
            Ok(text)
        }

        fn provider_name(&self) -> &'static str {
            "scripted"
        }
    }

    fn pipeline(responses: Vec<String>, parallel: usize) -> Pipeline {
        let config = PipelineConfig {
            parallel,
            ..PipelineConfig::default()
        };
        Pipeline::new(
            Arc::new(ScriptedClient {
                responses: Mutex::new(responses),
                delay_ms: 0,
            }),
            Arc::new(OutputValidator::embedded().unwrap()),
            PromptSet::default(),
            config,
        )
    }

    #[tokio::test]
    async fn report_preserves_input_order() {
        let n = 8;
        let responses = vec![compliant_json(); n];
        let p = pipeline(responses, 4);
        let cases: Vec<Case> = (0..n).map(|i| case(&format!("case-{i}"))).collect();
        let report = p.run_batch(cases, &CancelFlag::new(), None).await.unwrap();
        let ids: Vec<&str> = report.cases.iter().map(|c| c.case_id.as_str()).collect();
        let expected: Vec<String> = (0..n).map(|i| format!("case-{i}")).collect();
        assert_eq!(ids, expected.iter().map(String::as_str).collect::<Vec<_>>());
        assert!(report.all_succeeded());
    }

    #[tokio::test]
    async fn one_failing_case_never_aborts_the_batch() {
        let responses = vec![compliant_json(), "ERR".to_string(), compliant_json()];
        let p = pipeline(responses, 1);
        let cases = vec![case("a"), case("b"), case("c")];
        let report = p.run_batch(cases, &CancelFlag::new(), None).await.unwrap();
        assert_eq!(report.cases_total, 3);
        assert_eq!(report.cases_succeeded, 2);
        assert_eq!(report.cases_failed, 1);
        assert_eq!(report.cases[1].status, CaseStatus::ModelCallFailure);
    }

    #[tokio::test]
    async fn cancel_before_run_marks_all_cases_cancelled() {
        let p = pipeline(vec![], 2);
        let cancel = CancelFlag::new();
        cancel.cancel();
        let cases = vec![case("a"), case("b")];
        let report = p.run_batch(cases, &cancel, None).await.unwrap();
        assert_eq!(report.cases_cancelled, 2);
        assert!(report
            .cases
            .iter()
            .all(|c| c.status == CaseStatus::Cancelled));
    }

    #[tokio::test]
    async fn progress_sink_sees_every_completion() {
        let n = 5;
        let p = pipeline(vec![compliant_json(); n], 2);
        let cases: Vec<Case> = (0..n).map(|i| case(&format!("c{i}"))).collect();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = seen.clone();
        let sink: ProgressSink = Arc::new(move |ev: ProgressEvent| {
            sink_seen.lock().unwrap().push((ev.done, ev.total));
        });
        let report = p
            .run_batch(cases, &CancelFlag::new(), Some(sink))
            .await
            .unwrap();
        assert!(report.all_succeeded());
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), n);
        assert!(seen.iter().all(|&(_, t)| t == n));
        assert_eq!(seen.last().unwrap().0, n);
    }
}
