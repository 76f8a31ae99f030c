//! Run reports: machine-readable JSON, console table, markdown table.

pub mod console;
pub mod json;
pub mod markdown;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{CaseResult, CaseStatus};

#[derive(Debug, Clone, Copy)]
pub struct ProgressEvent {
    pub done: usize,
    pub total: usize,
}

pub type ProgressSink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Aggregate over one batch run. Cases appear in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Correlates the report with the artifact set of this invocation.
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub model: String,
    pub prompt_version: String,
    pub cases_total: usize,
    pub cases_succeeded: usize,
    pub cases_failed: usize,
    pub cases_cancelled: usize,
    pub cases: Vec<CaseResult>,
}

impl RunReport {
    pub fn from_cases(
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        model: String,
        prompt_version: String,
        cases: Vec<CaseResult>,
    ) -> Self {
        let count = |s: CaseStatus| cases.iter().filter(|c| c.status == s).count();
        let cases_succeeded = count(CaseStatus::Success);
        let cases_cancelled = count(CaseStatus::Cancelled);
        let cases_failed =
            count(CaseStatus::SchemaFailureExhausted) + count(CaseStatus::ModelCallFailure);
        Self {
            run_id: Uuid::new_v4(),
            started_at,
            finished_at,
            model,
            prompt_version,
            cases_total: cases.len(),
            cases_succeeded,
            cases_failed,
            cases_cancelled,
            cases,
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.cases_succeeded == self.cases_total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: &str, status: CaseStatus) -> CaseResult {
        CaseResult {
            case_id: id.into(),
            status,
            output: None,
            attempts: vec![],
            message: String::new(),
        }
    }

    #[test]
    fn counts_by_terminal_status() {
        let now = Utc::now();
        let report = RunReport::from_cases(
            now,
            now,
            "m".into(),
            "v3".into(),
            vec![
                result("a", CaseStatus::Success),
                result("b", CaseStatus::SchemaFailureExhausted),
                result("c", CaseStatus::ModelCallFailure),
                result("d", CaseStatus::Cancelled),
            ],
        );
        assert_eq!(report.cases_total, 4);
        assert_eq!(report.cases_succeeded, 1);
        assert_eq!(report.cases_failed, 2);
        assert_eq!(report.cases_cancelled, 1);
        assert!(!report.all_succeeded());
    }
}
