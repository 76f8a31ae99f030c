//! Human-readable console rendering: a per-case table and a progress sink.

use std::sync::{Arc, Mutex};

use crate::model::CaseStatus;
use crate::report::{ProgressEvent, ProgressSink, RunReport};

/// Format a single progress line. Deterministic, unit-testable.
#[must_use]
pub fn format_progress_line(done: usize, total: usize) -> String {
    format!("Running case {}/{}...", done, total)
}

/// For large batches, emit at most every this many cases (10% step).
pub(crate) fn progress_step(total: usize) -> usize {
    if total <= 10 {
        1
    } else {
        std::cmp::max(1, total / 10)
    }
}

/// Progress sink that throttles updates and prints to stderr.
/// Skips batches of one case; always emits on done == total.
pub fn default_progress_sink(total: usize) -> Option<ProgressSink> {
    if total <= 1 {
        return None;
    }
    let step = progress_step(total);
    let last_done = Arc::new(Mutex::new(0usize));
    Some(Arc::new(move |ev: ProgressEvent| {
        if ev.total == 0 {
            return;
        }
        let emit = ev.done == ev.total || ev.done % step == 0 || ev.done == 1;
        if emit {
            let mut g = last_done.lock().expect("progress lock");
            if ev.done > *g {
                *g = ev.done;
                eprintln!("{}", format_progress_line(ev.done, ev.total));
            }
        }
    }))
}

fn status_label(status: CaseStatus) -> &'static str {
    match status {
        CaseStatus::Success => "OK",
        CaseStatus::SchemaFailureExhausted => "EXHAUSTED",
        CaseStatus::ModelCallFailure => "MODEL_FAIL",
        CaseStatus::Cancelled => "CANCELLED",
    }
}

/// Render the per-case table. Failed cases show the last attempt's
/// violations so a reviewer can diagnose without re-running.
#[must_use]
pub fn render_table(report: &RunReport) -> String {
    let id_width = report
        .cases
        .iter()
        .map(|c| c.case_id.len())
        .chain(std::iter::once("case".len()))
        .max()
        .unwrap_or(4);

    let mut out = String::new();
    out.push_str(&format!(
        "{:<id_width$}  {:<10}  {:>8}  reason\n",
        "case", "status", "attempts"
    ));
    for case in &report.cases {
        let reason = if case.status.is_success() {
            String::new()
        } else {
            case.message.clone()
        };
        out.push_str(&format!(
            "{:<id_width$}  {:<10}  {:>8}  {}\n",
            case.case_id,
            status_label(case.status),
            case.attempts.len(),
            reason
        ));
        if !case.status.is_success() {
            for v in case.last_violations() {
                out.push_str(&format!("{:<id_width$}    - {}\n", "", v));
            }
        }
    }
    out.push_str(&format!(
        "\ntotal: {} | ok: {} | failed: {} | cancelled: {}\n",
        report.cases_total, report.cases_succeeded, report.cases_failed, report.cases_cancelled
    ));
    out
}

/// Print the table to stdout.
pub fn print_table(report: &RunReport) {
    print!("{}", render_table(report));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{codes, AttemptRecord, CaseResult, Violation};
    use chrono::Utc;

    #[test]
    fn table_shows_last_violations_for_failed_cases() {
        let now = Utc::now();
        let failed = CaseResult {
            case_id: "case-007".into(),
            status: CaseStatus::SchemaFailureExhausted,
            output: None,
            attempts: vec![AttemptRecord {
                attempt_no: 1,
                prompt: String::new(),
                raw_text: Some("{}".into()),
                violations: vec![Violation::new(
                    codes::E_SCHEMA,
                    "/summary",
                    "\"summary\" is a required property",
                )],
                model_error: None,
                duration_ms: None,
            }],
            message: "retry limit of 1 exhausted".into(),
        };
        let report =
            RunReport::from_cases(now, now, "m".into(), "v3".into(), vec![failed]);
        let table = render_table(&report);
        assert!(table.contains("case-007"));
        assert!(table.contains("EXHAUSTED"));
        assert!(table.contains("/summary"));
    }

    #[test]
    fn progress_step_scales() {
        assert_eq!(progress_step(5), 1);
        assert_eq!(progress_step(100), 10);
    }
}
