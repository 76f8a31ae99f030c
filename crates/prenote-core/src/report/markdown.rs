//! Markdown report, suitable for CI logs and review threads.

use std::path::Path;

use crate::model::CaseStatus;
use crate::report::RunReport;

#[must_use]
pub fn render_markdown(report: &RunReport) -> String {
    let mut lines = vec![
        "# Prenote run report".to_string(),
        String::new(),
        format!("- started_at: `{}`", report.started_at.to_rfc3339()),
        format!("- finished_at: `{}`", report.finished_at.to_rfc3339()),
        format!("- model: `{}` | prompt_version: `{}`", report.model, report.prompt_version),
        format!(
            "- total: **{}** | ok: **{}** | failed: **{}** | cancelled: **{}**",
            report.cases_total,
            report.cases_succeeded,
            report.cases_failed,
            report.cases_cancelled
        ),
        String::new(),
        "## Results".to_string(),
        String::new(),
        "| case | status | attempts | last failure |".to_string(),
        "|---|---|---:|---|".to_string(),
    ];

    for case in &report.cases {
        let status = match case.status {
            CaseStatus::Success => "OK",
            CaseStatus::SchemaFailureExhausted => "EXHAUSTED",
            CaseStatus::ModelCallFailure => "MODEL_FAIL",
            CaseStatus::Cancelled => "CANCELLED",
        };
        let failure = if case.status.is_success() {
            String::new()
        } else {
            let mut parts: Vec<String> =
                case.last_violations().iter().map(|v| v.to_string()).collect();
            if parts.is_empty() {
                parts.push(case.message.clone());
            }
            parts.join("; ").replace('|', "&#124;")
        };
        lines.push(format!(
            "| `{}` | **{}** | {} | {} |",
            case.case_id,
            status,
            case.attempts.len(),
            failure
        ));
    }

    lines.join("\n") + "\n"
}

pub fn write_markdown(report: &RunReport, out: &Path) -> anyhow::Result<()> {
    std::fs::write(out, render_markdown(report))?;
    Ok(())
}
