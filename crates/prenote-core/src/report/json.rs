//! Machine-readable report output.

use std::path::Path;

use crate::report::RunReport;

pub fn write_json(report: &RunReport, out: &Path) -> anyhow::Result<()> {
    std::fs::write(out, serde_json::to_string_pretty(report)?)?;
    Ok(())
}
