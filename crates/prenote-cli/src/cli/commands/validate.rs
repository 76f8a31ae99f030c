//! Standalone contract check for an output document.
//!
//! The risk-integrity check needs reference risk metadata; for a standalone
//! file the document's own risk fields serve as the reference, so that check
//! is vacuous here and the schema, safety and list-bound checks do the work.

use std::fs;

use anyhow::Context;
use serde_json::Value;
use tracing::error;

use prenote_core::model::{RiskLevel, RiskMetadata, ValidationOutcome};
use prenote_core::validate::OutputValidator;

use crate::cli::args::ValidateArgs;
use crate::exit_codes;

pub fn run(args: ValidateArgs) -> anyhow::Result<i32> {
    let raw = match fs::read_to_string(&args.file) {
        Ok(raw) => raw,
        Err(e) => {
            error!(file = %args.file.display(), error = %e, "cannot read file");
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };
    let value: Value = match serde_json::from_str(&raw) {
        Ok(v) => v,
        Err(e) => {
            error!(file = %args.file.display(), error = %e, "not valid JSON");
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };

    let validator = OutputValidator::embedded().context("compiling output schema")?;
    let risk = self_reference_risk(&value);

    match validator.validate(&value, &risk) {
        ValidationOutcome::Accepted(_) => {
            println!("{}: OK", args.file.display());
            Ok(exit_codes::SUCCESS)
        }
        ValidationOutcome::Rejected(violations) => {
            println!(
                "{}: {} violation(s)",
                args.file.display(),
                violations.len()
            );
            for v in &violations {
                println!("  {v}");
            }
            Ok(exit_codes::CASE_FAILURES)
        }
    }
}

/// Mirror the document's own risk fields; absent or malformed fields fall
/// back to a default that the integrity check will never compare against
/// (absence is a schema violation, not a risk-alteration).
fn self_reference_risk(value: &Value) -> RiskMetadata {
    let risk_level = value
        .get("risk_level")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or(RiskLevel::Low);
    let risk_flags = value
        .get("risk_flags")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default();
    RiskMetadata {
        risk_level,
        risk_flags,
    }
}
