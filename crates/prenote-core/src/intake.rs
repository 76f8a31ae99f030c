//! Intake loading and structural validation.
//!
//! An intake must pass the published Intake schema plus the invariants the
//! schema cannot express: a date-ordered timeline and the category-activated
//! mandatory blocks. All violations are collected and reported together.

use std::path::Path;

use jsonschema::Validator;
use serde_json::Value;
use tracing::debug;

use crate::errors::IntakeError;
use crate::model::{codes, ChiefComplaint, IntakeRecord, Violation};

/// Read an intake record from disk and validate it.
pub fn load_intake(path: &Path, schema: &Validator) -> Result<IntakeRecord, IntakeError> {
    let raw = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&raw)?;
    load_intake_value(value, schema)
}

/// Validate an already-parsed intake document and deserialize it.
pub fn load_intake_value(value: Value, schema: &Validator) -> Result<IntakeRecord, IntakeError> {
    let mut violations = schema_violations(&value, schema);
    if !violations.is_empty() {
        return Err(IntakeError::Invalid(violations));
    }

    let intake: IntakeRecord = serde_json::from_value(value)?;

    violations = check_invariants(&intake);
    if !violations.is_empty() {
        return Err(IntakeError::Invalid(violations));
    }

    debug!(
        category = ?intake.chief_complaint_category,
        events = intake.timeline.len(),
        "intake accepted"
    );
    Ok(intake)
}

fn schema_violations(value: &Value, schema: &Validator) -> Vec<Violation> {
    schema
        .iter_errors(value)
        .map(|e| Violation::new(codes::E_INTAKE, e.instance_path().to_string(), e.to_string()))
        .collect()
}

/// Invariants not expressible in the Intake schema. Returns all breaches.
pub fn check_invariants(intake: &IntakeRecord) -> Vec<Violation> {
    let mut violations = Vec::new();

    for pair in intake.timeline.windows(2) {
        if pair[1].date < pair[0].date {
            violations.push(Violation::new(
                codes::E_INTAKE,
                "/timeline",
                format!(
                    "timeline events out of order: {} precedes {}",
                    pair[1].date, pair[0].date
                ),
            ));
            break;
        }
    }

    match intake.chief_complaint_category {
        ChiefComplaint::Fever => {
            // The block must exist; an empty readings array means "measured
            // nothing" and renders downstream as the "unknown" sentinel.
            let has_block = intake
                .measurements
                .as_ref()
                .map(|m| m.temperature.is_some())
                .unwrap_or(false);
            if !has_block {
                violations.push(Violation::new(
                    codes::E_INTAKE,
                    "/measurements/temperature",
                    "measurements.temperature block is mandatory when category is fever",
                ));
            }
        }
        ChiefComplaint::ChestPainSob => {
            let has_triage = intake
                .modules
                .as_ref()
                .map(|m| m.adult_triage.is_some())
                .unwrap_or(false);
            if !has_triage {
                violations.push(Violation::new(
                    codes::E_INTAKE,
                    "/modules/adult_triage",
                    "modules.adult_triage is mandatory when category is chest_pain_sob",
                ));
            }
        }
        _ => {}
    }

    violations
}
