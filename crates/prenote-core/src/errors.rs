//! Failure taxonomy.
//!
//! Transport/model-boundary failures (`ModelError`) are terminal per attempt
//! and never retried by the schema-repair loop. Parse failures (`ParseError`)
//! fold into a validation rejection and are repaired by re-prompting. The
//! only error allowed to escape a whole run is a configuration problem
//! discovered before any case is processed (`SchemaError`).

use thiserror::Error;

/// Model-boundary failure. Not repairable by re-prompting with the same
/// inputs, so the repair loop treats any of these as terminal for the case.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("model unavailable: {0}")]
    Unavailable(String),
    #[error("model call timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
    #[error("model refused the request: {0}")]
    Refused(String),
}

impl ModelError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ModelError::Timeout { .. })
    }
}

/// Failure to extract a single JSON object from raw model text.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("no JSON object found in model output")]
    NoJsonObjectFound,
    #[error("malformed JSON in model output: {0}")]
    MalformedJson(String),
}

/// Configuration-time schema problem. Surfaced before any case runs.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to parse schema JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to compile schema: {0}")]
    Compile(String),
}

/// Intake record rejected at load time, before any generation.
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("failed to read intake: {0}")]
    Io(#[from] std::io::Error),
    #[error("intake is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("intake violates the intake contract ({} violation(s))", .0.len())]
    Invalid(Vec<crate::model::Violation>),
}
