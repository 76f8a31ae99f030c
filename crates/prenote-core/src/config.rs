//! Pipeline configuration.
//!
//! An explicit immutable value threaded into the engine at construction.
//! Inner components (prompt builder, validator) stay pure; nothing in this
//! crate reads the environment or files on its own.

use crate::prompt::PROMPT_VERSION;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Model identifier handed to the provider, opaque to the pipeline.
    pub model: String,
    /// Generation cap handed to the provider per attempt.
    pub max_tokens: u32,
    /// Maximum generation attempts per case, first attempt included.
    pub retry_limit: u32,
    /// Bounded concurrency for batch runs.
    pub parallel: usize,
    /// Deadline per model call; an elapsed deadline is a `ModelTimeout`.
    pub model_timeout_secs: u64,
    /// Whether a `ModelTimeout` spends an attempt and the loop continues
    /// (`true`) or is terminal for the case like any other model-call
    /// failure (`false`, the default).
    pub retry_timeouts: bool,
    /// Stamped into accepted outputs' provenance.
    pub prompt_version: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: "stub".to_string(),
            max_tokens: 800,
            retry_limit: 3,
            parallel: 4,
            model_timeout_secs: 120,
            retry_timeouts: false,
            prompt_version: PROMPT_VERSION.to_string(),
        }
    }
}
