//! Offline stub provider.
//!
//! Returns a deterministic, contract-conforming object so the whole pipeline
//! can run end-to-end without a model backend. The risk block is read back
//! out of the prompt (where the builder placed it verbatim), because a stub
//! that invented risk values would be rejected by the risk-integrity check
//! like any other misbehaving model.

use async_trait::async_trait;
use serde_json::json;

use super::ModelClient;
use crate::errors::ModelError;

pub struct StubClient;

impl StubClient {
    /// Pull a `key: value` line out of the prompt's risk metadata block.
    fn prompt_field<'a>(prompt: &'a str, key: &str) -> Option<&'a str> {
        prompt.lines().find_map(|line| {
            line.strip_prefix(key)
                .and_then(|rest| rest.strip_prefix(':'))
                .map(str::trim)
        })
    }
}

#[async_trait]
impl ModelClient for StubClient {
    async fn generate(&self, prompt: &str, _max_tokens: u32) -> Result<String, ModelError> {
        let risk_level = Self::prompt_field(prompt, "risk_level").unwrap_or("LOW");
        let risk_flags: serde_json::Value = Self::prompt_field(prompt, "risk_flags")
            .and_then(|s| serde_json::from_str(s).ok())
            .unwrap_or_else(|| json!([]));

        let output = json!({
            "summary": "Stub summary. Configure a real provider to generate clinical text.",
            "draft_note": "Stub draft note. Facts only. Clinician review required.",
            "missing_info": ["stub provider active, no real generation performed"],
            "followup_questions": [],
            "risk_level": risk_level,
            "risk_flags": risk_flags,
            "safety": {"no_diagnosis_or_treatment": true, "notes": ["Human-in-the-loop."]},
            "measurements": {"temperature": "unknown"}
        });

        Ok(output.to_string())
    }

    fn provider_name(&self) -> &'static str {
        "stub"
    }
}
