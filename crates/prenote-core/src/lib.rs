//! Prenote core: a generation-validation-repair pipeline that turns a
//! structured clinical intake record into a schema-validated Output JSON
//! (summary, draft note, missing-info list, follow-up questions, safety
//! flags) by prompting a text-generation model and enforcing strict
//! contract compliance on its response.
//!
//! The pipeline produces documentation only. It performs no medical
//! reasoning, and model responses containing out-of-contract content are
//! rejected structurally, attempt by attempt, until accepted or exhausted.
//!
//! Flow per case: intake → prompt → model → extract → validate → (on
//! rejection) repair re-prompt with the violation list → terminal
//! `CaseResult`. A batch of cases yields a `RunReport`.

pub mod config;
pub mod engine;
pub mod errors;
pub mod extract;
pub mod intake;
pub mod model;
pub mod prompt;
pub mod providers;
pub mod report;
pub mod schema;
pub mod validate;

pub use config::PipelineConfig;
pub use engine::{CancelFlag, Pipeline};
