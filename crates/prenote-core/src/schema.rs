//! Published Intake and Output schemas, embedded and compiled once.
//!
//! Schemas are supplied contracts, not derived from the Rust types. A schema
//! that fails to parse or compile is a configuration error and is the only
//! failure allowed to abort a run before any case is processed.

use jsonschema::{Draft, Validator};
use serde_json::Value;

use crate::errors::SchemaError;

pub const INTAKE_SCHEMA_JSON: &str = include_str!("../schemas/intake.schema.json");
pub const OUTPUT_SCHEMA_JSON: &str = include_str!("../schemas/output.schema.json");

/// Compile a schema document. Our schema strategy is Draft 2020-12.
pub fn compile(schema_json: &str) -> Result<Validator, SchemaError> {
    let schema: Value = serde_json::from_str(schema_json)?;
    jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(&schema)
        .map_err(|e| SchemaError::Compile(e.to_string()))
}

/// The two compiled contracts the pipeline runs against.
pub struct SchemaSet {
    pub intake: Validator,
    pub output: Validator,
}

impl SchemaSet {
    /// Compile the schemas shipped with this crate.
    pub fn embedded() -> Result<Self, SchemaError> {
        Self::from_json(INTAKE_SCHEMA_JSON, OUTPUT_SCHEMA_JSON)
    }

    /// Compile externally supplied schema documents.
    pub fn from_json(intake_json: &str, output_json: &str) -> Result<Self, SchemaError> {
        Ok(Self {
            intake: compile(intake_json)?,
            output: compile(output_json)?,
        })
    }
}
