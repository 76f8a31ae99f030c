//! Data model for the intake → draft-note generation pipeline.
//!
//! `IntakeRecord` and `RiskMetadata` are inputs; `OutputRecord` is the
//! generation target the model must satisfy; `AttemptRecord`, `CaseResult`
//! and the statuses are the pipeline's own bookkeeping.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Stable machine-readable violation codes.
///
/// Downstream tooling branches on these, not on the message text.
pub mod codes {
    /// Generic schema violation (required field, type, enum, bounds).
    pub const E_SCHEMA: &str = "E_SCHEMA";
    /// No parseable JSON object in the raw model text.
    pub const E_UNPARSABLE_OUTPUT: &str = "E_UNPARSABLE_OUTPUT";
    /// Output risk fields diverge from the supplied risk metadata.
    pub const E_RISK_ALTERED: &str = "E_RISK_ALTERED";
    /// `safety.no_diagnosis_or_treatment` is not literally `true`.
    pub const E_SAFETY_ASSERTION: &str = "E_SAFETY_ASSERTION";
    /// `missing_info` / `followup_questions` exceed the five-item bound.
    pub const E_LIST_BOUNDS: &str = "E_LIST_BOUNDS";
    /// Structural intake invariant breach (pre-generation).
    pub const E_INTAKE: &str = "E_INTAKE";
}

/// Chief complaint category of an intake, closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChiefComplaint {
    CoughColdChild,
    Fever,
    AbdominalPain,
    Rash,
    ChestPainSob,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Female,
    Male,
    Other,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub age_years: f64,
    pub sex: Sex,
}

/// Direction of change reported for a timeline event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeMarker {
    Appeared,
    Worsened,
    Improved,
    Resolved,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub date: NaiveDate,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<ChangeMarker>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemperatureReading {
    pub date: NaiveDate,
    pub celsius: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Measurements {
    /// Ordered time/value pairs. Present-but-empty means "measured nothing",
    /// which renders downstream as the `"unknown"` sentinel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Vec<TemperatureReading>>,
}

/// Adult chest-pain / shortness-of-breath triage block.
///
/// Required when the chief complaint is `chest_pain_sob`; the pipeline only
/// checks presence and shape, never interprets the answers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdultTriage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pain_character: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radiation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dyspnea_at_rest: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syncope: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Modules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adult_triage: Option<AdultTriage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Photo,
    Document,
    LabReport,
    Other,
}

/// Reference to an uploaded artifact. Only kind and filename travel through
/// the pipeline; raw content is never read or interpreted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub kind: AttachmentKind,
    pub filename: String,
}

/// Structured pre-visit patient narrative. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient: Option<Patient>,
    pub chief_complaint_category: ChiefComplaint,
    pub timeline: Vec<TimelineEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurements: Option<Measurements>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modules: Option<Modules>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentRef>,
}

/// Externally computed risk severity. Wire form is `LOW` / `MED` / `HIGH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Med,
    High,
}

impl RiskLevel {
    /// Wire-form rendering, identical to the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Med => "MED",
            RiskLevel::High => "HIGH",
        }
    }
}

/// Rule-based risk assessment computed outside the pipeline.
///
/// Passed through verbatim into the output; the pipeline must never derive,
/// alter, or invent these fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskMetadata {
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub risk_flags: Vec<String>,
}

/// One unit of work: an intake plus its externally supplied risk metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
    pub id: String,
    pub intake: IntakeRecord,
    pub risk: RiskMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Safety {
    pub no_diagnosis_or_treatment: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

/// Key-measurement echo the model must always fill, `"unknown"` when the
/// intake supplied no reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputMeasurements {
    pub temperature: String,
}

/// Pipeline-stamped generation metadata. Attached after acceptance; never
/// requested from or trusted to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provenance {
    pub model: String,
    pub prompt_version: String,
    pub generated_at: DateTime<Utc>,
    pub attempt: u32,
}

/// The generation target: one schema-conforming output per case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputRecord {
    pub summary: String,
    pub draft_note: String,
    pub missing_info: Vec<String>,
    pub followup_questions: Vec<String>,
    pub risk_level: RiskLevel,
    pub risk_flags: Vec<String>,
    pub safety: Safety,
    pub measurements: OutputMeasurements,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
}

/// One schema or pipeline-invariant breach, addressed by schema path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub code: String,
    pub path: String,
    pub message: String,
}

impl Violation {
    pub fn new(code: &str, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.path, self.message)
    }
}

/// Outcome of validating one parsed model response.
#[derive(Debug, Clone)]
pub enum ValidationOutcome {
    Accepted(Box<OutputRecord>),
    Rejected(Vec<Violation>),
}

/// One Drafting → Validating cycle, kept for the report and raw artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub attempt_no: u32,
    /// Exact prompt sent to the model. Written out as a per-attempt
    /// artifact by the caller; not embedded in the report JSON.
    #[serde(skip)]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<Violation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// Terminal status of one case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Success,
    SchemaFailureExhausted,
    ModelCallFailure,
    Cancelled,
}

impl CaseStatus {
    pub fn is_success(self) -> bool {
        matches!(self, CaseStatus::Success)
    }
}

/// Terminal record for one case. Immutable once finalized by the runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseResult {
    pub case_id: String,
    pub status: CaseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputRecord>,
    pub attempts: Vec<AttemptRecord>,
    pub message: String,
}

impl CaseResult {
    /// Violation list from the last attempt, empty when there is none.
    /// This is what a reviewer needs to diagnose a failed case.
    pub fn last_violations(&self) -> &[Violation] {
        self.attempts
            .last()
            .map(|a| a.violations.as_slice())
            .unwrap_or(&[])
    }
}
