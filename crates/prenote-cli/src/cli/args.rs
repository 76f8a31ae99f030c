//! Command-line surface of the `prenote` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "prenote",
    version,
    about = "Generate schema-validated pre-consultation note drafts from clinical intake records"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the generation pipeline over a directory of case files
    Run(RunArgs),
    /// Check an output document against the published output contract
    Validate(ValidateArgs),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Provider {
    /// Deterministic offline stub, no network
    Stub,
    /// OpenAI-compatible chat-completions endpoint
    Openai,
}

#[derive(Parser, Clone)]
pub struct RunArgs {
    /// Directory of case files (`<id>.json`, each holding intake + risk)
    #[arg(long, default_value = "cases")]
    pub cases: PathBuf,

    /// Output directory for per-case artifacts and reports
    #[arg(long, default_value = "out")]
    pub out: PathBuf,

    #[arg(long, value_enum, default_value_t = Provider::Stub)]
    pub provider: Provider,

    /// Model identifier passed to the provider and stamped into provenance
    #[arg(long, default_value = "stub")]
    pub model: String,

    /// API key for the openai provider
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Override the provider base URL (local gateways)
    #[arg(long)]
    pub base_url: Option<String>,

    #[arg(long, default_value_t = 800)]
    pub max_tokens: u32,

    /// Total attempts per case, repair re-prompts included
    #[arg(long, default_value_t = 3)]
    pub retries: u32,

    /// Cases drafted concurrently
    #[arg(long, default_value_t = 4)]
    pub parallel: usize,

    /// Per-attempt model deadline in seconds
    #[arg(long, default_value_t = 120)]
    pub timeout_secs: u64,

    /// Let a timed-out attempt spend a retry instead of ending the case
    #[arg(long)]
    pub retry_timeouts: bool,

    /// Skip writing per-attempt raw/prompt text artifacts
    #[arg(long)]
    pub no_attempt_artifacts: bool,
}

#[derive(Parser, Clone)]
pub struct ValidateArgs {
    /// Output document to check
    pub file: PathBuf,
}
