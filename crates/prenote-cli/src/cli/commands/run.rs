//! Batch run: load cases, drive the pipeline, persist artifacts and reports.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, warn};

use prenote_core::config::PipelineConfig;
use prenote_core::engine::{CancelFlag, Pipeline};
use prenote_core::intake::load_intake_value;
use prenote_core::model::{Case, CaseResult, RiskMetadata};
use prenote_core::prompt::{PromptSet, PROMPT_VERSION};
use prenote_core::providers::llm::{ModelClient, OpenAiClient, StubClient};
use prenote_core::report::{console, json, markdown, RunReport};
use prenote_core::schema::SchemaSet;
use prenote_core::validate::OutputValidator;

use crate::cli::args::{Provider, RunArgs};
use crate::exit_codes;

/// On-disk shape of one case file: the intake document plus the risk
/// metadata computed upstream.
#[derive(Deserialize)]
struct CaseFile {
    intake: Value,
    risk: RiskMetadata,
}

pub async fn run(args: RunArgs) -> anyhow::Result<i32> {
    let schemas = match SchemaSet::embedded() {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "embedded schemas failed to compile");
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };

    let cases = match load_cases(&args.cases, &schemas) {
        Ok(cases) => cases,
        Err(e) => {
            error!("{e:#}");
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };
    if cases.is_empty() {
        error!(dir = %args.cases.display(), "no case files found");
        return Ok(exit_codes::CONFIG_ERROR);
    }
    info!(count = cases.len(), dir = %args.cases.display(), "cases loaded");

    let client: Arc<dyn ModelClient> = match args.provider {
        Provider::Stub => Arc::new(StubClient),
        Provider::Openai => {
            let Some(api_key) = args.api_key.clone() else {
                error!("openai provider needs --api-key or OPENAI_API_KEY");
                return Ok(exit_codes::CONFIG_ERROR);
            };
            match &args.base_url {
                Some(base) => Arc::new(OpenAiClient::with_base_url(
                    args.model.clone(),
                    api_key,
                    base.clone(),
                )),
                None => Arc::new(OpenAiClient::new(args.model.clone(), api_key)),
            }
        }
    };

    let config = PipelineConfig {
        model: args.model.clone(),
        max_tokens: args.max_tokens,
        retry_limit: args.retries,
        parallel: args.parallel,
        model_timeout_secs: args.timeout_secs,
        retry_timeouts: args.retry_timeouts,
        prompt_version: PROMPT_VERSION.to_string(),
    };
    let validator = Arc::new(OutputValidator::embedded()?);
    let pipeline = Pipeline::new(client, validator, PromptSet::default(), config);

    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, draining in-flight cases");
                cancel.cancel();
            }
        });
    }

    let progress = console::default_progress_sink(cases.len());
    let report = pipeline.run_batch(cases, &cancel, progress).await?;

    fs::create_dir_all(&args.out)
        .with_context(|| format!("creating output dir {}", args.out.display()))?;
    write_artifacts(&args.out, &report.cases, !args.no_attempt_artifacts)?;
    json::write_json(&report, &args.out.join("report.json"))?;
    markdown::write_markdown(&report, &args.out.join("report.md"))?;
    console::print_table(&report);

    Ok(decide_exit(&report))
}

fn decide_exit(report: &RunReport) -> i32 {
    if report.all_succeeded() {
        exit_codes::SUCCESS
    } else {
        exit_codes::CASE_FAILURES
    }
}

/// Read every `*.json` in the cases directory, sorted by file name so runs
/// are reproducible. Any invalid case file fails the whole invocation; a
/// half-loaded batch is worse than no batch.
fn load_cases(dir: &Path, schemas: &SchemaSet) -> anyhow::Result<Vec<Case>> {
    let mut paths: Vec<_> = fs::read_dir(dir)
        .with_context(|| format!("reading cases dir {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut cases = Vec::with_capacity(paths.len());
    for path in paths {
        let id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("case")
            .to_string();
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("reading case file {}", path.display()))?;
        let file: CaseFile = serde_json::from_str(&raw)
            .with_context(|| format!("case file {} is not valid JSON", path.display()))?;
        let intake = load_intake_value(file.intake, &schemas.intake)
            .with_context(|| format!("case {id}: intake rejected"))?;
        cases.push(Case {
            id,
            intake,
            risk: file.risk,
        });
    }
    Ok(cases)
}

/// Persist per-case artifacts: the accepted output document, and optionally
/// the prompt/raw text of every attempt for review of repair behavior.
fn write_artifacts(out: &Path, cases: &[CaseResult], attempt_texts: bool) -> anyhow::Result<()> {
    for case in cases {
        if let Some(output) = &case.output {
            let path = out.join(format!("output_{}.json", case.case_id));
            let body = serde_json::to_string_pretty(output)?;
            fs::write(&path, body)
                .with_context(|| format!("writing {}", path.display()))?;
        }
        if !attempt_texts {
            continue;
        }
        for attempt in &case.attempts {
            let prompt_path = out.join(format!(
                "prompt_{}_a{}.txt",
                case.case_id, attempt.attempt_no
            ));
            fs::write(&prompt_path, &attempt.prompt)
                .with_context(|| format!("writing {}", prompt_path.display()))?;
            if let Some(raw) = &attempt.raw_text {
                let raw_path =
                    out.join(format!("raw_{}_a{}.txt", case.case_id, attempt.attempt_no));
                fs::write(&raw_path, raw)
                    .with_context(|| format!("writing {}", raw_path.display()))?;
            }
        }
    }
    Ok(())
}
