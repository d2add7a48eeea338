use super::check::print_diagnostic;
use super::{display_path, find_documents, OutputFormat, TargetArgs};
use crate::config::Config;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use plinth_engine::{
    BatchOutcome, DocumentReport, ExecutionSummary, Executor, MemoryCanvas, Notice, NoticeLevel,
};
use plinth_schema::ExecutionRequest;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Request documents, or directories searched for .json files
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    #[command(flatten)]
    pub target: TargetArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

pub async fn run(args: RunArgs, config: &Config, cwd: &Path) -> Result<()> {
    let files = find_documents(&args.paths, cwd)?;
    let documents = files
        .iter()
        .map(|path| {
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;
    let labels: Vec<String> = files.iter().map(|path| display_path(path, cwd)).collect();

    let request = args.target.request(documents)?;
    let (outcome, notices) = execute(&request, config, cwd).await?;
    report(&outcome, &labels, &notices, args.format)
}

/// Run a request against the configured canvas snapshot and save it back.
///
/// Returns the outcome together with the notices the host raised during the run.
pub async fn execute(
    request: &ExecutionRequest,
    config: &Config,
    cwd: &Path,
) -> Result<(BatchOutcome, Vec<Notice>)> {
    let registry = config.registry(cwd)?;
    let tokens = config.token_table(cwd)?;
    let executor = Executor::new(&registry)
        .with_guardrails(config.guardrails())
        .with_tokens(&tokens, config.unresolved_tokens);

    let canvas_path = config.canvas_path(cwd);
    let mut canvas = MemoryCanvas::load_or_default(&canvas_path)
        .with_context(|| format!("Failed to load canvas {}", canvas_path.display()))?;

    let outcome = executor.run_batch(&mut canvas, request).await;

    if let Some(parent) = canvas_path.parent() {
        fs::create_dir_all(parent)?;
    }
    canvas
        .save(&canvas_path)
        .with_context(|| format!("Failed to save canvas {}", canvas_path.display()))?;
    info!(
        canvas = %canvas_path.display(),
        nodes = canvas.len(),
        succeeded = outcome.succeeded(),
        failed = outcome.failed(),
        "Saved canvas snapshot"
    );

    Ok((outcome, canvas.notices().to_vec()))
}

#[derive(Serialize)]
struct LabeledReport<'a> {
    source: &'a str,
    #[serde(flatten)]
    report: DocumentReport,
}

/// Print the outcome and fail when any document failed
pub fn report(
    outcome: &BatchOutcome,
    labels: &[String],
    notices: &[Notice],
    format: OutputFormat,
) -> Result<()> {
    let reports = outcome.reports();

    match format {
        OutputFormat::Json => {
            let labeled: Vec<LabeledReport> = reports
                .into_iter()
                .map(|report| LabeledReport {
                    source: labels.get(report.index).map(String::as_str).unwrap_or(""),
                    report,
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&labeled)?);
        }
        OutputFormat::Text => print_reports(outcome, &reports, labels, notices),
    }

    if !outcome.is_success() {
        return Err(anyhow::anyhow!(
            "{} of {} documents failed",
            outcome.failed(),
            outcome.results.len()
        ));
    }

    Ok(())
}

fn print_reports(
    outcome: &BatchOutcome,
    reports: &[DocumentReport],
    labels: &[String],
    notices: &[Notice],
) {
    let verb = if outcome.intent.is_dry_run() {
        "Previewed"
    } else {
        "Applied"
    };

    for report in reports {
        let label = labels.get(report.index).map(String::as_str).unwrap_or("document");
        if let Some(summary) = &report.summary {
            print_summary(label, summary);
        }
        if let Some(error) = &report.error {
            println!("{} {}: {} {}", "✗".red(), label, error.kind.red().bold(), error.message);
            for diagnostic in &error.diagnostics {
                print_diagnostic(diagnostic);
            }
        }
    }

    for notice in notices {
        let level = match notice.level {
            NoticeLevel::Info => "notice".blue(),
            NoticeLevel::Warning => "notice".yellow(),
            NoticeLevel::Error => "notice".red(),
        };
        println!("  {} {}", level, notice.message);
    }

    println!();
    println!(
        "✨ {} {} of {} documents",
        if outcome.is_success() {
            verb.green().bold()
        } else {
            verb.red().bold()
        },
        outcome.succeeded(),
        outcome.results.len()
    );
}

fn print_summary(label: &str, summary: &ExecutionSummary) {
    println!(
        "{} {} → {} on {} {}",
        "✓".green(),
        label,
        summary.frame_name.bright_white(),
        summary.page,
        format!("({}/{}, {})", summary.surface_id, summary.slot_id, summary.mode).dimmed()
    );

    let counts = &summary.counts;
    println!(
        "    created {} · added {} · updated {} · removed {} · cleared {} · stale {}",
        counts.created, counts.added, counts.updated, counts.removed, counts.cleared, counts.stale
    );
    for warning in &summary.warnings {
        print_diagnostic(warning);
    }
    if !summary.empty_required_slots.is_empty() {
        println!(
            "    {} {}",
            "empty required slots:".yellow(),
            summary.empty_required_slots.join(", ")
        );
    }
}
