//! `inventory-checkr` — normalize software inventory exports into a canonical catalog.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]).
//! 2. Load config ([`config::load_config`]) and start logging ([`logging`]).
//! 3. Open the rule and disposition stores ([`store`]).
//!    Apply any `--set-disposition` administrative updates, then answer
//!    `--check-rules` and `--explain`.
//! 4. Collect input files and read their rows ([`detector`], [`input`]).
//! 5. Run one analysis per file, concurrently ([`pipeline::analyze`]).
//! 6. Render the requested report ([`report`]).
//! 7. Exit `0`, or `1` when a run failed or `--strict` finds unmapped entries.

mod cli;
mod config;
mod detector;
mod input;
mod logging;
mod models;
mod pipeline;
mod report;
mod rules;
mod store;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use cli::{Cli, ReportFormat};
use config::load_config;
use detector::collect_inputs;
use input::EntrySource;
use models::{Disposition, DispositionRecord, InputFormat, InventoryEntry};
use report::FileReport;
use rules::RuleSet;
use store::{DispositionStore, RuleStore};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let cwd = std::env::current_dir().context("cannot determine working directory")?;
    let config = load_config(&cwd, cli.config.as_deref())?;
    logging::init(cli.debug, config.logging.level.as_deref());

    let rule_store = config.rule_store(cli.rules.as_deref());
    let disposition_store = config.disposition_store(cli.dispositions.as_deref());

    if !cli.set_disposition.is_empty() {
        apply_disposition_updates(disposition_store.as_ref(), &cli.set_disposition)?;
    }

    if cli.check_rules {
        let clean = check_rules(rule_store.as_ref())?;
        if !clean {
            std::process::exit(1);
        }
    }

    if !cli.explain.is_empty() {
        explain_names(rule_store.as_ref(), &cli.explain, cli.report)?;
    }

    if cli.inputs.is_empty() {
        return Ok(());
    }

    let inputs = collect_inputs(&cli.inputs);
    if inputs.is_empty() {
        eprintln!("No .json or .csv inventory files found");
        std::process::exit(1);
    }

    let show_progress = !cli.quiet && matches!(cli.report, ReportFormat::Terminal);
    let (reports, failures) =
        run_analyses(inputs, rule_store, disposition_store, show_progress).await?;

    match cli.report {
        ReportFormat::Terminal => {
            report::terminal::render(&reports, cli.verbose, cli.quiet)?;
        }
        ReportFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
    }

    let has_unmapped = reports.iter().any(|r| !r.analysis.unmapped.is_empty());
    if failures > 0 || (cli.strict && has_unmapped) {
        std::process::exit(1);
    }

    Ok(())
}

/// Print rules whose patterns cannot be compiled. Returns `true` when the rule set is clean.
fn check_rules(rule_store: &dyn RuleStore) -> Result<bool> {
    let snapshot = RuleSet::load(rule_store)?;
    let invalid = snapshot.invalid_patterns();

    eprintln!(
        "  {} {} exclusion rules, {} mapping rules",
        "→".cyan(),
        snapshot.exclusions().len(),
        snapshot.mappings().len()
    );

    for bad in &invalid {
        eprintln!(
            "  {} {} rule {}: {} ({})",
            "✗".red(),
            bad.kind,
            bad.rule_id,
            bad.pattern,
            bad.error
        );
    }

    Ok(invalid.is_empty())
}

/// Print every rule matching each name, marking the one that decides it.
fn explain_names(rule_store: &dyn RuleStore, names: &[String], format: ReportFormat) -> Result<()> {
    let snapshot = RuleSet::load(rule_store)?;
    let explanations: Vec<_> = names.iter().map(|n| snapshot.explain(n)).collect();

    if matches!(format, ReportFormat::Json) {
        println!("{}", serde_json::to_string_pretty(&explanations)?);
        return Ok(());
    }

    for explanation in &explanations {
        println!("{}", explanation.name.bold());
        let winner = explanation.winner();
        for hit in explanation.exclusions.iter().chain(&explanation.mappings) {
            let marker = if winner == Some(hit) { "✓".green() } else { "·".dimmed() };
            println!(
                "  {} {} rule {} ({} \"{}\") → {}",
                marker, hit.kind, hit.rule_id, hit.pattern_type, hit.pattern, hit.outcome
            );
        }
        if winner.is_none() {
            println!("  {} no rule matches, entry stays unmapped", "?".yellow());
        }
    }
    Ok(())
}

/// Administrative disposition updates. Replacement and notes of an existing record are kept.
fn apply_disposition_updates(
    store: &dyn DispositionStore,
    updates: &[(String, Disposition)],
) -> Result<()> {
    for (name, disposition) in updates {
        let names = BTreeSet::from([name.clone()]);
        let mut record = store
            .fetch_dispositions(&names)?
            .into_iter()
            .next()
            .unwrap_or_else(|| DispositionRecord::pending(name.as_str()));
        record.disposition = disposition.clone();
        store.set_disposition(record)?;

        eprintln!("  {} {} → {}", "→".cyan(), name, disposition);
    }
    Ok(())
}

fn read_entries(path: &Path, format: InputFormat) -> Result<Vec<InventoryEntry>> {
    match format {
        InputFormat::Json => input::json::JsonSource::new().read(path),
        InputFormat::Csv => input::csv::CsvSource::new().read(path),
    }
}

/// One analysis run per input file, all sharing the same stores.
async fn run_analyses(
    inputs: Vec<(PathBuf, InputFormat)>,
    rule_store: Arc<dyn RuleStore>,
    disposition_store: Arc<dyn DispositionStore>,
    show_progress: bool,
) -> Result<(Vec<FileReport>, usize)> {
    use futures::future::join_all;

    let pb = if show_progress {
        let pb = ProgressBar::new(inputs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let tasks: Vec<_> = inputs
        .into_iter()
        .map(|(path, format)| {
            let rules = Arc::clone(&rule_store);
            let dispositions = Arc::clone(&disposition_store);
            let pb = pb.clone();
            async move {
                let task_path = path.clone();
                let result = tokio::task::spawn_blocking(move || -> Result<FileReport> {
                    let entries = read_entries(&task_path, format)?;
                    tracing::info!(file = %task_path.display(), %format, rows = entries.len(), "analysing inventory");
                    let analysis = pipeline::analyze(&entries, rules.as_ref(), dispositions.as_ref())
                        .with_context(|| format!("analysis of {} failed", task_path.display()))?;
                    Ok(FileReport::new(task_path, entries.len(), analysis))
                })
                .await;
                if let Some(pb) = &pb {
                    pb.inc(1);
                }
                (path, result)
            }
        })
        .collect();

    let mut reports = Vec::new();
    let mut failures = 0;

    for (path, result) in join_all(tasks).await {
        match result {
            Ok(Ok(report)) => reports.push(report),
            Ok(Err(err)) => {
                failures += 1;
                eprintln!("  {} {}: {:#}", "✗".red(), path.display(), err);
            }
            Err(join_err) => {
                failures += 1;
                eprintln!("  {} {}: task failed: {}", "✗".red(), path.display(), join_err);
            }
        }
    }

    if let Some(pb) = pb {
        pb.finish_with_message("Done");
    }

    Ok((reports, failures))
}
