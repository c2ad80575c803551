use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use colored::Colorize;
use fic_engine::{Checker, CheckerConfig, EngineError, RecordView, Verification, VerifyOutcome, VerifyStatus, VerifySummary};
use fic_store::ImportMode;
use fic_types::RecordState;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = resolve_config(&cli)?;
    let checker = Checker::from_config(&config).context("invalid configuration")?;
    let json = matches!(cli.format, OutputFormat::Json);

    match cli.command {
        Command::Add(args) => cmd_add(&checker, args, json),
        Command::Verify(args) => cmd_verify(&checker, args, json),
        Command::VerifyAll(_) => cmd_verify_all(&checker, json),
        Command::List(_) => cmd_list(&checker, json),
        Command::Remove(args) => cmd_remove(&checker, args, json),
        Command::Export(args) => cmd_export(&checker, args, json),
        Command::Import(args) => cmd_import(&checker, args, json),
    }
}

/// Flags win over the config file, which wins over defaults.
fn resolve_config(cli: &Cli) -> anyhow::Result<CheckerConfig> {
    let mut config = match &cli.config {
        Some(path) => CheckerConfig::load(path)?,
        None => CheckerConfig::default(),
    };
    if let Some(db) = &cli.db {
        config.store_path = db.clone();
    }
    if let Some(algorithm) = &cli.algorithm {
        config.default_algorithm = algorithm.clone();
    }
    Ok(config)
}

fn status_code(ok: bool) -> ExitCode {
    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_add(checker: &Checker, args: AddArgs, json: bool) -> anyhow::Result<ExitCode> {
    let description = args.description.unwrap_or_default();
    let outcome = checker
        .add(&args.path, &description)
        .with_context(|| format!("failed to add {}", args.path.display()))?;

    if json {
        print_json(&serde_json::json!({
            "path": outcome.path,
            "record": outcome.record,
            "replaced": outcome.replaced,
        }))?;
    } else {
        println!("{} Added {} to integrity database", "✓".green().bold(), outcome.path.display());
        println!("  {}: {}", outcome.record.algorithm, outcome.record.hash.dimmed());
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_verify(checker: &Checker, args: VerifyArgs, json: bool) -> anyhow::Result<ExitCode> {
    let checked = checker
        .verify(&args.path)
        .with_context(|| format!("failed to verify {}", args.path.display()))?;
    let verification = &checked.value;

    if json {
        let mut value = serde_json::to_value(verification)?;
        value["message"] = verification.message().into();
        value["persist_error"] = persist_error_json(&checked.persist_error);
        print_json(&value)?;
    } else {
        print_verification(verification);
        warn_unsaved(&checked.persist_error);
    }
    Ok(status_code(verification.is_verified() && checked.persist_error.is_none()))
}

fn persist_error_json(err: &Option<EngineError>) -> serde_json::Value {
    match err {
        Some(e) => e.to_string().into(),
        None => serde_json::Value::Null,
    }
}

/// Report a failed save after the classification has been printed.
fn warn_unsaved(err: &Option<EngineError>) {
    if let Some(e) = err {
        eprintln!("{} check history not saved: {}", "⚠".yellow().bold(), e);
    }
}

fn print_verification(v: &Verification) {
    let path = v.path.display();
    match &v.outcome {
        VerifyOutcome::Verified { .. } => {
            println!("{} {}: {}", "✓".green().bold(), path, v.message());
        }
        VerifyOutcome::Tampered { expected_hash, current_hash, .. } => {
            println!("{} {}: {}", "⚠".yellow().bold(), path, v.message().yellow());
            println!("  Expected: {}", expected_hash);
            println!("  Current:  {}", current_hash.red());
        }
        _ => {
            println!("{} {}: {}", "✗".red().bold(), path, v.message());
        }
    }
}

fn cmd_verify_all(checker: &Checker, json: bool) -> anyhow::Result<ExitCode> {
    let checked = checker.verify_all();
    let results: &BTreeMap<PathBuf, Verification> = &checked.value;
    let summary = VerifySummary::tally(results.values());

    if json {
        print_json(&serde_json::json!({
            "summary": summary,
            "results": results.values().collect::<Vec<_>>(),
            "persist_error": persist_error_json(&checked.persist_error),
        }))?;
    } else {
        println!("Verification Results:");
        println!("  {} Verified: {}", "✓".green(), summary.verified);
        println!("  {} Tampered: {}", "⚠".yellow(), summary.tampered);
        println!("  {} Errors: {}", "✗".red(), summary.other);
        for (path, v) in results.iter().filter(|(_, v)| !v.is_verified()) {
            let label = v.status().as_str().to_uppercase();
            let label = match v.status() {
                VerifyStatus::Tampered => label.yellow(),
                _ => label.red(),
            };
            println!("  {}: {}", label, path.display());
        }
        warn_unsaved(&checked.persist_error);
    }
    Ok(status_code(summary.is_clean() && checked.persist_error.is_none()))
}

fn cmd_list(checker: &Checker, json: bool) -> anyhow::Result<ExitCode> {
    let views = checker.list();
    if json {
        print_json(&views)?;
        return Ok(ExitCode::SUCCESS);
    }
    if views.is_empty() {
        println!("No files in database");
        return Ok(ExitCode::SUCCESS);
    }

    println!("{:<10} {:<50} {:<10} {:<8}", "Status", "Path", "Size", "Checks");
    println!("{}", "-".repeat(80));
    for view in &views {
        println!(
            "{} {:<50} {:<10} {:<8}",
            status_cell(view),
            view.path.display().to_string(),
            view.size,
            view.check_count
        );
    }
    Ok(ExitCode::SUCCESS)
}

/// Pad before colorizing so escape codes don't break column widths.
fn status_cell(view: &RecordView) -> colored::ColoredString {
    match view.status {
        RecordState::Verified => format!("{:<10}", "✓").green(),
        RecordState::Tampered => format!("{:<10}", "⚠").yellow(),
        RecordState::Unknown => format!("{:<10}", "?").dimmed(),
    }
}

fn cmd_remove(checker: &Checker, args: RemoveArgs, json: bool) -> anyhow::Result<ExitCode> {
    let removed = checker
        .remove(&args.path)
        .with_context(|| format!("failed to remove {}", args.path.display()))?;

    if json {
        print_json(&serde_json::json!({ "path": args.path, "removed": removed }))?;
    } else if removed {
        println!("{} Removed {} from database", "✓".green().bold(), args.path.display());
    } else {
        println!("{} File {} not found in database", "✗".red().bold(), args.path.display());
    }
    Ok(status_code(removed))
}

fn cmd_export(checker: &Checker, args: ExportArgs, json: bool) -> anyhow::Result<ExitCode> {
    let records = checker
        .export(&args.path)
        .with_context(|| format!("failed to export database to {}", args.path.display()))?;

    if json {
        print_json(&serde_json::json!({ "path": args.path, "records": records }))?;
    } else {
        println!("{} Database exported to {} ({} records)", "✓".green().bold(), args.path.display(), records);
    }
    Ok(ExitCode::SUCCESS)
}

/// Only `merge` merges; any other word, or none, replaces.
fn import_mode(arg: Option<&str>) -> ImportMode {
    match arg {
        Some(word) if word.eq_ignore_ascii_case("merge") => ImportMode::Merge,
        _ => ImportMode::Replace,
    }
}

fn cmd_import(checker: &Checker, args: ImportArgs, json: bool) -> anyhow::Result<ExitCode> {
    let mode = import_mode(args.mode.as_deref());
    let summary = checker
        .import(&args.path, mode)
        .with_context(|| format!("failed to import database from {}", args.path.display()))?;

    if json {
        print_json(&summary)?;
    } else {
        let action = match mode {
            ImportMode::Merge => "merged",
            ImportMode::Replace => "imported",
        };
        println!("{} Database {} from {}", "✓".green().bold(), action, args.path.display());
        println!(
            "  {} read, {} added, {} overwritten, {} removed",
            summary.records_read, summary.added, summary.overwritten, summary.removed
        );
    }
    Ok(ExitCode::SUCCESS)
}
