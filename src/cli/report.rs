use clone_duper::migrate::{MemberOutcome, OutcomeStatus};
use clone_duper::{MigrationSummary, ScanResult};
use colored::*;
use console::style;
use indicatif::HumanBytes;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Lists every duplicate group with its estimated savings.
pub fn print_duplicate_groups(result: &ScanResult) {
    for group in result.index.duplicate_groups() {
        let Some(canonical) = group.canonical() else {
            continue;
        };
        let size = fs::metadata(canonical).map(|m| m.len()).unwrap_or(0);
        let savings = size * (group.len() as u64 - 1);

        println!(
            "{} {}",
            style("Duplicate files with fingerprint").bold(),
            style(group.fingerprint).dim()
        );
        println!("Estimated savings: {}", HumanBytes(savings));
        println!("  {} {}", "*".green(), canonical.display());
        for duplicate in &group.paths[1..] {
            println!("    {}", duplicate.display());
        }
        println!();
    }

    println!(
        "{} duplicate groups, {} redundant copies",
        format!("{}", result.duplicate_groups).red(),
        format!("{}", result.duplicate_files).red(),
    );
    println!(
        "Total Estimated Savings: {}",
        format!("{}", HumanBytes(result.reclaimable_bytes)).green()
    );
}

pub fn print_summary(summary: &MigrationSummary) {
    println!();
    println!("{}", style("Migration summary").bold());
    println!("  Committed:      {}", format!("{}", summary.committed()).green());
    println!("  Rolled back:    {}", format!("{}", summary.rolled_back()).yellow());
    println!("  Backup failed:  {}", format!("{}", summary.backup_failed()).yellow());
    println!("  Irreversible:   {}", format!("{}", summary.irreversible()).red());
    println!("  Warnings:       {}", summary.warnings());
    println!(
        "  Reclaimed:      {}",
        format!("{}", HumanBytes(summary.reclaimed_bytes())).green()
    );
    if summary.cancelled {
        println!("  {}", "Run was cancelled before all groups were processed".yellow());
    }

    if summary.irreversible() > 0 {
        println!();
        println!(
            "{}",
            "The following files could not be restored and need manual recovery:"
                .red()
                .bold()
        );
        for outcome in summary.irreversible_outcomes() {
            println!(
                "  {} -> content is at {}",
                outcome.path.display(),
                outcome.backup.display()
            );
        }
    }
}

#[derive(Debug, Serialize)]
struct OutcomeRow<'a> {
    path: &'a str,
    canonical: &'a str,
    backup: &'a str,
    outcome: &'static str,
    size: u64,
    error: Option<String>,
    warnings: String,
}

fn error_text(outcome: &MemberOutcome) -> Option<String> {
    match &outcome.status {
        OutcomeStatus::Committed => None,
        OutcomeStatus::RolledBack { cause } | OutcomeStatus::BackupFailed { cause } => {
            Some(cause.to_string())
        }
        OutcomeStatus::Irreversible {
            clone_error,
            rollback_error,
        } => Some(format!("{}; {}", clone_error, rollback_error)),
    }
}

/// Writes one row per member outcome.
pub fn write_csv(summary: &MigrationSummary, path: &Path) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;

    for outcome in &summary.outcomes {
        let member = outcome.path.to_string_lossy();
        let canonical = outcome.canonical.to_string_lossy();
        let backup = outcome.backup.to_string_lossy();
        let warnings = outcome
            .warnings
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");

        writer.serialize(OutcomeRow {
            path: &member,
            canonical: &canonical,
            backup: &backup,
            outcome: outcome.kind().as_str(),
            size: outcome.size,
            error: error_text(outcome),
            warnings,
        })?;
    }

    writer.flush()?;
    Ok(())
}
