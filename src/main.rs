mod cli;

use std::process;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use cli::commands::{Cli, Commands, MigrateArgs, ScanArgs};
use cli::progress::CliReporter;
use cli::{logging, prompt, report};
use clone_duper::{AppConfig, ReflinkCloner, ScanEngine, ScanResult};
use colored::*;
use dotenv::dotenv;
use tracing::{error, info};

fn main() {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match clone_duper::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    let exit_code = match args.command {
        Some(Commands::Scan(scan_args)) => report_errors(run_scan(config, scan_args).map(|_| 0)),
        Some(Commands::Migrate(migrate_args)) => report_errors(run_migrate(config, migrate_args)),
        Some(Commands::PrintConfig) => report_errors(print_config(&config).map(|_| 0)),
        None => {
            let _ = Cli::command().print_long_help();
            0
        }
    };

    if exit_code != 0 {
        // flush the file appender before leaving
        drop(_guard);
        process::exit(exit_code);
    }
}

fn report_errors(result: anyhow::Result<i32>) -> i32 {
    match result {
        Ok(code) => code,
        Err(err) => {
            error!("Error: {:#}", err);
            1
        }
    }
}

fn with_paths(mut config: AppConfig, paths: Vec<String>) -> AppConfig {
    if !paths.is_empty() {
        config.root_paths = paths;
    }
    config
}

fn scan(engine: &ScanEngine) -> anyhow::Result<ScanResult> {
    if engine.config().root_paths.is_empty() {
        anyhow::bail!("no paths to scan: pass them as arguments or set root_paths in Config.toml");
    }

    let reporter = CliReporter::new();
    let result = engine.scan(&reporter).context("scan failed")?;

    info!(
        "Scan: {}, Hash: {}",
        format!("{:.2}s", result.scan_duration.as_secs_f64()).green(),
        format!("{:.2}s", result.hash_duration.as_secs_f64()).green(),
    );
    Ok(result)
}

fn run_scan(config: AppConfig, args: ScanArgs) -> anyhow::Result<()> {
    let engine = ScanEngine::new(with_paths(config, args.paths));
    let result = scan(&engine)?;
    report::print_duplicate_groups(&result);
    Ok(())
}

fn run_migrate(config: AppConfig, args: MigrateArgs) -> anyhow::Result<i32> {
    let mut config = with_paths(config, args.paths);
    if args.remove_backups {
        config.remove_backups = true;
    }
    if let Some(suffix) = args.backup_suffix {
        config.backup_suffix = suffix;
    }
    config.validate()?;

    let engine = ScanEngine::new(config);
    let result = scan(&engine)?;
    report::print_duplicate_groups(&result);

    if result.duplicate_groups == 0 {
        println!("Nothing to migrate.");
        return Ok(0);
    }

    if !args.yes && !prompt::prompt_confirm("Do you want to continue?", Some(false))? {
        println!("Exiting...");
        return Ok(0);
    }

    info!("Starting migration...");
    let cloner = ReflinkCloner;
    let reporter = CliReporter::new();
    let summary = engine
        .migrator(&cloner)
        .migrate_index(&result.index, &reporter);

    report::print_summary(&summary);

    let mut exit_code = 0;
    if let Some(report_path) = args.report {
        match report::write_csv(&summary, &report_path) {
            Ok(()) => info!("Report written to {}", report_path.display()),
            Err(err) => {
                error!("Error writing report to {}: {}", report_path.display(), err);
                exit_code = 1;
            }
        }
    }

    // irreversible members outrank a failed report
    if summary.irreversible() > 0 {
        exit_code = 2;
    }
    Ok(exit_code)
}

fn print_config(config: &AppConfig) -> anyhow::Result<()> {
    let rendered = toml::to_string_pretty(config).context("rendering configuration")?;
    println!("{}", rendered);
    Ok(())
}
