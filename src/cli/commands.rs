use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "clone-duper")]
#[command(about = "Replace duplicate files with copy-on-write clones", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List duplicate groups and the space a migration would reclaim
    Scan(ScanArgs),
    /// Scan, confirm, then replace duplicates with clones of the first copy found
    Migrate(MigrateArgs),
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directories to scan (overrides `root_paths` from the configuration)
    pub paths: Vec<String>,
}

#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Directories to scan (overrides `root_paths` from the configuration)
    pub paths: Vec<String>,

    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// Delete each backup once its clone is committed
    #[arg(long)]
    pub remove_backups: bool,

    /// Suffix for backup files
    #[arg(long)]
    pub backup_suffix: Option<String>,

    /// Write one CSV row per migrated file to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}
