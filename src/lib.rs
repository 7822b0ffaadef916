pub mod config;
pub mod engine;
pub mod error;
pub mod hasher;
pub mod index;
pub mod migrate;
pub mod progress;
pub mod scanner;

pub use config::AppConfig;
pub use engine::{ScanEngine, ScanResult};
pub use error::Error;
pub use hasher::Fingerprint;
pub use index::{DuplicateGroup, FingerprintIndex};
pub use migrate::{Cloner, MigrationSummary, Migrator, ReflinkCloner};
pub use progress::{ProgressReporter, SilentReporter};
