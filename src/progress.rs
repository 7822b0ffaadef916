use crate::migrate::MigrationSummary;

/// Trait for reporting scan and migration progress.
///
/// The CLI implements it with indicatif progress bars. All methods have default no-op
/// implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_start(&self) {}
    fn on_scan_progress(&self, _files_found: usize, _current_path: &str) {}
    fn on_scan_complete(&self, _total_files: usize, _duration_secs: f64) {}
    fn on_hash_start(&self) {}
    fn on_hash_progress(&self, _files_hashed: usize, _total_files: usize) {}
    fn on_hash_complete(&self, _duplicate_groups: usize, _duration_secs: f64) {}
    fn on_migrate_start(&self, _total_members: usize) {}
    fn on_migrate_progress(&self, _done: usize, _total: usize, _current_path: &str) {}
    fn on_migrate_complete(&self, _summary: &MigrationSummary) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
