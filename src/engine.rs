use crate::config::{self, AppConfig};
use crate::error::Error;
use crate::hasher;
use crate::index::FingerprintIndex;
use crate::migrate::{Cloner, Migrator};
use crate::progress::ProgressReporter;
use crate::scanner;
use ahash::AHashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub struct ScanEngine {
    config: AppConfig,
    cancel_token: Arc<AtomicBool>,
}

#[derive(Debug)]
pub struct ScanResult {
    pub index: FingerprintIndex,
    pub scan_duration: Duration,
    pub hash_duration: Duration,
    pub total_files_scanned: usize,
    pub files_fingerprinted: usize,
    pub duplicate_groups: usize,
    /// Non-canonical members across all groups.
    pub duplicate_files: usize,
    pub reclaimable_bytes: u64,
}

impl ScanEngine {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            cancel_token: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Shared flag that stops a running scan or migration when set.
    pub fn cancel_token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel_token)
    }

    /// Run the duplicate detection pipeline:
    /// 1. Ordered directory walk (roots pruned of nested duplicates)
    /// 2. Size, partial hash and full fingerprint passes into a `FingerprintIndex`
    pub fn scan(&self, reporter: &dyn ProgressReporter) -> Result<ScanResult, Error> {
        let non_overlapping = config::non_overlapping_directories(self.config.root_paths.clone());
        info!("Processing directories: {:?}", non_overlapping);

        let root_path_slices: Vec<&str> = non_overlapping.iter().map(|s| s.as_str()).collect();
        let ignore_pattern_slices: Vec<&str> = self
            .config
            .ignore_patterns
            .iter()
            .map(|s| s.as_str())
            .collect();

        // Phase 1: Walk
        info!("Scanning files...");
        reporter.on_scan_start();
        let scan_start = Instant::now();
        let files = scanner::walk_files(&root_path_slices, &ignore_pattern_slices, reporter)?;
        let scan_duration = scan_start.elapsed();
        reporter.on_scan_complete(files.len(), scan_duration.as_secs_f64());
        debug!(
            "Scan completed in {:.2}s, {} files",
            scan_duration.as_secs_f64(),
            files.len(),
        );
        if self.cancel_token.load(Ordering::Relaxed) {
            return Err(Error::Cancelled);
        }

        // Phase 2: Fingerprint
        info!("Building content fingerprints for possible dupes...");
        let hash_start = Instant::now();
        let (index, hash_stats) =
            hasher::build_fingerprint_index(&files, reporter, &self.cancel_token)?;
        let hash_duration = hash_start.elapsed();

        let sizes: AHashMap<&Path, u64> = files
            .iter()
            .map(|file| (file.path.as_path(), file.size))
            .collect();

        let mut duplicate_groups = 0;
        let mut duplicate_files = 0;
        let mut reclaimable_bytes = 0u64;
        for group in index.duplicate_groups() {
            let members = group.len() - 1;
            let size = group
                .canonical()
                .and_then(|canonical| sizes.get(canonical))
                .copied()
                .unwrap_or(0);
            duplicate_groups += 1;
            duplicate_files += members;
            reclaimable_bytes += size * members as u64;
        }

        reporter.on_hash_complete(duplicate_groups, hash_duration.as_secs_f64());
        debug!(
            "Fingerprinting completed in {:.2}s: {} size candidates, {} partial candidates, {} fingerprinted, {} duplicate groups",
            hash_duration.as_secs_f64(),
            hash_stats.size_candidates,
            hash_stats.partial_candidates,
            hash_stats.files_fingerprinted,
            duplicate_groups,
        );

        Ok(ScanResult {
            index,
            scan_duration,
            hash_duration,
            total_files_scanned: files.len(),
            files_fingerprinted: hash_stats.files_fingerprinted,
            duplicate_groups,
            duplicate_files,
            reclaimable_bytes,
        })
    }

    /// A `Migrator` using this engine's backup settings and cancel token.
    pub fn migrator<'c>(&self, cloner: &'c dyn Cloner) -> Migrator<'c> {
        Migrator::new(cloner)
            .with_backup_suffix(&self.config.backup_suffix)
            .with_remove_backups(self.config.remove_backups)
            .with_cancel_token(self.cancel_token())
    }
}
