pub mod fingerprint;
pub mod xxhash;

pub use fingerprint::{Fingerprint, FINGERPRINT_LEN};

use crate::error::Error;
use crate::index::FingerprintIndex;
use crate::progress::ProgressReporter;
use crate::scanner::ScannedFile;
use dashmap::DashMap;
use rayon::prelude::*;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::{debug, error};

/// Counters from one index build.
#[derive(Debug, Default, Clone, Copy)]
pub struct HashStats {
    pub size_candidates: usize,
    pub partial_candidates: usize,
    pub files_fingerprinted: usize,
}

/// Three-tier strategy:
/// 1. Group by file size; a file with a unique size has no duplicate
/// 2. Partial hash (first 1KB via XxHash64) on size collisions
/// 3. Full BLAKE3 fingerprint only on (size, partial hash) collisions
///
/// Hashing runs in parallel, but paths are recorded in the order `files` lists
/// them, so the first path of every group is the first one seen in traversal.
pub fn build_fingerprint_index(
    files: &[ScannedFile],
    reporter: &dyn ProgressReporter,
    cancel_token: &AtomicBool,
) -> Result<(FingerprintIndex, HashStats), Error> {
    let mut stats = HashStats::default();

    // First pass: sizes
    let size_counts: DashMap<u64, usize> = DashMap::new();
    files.par_iter().for_each(|file| {
        *size_counts.entry(file.size).or_default() += 1;
    });
    let size_candidates: Vec<&ScannedFile> = files
        .iter()
        .filter(|file| size_counts.get(&file.size).map_or(false, |count| *count > 1))
        .collect();
    stats.size_candidates = size_candidates.len();
    debug!(
        "{} of {} files share a size with another file",
        size_candidates.len(),
        files.len()
    );
    check_cancelled(cancel_token)?;

    // Second pass: partial hash on size collisions
    let partials: Vec<Option<u64>> = size_candidates
        .par_iter()
        .map(|file| {
            if cancel_token.load(Ordering::Relaxed) {
                return None;
            }
            hash_or_log(&file.path, xxhash::partial_hash)
        })
        .collect();
    check_cancelled(cancel_token)?;

    let partial_counts: DashMap<(u64, u64), usize> = DashMap::new();
    size_candidates
        .par_iter()
        .zip(partials.par_iter())
        .for_each(|(file, partial)| {
            if let Some(partial) = partial {
                *partial_counts.entry((file.size, *partial)).or_default() += 1;
            }
        });
    let partial_candidates: Vec<&ScannedFile> = size_candidates
        .iter()
        .zip(partials.iter())
        .filter_map(|(file, partial)| {
            let key = (file.size, (*partial)?);
            let count = partial_counts.get(&key).map_or(0, |count| *count);
            (count > 1).then_some(*file)
        })
        .collect();
    stats.partial_candidates = partial_candidates.len();
    debug!(
        "{} files share size and partial hash",
        partial_candidates.len()
    );

    // Third pass: full fingerprint on partial collisions
    reporter.on_hash_start();
    let total = partial_candidates.len();
    let hashed = AtomicUsize::new(0);
    let fingerprints: Vec<Option<Fingerprint>> = partial_candidates
        .par_iter()
        .map(|file| {
            if cancel_token.load(Ordering::Relaxed) {
                return None;
            }
            let fingerprint = hash_or_log(&file.path, Fingerprint::of_file);
            let done = hashed.fetch_add(1, Ordering::Relaxed) + 1;
            reporter.on_hash_progress(done, total);
            fingerprint
        })
        .collect();
    check_cancelled(cancel_token)?;

    let mut index = FingerprintIndex::new();
    for (file, fingerprint) in partial_candidates.iter().zip(fingerprints) {
        if let Some(fingerprint) = fingerprint {
            index.record(file.path.clone(), fingerprint);
            stats.files_fingerprinted += 1;
        }
    }

    Ok((index, stats))
}

fn hash_or_log<T>(path: &Path, hash: impl Fn(&Path) -> io::Result<T>) -> Option<T> {
    match hash(path) {
        Ok(value) => Some(value),
        Err(e) => {
            error!("Error hashing file '{}': {}", path.display(), e);
            None
        }
    }
}

fn check_cancelled(cancel_token: &AtomicBool) -> Result<(), Error> {
    if cancel_token.load(Ordering::Relaxed) {
        return Err(Error::Cancelled);
    }
    Ok(())
}
