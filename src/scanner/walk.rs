use crate::error::Error;
use crate::progress::ProgressReporter;
use glob::Pattern;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{trace, warn};
use walkdir::{DirEntry, WalkDir};

/// A regular file found during traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub size: u64,
}

/// Ordered directory traversal. Returns every regular, non-empty file under the
/// given roots, roots in the order given and entries sorted by file name within
/// each directory, so that repeated walks of an unchanged tree agree on order.
///
/// Symlinks are never followed or returned. An unreadable root is fatal; any
/// entry below the root that cannot be read is logged and skipped.
pub fn walk_files(
    root_paths: &[&str],
    ignore_globs: &[&str],
    reporter: &dyn ProgressReporter,
) -> Result<Vec<ScannedFile>, Error> {
    let ignore_patterns = compile_patterns(ignore_globs)?;
    let mut files: Vec<ScannedFile> = Vec::new();

    for root in root_paths {
        visit_root(Path::new(root), &ignore_patterns, &mut files, reporter)?;
    }

    Ok(files)
}

fn compile_patterns(ignore_globs: &[&str]) -> Result<Vec<Pattern>, Error> {
    ignore_globs
        .iter()
        .map(|glob| {
            Pattern::new(glob).map_err(|source| Error::InvalidPattern {
                pattern: glob.to_string(),
                source,
            })
        })
        .collect()
}

fn is_ignored(path: &Path, ignore_patterns: &[Pattern]) -> bool {
    ignore_patterns
        .iter()
        .any(|pattern| pattern.matches_path(path))
}

fn visit_root(
    root: &Path,
    ignore_patterns: &[Pattern],
    files: &mut Vec<ScannedFile>,
    reporter: &dyn ProgressReporter,
) -> Result<(), Error> {
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_ignored(entry.path(), ignore_patterns));

    for entry_result in walker {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(Error::Walk {
                    root: root.to_path_buf(),
                    source: err,
                });
            }
            Err(err) => {
                log_skipped_entry(&err);
                continue;
            }
        };

        if let Some(file) = scanned_file(&entry) {
            reporter.on_scan_progress(files.len() + 1, &file.path.to_string_lossy());
            files.push(file);
        }
    }

    Ok(())
}

fn scanned_file(entry: &DirEntry) -> Option<ScannedFile> {
    if !entry.file_type().is_file() {
        return None;
    }

    let size = match entry.metadata() {
        Ok(metadata) => metadata.len(),
        Err(err) => {
            warn!(
                "Error getting metadata for {}: {}",
                entry.path().display(),
                err
            );
            return None;
        }
    };

    if size == 0 {
        trace!("Skipping empty file {}", entry.path().display());
        return None;
    }

    Some(ScannedFile {
        path: entry.path().to_path_buf(),
        size,
    })
}

fn log_skipped_entry(err: &walkdir::Error) {
    let path = err
        .path()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    match err.io_error().map(io::Error::kind) {
        Some(io::ErrorKind::PermissionDenied) => {
            warn!("Access denied reading {}, skipping", path);
        }
        _ => {
            warn!("Error reading {}, skipping: {}", path, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentReporter;
    use std::fs;
    use tempfile::tempdir;

    fn names(files: &[ScannedFile]) -> Vec<String> {
        files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_walk_is_sorted_and_skips_empty_files() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        fs::write(root.join("c.txt"), "c").unwrap();
        fs::write(root.join("a.txt"), "a").unwrap();
        fs::write(root.join("empty.txt"), "").unwrap();
        fs::create_dir(root.join("b_dir")).unwrap();
        fs::write(root.join("b_dir").join("inner.txt"), "inner").unwrap();

        let root_str = root.to_string_lossy().into_owned();
        let files = walk_files(&[root_str.as_str()], &[], &SilentReporter).unwrap();

        assert_eq!(names(&files), vec!["a.txt", "inner.txt", "c.txt"]);
        assert_eq!(files[0].size, 1);
    }

    #[test]
    fn test_walk_ignore_patterns() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir(root.join("skip_me")).unwrap();
        fs::write(root.join("skip_me").join("x.txt"), "x").unwrap();
        fs::write(root.join("keep.txt"), "k").unwrap();
        fs::write(root.join("drop.tmp"), "d").unwrap();

        let root_str = root.to_string_lossy().into_owned();
        let files =
            walk_files(&[root_str.as_str()], &["**/skip_me", "*.tmp"], &SilentReporter).unwrap();

        assert_eq!(names(&files), vec!["keep.txt"]);
    }

    #[test]
    fn test_walk_invalid_pattern() {
        let tmp = tempdir().unwrap();
        let root_str = tmp.path().to_string_lossy().into_owned();
        let result = walk_files(&[root_str.as_str()], &["[unclosed"], &SilentReporter);
        assert!(matches!(result, Err(Error::InvalidPattern { .. })));
    }

    #[test]
    fn test_walk_missing_root_is_fatal() {
        let tmp = tempdir().unwrap();
        let missing = tmp.path().join("does_not_exist");
        let missing_str = missing.to_string_lossy().into_owned();
        let result = walk_files(&[missing_str.as_str()], &[], &SilentReporter);
        assert!(matches!(result, Err(Error::Walk { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_skips_symlinks() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        fs::write(root.join("real.txt"), "real").unwrap();
        std::os::unix::fs::symlink(root.join("real.txt"), root.join("link.txt")).unwrap();

        let root_str = root.to_string_lossy().into_owned();
        let files = walk_files(&[root_str.as_str()], &[], &SilentReporter).unwrap();

        assert_eq!(names(&files), vec!["real.txt"]);
    }
}
