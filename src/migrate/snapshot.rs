use super::transaction::{MetadataKind, TransactionError};
use std::fs;
use std::path::Path;
use tracing::warn;

#[cfg(unix)]
use std::os::unix::fs::{MetadataExt, PermissionsExt};

/// Permission bits and ownership of a file, taken just before it is mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataSnapshot {
    #[cfg(unix)]
    mode: u32,
    #[cfg(unix)]
    uid: u32,
    #[cfg(unix)]
    gid: u32,
    #[cfg(not(unix))]
    readonly: bool,
    size: u64,
}

impl MetadataSnapshot {
    pub fn capture(path: &Path) -> Result<Self, TransactionError> {
        let metadata = fs::metadata(path).map_err(|source| TransactionError::Stat {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            #[cfg(unix)]
            mode: metadata.permissions().mode() & 0o7777,
            #[cfg(unix)]
            uid: metadata.uid(),
            #[cfg(unix)]
            gid: metadata.gid(),
            #[cfg(not(unix))]
            readonly: metadata.permissions().readonly(),
            size: metadata.len(),
        })
    }

    /// Best-effort restore onto `path`. Every failure is logged and returned; none
    /// of them undo anything. Ownership goes first since chown may clear set-id bits.
    pub fn apply_to(&self, path: &Path) -> Vec<TransactionError> {
        let mut failures = Vec::new();

        #[cfg(unix)]
        {
            if let Err(source) = std::os::unix::fs::chown(path, Some(self.uid), Some(self.gid)) {
                failures.push(TransactionError::MetadataRestore {
                    path: path.to_path_buf(),
                    kind: MetadataKind::Ownership,
                    source,
                });
            }

            if let Err(source) = fs::set_permissions(path, fs::Permissions::from_mode(self.mode)) {
                failures.push(TransactionError::MetadataRestore {
                    path: path.to_path_buf(),
                    kind: MetadataKind::Permissions,
                    source,
                });
            }
        }

        #[cfg(not(unix))]
        {
            let result = fs::metadata(path).and_then(|metadata| {
                let mut permissions = metadata.permissions();
                permissions.set_readonly(self.readonly);
                fs::set_permissions(path, permissions)
            });
            if let Err(source) = result {
                failures.push(TransactionError::MetadataRestore {
                    path: path.to_path_buf(),
                    kind: MetadataKind::Permissions,
                    source,
                });
            }
        }

        for failure in &failures {
            warn!("{}", failure);
        }

        failures
    }

    #[cfg(unix)]
    pub fn mode(&self) -> u32 {
        self.mode
    }

    #[cfg(unix)]
    pub fn uid(&self) -> u32 {
        self.uid
    }

    #[cfg(unix)]
    pub fn gid(&self) -> u32 {
        self.gid
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_capture_reads_mode_and_owner() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("f.txt");
        fs::write(&path, "contents").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        let snapshot = MetadataSnapshot::capture(&path).unwrap();
        let metadata = fs::metadata(&path).unwrap();

        assert_eq!(snapshot.mode(), 0o640);
        assert_eq!(snapshot.uid(), metadata.uid());
        assert_eq!(snapshot.gid(), metadata.gid());
        assert_eq!(snapshot.size(), 8);
    }

    #[test]
    fn test_apply_to_restores_mode() {
        let tmp = tempdir().unwrap();
        let source = tmp.path().join("source.txt");
        let target = tmp.path().join("target.txt");
        fs::write(&source, "a").unwrap();
        fs::write(&target, "b").unwrap();
        fs::set_permissions(&source, fs::Permissions::from_mode(0o600)).unwrap();
        fs::set_permissions(&target, fs::Permissions::from_mode(0o755)).unwrap();

        let snapshot = MetadataSnapshot::capture(&source).unwrap();
        let failures = snapshot.apply_to(&target);

        assert!(failures.is_empty(), "unexpected restore failures: {:?}", failures);
        let restored = fs::metadata(&target).unwrap();
        assert_eq!(restored.permissions().mode() & 0o7777, 0o600);
        assert_eq!(restored.uid(), snapshot.uid());
        assert_eq!(restored.gid(), snapshot.gid());
    }

    #[test]
    fn test_apply_to_missing_path_reports_without_panicking() {
        let tmp = tempdir().unwrap();
        let source = tmp.path().join("source.txt");
        fs::write(&source, "a").unwrap();
        let snapshot = MetadataSnapshot::capture(&source).unwrap();

        let failures = snapshot.apply_to(&tmp.path().join("gone.txt"));
        assert_eq!(failures.len(), 2);
        assert!(failures
            .iter()
            .all(|f| matches!(f, TransactionError::MetadataRestore { .. })));
    }

    #[test]
    fn test_capture_missing_path_is_stat_error() {
        let tmp = tempdir().unwrap();
        let result = MetadataSnapshot::capture(&tmp.path().join("missing"));
        assert!(matches!(result, Err(TransactionError::Stat { .. })));
    }
}
