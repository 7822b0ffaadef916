use super::clone::Cloner;
use super::snapshot::MetadataSnapshot;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataKind {
    Ownership,
    Permissions,
}

impl fmt::Display for MetadataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataKind::Ownership => f.write_str("ownership"),
            MetadataKind::Permissions => f.write_str("permissions"),
        }
    }
}

/// Failure of a single step of a clone transaction. These never escape the
/// transaction as errors; they are carried in its `MemberOutcome`.
#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("error getting file info for {}: {source}", path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("backup path {} already exists", backup.display())]
    BackupExists { backup: PathBuf },

    #[error("error moving {} to backup {}: {source}", path.display(), backup.display())]
    Backup {
        path: PathBuf,
        backup: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("error cloning {} to {}: {source}", canonical.display(), path.display())]
    Clone {
        canonical: PathBuf,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("error restoring backup {} to {}: {source}", backup.display(), path.display())]
    Rollback {
        backup: PathBuf,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("error restoring {kind} for {}: {source}", path.display())]
    MetadataRestore {
        path: PathBuf,
        kind: MetadataKind,
        #[source]
        source: io::Error,
    },

    #[error("error removing backup {}: {source}", backup.display())]
    BackupCleanup {
        backup: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// How a member's transaction ended.
#[derive(Debug)]
pub enum OutcomeStatus {
    /// The member is now a clone of the canonical file.
    Committed,
    /// Cloning failed and the backup was renamed back; the member is as it was.
    RolledBack { cause: TransactionError },
    /// Nothing was changed: the member could not be stat'ed or moved aside.
    BackupFailed { cause: TransactionError },
    /// Cloning failed and so did the rename back. The member's content now exists
    /// only at the backup path and needs manual recovery.
    Irreversible {
        clone_error: TransactionError,
        rollback_error: TransactionError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    Committed,
    RolledBack,
    BackupFailed,
    Irreversible,
}

impl OutcomeStatus {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            OutcomeStatus::Committed => OutcomeKind::Committed,
            OutcomeStatus::RolledBack { .. } => OutcomeKind::RolledBack,
            OutcomeStatus::BackupFailed { .. } => OutcomeKind::BackupFailed,
            OutcomeStatus::Irreversible { .. } => OutcomeKind::Irreversible,
        }
    }
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Committed => "committed",
            OutcomeKind::RolledBack => "rolled-back",
            OutcomeKind::BackupFailed => "backup-failed",
            OutcomeKind::Irreversible => "irreversible",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct MemberOutcome {
    pub canonical: PathBuf,
    pub path: PathBuf,
    pub backup: PathBuf,
    pub status: OutcomeStatus,
    /// Metadata restore and backup cleanup failures. They never change `status`.
    pub warnings: Vec<TransactionError>,
    /// Size of the member when it was captured, 0 if it never was.
    pub size: u64,
}

impl MemberOutcome {
    pub fn kind(&self) -> OutcomeKind {
        self.status.kind()
    }
}

/// `path` with `suffix` appended to its final component, e.g. `b.txt` -> `b.txt.bak`.
pub fn backup_path(path: &Path, suffix: &str) -> PathBuf {
    let mut backup = OsString::from(path.as_os_str());
    backup.push(suffix);
    PathBuf::from(backup)
}

enum State {
    Start,
    BackedUp(MetadataSnapshot),
    Cloned(MetadataSnapshot),
    MetadataRestored,
    Committed,
}

impl State {
    fn name(&self) -> &'static str {
        match self {
            State::Start => "start",
            State::BackedUp(_) => "backed-up",
            State::Cloned(_) => "cloned",
            State::MetadataRestored => "metadata-restored",
            State::Committed => "committed",
        }
    }
}

enum Step {
    Next(State),
    Done(OutcomeStatus),
}

/// Replaces one duplicate member with a CoW clone of the canonical file:
///
/// `start -> backed-up -> cloned -> metadata-restored -> committed`
///
/// The member is first renamed to its backup path, then the clone is created at the
/// vacated path. If cloning fails the backup is renamed back. At every point the
/// member's former content sits at exactly one of the two paths. The canonical file
/// is only ever read.
pub struct CloneTransaction<'a> {
    canonical: &'a Path,
    path: &'a Path,
    backup: PathBuf,
    cloner: &'a dyn Cloner,
    remove_backup: bool,
}

impl<'a> CloneTransaction<'a> {
    pub fn new(
        canonical: &'a Path,
        path: &'a Path,
        backup_suffix: &str,
        cloner: &'a dyn Cloner,
    ) -> Self {
        Self {
            canonical,
            path,
            backup: backup_path(path, backup_suffix),
            cloner,
            remove_backup: false,
        }
    }

    /// Delete the backup after a commit instead of leaving it next to the clone.
    pub fn remove_backup(mut self, remove_backup: bool) -> Self {
        self.remove_backup = remove_backup;
        self
    }

    pub fn backup(&self) -> &Path {
        &self.backup
    }

    pub fn run(self) -> MemberOutcome {
        let mut warnings = Vec::new();
        let mut size = 0;
        let mut state = State::Start;

        let status = loop {
            match self.advance(state, &mut warnings) {
                Step::Next(next) => {
                    debug!("{}: {}", self.path.display(), next.name());
                    if let State::BackedUp(snapshot) = &next {
                        size = snapshot.size();
                    }
                    state = next;
                }
                Step::Done(status) => break status,
            }
        };

        MemberOutcome {
            canonical: self.canonical.to_path_buf(),
            path: self.path.to_path_buf(),
            backup: self.backup,
            status,
            warnings,
            size,
        }
    }

    fn advance(&self, state: State, warnings: &mut Vec<TransactionError>) -> Step {
        match state {
            State::Start => match self.back_up() {
                Ok(snapshot) => Step::Next(State::BackedUp(snapshot)),
                Err(cause) => {
                    error!("{}", cause);
                    Step::Done(OutcomeStatus::BackupFailed { cause })
                }
            },
            State::BackedUp(snapshot) => match self.cloner.clone_file(self.canonical, self.path) {
                Ok(()) => Step::Next(State::Cloned(snapshot)),
                Err(source) => Step::Done(self.roll_back(TransactionError::Clone {
                    canonical: self.canonical.to_path_buf(),
                    path: self.path.to_path_buf(),
                    source,
                })),
            },
            State::Cloned(snapshot) => {
                warnings.extend(snapshot.apply_to(self.path));
                Step::Next(State::MetadataRestored)
            }
            State::MetadataRestored => {
                if self.remove_backup {
                    if let Err(source) = fs::remove_file(&self.backup) {
                        let warning = TransactionError::BackupCleanup {
                            backup: self.backup.clone(),
                            source,
                        };
                        warn!("{}", warning);
                        warnings.push(warning);
                    }
                }
                Step::Next(State::Committed)
            }
            State::Committed => Step::Done(OutcomeStatus::Committed),
        }
    }

    fn back_up(&self) -> Result<MetadataSnapshot, TransactionError> {
        let snapshot = MetadataSnapshot::capture(self.path)?;

        // rename() replaces an existing destination, which would destroy an older backup
        if fs::symlink_metadata(&self.backup).is_ok() {
            return Err(TransactionError::BackupExists {
                backup: self.backup.clone(),
            });
        }

        fs::rename(self.path, &self.backup).map_err(|source| TransactionError::Backup {
            path: self.path.to_path_buf(),
            backup: self.backup.clone(),
            source,
        })?;

        Ok(snapshot)
    }

    fn roll_back(&self, clone_error: TransactionError) -> OutcomeStatus {
        error!("{}", clone_error);

        match fs::rename(&self.backup, self.path) {
            Ok(()) => {
                debug!("{}: rolled back", self.path.display());
                OutcomeStatus::RolledBack { cause: clone_error }
            }
            Err(source) => {
                let rollback_error = TransactionError::Rollback {
                    backup: self.backup.clone(),
                    path: self.path.to_path_buf(),
                    source,
                };
                error!(
                    "IRREVERSIBLE: {} now only exists as {}: {}",
                    self.path.display(),
                    self.backup.display(),
                    rollback_error
                );
                OutcomeStatus::Irreversible {
                    clone_error,
                    rollback_error,
                }
            }
        }
    }
}
