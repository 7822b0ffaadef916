use super::clone::Cloner;
use super::selector;
use super::transaction::{CloneTransaction, MemberOutcome, OutcomeKind};
use crate::config::DEFAULT_BACKUP_SUFFIX;
use crate::index::{DuplicateGroup, FingerprintIndex};
use crate::progress::ProgressReporter;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Outcomes of one migration run, one per duplicate member processed.
#[derive(Debug, Default)]
pub struct MigrationSummary {
    pub outcomes: Vec<MemberOutcome>,
    /// The run stopped early on the cancel token; remaining groups were not touched.
    pub cancelled: bool,
}

impl MigrationSummary {
    fn count(&self, kind: OutcomeKind) -> usize {
        self.outcomes.iter().filter(|o| o.kind() == kind).count()
    }

    pub fn committed(&self) -> usize {
        self.count(OutcomeKind::Committed)
    }

    pub fn rolled_back(&self) -> usize {
        self.count(OutcomeKind::RolledBack)
    }

    pub fn backup_failed(&self) -> usize {
        self.count(OutcomeKind::BackupFailed)
    }

    pub fn irreversible(&self) -> usize {
        self.count(OutcomeKind::Irreversible)
    }

    /// Members whose content now exists only at their backup path.
    pub fn irreversible_outcomes(&self) -> impl Iterator<Item = &MemberOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.kind() == OutcomeKind::Irreversible)
    }

    pub fn warnings(&self) -> usize {
        self.outcomes.iter().map(|o| o.warnings.len()).sum()
    }

    pub fn reclaimed_bytes(&self) -> u64 {
        self.outcomes
            .iter()
            .filter(|o| o.kind() == OutcomeKind::Committed)
            .map(|o| o.size)
            .sum()
    }

    pub fn outcome_for(&self, path: &std::path::Path) -> Option<&MemberOutcome> {
        self.outcomes.iter().find(|o| o.path == path)
    }
}

/// Drives one `CloneTransaction` per duplicate member. Groups run one after another
/// and so do the members of a group; a failed member never stops the run.
pub struct Migrator<'c> {
    cloner: &'c dyn Cloner,
    backup_suffix: String,
    remove_backups: bool,
    cancel_token: Arc<AtomicBool>,
}

impl<'c> Migrator<'c> {
    pub fn new(cloner: &'c dyn Cloner) -> Self {
        Self {
            cloner,
            backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
            remove_backups: false,
            cancel_token: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_backup_suffix(mut self, suffix: &str) -> Self {
        self.backup_suffix = suffix.to_string();
        self
    }

    pub fn with_remove_backups(mut self, remove_backups: bool) -> Self {
        self.remove_backups = remove_backups;
        self
    }

    pub fn with_cancel_token(mut self, cancel_token: Arc<AtomicBool>) -> Self {
        self.cancel_token = cancel_token;
        self
    }

    pub fn cancel_token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel_token)
    }

    pub fn migrate_index(
        &self,
        index: &FingerprintIndex,
        reporter: &dyn ProgressReporter,
    ) -> MigrationSummary {
        let groups: Vec<DuplicateGroup<'_>> = index.duplicate_groups().collect();
        self.migrate_groups(&groups, reporter)
    }

    /// Migrates an already confirmed list of groups.
    pub fn migrate_groups(
        &self,
        groups: &[DuplicateGroup<'_>],
        reporter: &dyn ProgressReporter,
    ) -> MigrationSummary {
        let total: usize = groups
            .iter()
            .map(|group| group.len().saturating_sub(1))
            .sum();
        reporter.on_migrate_start(total);

        let mut summary = MigrationSummary::default();

        for group in groups {
            if self.cancel_token.load(Ordering::Relaxed) {
                warn!(
                    "Migration cancelled after {} of {} members",
                    summary.outcomes.len(),
                    total
                );
                summary.cancelled = true;
                break;
            }

            let Some(selection) = selector::select(group) else {
                continue;
            };

            for duplicate in selection.duplicates {
                let outcome = CloneTransaction::new(
                    selection.canonical,
                    duplicate,
                    &self.backup_suffix,
                    self.cloner,
                )
                .remove_backup(self.remove_backups)
                .run();
                summary.outcomes.push(outcome);
                reporter.on_migrate_progress(
                    summary.outcomes.len(),
                    total,
                    &duplicate.to_string_lossy(),
                );
            }
        }

        info!(
            "Migration finished: {} committed, {} rolled back, {} backup failed, {} irreversible",
            summary.committed(),
            summary.rolled_back(),
            summary.backup_failed(),
            summary.irreversible(),
        );
        reporter.on_migrate_complete(&summary);

        summary
    }
}
