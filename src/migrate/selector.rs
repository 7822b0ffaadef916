use crate::index::DuplicateGroup;
use std::path::{Path, PathBuf};

/// The canonical member of a group and the members to be replaced by clones of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection<'a> {
    pub canonical: &'a Path,
    pub duplicates: &'a [PathBuf],
}

/// First path wins. The choice is positional only: the canonical member is not
/// the oldest, largest or most permissive, just the first one seen.
///
/// A single-path group selects no duplicates; an empty group selects nothing.
pub fn select<'a>(group: &DuplicateGroup<'a>) -> Option<Selection<'a>> {
    select_paths(group.paths)
}

pub fn select_paths(paths: &[PathBuf]) -> Option<Selection<'_>> {
    paths
        .split_first()
        .map(|(canonical, duplicates)| Selection {
            canonical: canonical.as_path(),
            duplicates,
        })
}
