use crate::hasher::Fingerprint;
use ahash::AHashMap;
use std::path::{Path, PathBuf};

/// Maps a content fingerprint to every path seen with that fingerprint, in the
/// order the paths were recorded. Append-only.
#[derive(Debug, Default)]
pub struct FingerprintIndex {
    slots: AHashMap<Fingerprint, usize>,
    entries: Vec<IndexEntry>,
}

#[derive(Debug)]
struct IndexEntry {
    fingerprint: Fingerprint,
    paths: Vec<PathBuf>,
}

/// An index entry with at least two paths. The first path is the canonical member.
#[derive(Debug, Clone, Copy)]
pub struct DuplicateGroup<'a> {
    pub fingerprint: &'a Fingerprint,
    pub paths: &'a [PathBuf],
}

impl FingerprintIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `path` under `fingerprint`. Callers record each path exactly once;
    /// recording the same path twice lists it twice.
    pub fn record(&mut self, path: PathBuf, fingerprint: Fingerprint) {
        match self.slots.get(&fingerprint) {
            Some(&slot) => self.entries[slot].paths.push(path),
            None => {
                self.slots.insert(fingerprint, self.entries.len());
                self.entries.push(IndexEntry {
                    fingerprint,
                    paths: vec![path],
                });
            }
        }
    }

    /// Groups with two or more paths, in the order their fingerprint was first seen.
    pub fn duplicate_groups(&self) -> impl Iterator<Item = DuplicateGroup<'_>> {
        self.entries
            .iter()
            .filter(|entry| entry.paths.len() >= 2)
            .map(|entry| DuplicateGroup {
                fingerprint: &entry.fingerprint,
                paths: &entry.paths,
            })
    }

    pub fn paths_for(&self, fingerprint: &Fingerprint) -> Option<&[PathBuf]> {
        self.slots
            .get(fingerprint)
            .map(|&slot| self.entries[slot].paths.as_slice())
    }

    /// Number of distinct fingerprints.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path_count(&self) -> usize {
        self.entries.iter().map(|entry| entry.paths.len()).sum()
    }
}

impl<'a> DuplicateGroup<'a> {
    pub fn canonical(&self) -> Option<&'a Path> {
        self.paths.first().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(byte: u8) -> Fingerprint {
        Fingerprint::from_bytes([byte; crate::hasher::FINGERPRINT_LEN])
    }

    #[test]
    fn test_groups_equal_fingerprints_in_record_order() {
        let mut index = FingerprintIndex::new();
        index.record(PathBuf::from("/r/a.txt"), fp(1));
        index.record(PathBuf::from("/r/d.txt"), fp(2));
        index.record(PathBuf::from("/r/b.txt"), fp(1));
        index.record(PathBuf::from("/r/c.txt"), fp(1));

        let groups: Vec<_> = index.duplicate_groups().collect();
        assert_eq!(groups.len(), 1, "unique fingerprint must not form a group");
        assert_eq!(groups[0].fingerprint, &fp(1));
        assert_eq!(
            groups[0].paths,
            &[
                PathBuf::from("/r/a.txt"),
                PathBuf::from("/r/b.txt"),
                PathBuf::from("/r/c.txt"),
            ]
        );
        assert_eq!(groups[0].canonical(), Some(Path::new("/r/a.txt")));
    }

    #[test]
    fn test_distinct_fingerprints_never_share_a_group() {
        let mut index = FingerprintIndex::new();
        for (i, byte) in [3u8, 4, 3, 4, 5].iter().enumerate() {
            index.record(PathBuf::from(format!("/r/{}", i)), fp(*byte));
        }

        assert_eq!(index.len(), 3);
        assert_eq!(index.path_count(), 5);
        for group in index.duplicate_groups() {
            for path in group.paths {
                let owners = index
                    .duplicate_groups()
                    .filter(|g| g.paths.contains(path))
                    .count();
                assert_eq!(owners, 1, "{} appears in more than one group", path.display());
            }
        }
        assert_eq!(index.paths_for(&fp(5)).map(|paths| paths.len()), Some(1));
        assert_eq!(index.duplicate_groups().count(), 2);
    }

    #[test]
    fn test_group_order_follows_first_sighting() {
        let mut index = FingerprintIndex::new();
        index.record(PathBuf::from("/r/x1"), fp(9));
        index.record(PathBuf::from("/r/y1"), fp(8));
        index.record(PathBuf::from("/r/y2"), fp(8));
        index.record(PathBuf::from("/r/x2"), fp(9));

        let firsts: Vec<_> = index
            .duplicate_groups()
            .filter_map(|g| g.canonical())
            .collect();
        assert_eq!(firsts, vec![Path::new("/r/x1"), Path::new("/r/y1")]);
    }

    #[test]
    fn test_empty_index() {
        let index = FingerprintIndex::new();
        assert!(index.is_empty());
        assert_eq!(index.duplicate_groups().count(), 0);
    }
}
