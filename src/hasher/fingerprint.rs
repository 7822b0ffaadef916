use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

pub const FINGERPRINT_LEN: usize = blake3::OUT_LEN;

/// BLAKE3 digest of a file's full contents. Equal fingerprints are treated as
/// equal content.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

impl Fingerprint {
    pub fn from_bytes(bytes: [u8; FINGERPRINT_LEN]) -> Self {
        Self(bytes)
    }

    pub fn of_file(path: &Path) -> io::Result<Self> {
        Self::of_reader(File::open(path)?)
    }

    /// Streams the reader through the hasher; memory use does not grow with input size.
    pub fn of_reader<R: Read>(mut reader: R) -> io::Result<Self> {
        let mut hasher = blake3::Hasher::new();
        io::copy(&mut reader, &mut hasher)?;
        Ok(Self(*hasher.finalize().as_bytes()))
    }

    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_equal_content_equal_fingerprint() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join("a"), "same bytes").unwrap();
        fs::write(tmp.path().join("b"), "same bytes").unwrap();
        fs::write(tmp.path().join("c"), "other bytes").unwrap();

        let a = Fingerprint::of_file(&tmp.path().join("a")).unwrap();
        let b = Fingerprint::of_file(&tmp.path().join("b")).unwrap();
        let c = Fingerprint::of_file(&tmp.path().join("c")).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_matches_blake3_of_contents() {
        let data = vec![0x5Au8; 200_000];
        let fp = Fingerprint::of_reader(&data[..]).unwrap();
        assert_eq!(fp.as_bytes(), blake3::hash(&data).as_bytes());
        assert_eq!(fp.to_hex().len(), FINGERPRINT_LEN * 2);
        assert_eq!(fp.to_string(), fp.to_hex());
    }

    #[test]
    fn test_missing_file_is_error() {
        let tmp = tempdir().unwrap();
        assert!(Fingerprint::of_file(&tmp.path().join("missing")).is_err());
    }
}
