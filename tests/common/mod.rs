#![allow(dead_code)]

use clone_duper::migrate::backup_path;
use clone_duper::Cloner;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Stands in for a CoW clone on filesystems without one: writes a fresh file with
/// default permissions, so metadata restore is observable.
#[derive(Default)]
pub struct CopyCloner {
    pub calls: Mutex<Vec<(PathBuf, PathBuf)>>,
}

impl Cloner for CopyCloner {
    fn clone_file(&self, source: &Path, dest: &Path) -> io::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((source.to_path_buf(), dest.to_path_buf()));
        let data = fs::read(source)?;
        let mut out = OpenOptions::new().write(true).create_new(true).open(dest)?;
        out.write_all(&data)?;
        Ok(())
    }
}

/// Fails for the listed destinations, copies for everything else.
pub struct FailingCloner {
    pub fail_for: Vec<PathBuf>,
    pub inner: CopyCloner,
}

impl FailingCloner {
    pub fn new(fail_for: Vec<PathBuf>) -> Self {
        Self {
            fail_for,
            inner: CopyCloner::default(),
        }
    }
}

impl Cloner for FailingCloner {
    fn clone_file(&self, source: &Path, dest: &Path) -> io::Result<()> {
        if self.fail_for.iter().any(|p| p == dest) {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "simulated clone failure",
            ));
        }
        self.inner.clone_file(source, dest)
    }
}

/// Moves the member's backup out of the way and then fails, so the rename back
/// cannot succeed.
pub struct BackupStealingCloner {
    pub suffix: String,
}

impl Cloner for BackupStealingCloner {
    fn clone_file(&self, _source: &Path, dest: &Path) -> io::Result<()> {
        let backup = backup_path(dest, &self.suffix);
        let _ = fs::rename(&backup, backup_path(dest, ".lost"));
        Err(io::Error::new(io::ErrorKind::Other, "simulated clone failure"))
    }
}

/// Claims success without creating the destination, so nothing is there to
/// take the restored metadata.
pub struct VanishingCloner;

impl Cloner for VanishingCloner {
    fn clone_file(&self, _source: &Path, _dest: &Path) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(unix)]
pub fn mode_of(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).unwrap().permissions().mode() & 0o7777
}

#[cfg(unix)]
pub fn set_mode(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
}

pub fn write_file(path: &Path, contents: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}
