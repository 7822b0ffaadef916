//! Copy-on-write clone primitive.
//!
//! `dest` must not exist; the clone either produces a complete file there that shares
//! blocks with `source`, or fails and leaves nothing at `dest`. Symlinks at `source`
//! are not followed.

use std::io;
use std::path::Path;

pub trait Cloner: Send + Sync {
    fn clone_file(&self, source: &Path, dest: &Path) -> io::Result<()>;
}

/// Block-sharing clone through the filesystem: `FICLONE` on Linux (btrfs, XFS,
/// bcachefs), `clonefile` on macOS (APFS). Unsupported elsewhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReflinkCloner;

impl Cloner for ReflinkCloner {
    fn clone_file(&self, source: &Path, dest: &Path) -> io::Result<()> {
        platform::clone_file(source, dest)
    }
}

#[cfg(target_os = "linux")]
mod platform {
    use std::fs::{self, File, OpenOptions};
    use std::io;
    use std::os::unix::fs::OpenOptionsExt;
    use std::os::unix::io::AsRawFd;
    use std::path::Path;

    // _IOW(0x94, 9, int)
    #[cfg(any(
        target_arch = "powerpc",
        target_arch = "powerpc64",
        target_arch = "mips",
        target_arch = "mips64",
        target_arch = "sparc64"
    ))]
    const FICLONE: u32 = 0x8004_9409;
    #[cfg(not(any(
        target_arch = "powerpc",
        target_arch = "powerpc64",
        target_arch = "mips",
        target_arch = "mips64",
        target_arch = "sparc64"
    )))]
    const FICLONE: u32 = 0x4004_9409;

    pub(super) fn clone_file(source: &Path, dest: &Path) -> io::Result<()> {
        let src = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NOFOLLOW)
            .open(source)?;
        if !src.metadata()?.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", source.display()),
            ));
        }

        let dst = OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(0o600)
            .open(dest)?;

        if let Err(err) = ficlone(&dst, &src) {
            drop(dst);
            let _ = fs::remove_file(dest);
            return Err(err);
        }

        Ok(())
    }

    fn ficlone(dst: &File, src: &File) -> io::Result<()> {
        // SAFETY: both descriptors are open for the duration of the call and FICLONE
        // takes the source descriptor by value.
        let ret = unsafe { libc::ioctl(dst.as_raw_fd(), FICLONE as _, src.as_raw_fd()) };
        if ret == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

#[cfg(target_os = "macos")]
mod platform {
    use std::ffi::CString;
    use std::io;
    use std::os::unix::ffi::OsStrExt;
    use std::path::Path;

    fn c_path(path: &Path) -> io::Result<CString> {
        CString::new(path.as_os_str().as_bytes())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
    }

    pub(super) fn clone_file(source: &Path, dest: &Path) -> io::Result<()> {
        let src = c_path(source)?;
        let dst = c_path(dest)?;
        // SAFETY: both pointers come from live CStrings.
        let ret = unsafe { libc::clonefile(src.as_ptr(), dst.as_ptr(), libc::CLONE_NOFOLLOW) };
        if ret == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
mod platform {
    use std::io;
    use std::path::Path;

    pub(super) fn clone_file(_source: &Path, _dest: &Path) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "copy-on-write clone is not supported on this platform",
        ))
    }
}
