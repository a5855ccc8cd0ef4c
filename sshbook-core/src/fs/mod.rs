//! Filesystem capability used by every store
//!
//! All reads and writes of the SSH config, its backups, the metadata file and
//! the secret file go through [`FileSystem`]. [`OsFileSystem`] talks to the
//! real disk; [`MemoryFileSystem`] keeps everything in memory and can inject
//! failures so crash scenarios can be exercised in tests.

mod memory;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub use memory::MemoryFileSystem;

/// Owner read/write permission bits used for every managed file
pub const OWNER_ONLY: u32 = 0o600;

/// Permission bits used when creating parent directories
pub const DIR_PERMISSIONS: u32 = 0o750;

/// Minimal set of filesystem primitives the repository relies on
pub trait FileSystem: Send + Sync + std::fmt::Debug {
    /// Reads the whole file
    ///
    /// # Errors
    ///
    /// Returns `io::ErrorKind::NotFound` if the file does not exist.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Creates or truncates `path`, writes `contents`, applies `mode` and
    /// flushes the data to stable storage
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    fn write(&self, path: &Path, contents: &[u8], mode: u32) -> io::Result<()>;

    /// Returns true if a file exists at `path`
    ///
    /// # Errors
    ///
    /// Returns an error if the existence cannot be determined.
    fn exists(&self, path: &Path) -> io::Result<bool>;

    /// Creates `path` and all of its missing parents
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Atomically replaces `to` with `from`
    ///
    /// # Errors
    ///
    /// Returns an error if the rename fails; `to` is left untouched.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Removes a single file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be removed.
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Lists the files directly inside `dir`
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;
}

/// [`FileSystem`] backed by the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write(&self, path: &Path, contents: &[u8], mode: u32) -> io::Result<()> {
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(mode);
        }

        let mut file = options.open(path)?;
        file.write_all(contents)?;

        // The creation mode is subject to the umask and ignored for existing
        // files, so set the bits explicitly.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(mode))?;
        }
        #[cfg(not(unix))]
        let _ = mode;

        file.sync_all()
    }

    fn exists(&self, path: &Path) -> io::Result<bool> {
        path.try_exists()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        if path.as_os_str().is_empty() || path.is_dir() {
            return Ok(());
        }
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(DIR_PERMISSIONS);
        }
        builder.create(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)?;
        #[cfg(unix)]
        {
            if let Some(dir) = to.parent().filter(|d| !d.as_os_str().is_empty()) {
                if let Ok(dir) = fs::File::open(dir) {
                    let _ = dir.sync_all();
                }
            }
        }
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn list_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.path());
            }
        }
        Ok(files)
    }
}

/// Reads a file, mapping `NotFound` to `None`
///
/// # Errors
///
/// Returns any I/O error other than `NotFound`.
pub fn read_optional(fs: &dyn FileSystem, path: &Path) -> io::Result<Option<Vec<u8>>> {
    match fs.read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
