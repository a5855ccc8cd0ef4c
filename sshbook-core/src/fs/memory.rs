//! In-memory [`FileSystem`] with failure injection

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::FileSystem;

#[derive(Debug, Clone)]
struct MemoryFile {
    contents: Vec<u8>,
    mode: u32,
}

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<PathBuf, MemoryFile>,
    dirs: BTreeSet<PathBuf>,
    failing_writes: BTreeSet<PathBuf>,
    failing_renames: BTreeSet<PathBuf>,
    renames: usize,
}

/// Thread-safe in-memory filesystem
///
/// Failures can be injected per target path: [`fail_writes_to`] makes every
/// write whose path starts with the given prefix fail, and
/// [`fail_renames_onto`] makes renames onto the given target fail, which
/// simulates a crash between writing a temp file and renaming it.
///
/// [`fail_writes_to`]: MemoryFileSystem::fail_writes_to
/// [`fail_renames_onto`]: MemoryFileSystem::fail_renames_onto
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    state: Mutex<State>,
}

impl MemoryFileSystem {
    /// Creates an empty filesystem
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seeds a file with owner-only permissions
    pub fn insert(&self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
        let path = path.into();
        let mut state = self.state();
        if let Some(parent) = path.parent() {
            state.dirs.insert(parent.to_path_buf());
        }
        state.files.insert(
            path,
            MemoryFile {
                contents: contents.into(),
                mode: super::OWNER_ONLY,
            },
        );
    }

    /// Returns the contents of a file, if present
    #[must_use]
    pub fn contents(&self, path: &Path) -> Option<Vec<u8>> {
        self.state().files.get(path).map(|f| f.contents.clone())
    }

    /// Returns the permission bits of a file, if present
    #[must_use]
    pub fn mode(&self, path: &Path) -> Option<u32> {
        self.state().files.get(path).map(|f| f.mode)
    }

    /// Returns every file path currently stored
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.state().files.keys().cloned().collect()
    }

    /// Number of successful renames performed so far
    #[must_use]
    pub fn rename_count(&self) -> usize {
        self.state().renames
    }

    /// Makes writes to any path whose text starts with `prefix` fail
    pub fn fail_writes_to(&self, prefix: impl Into<PathBuf>) {
        self.state().failing_writes.insert(prefix.into());
    }

    /// Makes renames onto `target` fail
    pub fn fail_renames_onto(&self, target: impl Into<PathBuf>) {
        self.state().failing_renames.insert(target.into());
    }

    /// Removes all injected failures
    pub fn clear_failures(&self) {
        let mut state = self.state();
        state.failing_writes.clear();
        state.failing_renames.clear();
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} does not exist", path.display()),
    )
}

fn injected(path: &Path) -> io::Error {
    io::Error::other(format!("injected failure for {}", path.display()))
}

impl FileSystem for MemoryFileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.contents(path).ok_or_else(|| not_found(path))
    }

    fn write(&self, path: &Path, contents: &[u8], mode: u32) -> io::Result<()> {
        let mut state = self.state();
        let target = path.to_string_lossy();
        if state
            .failing_writes
            .iter()
            .any(|p| target.starts_with(p.to_string_lossy().as_ref()))
        {
            return Err(injected(path));
        }
        let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
        if !parent.as_os_str().is_empty() && !state.dirs.contains(&parent) {
            return Err(not_found(&parent));
        }
        state.files.insert(
            path.to_path_buf(),
            MemoryFile {
                contents: contents.to_vec(),
                mode,
            },
        );
        Ok(())
    }

    fn exists(&self, path: &Path) -> io::Result<bool> {
        Ok(self.state().files.contains_key(path))
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state();
        for ancestor in path.ancestors() {
            if !ancestor.as_os_str().is_empty() {
                state.dirs.insert(ancestor.to_path_buf());
            }
        }
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut state = self.state();
        if state.failing_renames.contains(to) {
            return Err(injected(to));
        }
        let file = state.files.remove(from).ok_or_else(|| not_found(from))?;
        state.files.insert(to.to_path_buf(), file);
        state.renames += 1;
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        self.state()
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| not_found(path))
    }

    fn list_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let state = self.state();
        if !state.dirs.contains(dir) {
            return Err(not_found(dir));
        }
        Ok(state
            .files
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .cloned()
            .collect())
    }
}
