//! Backing-file abstraction.
//!
//! The store only needs four things from its backing file: know where it is,
//! know whether it exists, read it completely and overwrite it completely.
//! [`SettingsFile`] captures exactly that so tests can swap the file system
//! for a mock and count writes.
//!
//! # Known limitation
//!
//! [`FsSettingsFile::write_all`] truncates and rewrites the file in place.
//! There is no temp-file-and-rename step, so a crash in the middle of a write
//! can leave a truncated file behind.

use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Whole-file read/write access to the settings backing file.
#[cfg_attr(test, mockall::automock)]
pub trait SettingsFile: Send + Sync {
    /// Location of the file, used for error messages and logging.
    fn path(&self) -> PathBuf;

    /// Returns `true` if the file currently exists.
    fn exists(&self) -> bool;

    /// Creates the containing directory (and its parents) when missing.
    fn ensure_parent_dir(&self) -> io::Result<()>;

    /// Reads the complete file contents as UTF-8 text.
    fn read_to_string(&self) -> io::Result<String>;

    /// Replaces the complete file contents with `contents`.
    fn write_all(&self, contents: &str) -> io::Result<()>;
}

/// [`SettingsFile`] backed by a path on the local file system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsSettingsFile {
    path: PathBuf,
}

impl FsSettingsFile {
    /// Creates a handle for `path`.  The file does not need to exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Borrowing accessor for the underlying path.
    pub fn as_path(&self) -> &Path {
        &self.path
    }
}

impl SettingsFile for FsSettingsFile {
    fn path(&self) -> PathBuf {
        self.path.clone()
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn ensure_parent_dir(&self) -> io::Result<()> {
        match self.path.parent() {
            // A bare file name has an empty parent: the current directory.
            Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => {
                std::fs::create_dir_all(dir)?;
                debug!("created settings directory {}", dir.display());
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn read_to_string(&self) -> io::Result<String> {
        std::fs::read_to_string(&self.path)
    }

    fn write_all(&self, contents: &str) -> io::Result<()> {
        std::fs::write(&self.path, contents)
    }
}
