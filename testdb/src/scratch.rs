//! Temporary directories for test server data.

use std::path::{Path, PathBuf};

use log::debug;
use tempfile::TempDir;

use crate::error::Result;

/// A temporary directory holding one or more server data directories.
///
/// Everything beneath it is removed when it is dropped, unless
/// [`ScratchSpace::keep`] was called first. Stop any server running on a data
/// directory before dropping the scratch space.
///
/// # Examples
///
/// ```
/// use testdb::ScratchSpace;
///
/// let scratch = ScratchSpace::new().unwrap();
/// let data = scratch.data_dir("fargle");
/// assert!(data.starts_with(scratch.path()));
/// assert!(!data.exists());
/// ```
#[derive(Debug)]
pub struct ScratchSpace {
    dir: TempDir,
}

impl ScratchSpace {
    /// Create a scratch directory under the system temp directory.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be created.
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("testdb").tempdir()?;
        debug!("created scratch space {}", dir.path().display());
        Ok(Self { dir })
    }

    /// Create a scratch directory under `parent`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be created.
    pub fn new_in(parent: impl AsRef<Path>) -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("testdb").tempdir_in(parent)?;
        Ok(Self { dir })
    }

    /// Root of the scratch space.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path for a data directory called `name`. Not created: the initializer
    /// does that.
    #[must_use]
    pub fn data_dir(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Detach the directory from cleanup and return its path.
    #[must_use]
    pub fn keep(self) -> PathBuf {
        let path = self.dir.keep();
        debug!("keeping scratch space {}", path.display());
        path
    }
}
