//! Ephemeral workspace directories owned by a single evaluation.

use std::io;
use std::path::{Path, PathBuf};

use crate::obs;

/// A directory that is removed when the evaluation that owns it ends.
///
/// Call [`Workspace::cleanup`] on the normal path to observe removal errors;
/// `Drop` removes the directory on every other exit path.
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
    released: bool,
}

impl Workspace {
    /// Create `root/name` (and `root` if needed). Fails if `root/name` exists.
    ///
    /// The stored path is absolute even when `root` is relative.
    pub fn create(root: &Path, name: &str) -> io::Result<Self> {
        std::fs::create_dir_all(root)?;
        let path = std::path::absolute(root.join(name))?;
        std::fs::create_dir(&path)?;
        Ok(Self {
            path,
            released: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the directory now.
    pub async fn cleanup(mut self) -> io::Result<()> {
        self.released = true;
        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => obs::emit_cleanup_failed(&self.path, &e),
        }
    }
}
