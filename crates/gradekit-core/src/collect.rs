//! Source file collection for the quality evaluation.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use walkdir::WalkDir;

pub const SOURCE_SUBTREE: &str = "lib";
pub const SOURCE_EXTENSION: &str = "dart";

/// A source file read from the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectedFile {
    /// Path relative to the workspace root, `/`-separated.
    pub relative_path: String,
    pub content: String,
}

/// Collect every `*.{extension}` file under `root/subtree`.
///
/// Symlinks are not followed, including a symlinked subtree root, so no
/// file outside `root/subtree` is ever read. Unreadable entries are skipped with a warning.
/// A missing subtree yields an empty list.
pub fn collect_sources(root: &Path, subtree: &str, extension: &str) -> Vec<CollectedFile> {
    let base = root.join(subtree);
    match std::fs::symlink_metadata(&base) {
        Ok(meta) if meta.file_type().is_symlink() => {
            warn!(path = %base.display(), "Source subtree is a symlink, not collecting");
            return Vec::new();
        }
        Ok(meta) if meta.is_dir() => {}
        _ => {
            debug!(path = %base.display(), "Source subtree not found");
            return Vec::new();
        }
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(&base).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }

        let content = match std::fs::read_to_string(entry.path()) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "Skipping unreadable file");
                continue;
            }
        };

        let relative_path = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        files.push(CollectedFile {
            relative_path,
            content,
        });
    }

    debug!(count = files.len(), "Collected source files");
    files
}

/// Collect the reference subtree and extension.
pub fn collect_dart_sources(root: &Path) -> Vec<CollectedFile> {
    collect_sources(root, SOURCE_SUBTREE, SOURCE_EXTENSION)
}
