//! Required-file checks on a cloned workspace.

use std::path::Path;

use serde::{Deserialize, Serialize};

pub const MANIFEST_FILE: &str = "pubspec.yaml";
pub const ENTRY_POINT_FILE: &str = "lib/main.dart";

/// Which of the required files are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureStatus {
    Valid,
    BothMissing,
    ManifestMissing,
    EntryPointMissing,
}

impl StructureStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, StructureStatus::Valid)
    }

    pub fn message(&self) -> String {
        match self {
            StructureStatus::Valid => {
                format!("Found {MANIFEST_FILE} and {ENTRY_POINT_FILE}")
            }
            StructureStatus::BothMissing => {
                format!("Missing both {MANIFEST_FILE} and {ENTRY_POINT_FILE}")
            }
            StructureStatus::ManifestMissing => format!("Missing {MANIFEST_FILE}"),
            StructureStatus::EntryPointMissing => format!("Missing {ENTRY_POINT_FILE}"),
        }
    }
}

/// Check the workspace for the manifest and the entry-point source file.
pub fn validate_structure(root: &Path) -> StructureStatus {
    let manifest = root.join(MANIFEST_FILE).is_file();
    let entry_point = root.join(ENTRY_POINT_FILE).is_file();
    match (manifest, entry_point) {
        (true, true) => StructureStatus::Valid,
        (false, false) => StructureStatus::BothMissing,
        (false, true) => StructureStatus::ManifestMissing,
        (true, false) => StructureStatus::EntryPointMissing,
    }
}
