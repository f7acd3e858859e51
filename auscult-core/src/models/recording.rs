use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A stored recording: display name plus the backing `.wav` file.
///
/// Values are snapshots, not live handles. After a rename or delete,
/// re-fetch through `RecordingStore::list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recording {
    /// Display name; the file on disk is `<name>.wav`.
    pub name: String,

    /// Path of the backing file.
    pub path: PathBuf,
}

impl Recording {
    /// Build a `Recording` from a `.wav` path.
    ///
    /// Returns `None` when the path has no UTF-8 file stem.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_stem()?.to_str()?.to_string();
        Some(Self {
            name,
            path: path.to_path_buf(),
        })
    }

    /// Default name scheme for new recordings: `Recording_<unix millis>`.
    pub fn timestamped_name() -> String {
        format!("Recording_{}", chrono::Utc::now().timestamp_millis())
    }
}

/// Summary returned when a capture session finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureOutcome {
    pub recording: Recording,

    /// PCM payload bytes written (file size minus the 44-byte header).
    pub bytes_written: u64,

    pub duration_secs: f64,

    /// SHA-256 hex digest of the finalized file.
    pub checksum: String,
}
