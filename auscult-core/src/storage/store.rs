use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::models::error::AuscultError;
use crate::models::recording::Recording;

/// Flat-directory store of `<name>.wav` recordings.
///
/// The store never creates the directory itself; the first capture into
/// it does. Recording identity is the file name, nothing else; there
/// are no sidecar files.
pub struct RecordingStore {
    dir: PathBuf,
}

impl RecordingStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a recording named `name` occupies in this store.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.wav", name))
    }

    /// All `.wav` recordings in the store.
    ///
    /// Ordered by name, descending lexicographically; with the
    /// `Recording_<millis>` naming scheme that is newest-first for
    /// same-length names. Never fails: a missing or unreadable
    /// directory yields an empty list.
    pub fn list(&self) -> Vec<Recording> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let mut recordings: Vec<Recording> = entries
            .flatten()
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("wav"))
            .filter_map(|path| Recording::from_path(&path))
            .collect();

        recordings.sort_by(|a, b| b.name.cmp(&a.name));
        recordings
    }

    /// Delete a recording's backing file.
    ///
    /// Deleting one that is already gone succeeds silently.
    pub fn delete(&self, recording: &Recording) -> Result<(), AuscultError> {
        match fs::remove_file(&recording.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuscultError::Io(format!(
                "failed to delete {:?}: {}",
                recording.path, e
            ))),
        }
    }

    /// Rename a recording, keeping it in this store's directory.
    ///
    /// A vanished source is `InvalidState`; a name collision is `Io` and
    /// leaves both files untouched. The move itself is a single
    /// `fs::rename`, never copy-and-delete.
    pub fn rename(&self, recording: &Recording, new_name: &str) -> Result<Recording, AuscultError> {
        if !recording.path.is_file() {
            return Err(AuscultError::InvalidState(format!(
                "recording {:?} no longer exists",
                recording.name
            )));
        }

        let dest = self.path_for(new_name);
        if dest.exists() {
            return Err(AuscultError::Io(format!(
                "a recording named {:?} already exists",
                new_name
            )));
        }

        fs::rename(&recording.path, &dest)
            .map_err(|e| AuscultError::Io(format!("rename failed: {}", e)))?;

        Ok(Recording {
            name: new_name.to_string(),
            path: dest,
        })
    }
}
