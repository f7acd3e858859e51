use std::path::PathBuf;

use crate::models::config::CaptureConfig;
use crate::models::error::AuscultError;
use crate::models::recording::Recording;
use crate::playback::PlaybackController;
use crate::session::capture::{CaptureSession, Recorder};
use crate::storage::store::RecordingStore;
use crate::traits::audio_input::AudioInput;
use crate::traits::audio_output::AudioOutput;

/// Application-facing bundle of recorder, store, and playback for one
/// recordings directory.
///
/// The kit enforces the rule the parts cannot see on their own: the file
/// an active capture session is writing can not be deleted, renamed, or
/// played until that session stops.
pub struct AuscultKit<I: AudioInput, O: AudioOutput> {
    recorder: Recorder<I>,
    store: RecordingStore,
    playback: PlaybackController<O>,
}

impl<I: AudioInput, O: AudioOutput> AuscultKit<I, O> {
    pub fn new(input: I, output: O, config: CaptureConfig, recordings_dir: PathBuf) -> Self {
        Self {
            recorder: Recorder::new(input, config, recordings_dir.clone()),
            store: RecordingStore::new(recordings_dir),
            playback: PlaybackController::new(output),
        }
    }

    /// Start a capture session under a fresh timestamped name.
    pub fn start_recording(&self) -> Result<CaptureSession, AuscultError> {
        self.recorder.start(&Recording::timestamped_name())
    }

    /// Finished recordings, in the store's descending name order.
    pub fn recordings(&self) -> Vec<Recording> {
        self.store.list()
    }

    pub fn delete_recording(&self, recording: &Recording) -> Result<(), AuscultError> {
        self.guard_active(recording)?;
        self.store.delete(recording)
    }

    pub fn rename_recording(
        &self,
        recording: &Recording,
        new_name: &str,
    ) -> Result<Recording, AuscultError> {
        self.guard_active(recording)?;
        self.store.rename(recording, new_name)
    }

    pub fn play(&mut self, recording: &Recording) -> Result<(), AuscultError> {
        self.guard_active(recording)?;
        self.playback.play(recording)
    }

    pub fn stop_playback(&mut self) {
        self.playback.stop();
    }

    pub fn store(&self) -> &RecordingStore {
        &self.store
    }

    pub fn recorder(&self) -> &Recorder<I> {
        &self.recorder
    }

    /// Reject store and playback operations aimed at the file the active
    /// capture session is still writing.
    fn guard_active(&self, recording: &Recording) -> Result<(), AuscultError> {
        if self.recorder.active_target().as_deref() == Some(recording.path.as_path()) {
            return Err(AuscultError::InvalidState(format!(
                "recording is still being captured: {}",
                recording.name
            )));
        }
        Ok(())
    }
}
