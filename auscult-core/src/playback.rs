use std::path::{Path, PathBuf};

use crate::models::error::AuscultError;
use crate::models::recording::Recording;
use crate::traits::audio_output::AudioOutput;

/// Plays finished recordings through an `AudioOutput` sink.
///
/// One clip at a time: `play` tears down whatever is currently rendering
/// before opening the next file. Rendering itself runs inside the output
/// backend; the controller only tracks which file is up.
pub struct PlaybackController<O: AudioOutput> {
    output: O,
    current: Option<PathBuf>,
}

impl<O: AudioOutput> PlaybackController<O> {
    pub fn new(output: O) -> Self {
        Self {
            output,
            current: None,
        }
    }

    /// Start playing `recording` from the beginning, stopping any clip
    /// currently rendering first.
    ///
    /// Fails with `InvalidState` when the backing file no longer exists,
    /// e.g. it was deleted after being listed.
    pub fn play(&mut self, recording: &Recording) -> Result<(), AuscultError> {
        self.stop();

        if !recording.path.is_file() {
            return Err(AuscultError::InvalidState(format!(
                "recording file is gone: {:?}",
                recording.path
            )));
        }

        self.output.open(&recording.path)?;
        if let Err(e) = self.output.start() {
            self.output.stop();
            return Err(e);
        }

        self.current = Some(recording.path.clone());
        log::info!("playback started: {:?}", recording.path);
        Ok(())
    }

    /// Stop rendering and release the output sink. Safe to call when
    /// nothing is playing.
    pub fn stop(&mut self) {
        self.output.stop();
        if let Some(path) = self.current.take() {
            log::info!("playback stopped: {:?}", path);
        }
    }

    /// Path of the recording currently rendering, if any.
    pub fn current(&self) -> Option<&Path> {
        self.current.as_deref()
    }
}
