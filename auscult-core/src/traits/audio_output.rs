use std::path::Path;

use crate::models::error::AuscultError;

/// Interface for platform playback backends.
///
/// `open` loads a WAV file, `start` begins rendering it on the device,
/// and rendering proceeds asynchronously until `stop`. Implementations
/// release the device on `stop` and on drop.
pub trait AudioOutput {
    /// Load the WAV file at `path` for playback.
    fn open(&mut self, path: &Path) -> Result<(), AuscultError>;

    /// Begin rendering the loaded file from its first sample.
    fn start(&mut self) -> Result<(), AuscultError>;

    /// Stop rendering and release the device. Safe to call when idle.
    fn stop(&mut self);
}
