use crate::models::config::CaptureConfig;
use crate::models::error::AuscultError;

/// Interface for platform audio capture backends.
///
/// Implemented by `auscult-cpal`'s microphone input and by scripted
/// fakes in tests. The recorder opens one stream per session at a fixed
/// configuration and polls it from a dedicated writer thread.
pub trait AudioInput {
    type Stream: InputStream + 'static;

    /// Open a capture stream delivering PCM at `config`.
    ///
    /// Fails with `DeviceUnavailable` when no usable device exists or
    /// the device rejects the configuration.
    fn open(&self, config: &CaptureConfig) -> Result<Self::Stream, AuscultError>;
}

/// An open capture stream of interleaved little-endian PCM bytes.
///
/// The stream releases its device when dropped.
pub trait InputStream: Send {
    /// Read up to `buf.len()` captured bytes.
    ///
    /// `Ok(0)` means no data is ready yet, never end-of-stream; the
    /// caller polls again. Transient device hiccups must surface as
    /// `Ok(0)`, not `Err`. An `Err` is fatal and aborts the capture
    /// session.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, AuscultError>;
}
