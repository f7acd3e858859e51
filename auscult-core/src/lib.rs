//! # auscult-core
//!
//! Platform-agnostic lung-sound recording core library.
//!
//! Provides the WAV container codec, the concurrent capture-to-file
//! pipeline, the recording store, and playback control. Device backends
//! (such as `auscult-cpal`) implement the `AudioInput` / `AudioOutput`
//! traits and plug into the generic `Recorder` and `PlaybackController`.
//!
//! ## Architecture
//!
//! ```text
//! auscult-core (this crate)
//! ├── traits/       ← AudioInput, InputStream, AudioOutput
//! ├── models/       ← AuscultError, CaptureState, CaptureConfig, Recording
//! ├── processing/   ← WAV header codec, PcmRing
//! ├── session/      ← Recorder/CaptureSession, AuscultKit facade
//! ├── storage/      ← WavFileSink, RecordingStore
//! └── playback      ← PlaybackController
//! ```

pub mod models;
pub mod playback;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::config::CaptureConfig;
pub use models::error::AuscultError;
pub use models::recording::{CaptureOutcome, Recording};
pub use models::state::CaptureState;
pub use playback::PlaybackController;
pub use processing::ring_buffer::PcmRing;
pub use session::capture::{CaptureSession, Recorder};
pub use session::kit::AuscultKit;
pub use storage::store::RecordingStore;
pub use storage::wav_sink::WavFileSink;
pub use traits::audio_input::{AudioInput, InputStream};
pub use traits::audio_output::AudioOutput;
