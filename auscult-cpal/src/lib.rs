//! # auscult-cpal
//!
//! cpal device backend for `auscult-core`: microphone capture through
//! [`CpalAudioInput`] and clip playback through [`CpalAudioOutput`].
//!
//! cpal streams are not `Send`, so the capture stream lives on a
//! dedicated thread that it never leaves; PCM crosses to the reader
//! through a shared [`auscult_core::PcmRing`].

pub mod input;
pub mod output;

pub use input::{CpalAudioInput, CpalInputStream};
pub use output::CpalAudioOutput;
