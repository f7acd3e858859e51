use thiserror::Error;

/// Errors that can occur across capture, storage, playback, and analysis.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuscultError {
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("i/o error: {0}")]
    Io(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("remote analysis unavailable: {0}")]
    RemoteUnavailable(String),
}
