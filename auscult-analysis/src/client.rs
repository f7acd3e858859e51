use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};

use auscult_core::AuscultError;

use crate::report::{AnalysisOutcome, AnalysisReport};

/// Hugging Face space hosting the lung-sound classifier.
pub const DEFAULT_ENDPOINT: &str = "https://h3rsh-resp2.hf.space/predict";

/// Connection settings for the classifier service.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Blocking HTTP client for the remote classifier.
///
/// One WAV file per request, multipart-encoded under the part name
/// `file`. No retries; the caller decides whether an `Unknown` outcome
/// is worth a second attempt.
#[derive(Clone)]
pub struct ClassifierClient {
    config: ClassifierConfig,
    http: reqwest::blocking::Client,
}

impl ClassifierClient {
    pub fn new(config: ClassifierConfig) -> Result<Self, AuscultError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                AuscultError::RemoteUnavailable(format!("failed to build http client: {}", e))
            })?;
        Ok(Self { config, http })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// Upload the WAV at `path` and parse the service's verdict.
    ///
    /// `Io` when the file cannot be read; `RemoteUnavailable` for
    /// transport errors, non-success statuses, and unparseable bodies.
    pub fn try_classify(&self, path: &Path) -> Result<AnalysisReport, AuscultError> {
        let data = fs::read(path)
            .map_err(|e| AuscultError::Io(format!("failed to read {:?}: {}", path, e)))?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "recording.wav".to_string());

        let part = Part::bytes(data)
            .file_name(file_name)
            .mime_str("audio/wav")
            .map_err(|e| {
                AuscultError::RemoteUnavailable(format!("failed to build upload part: {}", e))
            })?;
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(&self.config.endpoint)
            .multipart(form)
            .send()
            .map_err(|e| {
                AuscultError::RemoteUnavailable(format!("request to classifier failed: {}", e))
            })?;

        let status = response.status();
        let body = response.text().map_err(|e| {
            AuscultError::RemoteUnavailable(format!("failed to read classifier response: {}", e))
        })?;

        if !status.is_success() {
            return Err(AuscultError::RemoteUnavailable(format!(
                "classifier returned {}: {}",
                status, body
            )));
        }

        log::debug!("classifier response: {}", body);

        serde_json::from_str(&body).map_err(|e| {
            AuscultError::RemoteUnavailable(format!("unparseable classifier response: {}", e))
        })
    }

    /// Like `try_classify`, but collapses every failure to
    /// [`AnalysisOutcome::Unknown`] so the caller always has a verdict.
    pub fn classify(&self, path: &Path) -> AnalysisOutcome {
        match self.try_classify(path) {
            Ok(report) => AnalysisOutcome::Report(report),
            Err(e) => {
                log::warn!("classification failed for {:?}: {}", path, e);
                AnalysisOutcome::Unknown {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Run `classify` on a background thread and hand the outcome to
    /// `on_result` there.
    pub fn classify_in_background(
        &self,
        path: PathBuf,
        on_result: impl FnOnce(AnalysisOutcome) + Send + 'static,
    ) -> thread::JoinHandle<()> {
        let worker = self.clone();
        thread::Builder::new()
            .name("classifier-upload".into())
            .spawn(move || on_result(worker.classify(&path)))
            .expect("failed to spawn classifier thread")
    }
}
