//! # auscult-analysis
//!
//! HTTP client for the remote lung-sound classifier. Uploads a finished
//! recording as a multipart WAV and parses the returned label and class
//! probabilities; every failure along the way collapses to
//! [`AnalysisOutcome::Unknown`] so the caller always has a verdict to
//! show.

pub mod client;
pub mod report;

pub use client::{ClassifierClient, ClassifierConfig, DEFAULT_ENDPOINT};
pub use report::{AnalysisOutcome, AnalysisReport, ClassProbabilities};
