use serde::{Deserialize, Serialize};

/// Per-class probabilities from the classifier, each in `0.0..=1.0`.
///
/// Classes the service leaves out of a payload default to zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassProbabilities {
    #[serde(default)]
    pub healthy: f64,
    #[serde(default)]
    pub wheezes: f64,
    #[serde(default)]
    pub crackles: f64,
    #[serde(default)]
    pub crackles_and_wheezes: f64,
}

impl ClassProbabilities {
    /// Combined probability of the three abnormal classes.
    pub fn abnormal(&self) -> f64 {
        self.wheezes + self.crackles + self.crackles_and_wheezes
    }
}

/// Parsed classifier response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub label: Option<String>,
    pub confidence: Option<f64>,
    #[serde(default)]
    pub probabilities: ClassProbabilities,
}

impl AnalysisReport {
    /// Whether the service labelled the recording healthy, compared
    /// case-insensitively.
    pub fn is_healthy(&self) -> bool {
        self.label
            .as_deref()
            .is_some_and(|l| l.eq_ignore_ascii_case("healthy"))
    }

    pub fn confidence_or_zero(&self) -> f64 {
        self.confidence.unwrap_or(0.0)
    }
}

/// Final outcome of a classification attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Report(AnalysisReport),
    /// The recording could not be classified; `reason` is for logs and
    /// error surfaces, not for branching.
    Unknown { reason: String },
}

impl AnalysisOutcome {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown { .. })
    }

    pub fn report(&self) -> Option<&AnalysisReport> {
        match self {
            Self::Report(report) => Some(report),
            Self::Unknown { .. } => None,
        }
    }
}
