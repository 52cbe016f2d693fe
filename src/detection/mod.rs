pub mod service;

use std::{fmt, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Half-width of the manual-review band around the threshold, in probability units.
pub const UNCERTAINTY_BAND: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Real,
    Fake,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Real => write!(f, "REAL"),
            Verdict::Fake => write!(f, "FAKE"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    prediction: Verdict,
    authenticity_score: f64,
    threshold: f64,
    uncertain: bool,
}

impl DetectionResult {
    /// Applies the decision rule: REAL when `probability >= threshold`, and
    /// uncertain when the probability lies strictly inside the band around it.
    pub fn from_probability(probability: f64, threshold: f64) -> Self {
        let prediction = if probability >= threshold {
            Verdict::Real
        } else {
            Verdict::Fake
        };
        // Band edges are computed from the threshold so that a probability
        // exactly on an edge is outside the band.
        let uncertain =
            probability > threshold - UNCERTAINTY_BAND && probability < threshold + UNCERTAINTY_BAND;

        Self {
            prediction,
            authenticity_score: probability * 100.0,
            threshold: threshold * 100.0,
            uncertain,
        }
    }

    pub fn prediction(&self) -> Verdict {
        self.prediction
    }

    /// Real-class probability on a 0-100 scale.
    pub fn authenticity_score(&self) -> f64 {
        self.authenticity_score
    }

    /// Decision threshold on a 0-100 scale.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn is_uncertain(&self) -> bool {
        self.uncertain
    }

    pub fn is_real(&self) -> bool {
        self.prediction == Verdict::Real
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    #[serde(flatten)]
    result: DetectionResult,
    image_path: String,
    image_name: String,
}

impl BatchEntry {
    pub fn new(path: &Path, result: DetectionResult) -> Self {
        Self {
            result,
            image_path: path.to_string_lossy().into_owned(),
            image_name: file_name(path),
        }
    }

    pub fn result(&self) -> &DetectionResult {
        &self.result
    }

    pub fn image_path(&self) -> &str {
        &self.image_path
    }

    pub fn image_name(&self) -> &str {
        &self.image_name
    }
}

/// An image a batch could not score, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedImage {
    pub image_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    total: usize,
    real_count: usize,
    fake_count: usize,
    uncertain_count: usize,
    avg_score: f64,
    real_percentage: f64,
    fake_percentage: f64,
    results: Vec<BatchEntry>,
    #[serde(skip)]
    skipped: Vec<SkippedImage>,
}

impl BatchReport {
    /// Aggregates scored entries, keeping their order. An empty batch reports
    /// zeros everywhere.
    pub fn from_entries(results: Vec<BatchEntry>, skipped: Vec<SkippedImage>) -> Self {
        let total = results.len();
        let real_count = results.iter().filter(|e| e.result.is_real()).count();
        let fake_count = total - real_count;
        let uncertain_count = results.iter().filter(|e| e.result.uncertain).count();

        let (avg_score, real_percentage, fake_percentage) = if total == 0 {
            (0.0, 0.0, 0.0)
        } else {
            let n = total as f64;
            let sum = results
                .iter()
                .map(|e| e.result.authenticity_score)
                .sum::<f64>();
            (
                sum / n,
                real_count as f64 / n * 100.0,
                fake_count as f64 / n * 100.0,
            )
        };

        Self {
            total,
            real_count,
            fake_count,
            uncertain_count,
            avg_score,
            real_percentage,
            fake_percentage,
            results,
            skipped,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn real_count(&self) -> usize {
        self.real_count
    }

    pub fn fake_count(&self) -> usize {
        self.fake_count
    }

    pub fn uncertain_count(&self) -> usize {
        self.uncertain_count
    }

    pub fn avg_score(&self) -> f64 {
        self.avg_score
    }

    pub fn real_percentage(&self) -> f64 {
        self.real_percentage
    }

    pub fn fake_percentage(&self) -> f64 {
        self.fake_percentage
    }

    pub fn results(&self) -> &[BatchEntry] {
        &self.results
    }

    pub fn skipped(&self) -> &[SkippedImage] {
        &self.skipped
    }

    /// FAKE entries in enumeration order.
    pub fn fake_entries(&self) -> impl Iterator<Item = &BatchEntry> {
        self.results.iter().filter(|e| !e.result.is_real())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
