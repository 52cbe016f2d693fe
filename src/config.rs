use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ForensicsError, Result};

pub const DEFAULT_THRESHOLD: f64 = 0.5;
pub const DEFAULT_ELA_QUALITY: u8 = 90;
pub const DEFAULT_MODEL_PATH: &str = "saved_models/id_detector.json";
pub const DEFAULT_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "tiff"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub threshold: f64,
    pub model_path: PathBuf,
    pub allowed_extensions: Vec<String>,
    pub ela_quality: u8,
    pub parallel: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            allowed_extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            ela_quality: DEFAULT_ELA_QUALITY,
            parallel: true,
        }
    }
}

impl DetectorConfig {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_model_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.model_path = path.into();
        self
    }

    pub fn with_ela_quality(mut self, quality: u8) -> Self {
        self.ela_quality = quality;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ForensicsError::InvalidParameter(format!(
                "threshold must be within [0, 1], got {}",
                self.threshold
            )));
        }

        if !(1..=100).contains(&self.ela_quality) {
            return Err(ForensicsError::InvalidParameter(format!(
                "ELA quality must be within 1..=100, got {}",
                self.ela_quality
            )));
        }

        if self.allowed_extensions.is_empty() {
            return Err(ForensicsError::InvalidParameter(
                "at least one allowed extension is required".into(),
            ));
        }

        Ok(())
    }

    pub fn allows(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| allowed_file(name, &self.allowed_extensions))
    }
}

/// True when `filename` has an extension whose lower-cased form is in `extensions`.
pub fn allowed_file<S: AsRef<str>>(filename: &str, extensions: &[S]) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => {
            let ext = ext.to_lowercase();
            extensions.iter().any(|allowed| allowed.as_ref() == ext)
        }
        None => false,
    }
}
