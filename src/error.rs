use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForensicsError {
    #[error("Input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Feature extraction failed: {0}")]
    FeatureExtraction(String),

    #[error("Model not trained. Load or train a model first")]
    NotTrained,

    #[error("Model artifact not found: {}", .0.display())]
    ArtifactNotFound(PathBuf),

    #[error("Model artifact is corrupt: {0}")]
    ArtifactCorrupt(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ForensicsError {
    /// Errors that belong to a single image and must not abort a batch.
    pub fn is_per_image(&self) -> bool {
        matches!(
            self,
            ForensicsError::InputNotFound(_)
                | ForensicsError::UnsupportedFormat(_)
                | ForensicsError::FeatureExtraction(_)
                | ForensicsError::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ForensicsError>;
