pub mod forest;
pub mod scaler;

use std::{
    fs,
    io::{ErrorKind, Write},
    path::Path,
    sync::Arc,
};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

pub use forest::{ForestConfig, RandomForest};
pub use scaler::StandardScaler;

use crate::{
    error::{ForensicsError, Result},
    features::{FEATURE_COUNT, FeatureVector},
};

const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Model handle shared between a service and its callers. Writers (load,
/// train) take the write lock, predictions hold the read lock.
pub type SharedModel = Arc<RwLock<ScoringModel>>;

#[derive(Debug, Clone, PartialEq)]
struct Trained {
    scaler: StandardScaler,
    forest: RandomForest,
}

/// Binary classifier over feature vectors returning P(real).
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringModel {
    config: ForestConfig,
    trained: Option<Trained>,
}

#[derive(Serialize, Deserialize)]
struct ModelArtifact {
    format_version: u32,
    feature_count: usize,
    config: ForestConfig,
    scaler: StandardScaler,
    forest: RandomForest,
    trained: bool,
}

impl ScoringModel {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trained: None,
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut model = Self::default();
        model.load(path)?;
        Ok(model)
    }

    pub fn into_shared(self) -> SharedModel {
        Arc::new(RwLock::new(self))
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn is_trained(&self) -> bool {
        self.trained.is_some()
    }

    /// Fits normalization and classifier from scratch. Labels: 1 = real, 0 = fake.
    pub fn train(&mut self, features: &[FeatureVector], labels: &[u8]) -> Result<()> {
        if features.is_empty() {
            return Err(ForensicsError::InvalidParameter(
                "training set is empty".into(),
            ));
        }
        if features.len() != labels.len() {
            return Err(ForensicsError::InvalidParameter(format!(
                "{} feature vectors but {} labels",
                features.len(),
                labels.len()
            )));
        }
        if let Some(bad) = labels.iter().find(|&&l| l > 1) {
            return Err(ForensicsError::InvalidParameter(format!(
                "labels must be 0 or 1, got {}",
                bad
            )));
        }
        let real = labels.iter().filter(|&&l| l == 1).count();
        if real == 0 || real == labels.len() {
            return Err(ForensicsError::InvalidParameter(
                "training set must contain both real and fake samples".into(),
            ));
        }

        let scaler = StandardScaler::fit(features)?;
        let rows = features.iter().map(|f| scaler.transform(f)).collect::<Vec<_>>();
        let forest = RandomForest::fit(&rows, labels, &self.config)?;

        log::info!(
            "trained {} trees on {} samples ({} real, {} fake)",
            forest.trees().len(),
            labels.len(),
            real,
            labels.len() - real
        );

        self.trained = Some(Trained { scaler, forest });

        Ok(())
    }

    /// Probability that `features` comes from a real document, using the
    /// normalization stored at training time.
    pub fn predict_proba(&self, features: &FeatureVector) -> Result<f64> {
        let trained = self.trained.as_ref().ok_or(ForensicsError::NotTrained)?;
        let scaled = trained.scaler.transform(features);
        Ok(trained.forest.predict_proba(&scaled))
    }

    /// Writes the artifact next to `path` and renames it into place.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let trained = self.trained.as_ref().ok_or(ForensicsError::NotTrained)?;

        let artifact = ModelArtifact {
            format_version: ARTIFACT_FORMAT_VERSION,
            feature_count: FEATURE_COUNT,
            config: self.config.clone(),
            scaler: trained.scaler.clone(),
            forest: trained.forest.clone(),
            trained: true,
        };
        let bytes = serde_json::to_vec(&artifact)?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| ForensicsError::Io(e.error))?;

        log::info!("model saved to {}", path.display());

        Ok(())
    }

    /// Replaces this model with the artifact at `path`. On any error the
    /// current state is left as it was.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ForensicsError::ArtifactNotFound(path.to_path_buf()),
            _ => ForensicsError::Io(e),
        })?;

        let artifact: ModelArtifact = serde_json::from_slice(&bytes)
            .map_err(|e| ForensicsError::ArtifactCorrupt(e.to_string()))?;
        Self::validate_artifact(&artifact)?;

        *self = Self {
            config: artifact.config,
            trained: Some(Trained {
                scaler: artifact.scaler,
                forest: artifact.forest,
            }),
        };

        log::info!("model loaded from {}", path.display());

        Ok(())
    }

    fn validate_artifact(artifact: &ModelArtifact) -> Result<()> {
        if artifact.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ForensicsError::ArtifactCorrupt(format!(
                "unsupported artifact version {}",
                artifact.format_version
            )));
        }
        if !artifact.trained {
            return Err(ForensicsError::ArtifactCorrupt(
                "artifact is not marked as trained".into(),
            ));
        }
        if artifact.feature_count != FEATURE_COUNT {
            return Err(ForensicsError::ArtifactCorrupt(format!(
                "artifact was trained on {} features, extractor produces {}",
                artifact.feature_count, FEATURE_COUNT
            )));
        }

        artifact.scaler.validate(FEATURE_COUNT)?;
        artifact.forest.validate(FEATURE_COUNT)
    }
}

impl Default for ScoringModel {
    fn default() -> Self {
        Self::new(ForestConfig::default())
    }
}
