use std::{
    fs,
    path::{Path, PathBuf},
};

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::{
    config::DetectorConfig,
    detection::{BatchEntry, BatchReport, DetectionResult, SkippedImage, file_name},
    error::{ForensicsError, Result},
    features::{FeatureExtractor, FeatureVector},
    loader::ImageLoader,
    model::{ScoringModel, SharedModel},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainingSummary {
    pub real_samples: usize,
    pub fake_samples: usize,
    pub skipped: usize,
}

/// Feature extraction plus scoring for single images and folders.
pub struct DetectorService {
    config: DetectorConfig,
    extractor: FeatureExtractor,
    model: SharedModel,
}

impl DetectorService {
    /// Service with an empty (untrained) model.
    pub fn new(config: DetectorConfig) -> Result<Self> {
        Self::with_model(config, ScoringModel::default().into_shared())
    }

    pub fn with_model(config: DetectorConfig, model: SharedModel) -> Result<Self> {
        config.validate()?;
        let extractor = FeatureExtractor::new().with_ela_quality(config.ela_quality);

        Ok(Self {
            config,
            extractor,
            model,
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn model(&self) -> SharedModel {
        self.model.clone()
    }

    pub fn is_trained(&self) -> bool {
        self.model.read().is_trained()
    }

    pub fn allowed_file(&self, filename: &str) -> bool {
        crate::config::allowed_file(filename, &self.config.allowed_extensions)
    }

    /// Loads the artifact and swaps it in. Predictions running concurrently
    /// see either the old or the new model, never a mix.
    pub fn load_model<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let loaded = ScoringModel::from_file(path)?;
        *self.model.write() = loaded;
        Ok(())
    }

    pub fn load_default_model(&self) -> Result<()> {
        self.load_model(&self.config.model_path)
    }

    pub fn save_model<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        self.model.read().save(path)
    }

    /// Extracts features from both sets (label 1 for real, 0 for fake) and
    /// trains a fresh model. Unreadable images are logged and left out.
    pub fn train(&self, real_paths: &[PathBuf], fake_paths: &[PathBuf]) -> Result<TrainingSummary> {
        log::info!(
            "training on {} real and {} fake images",
            real_paths.len(),
            fake_paths.len()
        );

        let real = self.extract_all(real_paths);
        let fake = self.extract_all(fake_paths);
        let skipped = real_paths.len() + fake_paths.len() - real.len() - fake.len();

        let labels = std::iter::repeat_n(1u8, real.len())
            .chain(std::iter::repeat_n(0u8, fake.len()))
            .collect::<Vec<_>>();
        let features = real.iter().chain(fake.iter()).copied().collect::<Vec<_>>();

        let mut model = ScoringModel::new(self.model.read().config().clone());
        model.train(&features, &labels)?;
        *self.model.write() = model;

        Ok(TrainingSummary {
            real_samples: real.len(),
            fake_samples: fake.len(),
            skipped,
        })
    }

    pub fn predict<P: AsRef<Path>>(&self, path: P) -> Result<DetectionResult> {
        let model = self.model.read();
        self.predict_with(&model, path.as_ref())
    }

    /// Scores every supported image directly inside `folder`. A failing image
    /// is logged and skipped; it never fails the batch.
    pub fn predict_batch<P: AsRef<Path>>(&self, folder: P) -> Result<BatchReport> {
        let model = self.model.read();
        if !model.is_trained() {
            return Err(ForensicsError::NotTrained);
        }

        let scoring: &ScoringModel = &model;

        let paths = ImageLoader::images_in_folder(folder.as_ref(), &self.config.allowed_extensions)?;
        log::info!("processing {} images from {}", paths.len(), folder.as_ref().display());

        let outcomes = if self.config.parallel {
            paths
                .par_iter()
                .map(|p| self.predict_with(scoring, p))
                .collect::<Vec<_>>()
        } else {
            paths.iter().map(|p| self.predict_with(scoring, p)).collect()
        };

        let mut entries = Vec::with_capacity(paths.len());
        let mut skipped = Vec::new();
        for (path, outcome) in paths.iter().zip(outcomes) {
            match outcome {
                Ok(result) => entries.push(BatchEntry::new(path, result)),
                Err(e) if e.is_per_image() => {
                    log::warn!("error processing {}: {}", file_name(path), e);
                    skipped.push(SkippedImage {
                        image_name: file_name(path),
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        Ok(BatchReport::from_entries(entries, skipped))
    }

    fn predict_with(&self, model: &ScoringModel, path: &Path) -> Result<DetectionResult> {
        if !model.is_trained() {
            return Err(ForensicsError::NotTrained);
        }

        let features = self.extractor.extract_features(path)?;
        let probability = model.predict_proba(&features)?;

        Ok(DetectionResult::from_probability(probability, self.config.threshold))
    }

    fn extract_all(&self, paths: &[PathBuf]) -> Vec<FeatureVector> {
        paths
            .iter()
            .filter_map(|path| match self.extractor.extract_features(path) {
                Ok(features) => Some(features),
                Err(e) => {
                    log::warn!("skipping {} during training: {}", file_name(path), e);
                    None
                }
            })
            .collect()
    }
}
