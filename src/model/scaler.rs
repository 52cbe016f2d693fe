use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ForensicsError, Result},
    features::FeatureVector,
};

/// Per-feature standardization fitted on the training set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(samples: &[FeatureVector]) -> Result<Self> {
        if samples.is_empty() {
            return Err(ForensicsError::InvalidParameter(
                "cannot fit a scaler on zero samples".into(),
            ));
        }

        let dim = samples[0].as_slice().len();
        let flat = samples
            .iter()
            .flat_map(|s| s.as_slice().iter().copied())
            .collect::<Vec<_>>();
        let matrix = Array2::from_shape_vec((samples.len(), dim), flat)
            .map_err(|e| ForensicsError::InvalidParameter(e.to_string()))?;

        let mean = matrix
            .mean_axis(Axis(0))
            .ok_or_else(|| ForensicsError::InvalidParameter("empty feature matrix".into()))?
            .to_vec();
        // Constant columns keep their offset but are not rescaled.
        let scale = matrix
            .std_axis(Axis(0), 0.0)
            .iter()
            .map(|&s| if s > f64::EPSILON { s } else { 1.0 })
            .collect();

        Ok(Self { mean, scale })
    }

    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    pub fn transform(&self, features: &FeatureVector) -> Vec<f64> {
        features
            .as_slice()
            .iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .map(|(&x, (&mean, &scale))| (x - mean) / scale)
            .collect()
    }

    pub(crate) fn validate(&self, expected_dim: usize) -> Result<()> {
        if self.mean.len() != expected_dim || self.scale.len() != expected_dim {
            return Err(ForensicsError::ArtifactCorrupt(format!(
                "scaler has {} means and {} scales, expected {}",
                self.mean.len(),
                self.scale.len(),
                expected_dim
            )));
        }

        let finite = self.mean.iter().all(|v| v.is_finite())
            && self.scale.iter().all(|v| v.is_finite() && *v > 0.0);
        if !finite {
            return Err(ForensicsError::ArtifactCorrupt(
                "scaler parameters must be finite with positive scales".into(),
            ));
        }

        Ok(())
    }
}
