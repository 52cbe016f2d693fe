use std::path::Path;

use image::DynamicImage;
use imageproc::edges::canny;
use serde::{Deserialize, Serialize};

use crate::{
    analysis::ImageAnalyzer,
    config::DEFAULT_ELA_QUALITY,
    error::{ForensicsError, Result},
    image_utils::{channel_histogram, mean_std, rgb_to_gray},
    loader::ImageLoader,
};

pub const FEATURE_COUNT: usize = 18;

/// Column names, in the order the extractor emits them. The scoring model's
/// normalization parameters are positional, so this order is part of the
/// artifact format.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "ela_mean",
    "ela_std",
    "ela_max",
    "text_mean_area",
    "text_std_area",
    "text_num_regions",
    "edge_mean",
    "edge_std",
    "hist_std_b",
    "hist_std_g",
    "hist_std_r",
    "jpeg_artifact_score",
    "width",
    "height",
    "area",
    "noise_estimate",
    "gray_mean",
    "gray_std",
];

const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 150.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|&n| n == name)
            .map(|i| self.0[i])
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

impl From<[f64; FEATURE_COUNT]> for FeatureVector {
    fn from(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }
}

#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    analyzer: ImageAnalyzer,
    ela_quality: u8,
}

impl FeatureExtractor {
    pub fn new() -> Self {
        Self {
            analyzer: ImageAnalyzer,
            ela_quality: DEFAULT_ELA_QUALITY,
        }
    }

    pub fn with_ela_quality(mut self, quality: u8) -> Self {
        self.ela_quality = quality;
        self
    }

    pub fn extract_features<P: AsRef<Path>>(&self, path: P) -> Result<FeatureVector> {
        let image = ImageLoader::load_image(&path)?;
        self.extract_from_image(&image)
    }

    pub fn extract_from_image(&self, image: &DynamicImage) -> Result<FeatureVector> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(ForensicsError::FeatureExtraction(format!(
                "degenerate image of size {}x{}",
                width, height
            )));
        }

        let rgb = image.to_rgb8();
        let gray = rgb_to_gray(&rgb);

        let ela = self.analyzer.calculate_ela(image, self.ela_quality)?;
        let text = self.analyzer.analyze_text_regions(&gray);

        let edges = canny(&gray, CANNY_LOW, CANNY_HIGH);
        let (edge_mean, edge_std) = mean_std(edges.pixels().map(|p| p[0] as f64));

        // Histogram columns are blue, green, red.
        let [hist_b, hist_g, hist_r] = [2, 1, 0].map(|channel| {
            let (_, std) = mean_std(channel_histogram(&rgb, channel).iter().map(|&c| c as f64));
            std
        });

        let jpeg_score = self.analyzer.detect_jpeg_artifacts(&gray)?;
        let noise = self.analyzer.estimate_noise(&gray)?;
        let (gray_mean, gray_std) = mean_std(gray.pixels().map(|p| p[0] as f64));

        let (w, h) = (width as f64, height as f64);
        let features = FeatureVector([
            ela.mean_difference,
            ela.std_deviation,
            ela.max_difference,
            text.mean_area,
            text.std_area,
            text.num_regions as f64,
            edge_mean,
            edge_std,
            hist_b,
            hist_g,
            hist_r,
            jpeg_score,
            w,
            h,
            w * h,
            noise,
            gray_mean,
            gray_std,
        ]);

        if !features.is_finite() {
            let bad = FEATURE_NAMES
                .iter()
                .zip(features.values())
                .filter(|(_, v)| !v.is_finite())
                .map(|(n, _)| *n)
                .collect::<Vec<_>>();
            return Err(ForensicsError::FeatureExtraction(format!(
                "non-finite features: {}",
                bad.join(", ")
            )));
        }

        log::debug!(
            "extracted {} features from {}x{} image",
            FEATURE_COUNT,
            width,
            height
        );

        Ok(features)
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}
