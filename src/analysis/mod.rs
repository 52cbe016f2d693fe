pub mod ela;
pub mod jpeg_analysis;
pub mod noise;
pub mod text_regions;

use image::{DynamicImage, GrayImage};

use crate::{
    ElaResult, TextRegionStats,
    analysis::{
        ela::ElaAnalyzer, jpeg_analysis::JpegArtifactAnalyzer, noise::NoiseAnalyzer,
        text_regions::TextRegionAnalyzer,
    },
    error::Result,
};

/// Stateless forensic primitives over a single image.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageAnalyzer;

impl ImageAnalyzer {
    pub fn calculate_ela(&self, image: &DynamicImage, quality: u8) -> Result<ElaResult> {
        ElaAnalyzer::new(quality).analyze(image)
    }

    pub fn detect_jpeg_artifacts(&self, gray: &GrayImage) -> Result<f64> {
        JpegArtifactAnalyzer::new().artifact_score(gray)
    }

    pub fn estimate_noise(&self, gray: &GrayImage) -> Result<f64> {
        NoiseAnalyzer::new().estimate(gray)
    }

    pub fn analyze_text_regions(&self, gray: &GrayImage) -> TextRegionStats {
        TextRegionAnalyzer::new().analyze(gray)
    }
}
