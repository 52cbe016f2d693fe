use image::RgbImage;
use serde::{Deserialize, Serialize};

pub mod analysis;
pub mod config;
pub mod detection;
pub mod error;
pub mod features;
pub mod image_utils;
pub mod loader;
pub mod model;
pub mod report;

pub use config::{DetectorConfig, allowed_file};
pub use detection::{
    BatchEntry, BatchReport, DetectionResult, SkippedImage, Verdict,
    service::{DetectorService, TrainingSummary},
};
pub use error::{ForensicsError, Result};
pub use features::{FEATURE_COUNT, FEATURE_NAMES, FeatureExtractor, FeatureVector};
pub use model::{ForestConfig, ScoringModel, SharedModel};

/// Error-level map: the absolute per-channel difference between an image
/// and its JPEG re-encoding, with summary statistics over every channel value.
#[derive(Debug, Clone)]
pub struct ElaResult {
    pub difference: RgbImage,
    pub max_difference: f64,
    pub mean_difference: f64,
    pub std_deviation: f64,
}

impl ElaResult {
    pub fn from_difference(difference: RgbImage) -> Self {
        let (mean_difference, std_deviation) =
            image_utils::mean_std(difference.as_raw().iter().map(|&v| v as f64));
        let max_difference = difference.as_raw().iter().copied().max().unwrap_or(0) as f64;

        Self {
            difference,
            max_difference,
            mean_difference,
            std_deviation,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TextRegionStats {
    pub mean_area: f64,
    pub std_area: f64,
    pub num_regions: usize,
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::{Path, PathBuf};

    use image::{Rgb, RgbImage};
    use imageproc::{drawing::draw_filled_rect_mut, rect::Rect};
    use rand::{Rng, SeedableRng, rngs::StdRng};

    /// Card-like test image: a soft gradient background, a few dark "text"
    /// blocks and seeded pixel noise.
    pub fn synthetic_card(width: u32, height: u32, seed: u64) -> RgbImage {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut image = RgbImage::from_fn(width, height, |x, y| {
            let base = 170 + (x * 60 / width.max(1)) as u8;
            Rgb([base, base.saturating_sub((y % 7) as u8), 200])
        });

        if width >= 24 && height >= 16 {
            for i in 0..3u32 {
                let w = 6 + rng.gen_range(0..width / 4);
                let h = 4 + rng.gen_range(0..height / 4);
                let x = rng.gen_range(0..width - w);
                let y = (i * height / 3).min(height - h);
                draw_filled_rect_mut(
                    &mut image,
                    Rect::at(x as i32, y as i32).of_size(w, h),
                    Rgb([20, 20, 40]),
                );
            }
        }

        for pixel in image.pixels_mut() {
            let jitter = rng.gen_range(0..12u8);
            pixel[0] = pixel[0].saturating_add(jitter);
        }

        image
    }

    pub fn write_png(dir: &Path, name: &str, image: &RgbImage) -> PathBuf {
        let path = dir.join(name);
        image.save(&path).unwrap();
        path
    }
}
