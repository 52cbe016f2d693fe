use std::f64::consts::PI;

use image::GrayImage;

use crate::error::{ForensicsError, Result};

const LAPLACIAN: [[f64; 3]; 3] = [[1.0, -2.0, 1.0], [-2.0, 4.0, -2.0], [1.0, -2.0, 1.0]];

/// Fast global noise estimate: absolute response of a difference-of-Laplacians
/// kernel, summed over the interior of the image.
pub struct NoiseAnalyzer;

impl NoiseAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Requires both dimensions to be larger than 2.
    pub fn estimate(&self, gray: &GrayImage) -> Result<f64> {
        let (width, height) = gray.dimensions();
        if width <= 2 || height <= 2 {
            return Err(ForensicsError::FeatureExtraction(format!(
                "noise estimation needs at least 3x3 pixels, got {}x{}",
                width, height
            )));
        }

        let mut total = 0.0;
        for y in 1..height - 1 {
            for x in 1..width - 1 {
                let mut response = 0.0;
                for (ky, row) in LAPLACIAN.iter().enumerate() {
                    for (kx, weight) in row.iter().enumerate() {
                        let px = gray.get_pixel(x + kx as u32 - 1, y + ky as u32 - 1)[0] as f64;
                        response += px * weight;
                    }
                }
                total += response.abs();
            }
        }

        let interior = (width - 2) as f64 * (height - 2) as f64;

        Ok(total * (0.5 * PI).sqrt() / (6.0 * interior))
    }
}

impl Default for NoiseAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use image::Luma;

    use super::*;

    #[test]
    fn test_flat_and_linear_images_have_zero_noise() {
        let analyzer = NoiseAnalyzer::new();
        let flat = GrayImage::from_pixel(10, 10, Luma([77]));
        let ramp = GrayImage::from_fn(10, 10, |x, y| Luma([(x * 5 + y * 3) as u8]));

        assert_eq!(analyzer.estimate(&flat).unwrap(), 0.0);
        assert_eq!(analyzer.estimate(&ramp).unwrap(), 0.0);
    }

    #[test]
    fn test_single_spike_response() {
        let mut gray = GrayImage::from_pixel(5, 5, Luma([0]));
        gray.put_pixel(2, 2, Luma([10]));

        // Every interior pixel sees the spike through one kernel tap:
        // centre 4, edges 2, corners 1, for a total of 4 + 4*2 + 4*1 = 16 per unit.
        let expected = 160.0 * (0.5 * PI).sqrt() / (6.0 * 9.0);
        let noise = NoiseAnalyzer::new().estimate(&gray).unwrap();
        assert!((noise - expected).abs() < 1e-12);
    }

    #[test]
    fn test_tiny_image_is_rejected() {
        let gray = GrayImage::from_pixel(2, 50, Luma([0]));
        assert!(NoiseAnalyzer::new().estimate(&gray).is_err());
    }
}
