use std::{f64::consts::PI, sync::Arc};

use image::GrayImage;
use ndarray::{Array2, Axis};
use num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::{
    error::{ForensicsError, Result},
    image_utils::gray_to_array,
};

/// Strength of high-frequency compression ringing, measured on an
/// orthonormal DCT-II of the whole grayscale image.
pub struct JpegArtifactAnalyzer;

impl JpegArtifactAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Mean magnitude of the coefficients whose row and column both lie
    /// past the midpoint of the spectrum.
    pub fn artifact_score(&self, gray: &GrayImage) -> Result<f64> {
        let (width, height) = gray.dimensions();
        if width == 0 || height == 0 {
            return Err(ForensicsError::FeatureExtraction(
                "cannot transform a zero-area image".into(),
            ));
        }

        let coefficients = dct_2d(&gray_to_array(gray));
        let (rows, cols) = coefficients.dim();
        let high = coefficients.slice(ndarray::s![rows / 2.., cols / 2..]);

        let count = high.len();
        let sum = high.iter().map(|c| c.abs()).sum::<f64>();

        Ok(sum / count as f64)
    }
}

impl Default for JpegArtifactAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Separable orthonormal 2-D DCT-II: rows first, then columns.
pub fn dct_2d(input: &Array2<f64>) -> Array2<f64> {
    let (rows, cols) = input.dim();
    let mut output = input.clone();
    let mut planner = FftPlanner::new();

    let row_dct = Dct1d::new(&mut planner, cols);
    for mut row in output.axis_iter_mut(Axis(0)) {
        let line = row.to_vec();
        let transformed = row_dct.process(&line);
        row.iter_mut().zip(transformed).for_each(|(dst, v)| *dst = v);
    }

    let col_dct = Dct1d::new(&mut planner, rows);
    for mut col in output.axis_iter_mut(Axis(1)) {
        let line = col.to_vec();
        let transformed = col_dct.process(&line);
        col.iter_mut().zip(transformed).for_each(|(dst, v)| *dst = v);
    }

    output
}

// DCT-II of length n through a 2n-point FFT of the mirrored signal.
struct Dct1d {
    n: usize,
    fft: Arc<dyn Fft<f64>>,
    twiddles: Vec<Complex<f64>>,
}

impl Dct1d {
    fn new(planner: &mut FftPlanner<f64>, n: usize) -> Self {
        let fft = planner.plan_fft_forward(2 * n);
        let twiddles = (0..n)
            .map(|k| Complex::from_polar(1.0, -PI * k as f64 / (2.0 * n as f64)))
            .collect();

        Self { n, fft, twiddles }
    }

    fn process(&self, input: &[f64]) -> Vec<f64> {
        let n = self.n;
        let mut buffer = vec![Complex::new(0.0, 0.0); 2 * n];
        for (i, &v) in input.iter().enumerate() {
            buffer[i] = Complex::new(v, 0.0);
            buffer[2 * n - 1 - i] = Complex::new(v, 0.0);
        }

        self.fft.process(&mut buffer);

        let dc_scale = (1.0 / n as f64).sqrt();
        let ac_scale = (2.0 / n as f64).sqrt();

        (0..n)
            .map(|k| {
                let scale = if k == 0 { dc_scale } else { ac_scale };
                (buffer[k] * self.twiddles[k]).re / 2.0 * scale
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use image::Luma;

    use super::*;

    fn naive_dct(input: &[f64]) -> Vec<f64> {
        let n = input.len() as f64;
        (0..input.len())
            .map(|k| {
                let sum = input
                    .iter()
                    .enumerate()
                    .map(|(i, &x)| x * (PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n)).cos())
                    .sum::<f64>();
                let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
                sum * scale
            })
            .collect()
    }

    #[test]
    fn test_fft_dct_matches_direct_formula() {
        let signal = [3.0, 7.0, -1.0, 4.0, 10.0, 0.5, 2.0];
        let mut planner = FftPlanner::new();
        let fast = Dct1d::new(&mut planner, signal.len()).process(&signal);
        let slow = naive_dct(&signal);

        for (a, b) in fast.iter().zip(slow.iter()) {
            assert!((a - b).abs() < 1e-9, "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_dct_2d_preserves_energy() {
        let input = Array2::from_shape_fn((6, 9), |(r, c)| ((r * 31 + c * 17) % 23) as f64);
        let output = dct_2d(&input);

        let energy_in = input.iter().map(|v| v * v).sum::<f64>();
        let energy_out = output.iter().map(|v| v * v).sum::<f64>();
        assert!((energy_in - energy_out).abs() / energy_in < 1e-9);
    }

    #[test]
    fn test_flat_image_has_no_high_frequency_energy() {
        let gray = GrayImage::from_pixel(20, 14, Luma([90]));
        let score = JpegArtifactAnalyzer::new().artifact_score(&gray).unwrap();
        assert!(score < 1e-9);
    }

    #[test]
    fn test_checkerboard_scores_higher_than_gradient() {
        let checker = GrayImage::from_fn(32, 32, |x, y| Luma([if (x + y) % 2 == 0 { 0 } else { 255 }]));
        let gradient = GrayImage::from_fn(32, 32, |x, _| Luma([(x * 8) as u8]));

        let analyzer = JpegArtifactAnalyzer::new();
        let checker_score = analyzer.artifact_score(&checker).unwrap();
        let gradient_score = analyzer.artifact_score(&gradient).unwrap();
        assert!(checker_score > gradient_score);
    }
}
