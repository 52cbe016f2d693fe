use image::{GrayImage, Luma};
use imageproc::{contours::find_contours, contrast::otsu_level, point::Point};

use crate::{TextRegionStats, image_utils::mean_std};

pub struct TextRegionAnalyzer {
    min_area: f64,
}

impl TextRegionAnalyzer {
    pub fn new() -> Self {
        Self { min_area: 50.0 }
    }

    /// Otsu-binarizes the image and summarizes the areas of the outermost
    /// contours larger than `min_area`.
    pub fn analyze(&self, gray: &GrayImage) -> TextRegionStats {
        let level = otsu_level(gray);
        let binary = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
            if gray.get_pixel(x, y)[0] > level {
                Luma([255])
            } else {
                Luma([0])
            }
        });

        let areas = find_contours::<i32>(&binary)
            .into_iter()
            .filter(|c| c.parent.is_none())
            .map(|c| polygon_area(&c.points))
            .filter(|&area| area > self.min_area)
            .collect::<Vec<_>>();

        if areas.is_empty() {
            return TextRegionStats::default();
        }

        let (mean_area, std_area) = mean_std(areas.iter().copied());

        TextRegionStats {
            mean_area,
            std_area,
            num_regions: areas.len(),
        }
    }
}

impl Default for TextRegionAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Shoelace area of a closed contour traced through pixel centres.
fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let twice_area = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum::<i64>();

    twice_area.abs() as f64 / 2.0
}
