use image::{GrayImage, Luma, RgbImage};
use ndarray::Array2;
use statrs::statistics::Statistics;

/// ITU-R BT.601 luma, rounded to the nearest level.
pub fn rgb_to_gray(image: &RgbImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut gray = GrayImage::new(width, height);

    for (x, y, pixel) in image.enumerate_pixels() {
        let lum = 0.299 * pixel[0] as f64 + 0.587 * pixel[1] as f64 + 0.114 * pixel[2] as f64;
        gray.put_pixel(x, y, Luma([lum.round().clamp(0.0, 255.0) as u8]));
    }

    gray
}

pub fn gray_to_array(image: &GrayImage) -> Array2<f64> {
    let (width, height) = image.dimensions();
    let mut arr = Array2::zeros((height as usize, width as usize));

    for (x, y, pixel) in image.enumerate_pixels() {
        arr[[y as usize, x as usize]] = pixel[0] as f64;
    }

    arr
}

/// 256-bin histogram of one channel of an RGB image.
pub fn channel_histogram(image: &RgbImage, channel: usize) -> [u32; 256] {
    let mut histogram = [0u32; 256];

    for pixel in image.pixels() {
        histogram[pixel[channel] as usize] += 1;
    }

    histogram
}

/// Population mean and standard deviation. Empty input yields `(0.0, 0.0)`.
pub fn mean_std<I>(values: I) -> (f64, f64)
where
    I: IntoIterator<Item = f64>,
{
    let values = values.into_iter().collect::<Vec<_>>();
    if values.is_empty() {
        return (0.0, 0.0);
    }

    let mean = values.iter().mean();
    let std = values.iter().population_std_dev();

    (mean, if std.is_nan() { 0.0 } else { std })
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;

    #[test]
    fn test_rgb_to_gray_rounds() {
        let mut image = RgbImage::new(2, 1);
        image.put_pixel(0, 0, Rgb([255, 255, 255]));
        image.put_pixel(1, 0, Rgb([10, 20, 30]));

        let gray = rgb_to_gray(&image);
        assert_eq!(gray.get_pixel(0, 0)[0], 255);
        // 2.99 + 11.74 + 3.42 = 18.15
        assert_eq!(gray.get_pixel(1, 0)[0], 18);
    }

    #[test]
    fn test_channel_histogram_counts_every_pixel() {
        let image = RgbImage::from_pixel(4, 3, Rgb([1, 2, 3]));
        let hist = channel_histogram(&image, 2);
        assert_eq!(hist[3], 12);
        assert_eq!(hist.iter().sum::<u32>(), 12);
    }

    #[test]
    fn test_mean_std_population() {
        let (mean, std) = mean_std([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((mean - 5.0).abs() < 1e-12);
        assert!((std - 2.0).abs() < 1e-12);
        assert_eq!(mean_std(std::iter::empty()), (0.0, 0.0));
        assert_eq!(mean_std([3.0]), (3.0, 0.0));
    }
}
