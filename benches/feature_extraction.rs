use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use id_forensics::{FeatureExtractor, analysis::ImageAnalyzer, image_utils::rgb_to_gray};
use image::{DynamicImage, Rgb, RgbImage};

// Roughly the size of an ID card scanned at 150 dpi.
fn card_image() -> DynamicImage {
    let image = RgbImage::from_fn(510, 320, |x, y| {
        let v = ((x * 7 + y * 13) % 64) as u8;
        if (40..80).contains(&y) && x % 9 < 6 {
            Rgb([20 + v / 4, 20, 40])
        } else {
            Rgb([180 + v, 190, 200 - v / 2])
        }
    });
    DynamicImage::ImageRgb8(image)
}

fn bench_extraction(c: &mut Criterion) {
    let image = card_image();
    let gray = rgb_to_gray(&image.to_rgb8());
    let extractor = FeatureExtractor::new();
    let analyzer = ImageAnalyzer;

    c.bench_function("extract_features", |b| {
        b.iter(|| extractor.extract_from_image(black_box(&image)))
    });
    c.bench_function("calculate_ela", |b| {
        b.iter(|| analyzer.calculate_ela(black_box(&image), 90))
    });
    c.bench_function("detect_jpeg_artifacts", |b| {
        b.iter(|| analyzer.detect_jpeg_artifacts(black_box(&gray)))
    });
    c.bench_function("estimate_noise", |b| {
        b.iter(|| analyzer.estimate_noise(black_box(&gray)))
    });
}

criterion_group!(benches, bench_extraction);
criterion_main!(benches);
