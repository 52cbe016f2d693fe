use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, codecs::jpeg::JpegEncoder};

use crate::{
    ElaResult,
    error::{ForensicsError, Result},
};

pub struct ElaAnalyzer {
    quality: u8,
}

impl ElaAnalyzer {
    pub fn new(quality: u8) -> Self {
        Self { quality }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Per-channel absolute difference between the image and a JPEG
    /// re-encoding of it at `quality`.
    pub fn analyze(&self, image: &DynamicImage) -> Result<ElaResult> {
        let original = image.to_rgb8();
        let (width, height) = original.dimensions();
        if width == 0 || height == 0 {
            return Err(ForensicsError::FeatureExtraction(
                "cannot run ELA on a zero-area image".into(),
            ));
        }

        let recompressed = self.recompress_jpeg(&original)?;
        if recompressed.dimensions() != original.dimensions() {
            return Err(ForensicsError::FeatureExtraction(format!(
                "recompressed image is {:?}, expected {:?}",
                recompressed.dimensions(),
                original.dimensions()
            )));
        }

        let mut difference = RgbImage::new(width, height);
        for (x, y, orig) in original.enumerate_pixels() {
            let recomp = recompressed.get_pixel(x, y);
            difference.put_pixel(
                x,
                y,
                Rgb([
                    orig[0].abs_diff(recomp[0]),
                    orig[1].abs_diff(recomp[1]),
                    orig[2].abs_diff(recomp[2]),
                ]),
            );
        }

        Ok(ElaResult::from_difference(difference))
    }

    // The encoded bytes live only in this call's buffer; nothing touches the filesystem.
    fn recompress_jpeg(&self, rgb: &RgbImage) -> Result<RgbImage> {
        let mut buffer = Cursor::new(Vec::new());

        let encoder = JpegEncoder::new_with_quality(&mut buffer, self.quality);
        rgb.write_with_encoder(encoder).map_err(|e| {
            ForensicsError::FeatureExtraction(format!("JPEG re-encoding failed: {}", e))
        })?;

        let recompressed = image::load_from_memory_with_format(buffer.get_ref(), ImageFormat::Jpeg)
            .map_err(|e| {
                ForensicsError::FeatureExtraction(format!("JPEG re-decoding failed: {}", e))
            })?;

        Ok(recompressed.to_rgb8())
    }
}

impl Default for ElaAnalyzer {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_ELA_QUALITY)
    }
}
