use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;

use press_core::{ImageFormat, JobConfig};

use crate::types::TransformError;

/// How the re-encoded bytes are stored inside the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamFilter {
    /// JPEG bytes (DCTDecode).
    Dct,
    /// Zlib-compressed raw samples (FlateDecode).
    Flate,
}

/// A re-encoded image ready to replace an embedded original.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Single gray channel when true, 8-bit RGB otherwise.
    pub grayscale: bool,
    pub filter: StreamFilter,
}

/// Apply the job's color/scale policy to decoded pixels and re-encode.
///
/// `quality == 0` never reaches this point; the caller removes the image
/// instead. Sources with alpha or extra channels are normalized to RGB
/// before any other step.
pub fn recode(image: DynamicImage, config: &JobConfig) -> Result<EncodedImage, TransformError> {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut normalized = DynamicImage::ImageRgb8(rgb);
    if config.grayscale {
        normalized = DynamicImage::ImageLuma8(normalized.to_luma8());
    }

    // Both dimensions scale by the ratio, floored at one pixel.
    let target_w = ((width as f32 * config.resize_ratio) as u32).max(1);
    let target_h = ((height as f32 * config.resize_ratio) as u32).max(1);
    let resized = if (target_w, target_h) == (width, height) {
        normalized
    } else {
        normalized.resize_exact(target_w, target_h, FilterType::CatmullRom)
    };

    match config.format {
        ImageFormat::Jpeg => {
            let mut data = Vec::new();
            let encoder = JpegEncoder::new_with_quality(&mut data, config.quality);
            resized
                .write_with_encoder(encoder)
                .map_err(|err| TransformError::Encode(err.to_string()))?;
            Ok(EncodedImage {
                data,
                width: target_w,
                height: target_h,
                grayscale: config.grayscale,
                filter: StreamFilter::Dct,
            })
        }
        ImageFormat::Png => {
            // PNG-sourced images live in a PDF as flate-compressed raw
            // samples; quality does not apply to the lossless path.
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder
                .write_all(resized.as_bytes())
                .map_err(|err| TransformError::Encode(err.to_string()))?;
            let data = encoder
                .finish()
                .map_err(|err| TransformError::Encode(err.to_string()))?;
            Ok(EncodedImage {
                data,
                width: target_w,
                height: target_h,
                grayscale: config.grayscale,
                filter: StreamFilter::Flate,
            })
        }
    }
}
