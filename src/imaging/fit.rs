//! Dimension correction for generated images.
//!
//! The generation service is asked for an image at the site photo's exact
//! size but does not always comply. Before/after comparison needs identical
//! dimensions, so every generated result goes through [`fit_to_dimensions`]:
//! scale to cover the target box, center-crop, re-encode in the original
//! media type.

use super::asset::{ImageAsset, InvalidImageError};
use super::calculations::calculate_cover;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use thiserror::Error;

/// JPEG quality used when a corrected image has to be re-encoded as JPEG.
const JPEG_QUALITY: u8 = 92;

#[derive(Error, Debug)]
pub enum FitError {
    #[error("Invalid target dimensions {0}x{1}")]
    InvalidTarget(u32, u32),
    #[error(transparent)]
    Image(#[from] InvalidImageError),
    #[error("Failed to re-encode image: {0}")]
    Encode(String),
}

/// Return `asset` at exactly `width` x `height`.
///
/// When the asset already has those dimensions it is returned as-is (no
/// decode, no re-encode). Otherwise the image is scaled uniformly to cover
/// the target and center-cropped.
pub fn fit_to_dimensions(
    asset: &ImageAsset,
    width: u32,
    height: u32,
) -> Result<ImageAsset, FitError> {
    if width == 0 || height == 0 {
        return Err(FitError::InvalidTarget(width, height));
    }
    if asset.dimensions() == (width, height) {
        return Ok(asset.clone());
    }

    let img = decode(asset)?;
    let plan = calculate_cover((img.width(), img.height()), (width, height));
    let (scaled_w, scaled_h) = plan.scaled;
    let (crop_x, crop_y) = plan.crop_origin;

    let cropped = img
        .resize_exact(scaled_w, scaled_h, FilterType::Lanczos3)
        .crop_imm(crop_x, crop_y, width, height);

    let (bytes, media_type) = encode_like(&cropped, asset.media_type())?;
    Ok(ImageAsset::from_bytes(&bytes, &media_type)?)
}

/// Decode an asset's payload into pixels.
pub fn decode(asset: &ImageAsset) -> Result<DynamicImage, InvalidImageError> {
    let bytes = asset.bytes()?;
    let format = ImageFormat::from_mime_type(asset.media_type());
    let decoded = match format {
        Some(fmt) => image::load_from_memory_with_format(&bytes, fmt),
        None => image::load_from_memory(&bytes),
    };
    decoded.map_err(|e| InvalidImageError::Decode(e.to_string()))
}

/// Encode `img` in the format named by `media_type`, falling back to PNG
/// when no encoder for that format is compiled in.
///
/// Returns the bytes and the media type actually used.
fn encode_like(img: &DynamicImage, media_type: &str) -> Result<(Vec<u8>, String), FitError> {
    let format = ImageFormat::from_mime_type(media_type)
        .filter(|f| f.writing_enabled())
        .unwrap_or(ImageFormat::Png);

    let mut buf = Vec::new();
    match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY))
                .map_err(|e| FitError::Encode(e.to_string()))?;
        }
        ImageFormat::WebP => {
            let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
            rgba.write_to(&mut Cursor::new(&mut buf), format)
                .map_err(|e| FitError::Encode(e.to_string()))?;
        }
        other => {
            img.write_to(&mut Cursor::new(&mut buf), other)
                .map_err(|e| FitError::Encode(e.to_string()))?;
        }
    }
    Ok((buf, format.to_mime_type().to_string()))
}
