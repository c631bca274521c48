//! The in-memory image value passed between every stage.
//!
//! An [`ImageAsset`] is what the rest of the crate means by "an image": the
//! base64 payload, its declared media type, and its pixel dimensions. The
//! generation service takes and returns images in exactly this shape
//! (`mimeType` + base64 `data`), so keeping the encoded form around avoids
//! re-encoding on every request.
//!
//! Assets are immutable. Anything that changes pixels (see
//! [`fit`](super::fit)) produces a new asset.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::{ImageFormat, ImageReader};
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InvalidImageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Not an image: {0}")]
    NotAnImage(String),
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Malformed data URL: {0}")]
    DataUrl(String),
}

/// An encoded image with known media type and dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    data: String,
    media_type: String,
    width: u32,
    height: u32,
}

impl ImageAsset {
    /// Build an asset from raw encoded bytes.
    ///
    /// Dimensions are read from the image header; the payload itself is not
    /// fully decoded. Fails if the bytes are not a recognisable image.
    pub fn from_bytes(bytes: &[u8], media_type: &str) -> Result<Self, InvalidImageError> {
        let (width, height) = read_dimensions(bytes)?;
        Ok(Self {
            data: BASE64.encode(bytes),
            media_type: media_type.to_string(),
            width,
            height,
        })
    }

    /// Build an asset from an already base64-encoded payload, as returned
    /// inline by the generation service.
    pub fn from_base64(data: &str, media_type: &str) -> Result<Self, InvalidImageError> {
        let bytes = BASE64
            .decode(data.trim())
            .map_err(|e| InvalidImageError::Decode(format!("invalid base64: {e}")))?;
        let (width, height) = read_dimensions(&bytes)?;
        Ok(Self {
            data: data.trim().to_string(),
            media_type: media_type.to_string(),
            width,
            height,
        })
    }

    /// Parse a `data:<media type>;base64,<payload>` URL.
    pub fn from_data_url(url: &str) -> Result<Self, InvalidImageError> {
        let (media_type, payload) = split_data_url(url)?;
        Self::from_base64(payload, media_type)
    }

    /// The base64 payload, without any `data:` prefix.
    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Full `data:` URL combining media type and payload.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }

    /// Decode the base64 payload back into encoded image bytes.
    pub fn bytes(&self) -> Result<Vec<u8>, InvalidImageError> {
        BASE64
            .decode(&self.data)
            .map_err(|e| InvalidImageError::Decode(format!("invalid base64: {e}")))
    }

    /// File extension matching the media type (`png` when unknown).
    pub fn extension(&self) -> &'static str {
        ImageFormat::from_mime_type(&self.media_type)
            .and_then(|f| f.extensions_str().first().copied())
            .unwrap_or("png")
    }
}

/// Split a base64 data URL into `(media_type, payload)`.
fn split_data_url(url: &str) -> Result<(&str, &str), InvalidImageError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| InvalidImageError::DataUrl("missing data: prefix".into()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| InvalidImageError::DataUrl("missing ',' separator".into()))?;
    let media_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| InvalidImageError::DataUrl("only base64 payloads are supported".into()))?;
    if !media_type.starts_with("image/") {
        return Err(InvalidImageError::NotAnImage(media_type.to_string()));
    }
    Ok((media_type, payload))
}

fn read_dimensions(bytes: &[u8]) -> Result<(u32, u32), InvalidImageError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(InvalidImageError::Io)?;
    if reader.format().is_none() {
        return Err(InvalidImageError::NotAnImage(
            "unrecognised image format".into(),
        ));
    }
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| InvalidImageError::Decode(e.to_string()))?;
    if width == 0 || height == 0 {
        return Err(InvalidImageError::Decode(format!(
            "image has zero size ({width}x{height})"
        )));
    }
    Ok((width, height))
}
