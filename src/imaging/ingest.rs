//! Turn a user-chosen file into an [`ImageAsset`].
//!
//! Picking a file from a dialog and dropping one onto the window both end up
//! here with the same bytes, so both produce the same asset. No network I/O.

use super::asset::{ImageAsset, InvalidImageError};
use image::ImageReader;
use std::io::Cursor;
use std::path::Path;

/// Read and identify an image file from disk.
pub fn load_file(path: &Path) -> Result<ImageAsset, InvalidImageError> {
    let bytes = std::fs::read(path)?;
    from_bytes(&bytes, None).map_err(|e| match e {
        InvalidImageError::NotAnImage(reason) => {
            InvalidImageError::NotAnImage(format!("{}: {reason}", path.display()))
        }
        other => other,
    })
}

/// Identify an in-memory image.
///
/// `declared_media_type` is what the picker reported (a browser `File.type`,
/// an HTTP `Content-Type`). It is trusted only when it names an `image/*`
/// type; otherwise the type is sniffed from the content.
pub fn from_bytes(
    bytes: &[u8],
    declared_media_type: Option<&str>,
) -> Result<ImageAsset, InvalidImageError> {
    if bytes.is_empty() {
        return Err(InvalidImageError::NotAnImage("file is empty".into()));
    }
    let media_type = match declared_media_type {
        Some(declared) if declared.starts_with("image/") => declared.to_string(),
        _ => sniff_media_type(bytes)?,
    };
    ImageAsset::from_bytes(bytes, &media_type)
}

fn sniff_media_type(bytes: &[u8]) -> Result<String, InvalidImageError> {
    let format = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .format()
        .ok_or_else(|| InvalidImageError::NotAnImage("unrecognised image format".into()))?;
    Ok(format.to_mime_type().to_string())
}
