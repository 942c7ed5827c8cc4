//! # Submitted Image Loading
//!
//! Decodes submitted image data (raw base64 or a data URI) and probes its
//! dimensions so photos and signatures can be placed with their aspect
//! ratio preserved. The engine embeds the original bytes through the
//! canvas; no re-encoding happens here.
//!
//! Every failure is hard and names the offending file. A report that
//! silently dropped a submitted photo would be worse than no report.

use std::io::Cursor;

use log::warn;

use crate::error::RapportError;

/// A validated image ready for canvas embedding.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    /// The original encoded bytes, passed through to the canvas.
    pub bytes: Vec<u8>,
    /// Sniffed MIME type (`image/jpeg` or `image/png`).
    pub mime: &'static str,
    pub width_px: u32,
    pub height_px: u32,
}

/// Load an image from a submission source string.
///
/// Supported `src` formats: a `data:image/...;base64,...` URI or raw
/// base64-encoded bytes. `name` is the submitted file name, used only for
/// error messages.
pub fn load_image(name: &str, src: &str) -> Result<LoadedImage, RapportError> {
    let bytes = read_source_bytes(name, src)?;
    validate_bytes(name, bytes)
}

/// Validate already-decoded image bytes.
pub fn validate_bytes(name: &str, bytes: Vec<u8>) -> Result<LoadedImage, RapportError> {
    if bytes.len() < 4 {
        return Err(image_error(name, "image data too short"));
    }

    let mime = if is_jpeg(&bytes) {
        "image/jpeg"
    } else if is_png(&bytes) {
        "image/png"
    } else {
        return Err(image_error(
            name,
            "unsupported image format (expected JPEG or PNG)",
        ));
    };

    let (width_px, height_px) = image::io::Reader::new(Cursor::new(&bytes))
        .with_guessed_format()
        .map_err(|e| image_error(name, &format!("format detection failed: {e}")))?
        .into_dimensions()
        .map_err(|e| image_error(name, &format!("failed to read dimensions: {e}")))?;

    if width_px == 0 || height_px == 0 {
        return Err(image_error(name, "image has zero-sized dimensions"));
    }

    Ok(LoadedImage {
        bytes,
        mime,
        width_px,
        height_px,
    })
}

/// Scale `(width_px, height_px)` to fit inside `max_w × max_h` without
/// distortion. Never upscales beyond the box, always preserves ratio.
pub fn fit_within(width_px: u32, height_px: u32, max_w: f64, max_h: f64) -> (f64, f64) {
    let w = width_px as f64;
    let h = height_px as f64;
    let scale = (max_w / w).min(max_h / h);
    (w * scale, h * scale)
}

fn read_source_bytes(name: &str, src: &str) -> Result<Vec<u8>, RapportError> {
    let b64 = if let Some(rest) = src.strip_prefix("data:") {
        let comma = rest
            .find(',')
            .ok_or_else(|| image_error(name, "invalid data URI: missing comma"))?;
        if !rest[..comma].contains("base64") {
            warn!("image '{name}': data URI without base64 marker; decoding anyway");
        }
        &rest[comma + 1..]
    } else {
        src
    };

    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|e| image_error(name, &format!("base64 decode error: {e}")))
}

fn image_error(name: &str, reason: &str) -> RapportError {
    RapportError::Image {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

fn is_jpeg(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8
}

fn is_png(data: &[u8]) -> bool {
    data.len() >= 4 && data[0] == 0x89 && data[1] == 0x50 && data[2] == 0x4E && data[3] == 0x47
}
