//! Image preview: uploaded picture → downscaled base64 PNG data URI.
//!
//! The preview is purely cosmetic. Decoding runs on the blocking pool so a
//! large JPEG never stalls the event loop, and any failure simply yields no
//! preview.

use crate::document::RasterPreview;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::{debug, warn};

/// Longest edge of a preview, in pixels.
pub const PREVIEW_MAX_EDGE: u32 = 1024;

/// Decode `bytes` as an image and encode a bounded PNG preview.
pub fn decode_preview(bytes: &[u8]) -> Result<RasterPreview, image::ImageError> {
    let img = image::load_from_memory(bytes)?;
    let img = shrink_to_fit(img, PREVIEW_MAX_EDGE);

    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!(
        "Preview {}x{} → {} bytes base64",
        img.width(),
        img.height(),
        b64.len()
    );

    Ok(RasterPreview {
        width: img.width(),
        height: img.height(),
        data_uri: format!("data:image/png;base64,{b64}"),
    })
}

/// Decode a preview off the event loop. Never fails; errors are logged.
pub async fn build_preview(name: &str, bytes: Vec<u8>) -> Option<RasterPreview> {
    match tokio::task::spawn_blocking(move || decode_preview(&bytes)).await {
        Ok(Ok(preview)) => Some(preview),
        Ok(Err(e)) => {
            warn!("No preview for '{}': {}", name, e);
            None
        }
        Err(e) => {
            warn!("Preview task for '{}' failed: {}", name, e);
            None
        }
    }
}

fn shrink_to_fit(img: DynamicImage, max_edge: u32) -> DynamicImage {
    if img.width() <= max_edge && img.height() <= max_edge {
        img
    } else {
        img.thumbnail(max_edge, max_edge)
    }
}
