//! PDF serialisation via pdfium.
//!
//! Everything in here is blocking FFI and must run under
//! `tokio::task::spawn_blocking`. One export builds one document:
//!
//! 1. bind pdfium (configured path, else the system library)
//! 2. load the TrueType font once, embedded as a CID font
//! 3. measure and lay out every line with that font
//! 4. emit one text object per line, flipping y to PDF's bottom-left origin
//! 5. `save_to_bytes()`

use super::layout::{layout, ExportArtifact, TextMeasure};
use crate::config::ExportConfig;
use crate::error::ExportError;
use pdfium_render::prelude::*;
use std::cell::RefCell;
use std::path::Path;
use tracing::{debug, info};

/// Bind to pdfium: an explicit library file, a directory holding the platform
/// library, or the system library when `path` is `None`.
pub fn bind_pdfium(path: Option<&Path>) -> Result<Pdfium, ExportError> {
    let bindings = match path {
        Some(p) if p.is_dir() => {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(p))
        }
        Some(p) => Pdfium::bind_to_library(p),
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| {
        let from = path
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "system library".to_string());
        ExportError::PdfiumUnavailable(format!("{from}: {e}"))
    })?;

    Ok(Pdfium::new(bindings))
}

/// Read the export font from disk.
pub fn read_font(config: &ExportConfig) -> Result<Vec<u8>, ExportError> {
    let path = config
        .font_path
        .as_deref()
        .ok_or(ExportError::FontNotConfigured)?;
    let bytes = std::fs::read(path).map_err(|e| ExportError::FontUnavailable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    debug!("Loaded font {} ({} bytes)", path.display(), bytes.len());
    Ok(bytes)
}

/// Measures text by building detached pdfium text objects with the embedded
/// font. The first pdfium failure is kept and reported after layout.
struct PdfiumMeasure<'a, 'b> {
    document: &'b PdfDocument<'a>,
    font: PdfFontToken,
    size: PdfPoints,
    error: RefCell<Option<PdfiumError>>,
}

impl TextMeasure for PdfiumMeasure<'_, '_> {
    fn width(&self, text: &str) -> f32 {
        if text.is_empty() {
            return 0.0;
        }
        let measured = PdfPageTextObject::new(self.document, text, self.font, self.size)
            .and_then(|object| object.width());
        match measured {
            Ok(width) => width.value,
            Err(e) => {
                self.error.borrow_mut().get_or_insert(e);
                0.0
            }
        }
    }
}

/// Lay out `text` and serialise it to PDF bytes.
///
/// Returns the bytes together with the artifact that was written.
pub fn render_blocking(
    pdfium: &Pdfium,
    text: &str,
    font_bytes: &[u8],
    config: &ExportConfig,
) -> Result<(Vec<u8>, ExportArtifact), ExportError> {
    let mut document = pdfium.create_new_pdf().map_err(pdf_err)?;

    let font = document
        .fonts_mut()
        .load_true_type_from_bytes(font_bytes, true)
        .map_err(|e| ExportError::FontUnavailable {
            path: config.font_path.clone().unwrap_or_default(),
            reason: e.to_string(),
        })?;
    let size = PdfPoints::new(config.font_size);

    let artifact = {
        let measure = PdfiumMeasure {
            document: &document,
            font,
            size,
            error: RefCell::new(None),
        };
        let artifact = layout(text, config, &measure)?;
        if let Some(e) = measure.error.into_inner() {
            return Err(pdf_err(e));
        }
        artifact
    };

    let width = PdfPoints::new(artifact.page_width);
    let height = PdfPoints::new(artifact.page_height);
    for laid_out in &artifact.pages {
        let mut page = document
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::Custom(width, height))
            .map_err(pdf_err)?;

        for line in laid_out.lines.iter().filter(|l| !l.text.is_empty()) {
            page.objects_mut()
                .create_text_object(
                    PdfPoints::new(line.x),
                    PdfPoints::new(artifact.page_height - line.baseline),
                    &line.text,
                    font,
                    size,
                )
                .map_err(pdf_err)?;
        }
    }

    let bytes = document.save_to_bytes().map_err(pdf_err)?;
    info!(
        "Rendered {} line(s) on {} page(s), {} bytes",
        artifact.line_count(),
        artifact.page_count(),
        bytes.len()
    );
    Ok((bytes, artifact))
}

fn pdf_err(e: PdfiumError) -> ExportError {
    ExportError::Pdfium(e.to_string())
}
