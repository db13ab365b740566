//! ExportRenderer: paginate the active text into a font-embedded PDF.
//!
//! [`layout`] is pure and backend-agnostic; [`pdf`] does the pdfium work.
//! [`ExportRenderer::render`] moves the whole blocking part onto the
//! blocking pool.

pub mod layout;
pub mod pdf;

pub use layout::{ExportArtifact, Page, PositionedLine, TextMeasure};

use crate::config::ExportConfig;
use crate::error::ExportError;
use std::path::PathBuf;
use tracing::info;

/// A rendered export, ready to be saved or offered as a download.
#[derive(Clone)]
pub struct ExportedPdf {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub line_count: usize,
}

impl std::fmt::Debug for ExportedPdf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportedPdf")
            .field("file_name", &self.file_name)
            .field("bytes", &self.bytes.len())
            .field("page_count", &self.page_count)
            .field("line_count", &self.line_count)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ExportRenderer {
    config: ExportConfig,
}

impl ExportRenderer {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Lay out `text` with a caller-supplied measure. No PDF is produced.
    pub fn layout(
        &self,
        text: &str,
        measure: &impl TextMeasure,
    ) -> Result<ExportArtifact, ExportError> {
        layout::layout(text, &self.config, measure)
    }

    /// Render `text` to PDF bytes on the blocking pool.
    pub async fn render(&self, text: String) -> Result<ExportedPdf, ExportError> {
        let config = self.config.clone();
        let file_name = config.file_name.clone();
        let pdfium_path: Option<PathBuf> = config.pdfium_library_path.clone();

        let (bytes, artifact) = tokio::task::spawn_blocking(move || {
            let font = pdf::read_font(&config)?;
            let pdfium = pdf::bind_pdfium(pdfium_path.as_deref())?;
            pdf::render_blocking(&pdfium, &text, &font, &config)
        })
        .await
        .map_err(|e| ExportError::Task(e.to_string()))??;

        info!(
            "Export '{}' ready: {} page(s)",
            file_name,
            artifact.page_count()
        );
        Ok(ExportedPdf {
            file_name,
            bytes,
            page_count: artifact.page_count(),
            line_count: artifact.line_count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_font_fails_before_touching_pdfium() {
        let renderer = ExportRenderer::new(ExportConfig::default());
        let err = renderer.render("नमस्ते".into()).await.unwrap_err();
        assert!(matches!(err, ExportError::FontNotConfigured));
    }

    #[tokio::test]
    async fn unreadable_font_is_reported_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = ExportRenderer::new(ExportConfig {
            font_path: Some(dir.path().join("missing.ttf")),
            ..ExportConfig::default()
        });
        let err = renderer.render("text".into()).await.unwrap_err();
        assert!(
            matches!(err, ExportError::FontUnavailable { ref path, .. } if path.ends_with("missing.ttf"))
        );
    }

    #[test]
    fn layout_uses_renderer_config() {
        let renderer = ExportRenderer::new(ExportConfig::default());
        let artifact = renderer
            .layout("one\ntwo", &|s: &str| s.len() as f32 * 6.0)
            .unwrap();
        assert_eq!(artifact.line_count(), 2);
        assert_eq!(artifact.page_width, renderer.config().page_width);
    }
}
