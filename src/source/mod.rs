//! DocumentSource: turn a picked file or the sample asset into a [`Document`].
//!
//! ```text
//! RawInput ──▶ validate ──▶ Document ──(image?)──▶ preview, decoded later
//! sample URL ──▶ GET ──▶ %PDF check ──▶ Document (application/pdf, no preview)
//! ```
//!
//! 1. [`DocumentSource::from_user_selection`]: keeps the original bytes,
//!    declared mime type and name; returns at once, without a preview
//! 2. [`DocumentSource::preview`]: decodes an image document's preview on
//!    the blocking pool, independently of selection and submission
//! 3. [`DocumentSource::from_sample_asset`]: fixed, known-good sample; any
//!    failure is [`SessionError::AssetUnavailable`]

pub mod preview;
mod sample;

use crate::config::SessionConfig;
use crate::document::{Document, RasterPreview, RawInput};
use crate::error::SessionError;
use tracing::{debug, info};

const SAMPLE_MIME: &str = "application/pdf";
const FALLBACK_MIME: &str = "application/octet-stream";

/// Resolves candidate inputs into immutable [`Document`]s.
#[derive(Debug, Clone)]
pub struct DocumentSource {
    http: reqwest::Client,
    sample_file_name: String,
    download_timeout_secs: u64,
}

impl DocumentSource {
    pub fn new(config: &SessionConfig) -> Result<Self, SessionError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| SessionError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self::with_client(http, config))
    }

    /// Share an existing HTTP client (connection pool) with the source.
    pub fn with_client(http: reqwest::Client, config: &SessionConfig) -> Self {
        Self {
            http,
            sample_file_name: config.sample_file_name.clone(),
            download_timeout_secs: config.download_timeout_secs,
        }
    }

    /// Build a document from a file the user picked.
    ///
    /// Empty input is rejected. A missing mime type is guessed from the file
    /// name. The document never waits for its preview; see [`Self::preview`].
    pub fn from_user_selection(&self, raw: RawInput) -> Result<Document, SessionError> {
        if raw.bytes.is_empty() {
            return Err(SessionError::EmptyInput { name: raw.name });
        }

        let mime_type = raw
            .mime_type
            .filter(|m| !m.trim().is_empty())
            .or_else(|| mime_guess::from_path(&raw.name).first_raw().map(str::to_string))
            .unwrap_or_else(|| FALLBACK_MIME.to_string());

        let doc = Document::new(raw.bytes, mime_type, raw.name, None);
        debug!(
            "Selected {} '{}' ({}, {})",
            doc.id(),
            doc.display_name(),
            doc.mime_type(),
            doc.size_label()
        );
        Ok(doc)
    }

    /// Decode a preview for an image document. Non-image documents and images
    /// that fail to decode get none.
    pub async fn preview(&self, document: &Document) -> Option<RasterPreview> {
        if !document.is_image() {
            return None;
        }
        preview::build_preview(document.display_name(), document.content().to_vec()).await
    }

    /// Fetch the sample document at `url`.
    pub async fn from_sample_asset(&self, url: &str) -> Result<Document, SessionError> {
        let bytes = sample::fetch_sample(&self.http, url, self.download_timeout_secs).await?;
        let doc = Document::new(bytes, SAMPLE_MIME, self.sample_file_name.clone(), None);
        info!("Loaded sample {} ({})", doc.id(), doc.size_label());
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> DocumentSource {
        DocumentSource::new(&SessionConfig::default()).expect("client")
    }

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba([0, 128, 0, 255]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .expect("encode fixture");
        buf
    }

    #[test]
    fn empty_input_rejected() {
        let err = source()
            .from_user_selection(RawInput::new(Vec::new(), None, "blank.pdf"))
            .unwrap_err();
        assert!(matches!(err, SessionError::EmptyInput { ref name } if name == "blank.pdf"));
    }

    #[tokio::test]
    async fn pdf_keeps_bytes_and_gets_no_preview() {
        let bytes = b"%PDF-1.7 body".to_vec();
        let doc = source()
            .from_user_selection(RawInput::new(
                bytes.clone(),
                Some("application/pdf".into()),
                "scan.pdf",
            ))
            .unwrap();
        assert_eq!(doc.content(), bytes.as_slice());
        assert_eq!(doc.mime_type(), "application/pdf");
        assert_eq!(doc.display_name(), "scan.pdf");
        assert!(doc.preview().is_none());
        assert!(source().preview(&doc).await.is_none());
    }

    #[tokio::test]
    async fn image_is_selected_before_its_preview_exists() {
        let doc = source()
            .from_user_selection(RawInput::new(png_bytes(40, 30), None, "page.png"))
            .unwrap();
        assert!(doc.is_image());
        assert!(doc.preview().is_none());

        let preview = source().preview(&doc).await.expect("decodable png");
        assert_eq!((preview.width, preview.height), (40, 30));
    }

    #[tokio::test]
    async fn undecodable_image_still_selects() {
        let doc = source()
            .from_user_selection(RawInput::new(
                vec![1, 2, 3, 4],
                Some("image/jpeg".into()),
                "broken.jpg",
            ))
            .expect("preview failure is not fatal");
        assert!(doc.is_image());
        assert!(source().preview(&doc).await.is_none());
    }

    #[test]
    fn missing_mime_is_guessed_from_name() {
        let doc = source()
            .from_user_selection(RawInput::new(b"%PDF".to_vec(), None, "notes.pdf"))
            .unwrap();
        assert_eq!(doc.mime_type(), "application/pdf");

        let doc = source()
            .from_user_selection(RawInput::new(b"??".to_vec(), None, "mystery"))
            .unwrap();
        assert_eq!(doc.mime_type(), FALLBACK_MIME);
    }
}
