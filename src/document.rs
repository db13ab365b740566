//! Document data model.
//!
//! A [`Document`] is immutable once built. Choosing another file produces a new
//! `Document` with a new [`DocumentId`]. A preview decoded later is attached by
//! swapping in a copy with the same id; nothing ever edits one in place, so a
//! submission that captured an `Arc<Document>` keeps seeing exactly the bytes
//! it sent.

use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DocumentId(u64);

impl DocumentId {
    fn next() -> Self {
        Self(NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc#{}", self.0)
    }
}

/// A file exactly as the user handed it over, before validation.
#[derive(Debug, Clone)]
pub struct RawInput {
    pub bytes: Vec<u8>,
    /// Declared mime type, if the picker supplied one.
    pub mime_type: Option<String>,
    pub name: String,
}

impl RawInput {
    pub fn new(bytes: impl Into<Vec<u8>>, mime_type: Option<String>, name: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type,
            name: name.into(),
        }
    }

    /// Read a local file, guessing its mime type from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let mime_type = mime_guess::from_path(path)
            .first_raw()
            .map(str::to_string);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        Ok(Self {
            bytes,
            mime_type,
            name,
        })
    }
}

/// Downscaled image preview of an uploaded picture.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct RasterPreview {
    pub width: u32,
    pub height: u32,
    /// `data:image/png;base64,…`, ready to drop into an `<img src>`.
    pub data_uri: String,
}

impl fmt::Debug for RasterPreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterPreview")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("data_uri_len", &self.data_uri.len())
            .finish()
    }
}

/// A validated input ready for submission.
#[derive(Clone)]
pub struct Document {
    id: DocumentId,
    content: Vec<u8>,
    mime_type: String,
    display_name: String,
    preview: Option<RasterPreview>,
}

impl Document {
    pub(crate) fn new(
        content: Vec<u8>,
        mime_type: impl Into<String>,
        display_name: impl Into<String>,
        preview: Option<RasterPreview>,
    ) -> Self {
        Self {
            id: DocumentId::next(),
            content,
            mime_type: mime_type.into(),
            display_name: display_name.into(),
            preview,
        }
    }

    /// The same document, identity included, with `preview` attached.
    pub(crate) fn with_preview(&self, preview: RasterPreview) -> Self {
        Self {
            preview: Some(preview),
            ..self.clone()
        }
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn size_bytes(&self) -> usize {
        self.content.len()
    }

    /// Size as the upload panel shows it, e.g. `"1536.00 KB"`.
    pub fn size_label(&self) -> String {
        format!("{:.2} KB", self.content.len() as f64 / 1024.0)
    }

    pub fn is_image(&self) -> bool {
        is_image_mime(&self.mime_type)
    }

    pub fn preview(&self) -> Option<&RasterPreview> {
        self.preview.as_ref()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("mime_type", &self.mime_type)
            .field("size_bytes", &self.content.len())
            .field("preview", &self.preview)
            .finish()
    }
}

pub(crate) fn is_image_mime(mime: &str) -> bool {
    mime.trim().to_ascii_lowercase().starts_with("image/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = Document::new(vec![1], "application/pdf", "a.pdf", None);
        let b = Document::new(vec![1], "application/pdf", "a.pdf", None);
        assert_ne!(a.id(), b.id());

        let shown = a.with_preview(RasterPreview {
            width: 2,
            height: 1,
            data_uri: "data:image/png;base64,".into(),
        });
        assert_eq!(shown.id(), a.id());
        assert_eq!(shown.preview().map(|p| p.width), Some(2));
        assert!(a.preview().is_none());
        assert!(b.id() > a.id());
    }

    #[test]
    fn size_label_in_kilobytes() {
        let doc = Document::new(vec![0; 1536], "image/png", "scan.png", None);
        assert_eq!(doc.size_label(), "1.50 KB");
    }

    #[test]
    fn image_detection() {
        assert!(is_image_mime("image/jpeg"));
        assert!(is_image_mime("IMAGE/PNG"));
        assert!(!is_image_mime("application/pdf"));
    }

    #[test]
    fn debug_hides_content() {
        let doc = Document::new(vec![7; 2048], "application/pdf", "big.pdf", None);
        let dbg = format!("{doc:?}");
        assert!(dbg.contains("size_bytes: 2048"));
        assert!(!dbg.contains("7, 7, 7"));
    }

    #[tokio::test]
    async fn raw_input_from_path_guesses_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        tokio::fs::write(&path, b"not really a png").await.unwrap();

        let raw = RawInput::from_path(&path).await.unwrap();
        assert_eq!(raw.name, "page.png");
        assert_eq!(raw.mime_type.as_deref(), Some("image/png"));
        assert_eq!(raw.bytes.len(), 16);
    }
}
