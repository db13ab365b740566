//! Error types for the doc-translate library.
//!
//! Three error types map onto three boundaries:
//!
//! * [`SessionError`]: what the view layer sees. Every variant is
//!   recoverable by a later user action; none of them tears the session down.
//!   Inline notices (`NoDocumentSelected`, `AssetUnavailable`, `ExportFailed`)
//!   are stored next to the session state, while `SubmissionFailed` carries the
//!   message shown in the `Failed` state.
//!
//! * [`ProcessingError`]: how the remote OCR/translation service failed.
//!   Classified so callers can tell a rejection with a server-provided detail
//!   from a timeout or a transport fault; the controller only needs
//!   [`ProcessingError::user_message`].
//!
//! * [`ExportError`]: layout or PDF serialisation failure. Converted into
//!   [`SessionError::ExportFailed`] at the session boundary so a failed export
//!   never disturbs the result it was exporting.

use std::path::PathBuf;
use thiserror::Error;

/// Message shown when the service failed without saying why.
pub const GENERIC_PROCESSING_FAILURE: &str = "An error occurred during processing.";

/// All errors surfaced to the view layer by a translation session.
#[derive(Debug, Error)]
pub enum SessionError {
    // ── Selection errors ──────────────────────────────────────────────────
    /// Submit was requested before any document was chosen.
    #[error("Please upload a document or use the sample document first.")]
    NoDocumentSelected,

    /// The chosen file had no content.
    #[error("The selected file '{name}' is empty.")]
    EmptyInput { name: String },

    /// The bundled sample document could not be fetched.
    #[error("Could not load sample document from '{url}': {reason}")]
    AssetUnavailable { url: String, reason: String },

    // ── Processing errors ─────────────────────────────────────────────────
    /// The remote service rejected the document or could not be reached.
    #[error("{message}")]
    SubmissionFailed { message: String },

    // ── Export errors ─────────────────────────────────────────────────────
    /// Laying out or serialising the export artifact failed.
    #[error("Failed to generate PDF: {reason}")]
    ExportFailed { reason: String },

    /// Could not write the exported file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (e.g. a background task panicked).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A classified failure reported by a [`crate::client::ProcessingClient`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProcessingError {
    /// The service answered, but refused the document.
    ///
    /// `status` is `None` when the service replied 2xx with an error body.
    #[error("Service rejected the document (status {status:?}): {detail:?}")]
    Rejected {
        status: Option<u16>,
        detail: Option<String>,
    },

    /// The request exceeded the configured timeout.
    #[error("Processing request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The request never produced an HTTP response.
    #[error("Network error: {0}")]
    Network(String),

    /// A success status whose body did not contain both text fields.
    #[error("Malformed service response: {0}")]
    InvalidResponse(String),
}

impl ProcessingError {
    /// The message shown in the `Failed` state.
    ///
    /// A server-provided detail is surfaced verbatim; everything else falls
    /// back to [`GENERIC_PROCESSING_FAILURE`].
    pub fn user_message(&self) -> String {
        match self {
            ProcessingError::Rejected {
                detail: Some(detail),
                ..
            } if !detail.trim().is_empty() => detail.clone(),
            _ => GENERIC_PROCESSING_FAILURE.to_string(),
        }
    }
}

impl From<ProcessingError> for SessionError {
    fn from(e: ProcessingError) -> Self {
        SessionError::SubmissionFailed {
            message: e.user_message(),
        }
    }
}

/// Layout or serialisation failure while building the export PDF.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The page geometry cannot hold a single line.
    #[error("Invalid page geometry: {0}")]
    InvalidGeometry(String),

    /// No export font was configured.
    #[error(
        "No export font configured\n\
Set a TrueType font with Devanagari coverage (--font / DOCTRANSLATE_FONT)."
    )]
    FontNotConfigured,

    /// The embedded font could not be read or parsed.
    #[error("Font '{path}' unavailable: {reason}")]
    FontUnavailable { path: PathBuf, reason: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set the pdfium library path (--pdfium / DOCTRANSLATE_PDFIUM) or install libpdfium system-wide."
    )]
    PdfiumUnavailable(String),

    /// pdfium reported an error while building the document.
    #[error("PDF backend error: {0}")]
    Pdfium(String),

    /// The blocking export task panicked or was cancelled.
    #[error("Export task failed: {0}")]
    Task(String),
}

impl From<ExportError> for SessionError {
    fn from(e: ExportError) -> Self {
        SessionError::ExportFailed {
            reason: e.to_string(),
        }
    }
}
