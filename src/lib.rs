//! # doc-translate
//!
//! Client-side session for a scanned-document OCR and translation service:
//! pick a document, send it to the service, review the extracted Tamang text
//! and its Nepali translation, and export either one as a paginated PDF with
//! an embedded Devanagari font.
//!
//! ## Session Overview
//!
//! ```text
//! Idle ──select──▶ Ready ──submit──▶ Processing ──┬─ ok ──▶ Succeeded(translated) ──switch──┐
//!   ▲                ▲                            └─ err ─▶ Failed(message)                 │
//!   │                └──────────── select (from any state) ◀────────────────────────────────┘
//!   └ sample fetch failed: stays put, inline notice
//! ```
//!
//!  1. Source    user file (image preview decoded off-thread) or the sample PDF
//!  2. Submit    one multipart upload per submission, tagged with a generation id
//!  3. Status    cyclic progress phrases while `Processing`, cancelled on exit
//!  4. Review    switch between extracted and translated text
//!  5. Export    measured word-wrap + pagination → pdfium, font embedded once
//!
//! A response for a document that has since been replaced is discarded on
//! arrival; it never overwrites the newer session state.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doc_translate::{RawInput, Session, SessionConfig, SessionState};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SessionConfig::builder()
//!         .service_url("http://localhost:8000")
//!         .font_path("NotoSansDevanagari-Regular.ttf")
//!         .build()?;
//!     let mut session = Session::new(config)?;
//!
//!     session.select_input(RawInput::from_path("scan.pdf").await?);
//!     session.run_until_settled().await;
//!     session.submit()?;
//!
//!     if let SessionState::Succeeded { result, .. } = session.run_until_settled().await {
//!         println!("{}", result.translated_text);
//!     }
//!     let path = session.export_to_file(".").await?;
//!     eprintln!("wrote {}", path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doctranslate` binary (clap + indicatif + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! doc-translate = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod observer;
pub mod session;
pub mod source;
pub mod status;
pub mod workflow;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::{HttpProcessingClient, ProcessingClient};
pub use config::{ExportConfig, SessionConfig, SessionConfigBuilder};
pub use document::{Document, DocumentId, RasterPreview, RawInput};
pub use error::{ExportError, ProcessingError, SessionError};
pub use export::{ExportArtifact, ExportRenderer, ExportedPdf, TextMeasure};
pub use observer::{NoopObserver, SessionObserver};
pub use session::{Session, SessionUpdate};
pub use source::DocumentSource;
pub use status::{AnnouncerGuard, StatusAnnouncer};
pub use workflow::{
    Completion, ProcessingResult, SessionState, SubmissionId, TextVariant, WorkflowController,
};
