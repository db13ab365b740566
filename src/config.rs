//! Configuration types for a translation session.
//!
//! Everything a [`crate::session::Session`] needs to know (where the remote
//! service lives, how long to wait for it, what the progress phrases say, and
//! how the exported PDF is laid out) lives in [`SessionConfig`], built via
//! [`SessionConfigBuilder`]. Nothing in the library reads environment
//! variables; the CLI maps its flags onto the builder.

use crate::error::SessionError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Millimetres to PDF points.
pub const MM: f32 = 72.0 / 25.4;

/// Status phrases cycled while a submission is in flight.
pub const DEFAULT_STATUS_PHRASES: [&str; 7] = [
    "Initializing AI processing...",
    "Scanning document for text...",
    "Analyzing layout and structure...",
    "Running OCR extraction...",
    "Translating Tamang to Nepali...",
    "Optimizing response for readability...",
    "Finalizing your results...",
];

/// Configuration for a translation session.
///
/// # Example
/// ```rust
/// use doc_translate::SessionConfig;
///
/// let config = SessionConfig::builder()
///     .service_url("http://ocr.internal:8000")
///     .request_timeout_secs(120)
///     .build()
///     .unwrap();
/// assert_eq!(config.upload_url(), "http://ocr.internal:8000/upload");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Base URL of the OCR/translation service. Default: `http://localhost:8000`.
    pub service_url: String,

    /// Route that accepts the multipart upload. Default: `/upload`.
    pub upload_path: String,

    /// Where the sample document is fetched from.
    pub sample_asset_url: String,

    /// Name given to the sample document. Default: `Tamang_Nep.pdf`.
    pub sample_file_name: String,

    /// Per-submission timeout in seconds. Default: 300.
    ///
    /// OCR of a multi-page scan followed by translation routinely takes
    /// 30 s or more.
    pub request_timeout_secs: u64,

    /// Timeout for the sample-asset download in seconds. Default: 60.
    pub download_timeout_secs: u64,

    /// Interval between status phrases in milliseconds. Default: 4000.
    pub status_interval_ms: u64,

    /// Phrases the status announcer cycles through.
    pub status_phrases: Vec<String>,

    /// Export layout and backend settings.
    pub export: ExportConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            service_url: "http://localhost:8000".to_string(),
            upload_path: "/upload".to_string(),
            sample_asset_url: "http://localhost:5173/Tamang_Nep.pdf".to_string(),
            sample_file_name: "Tamang_Nep.pdf".to_string(),
            request_timeout_secs: 300,
            download_timeout_secs: 60,
            status_interval_ms: 4000,
            status_phrases: DEFAULT_STATUS_PHRASES.iter().map(|s| s.to_string()).collect(),
            export: ExportConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Create a new builder for `SessionConfig`.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Full URL of the upload endpoint.
    pub fn upload_url(&self) -> String {
        join_url(&self.service_url, &self.upload_path)
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms)
    }

    /// Check the constraints [`SessionConfigBuilder::build`] enforces. The
    /// fields are public, so a session re-checks whatever it is handed.
    pub fn validate(&self) -> Result<(), SessionError> {
        if !(self.service_url.starts_with("http://") || self.service_url.starts_with("https://")) {
            return Err(SessionError::InvalidConfig(format!(
                "service URL must be http(s), got '{}'",
                self.service_url
            )));
        }
        if self.status_interval_ms == 0 {
            return Err(SessionError::InvalidConfig(
                "status interval must be ≥ 1 ms".into(),
            ));
        }
        if self.status_phrases.is_empty() {
            return Err(SessionError::InvalidConfig(
                "at least one status phrase is required".into(),
            ));
        }
        self.export.validate().map_err(SessionError::InvalidConfig)
    }
}

/// Layout and backend settings for the exported PDF.
///
/// All lengths are PDF points (1/72 inch). Defaults reproduce an A4 portrait
/// page with a 15 mm margin, a 7 mm line advance and 12 pt text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    /// Vertical distance between consecutive baselines.
    pub line_advance: f32,
    pub font_size: f32,
    /// Name of the downloadable artifact.
    pub file_name: String,
    /// TrueType font with both Devanagari and Latin coverage.
    pub font_path: Option<PathBuf>,
    /// Directory or file of the pdfium library. `None` binds the system library.
    pub pdfium_library_path: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            page_width: 210.0 * MM,
            page_height: 297.0 * MM,
            margin: 15.0 * MM,
            line_advance: 7.0 * MM,
            font_size: 12.0,
            file_name: "translation_result.pdf".to_string(),
            font_path: None,
            pdfium_library_path: None,
        }
    }
}

impl ExportConfig {
    /// Width available to a line of text.
    pub fn line_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }

    /// Number of lines that fit on one page.
    pub fn lines_per_page(&self) -> usize {
        let usable = self.page_height - 2.0 * self.margin;
        if usable < self.line_advance || self.line_advance <= 0.0 {
            return 0;
        }
        // Nudge before flooring so 80 / 8 doesn't come out as 9.999…
        ((usable / self.line_advance) + 1e-4).floor() as usize
    }

    /// Check that the geometry can hold at least one line.
    pub fn validate(&self) -> Result<(), String> {
        if self.page_width <= 0.0 || self.page_height <= 0.0 {
            return Err(format!(
                "page size must be positive, got {}×{}",
                self.page_width, self.page_height
            ));
        }
        if self.margin < 0.0 {
            return Err(format!("margin must be ≥ 0, got {}", self.margin));
        }
        if self.font_size <= 0.0 {
            return Err(format!("font size must be positive, got {}", self.font_size));
        }
        if self.line_width() <= 0.0 {
            return Err("margins leave no horizontal space for text".into());
        }
        if self.lines_per_page() == 0 {
            return Err(format!(
                "line advance {} does not fit between margins of a {}-high page",
                self.line_advance, self.page_height
            ));
        }
        if self.file_name.trim().is_empty() {
            return Err("export file name must not be empty".into());
        }
        Ok(())
    }
}

/// Builder for [`SessionConfig`].
#[derive(Debug)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    pub fn service_url(mut self, url: impl Into<String>) -> Self {
        self.config.service_url = url.into();
        self
    }

    pub fn upload_path(mut self, path: impl Into<String>) -> Self {
        self.config.upload_path = path.into();
        self
    }

    pub fn sample_asset_url(mut self, url: impl Into<String>) -> Self {
        self.config.sample_asset_url = url.into();
        self
    }

    pub fn sample_file_name(mut self, name: impl Into<String>) -> Self {
        self.config.sample_file_name = name.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs.max(1);
        self
    }

    pub fn status_interval_ms(mut self, ms: u64) -> Self {
        self.config.status_interval_ms = ms;
        self
    }

    pub fn status_phrases<I, S>(mut self, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.status_phrases = phrases.into_iter().map(Into::into).collect();
        self
    }

    pub fn export(mut self, export: ExportConfig) -> Self {
        self.config.export = export;
        self
    }

    pub fn font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.export.font_path = Some(path.into());
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.export.pdfium_library_path = Some(path.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SessionConfig, SessionError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_builds() {
        let config = SessionConfig::builder().build().expect("defaults are valid");
        assert_eq!(config.upload_url(), "http://localhost:8000/upload");
        assert_eq!(config.status_phrases.len(), 7);
        assert_eq!(config.export.file_name, "translation_result.pdf");
    }

    #[test]
    fn upload_url_tolerates_slashes() {
        let config = SessionConfig::builder()
            .service_url("http://svc:9000/")
            .upload_path("upload")
            .build()
            .unwrap();
        assert_eq!(config.upload_url(), "http://svc:9000/upload");
    }

    #[test]
    fn a4_holds_thirty_eight_lines() {
        // (297 − 30) mm / 7 mm = 38.14 → 38 lines
        let export = ExportConfig::default();
        assert_eq!(export.lines_per_page(), 38);
        assert!(export.validate().is_ok());
    }

    #[test]
    fn exact_fit_is_not_rounded_down() {
        let export = ExportConfig {
            page_width: 100.0,
            page_height: 100.0,
            margin: 10.0,
            line_advance: 8.0,
            ..ExportConfig::default()
        };
        assert_eq!(export.lines_per_page(), 10);
    }

    #[test]
    fn geometry_too_small_is_rejected() {
        let export = ExportConfig {
            page_height: 40.0,
            margin: 15.0,
            line_advance: 20.0,
            ..ExportConfig::default()
        };
        let err = SessionConfig::builder().export(export).build().unwrap_err();
        assert!(matches!(err, SessionError::InvalidConfig(_)));
    }

    #[test]
    fn non_http_service_is_rejected() {
        let err = SessionConfig::builder()
            .service_url("ftp://example")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("http"));
    }

    #[test]
    fn hand_built_config_is_checked_too() {
        let config = SessionConfig {
            status_interval_ms: 0,
            ..SessionConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SessionError::InvalidConfig(_))
        ));
        assert!(SessionConfig::default().validate().is_ok());
    }

    #[test]
    fn empty_phrases_rejected() {
        let err = SessionConfig::builder()
            .status_phrases(Vec::<String>::new())
            .build()
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidConfig(_)));
    }
}
