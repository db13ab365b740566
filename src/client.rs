//! ProcessingClient: the remote OCR/translation service.
//!
//! The service takes one multipart upload (field `file`) and answers with the
//! extracted and translated text. Its failure modes are classified into
//! [`ProcessingError`] here; the controller only ever sees the classification.
//!
//! ## Response handling
//!
//! | Response | Outcome |
//! |---|---|
//! | 2xx with `extracted_text` and `translated_text` | `Ok(ProcessingResult)` |
//! | 2xx with `error` | `Rejected { status: None, detail: error }` |
//! | 2xx missing a text field | `InvalidResponse` |
//! | non-2xx | `Rejected { status, detail }`, detail from JSON `detail` |
//! | no response in time | `Timeout` |
//! | any other transport failure | `Network` |

use crate::config::SessionConfig;
use crate::document::Document;
use crate::error::{ProcessingError, SessionError};
use crate::workflow::ProcessingResult;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Sends a document to the processing service.
#[async_trait]
pub trait ProcessingClient: Send + Sync {
    async fn submit(&self, document: &Document) -> Result<ProcessingResult, ProcessingError>;
}

/// [`ProcessingClient`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpProcessingClient {
    http: reqwest::Client,
    service_url: String,
    upload_url: String,
    timeout: Duration,
}

impl HttpProcessingClient {
    pub fn new(config: &SessionConfig) -> Result<Self, SessionError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| SessionError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self::with_client(http, config))
    }

    pub fn with_client(http: reqwest::Client, config: &SessionConfig) -> Self {
        Self {
            http,
            service_url: config.service_url.clone(),
            upload_url: config.upload_url(),
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    pub fn upload_url(&self) -> &str {
        &self.upload_url
    }

    /// Ping the service root, which answers `{"status": "running"}`.
    pub async fn check_health(&self) -> Result<(), ProcessingError> {
        #[derive(Deserialize)]
        struct Health {
            status: Option<String>,
        }

        let response = self
            .http
            .get(&self.service_url)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| classify_transport(e, 10))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProcessingError::Rejected {
                status: Some(status.as_u16()),
                detail: None,
            });
        }

        let health: Health = response
            .json()
            .await
            .map_err(|e| ProcessingError::InvalidResponse(e.to_string()))?;
        match health.status.as_deref() {
            Some("running") => Ok(()),
            other => Err(ProcessingError::InvalidResponse(format!(
                "unexpected health status {other:?}"
            ))),
        }
    }

    fn file_part(document: &Document) -> Part {
        let part = || {
            Part::bytes(document.content().to_vec()).file_name(document.display_name().to_string())
        };
        match part().mime_str(document.mime_type()) {
            Ok(p) => p,
            Err(e) => {
                warn!(
                    "Invalid mime type '{}' on {}: {}; sending without one",
                    document.mime_type(),
                    document.id(),
                    e
                );
                part()
            }
        }
    }
}

#[async_trait]
impl ProcessingClient for HttpProcessingClient {
    async fn submit(&self, document: &Document) -> Result<ProcessingResult, ProcessingError> {
        let start = Instant::now();
        info!(
            "Uploading '{}' ({}, {}) to {}",
            document.display_name(),
            document.mime_type(),
            document.size_label(),
            self.upload_url
        );

        let form = Form::new().part("file", Self::file_part(document));
        let response = self
            .http
            .post(&self.upload_url)
            .multipart(form)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| classify_transport(e, self.timeout.as_secs()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| classify_transport(e, self.timeout.as_secs()))?;

        debug!("Service answered {} ({} bytes)", status, body.len());
        let result = interpret_response(status, &body)?;
        info!(
            "Processed '{}' in {:.1}s",
            document.display_name(),
            start.elapsed().as_secs_f64()
        );
        Ok(result)
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    extracted_text: Option<String>,
    translated_text: Option<String>,
    error: Option<String>,
    document_id: Option<serde_json::Value>,
    timing: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// Classify a service response by status and body.
pub(crate) fn interpret_response(
    status: u16,
    body: &str,
) -> Result<ProcessingResult, ProcessingError> {
    if !(200..300).contains(&status) {
        let detail = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.detail)
            .and_then(|d| d.as_str().map(str::to_string));
        return Err(ProcessingError::Rejected {
            status: Some(status),
            detail,
        });
    }

    let parsed: UploadResponse = serde_json::from_str(body)
        .map_err(|e| ProcessingError::InvalidResponse(format!("body is not the expected JSON: {e}")))?;

    if let Some(error) = parsed.error {
        return Err(ProcessingError::Rejected {
            status: None,
            detail: Some(error),
        });
    }

    match (parsed.extracted_text, parsed.translated_text) {
        (Some(extracted_text), Some(translated_text)) => {
            if let Some(id) = &parsed.document_id {
                info!("Service stored document {}", id);
            }
            if let Some(timing) = &parsed.timing {
                info!("Service timing: {}", timing);
            }
            Ok(ProcessingResult {
                extracted_text,
                translated_text,
            })
        }
        (extracted, translated) => Err(ProcessingError::InvalidResponse(format!(
            "missing text field(s): extracted_text={}, translated_text={}",
            extracted.is_some(),
            translated.is_some()
        ))),
    }
}

fn classify_transport(e: reqwest::Error, secs: u64) -> ProcessingError {
    if e.is_timeout() {
        ProcessingError::Timeout { secs }
    } else {
        ProcessingError::Network(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_body() {
        let body = r#"{
            "message": "Processed successfully",
            "document_id": 12,
            "extracted_text": "ङाला",
            "translated_text": "मलाई",
            "timing": {"ocr_time": 3.2, "translation_time": 1.1, "total_time": 4.3}
        }"#;
        let result = interpret_response(200, body).unwrap();
        assert_eq!(result, ProcessingResult::new("ङाला", "मलाई"));
    }

    #[test]
    fn fastapi_detail_is_surfaced() {
        let body = r#"{"detail": "Unsupported file type. Allowed: png, jpg, jpeg, bmp, tiff, tif, pdf"}"#;
        let err = interpret_response(400, body).unwrap_err();
        assert_eq!(
            err,
            ProcessingError::Rejected {
                status: Some(400),
                detail: Some(
                    "Unsupported file type. Allowed: png, jpg, jpeg, bmp, tiff, tif, pdf".into()
                ),
            }
        );
    }

    #[test]
    fn validation_detail_list_is_not_a_message() {
        let body = r#"{"detail": [{"loc": ["body", "file"], "msg": "field required"}]}"#;
        let err = interpret_response(422, body).unwrap_err();
        assert_eq!(err.user_message(), crate::error::GENERIC_PROCESSING_FAILURE);
    }

    #[test]
    fn non_json_error_body() {
        let err = interpret_response(502, "<html>Bad Gateway</html>").unwrap_err();
        assert!(matches!(
            err,
            ProcessingError::Rejected {
                status: Some(502),
                detail: None
            }
        ));
    }

    #[test]
    fn success_status_with_error_field() {
        let err = interpret_response(200, r#"{"error": "Tesseract OCR failed: no text"}"#)
            .unwrap_err();
        assert_eq!(err.user_message(), "Tesseract OCR failed: no text");
    }

    #[test]
    fn partial_result_is_invalid() {
        let err = interpret_response(200, r#"{"extracted_text": "only half"}"#).unwrap_err();
        assert!(matches!(err, ProcessingError::InvalidResponse(_)));
        let err = interpret_response(200, "not json").unwrap_err();
        assert!(matches!(err, ProcessingError::InvalidResponse(_)));
    }

    #[test]
    fn upload_url_from_config() {
        let config = SessionConfig::builder()
            .service_url("http://127.0.0.1:9999/")
            .build()
            .unwrap();
        let client = HttpProcessingClient::new(&config).unwrap();
        assert_eq!(client.upload_url(), "http://127.0.0.1:9999/upload");
    }
}
