//! Sample-asset download.
//!
//! The sample document is a static file served next to the UI. Dev servers
//! that fall back to `index.html` for unknown paths answer 200 with HTML, so
//! the body is checked for the `%PDF` magic before it is accepted.

use crate::error::SessionError;
use std::time::Duration;
use tracing::{debug, info};

/// Fetch the sample asset at `url`, returning its raw bytes.
pub(crate) async fn fetch_sample(
    client: &reqwest::Client,
    url: &str,
    timeout_secs: u64,
) -> Result<Vec<u8>, SessionError> {
    info!("Fetching sample document from: {}", url);

    let unavailable = |reason: String| SessionError::AssetUnavailable {
        url: url.to_string(),
        reason,
    };

    let response = client
        .get(url)
        .timeout(Duration::from_secs(timeout_secs))
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                unavailable(format!("timed out after {timeout_secs}s"))
            } else {
                unavailable(e.to_string())
            }
        })?;

    if !response.status().is_success() {
        return Err(unavailable(format!("HTTP {}", response.status())));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| unavailable(e.to_string()))?;

    check_pdf_magic(&bytes).map_err(unavailable)?;

    debug!("Sample document: {} bytes", bytes.len());
    Ok(bytes.to_vec())
}

fn check_pdf_magic(bytes: &[u8]) -> Result<(), String> {
    if bytes.len() < 4 {
        return Err(format!("response too short ({} bytes)", bytes.len()));
    }
    if &bytes[..4] != b"%PDF" {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[..4]);
        return Err(format!("not a PDF (first bytes {magic:?})"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_magic_accepted() {
        assert!(check_pdf_magic(b"%PDF-1.4\n...").is_ok());
    }

    #[test]
    fn html_fallback_rejected() {
        let err = check_pdf_magic(b"<!doctype html>").unwrap_err();
        assert!(err.contains("not a PDF"));
    }

    #[test]
    fn empty_body_rejected() {
        assert!(check_pdf_magic(b"").is_err());
    }
}
