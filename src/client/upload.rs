//! Suite upload client
//!
//! Submits the packaged suite to the grid control plane and returns the
//! base execution URL the sessions will run against.

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Upload errors; all of them are fatal pre-flight
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Failed to read archive {path}: {message}")]
    ArchiveRead { path: String, message: String },

    #[error("Upload request failed: {0}")]
    RequestFailed(String),

    #[error("Upload rejected by the grid: {0}")]
    Rejected(String),

    #[error("Upload response carried no suite URL")]
    MissingUrl,
}

/// Upload response payload
#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: Option<String>,
    error: Option<String>,
}

/// Client for the control plane upload endpoint
pub struct UploadClient {
    client: Client,
    upload_url: String,
}

impl UploadClient {
    pub fn new(upload_url: impl Into<String>) -> Result<Self, UploadError> {
        let client = Client::builder()
            // Uploads carry the whole zipped suite; allow more headroom
            // than the session calls get.
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| UploadError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            upload_url: upload_url.into(),
        })
    }

    /// Upload the suite archive, returning the base execution URL
    pub async fn upload(&self, org: &str, archive: &Path) -> Result<String, UploadError> {
        let bytes = tokio::fs::read(archive)
            .await
            .map_err(|e| UploadError::ArchiveRead {
                path: archive.display().to_string(),
                message: e.to_string(),
            })?;

        debug!(
            "Uploading {} byte archive to {}",
            bytes.len(),
            self.upload_url
        );

        let part = Part::bytes(bytes)
            .file_name("suite.zip")
            .mime_str("application/zip")
            .map_err(|e| UploadError::RequestFailed(e.to_string()))?;

        let form = Form::new().text("orgId", org.to_string()).part("zipfile", part);

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| UploadError::RequestFailed(e.to_string()))?;

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| UploadError::RequestFailed(format!("invalid upload response: {e}")))?;

        if let Some(error) = body.error {
            return Err(UploadError::Rejected(error));
        }

        let url = body
            .url
            .filter(|u| !u.is_empty())
            .ok_or(UploadError::MissingUrl)?;

        info!("Suite uploaded, execution URL: {url}");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_response_parsing() {
        let ok: UploadResponse =
            serde_json::from_str(r#"{"url":"https://cdn.gridrunner.dev/suites/42"}"#).unwrap();
        assert_eq!(ok.url.as_deref(), Some("https://cdn.gridrunner.dev/suites/42"));
        assert!(ok.error.is_none());

        let rejected: UploadResponse =
            serde_json::from_str(r#"{"error":"org quota exceeded"}"#).unwrap();
        assert!(rejected.url.is_none());
        assert_eq!(rejected.error.as_deref(), Some("org quota exceeded"));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            UploadError::MissingUrl.to_string(),
            "Upload response carried no suite URL"
        );
    }
}
