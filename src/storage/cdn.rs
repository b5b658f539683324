//! File CDN client for signature uploads
//!
//! The CDN exposes a multipart upload endpoint:
//! ```text
//! POST {base_url}/api/v1/files/upload
//! Authorization: Bearer {api_key}       (optional)
//! file=<png bytes>
//!
//! 200/201 {"file_url": "..."}  or  {"url": "..."}
//! ```

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument};
use url::Url;
use uuid::Uuid;

use crate::config::CdnSettings;
use crate::providers::{ClientError, RateLimitedClient};

const UPLOAD_PATH: &str = "api/v1/files/upload";
const UPLOAD_RATE_PER_MINUTE: u32 = 300;

/// Errors that can occur during CDN operations
#[derive(Error, Debug)]
pub enum CdnError {
    #[error("CDN base URL not configured")]
    NotConfigured,

    #[error("Invalid CDN base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("CDN upload error: {0}")]
    Transport(#[from] ClientError),

    #[error("CDN upload failed: {0}")]
    Status(u16),

    #[error("CDN response has no file URL")]
    MissingUrl,
}

impl From<reqwest::Error> for CdnError {
    fn from(err: reqwest::Error) -> Self {
        CdnError::Transport(ClientError::Http(err))
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file_url: Option<String>,
    url: Option<String>,
}

impl UploadResponse {
    fn into_url(self) -> Option<String> {
        self.file_url
            .or(self.url)
            .filter(|u| !u.is_empty())
    }
}

/// Build the upload endpoint from the configured base URL
pub fn upload_endpoint(base_url: &str) -> Result<Url, CdnError> {
    let base = base_url.trim();
    if base.is_empty() {
        return Err(CdnError::NotConfigured);
    }

    // Keep any path prefix on the base URL
    let base = Url::parse(&format!("{}/", base.trim_end_matches('/')))?;
    Ok(base.join(UPLOAD_PATH)?)
}

/// CDN client for publishing PNG files
#[derive(Clone)]
pub struct CdnClient {
    http: RateLimitedClient,
    endpoint: Option<Url>,
    api_key: Option<String>,
}

impl CdnClient {
    /// Create a client from settings; an empty base URL leaves uploads disabled
    pub fn new(settings: &CdnSettings) -> Result<Self, CdnError> {
        let endpoint = if settings.is_configured() {
            Some(upload_endpoint(&settings.base_url)?)
        } else {
            None
        };

        let http = RateLimitedClient::new(
            UPLOAD_RATE_PER_MINUTE,
            Duration::from_secs(settings.timeout_secs),
        )?;

        debug!(endpoint = ?endpoint.as_ref().map(Url::as_str), "Creating CDN client");

        Ok(CdnClient {
            http,
            endpoint,
            api_key: Some(settings.api_key.clone()).filter(|k| !k.is_empty()),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Upload PNG bytes and return the public file URL
    #[instrument(skip(self, data), fields(size = data.len()))]
    pub async fn upload_png(&self, data: Vec<u8>, filename: Option<String>) -> Result<String, CdnError> {
        let endpoint = self.endpoint.as_ref().ok_or(CdnError::NotConfigured)?;
        let filename = filename.unwrap_or_else(|| format!("signature_{}.png", Uuid::new_v4()));
        let size = data.len();

        let part = reqwest::multipart::Part::bytes(data)
            .file_name(filename.clone())
            .mime_str("image/png")?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let mut request = self.http.post(endpoint.as_str()).multipart(form);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();

        if status != 200 && status != 201 {
            return Err(CdnError::Status(status));
        }

        let body: UploadResponse = response.json().await?;
        let url = body.into_url().ok_or(CdnError::MissingUrl)?;

        info!(filename = %filename, size, url = %url, "Uploaded to CDN");

        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::testing::{start_stub_cdn, STUB_API_KEY, STUB_FILE_URL};

    #[test]
    fn test_upload_endpoint() {
        assert_eq!(
            upload_endpoint("https://cdn.example.com").unwrap().as_str(),
            "https://cdn.example.com/api/v1/files/upload"
        );
        assert_eq!(
            upload_endpoint("https://example.com/cdn/").unwrap().as_str(),
            "https://example.com/cdn/api/v1/files/upload"
        );
        assert!(matches!(upload_endpoint("  "), Err(CdnError::NotConfigured)));
        assert!(matches!(upload_endpoint("not a url"), Err(CdnError::InvalidUrl(_))));
    }

    #[test]
    fn test_upload_response_url_fields() {
        let body: UploadResponse = serde_json::from_str(r#"{"file_url": "https://c/a.png", "url": "x"}"#).unwrap();
        assert_eq!(body.into_url().as_deref(), Some("https://c/a.png"));

        let body: UploadResponse = serde_json::from_str(r#"{"url": "https://c/b.png"}"#).unwrap();
        assert_eq!(body.into_url().as_deref(), Some("https://c/b.png"));

        let body: UploadResponse = serde_json::from_str(r#"{"id": 3}"#).unwrap();
        assert_eq!(body.into_url(), None);
    }

    #[tokio::test]
    async fn test_unconfigured_upload_fails() {
        let client = CdnClient::new(&crate::config::Settings::default().cdn).unwrap();
        assert!(!client.is_configured());
        let err = client.upload_png(vec![1, 2, 3], None).await.unwrap_err();
        assert!(matches!(err, CdnError::NotConfigured));
        assert_eq!(err.to_string(), "CDN base URL not configured");
    }

    fn client(base_url: String, api_key: &str) -> CdnClient {
        CdnClient::new(&CdnSettings {
            base_url,
            api_key: api_key.to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[actix_web::test]
    async fn test_upload_returns_file_url() {
        let (base, server) = start_stub_cdn().await;

        let url = client(format!("{}/ok", base), STUB_API_KEY)
            .upload_png(vec![0x89, b'P', b'N', b'G'], None)
            .await
            .unwrap();
        assert_eq!(url, STUB_FILE_URL);

        server.stop(true).await;
    }

    #[actix_web::test]
    async fn test_upload_rejected_status() {
        let (base, server) = start_stub_cdn().await;

        let err = client(format!("{}/broken", base), "")
            .upload_png(vec![1, 2, 3], Some("sig.png".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "CDN upload failed: 500");

        // Missing bearer key
        let err = client(format!("{}/ok", base), "")
            .upload_png(vec![1, 2, 3], None)
            .await
            .unwrap_err();
        assert!(matches!(err, CdnError::Status(401)));

        server.stop(true).await;
    }

    #[actix_web::test]
    async fn test_upload_without_url_field() {
        let (base, server) = start_stub_cdn().await;

        let err = client(format!("{}/no-url", base), "")
            .upload_png(vec![1, 2, 3], None)
            .await
            .unwrap_err();
        assert!(matches!(err, CdnError::MissingUrl));

        server.stop(true).await;
    }
}
