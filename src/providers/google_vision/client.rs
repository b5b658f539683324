//! Google Cloud Vision API Client Implementation
//!
//! Implements the OcrProvider trait on top of the `images:annotate` REST
//! endpoint with TEXT_DETECTION.
//!
//! API Docs: https://cloud.google.com/vision/docs/reference/rest/v1/images/annotate

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{debug, info, instrument, warn};

use crate::config::OcrSettings;
use crate::domain::OcrResult;
use crate::providers::http_client::RateLimitedClient;
use crate::providers::traits::{OcrProvider, ProviderError, ProviderResult};
use super::auth::{ServiceAccountAuth, ServiceAccountKey};
use super::models::{AnnotateRequest, AnnotateResponse};

/// How requests to Vision are authorised
#[derive(Debug)]
pub enum VisionAuth {
    /// `?key=` query parameter
    ApiKey(String),
    /// OAuth bearer token minted from a service account
    ServiceAccount(ServiceAccountAuth),
}

/// Google Cloud Vision client
pub struct GoogleVisionProvider {
    /// Rate-limited HTTP client
    client: RateLimitedClient,

    auth: VisionAuth,

    /// Full `images:annotate` URL
    annotate_url: String,

    max_retries: u32,
}

impl GoogleVisionProvider {
    pub fn new(client: RateLimitedClient, auth: VisionAuth, endpoint: &str, max_retries: u32) -> Self {
        GoogleVisionProvider {
            client,
            auth,
            annotate_url: format!("{}/v1/images:annotate", endpoint.trim_end_matches('/')),
            max_retries,
        }
    }

    /// Build from settings; an API key wins over a credentials file
    pub fn from_settings(settings: &OcrSettings) -> ProviderResult<Self> {
        let auth = if let Some(key) = settings.google_api_key() {
            VisionAuth::ApiKey(key.to_string())
        } else if let Some(path) = settings.google_credentials_path.as_deref() {
            let auth = ServiceAccountAuth::new(ServiceAccountKey::from_file(path)?)?;
            debug!(client_email = auth.client_email(), "Loaded service account credentials");
            VisionAuth::ServiceAccount(auth)
        } else {
            return Err(ProviderError::NotConfigured(
                "GOOGLE_VISION_API_KEY or GOOGLE_CLOUD_CREDENTIALS_PATH not set".to_string(),
            ));
        };

        let client = RateLimitedClient::new(
            settings.rate_limit_per_minute,
            Duration::from_secs(settings.timeout_secs),
        )?;

        let provider = Self::new(client, auth, &settings.vision_endpoint, settings.max_retries);

        info!(
            endpoint = %provider.annotate_url,
            auth = provider.auth_kind(),
            rate_limit = provider.client.rate_limit(),
            "Google Cloud Vision initialized"
        );

        Ok(provider)
    }

    fn auth_kind(&self) -> &'static str {
        match self.auth {
            VisionAuth::ApiKey(_) => "api_key",
            VisionAuth::ServiceAccount(_) => "service_account",
        }
    }

    /// POST an annotate request and parse the response body
    async fn annotate(&self, request: &AnnotateRequest) -> ProviderResult<AnnotateResponse> {
        debug!(
            url = %self.annotate_url,
            remaining = ?self.client.remaining_requests(),
            "Vision API request"
        );

        let builder = self.client.post(&self.annotate_url).json(request);
        let builder = match &self.auth {
            VisionAuth::ApiKey(key) => builder.query(&[("key", key.as_str())]),
            VisionAuth::ServiceAccount(auth) => {
                let token = auth.access_token(&self.client, self.max_retries).await?;
                builder.bearer_auth(&token)
            }
        };

        let response = builder.send_with_retry(self.max_retries).await?;

        // Check for error status
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        // Parse JSON response
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ProviderError::ParseError(format!(
                "JSON parse error: {} - Body: {}",
                e,
                truncate(&text, 500)
            ))
        })
    }
}

/// Cut a body for logging without splitting a char
fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[async_trait]
impl OcrProvider for GoogleVisionProvider {
    fn code(&self) -> &'static str {
        "google_vision"
    }

    fn name(&self) -> &'static str {
        "Google Vision"
    }

    #[instrument(skip(self, image), fields(bytes = image.len()))]
    async fn detect_text(&self, image: &[u8]) -> ProviderResult<OcrResult> {
        let request = AnnotateRequest::text_detection(STANDARD.encode(image));
        let response = self.annotate(&request).await?;

        let first = response.responses.into_iter().next().unwrap_or_default();
        if let Some(message) = first.error_message() {
            warn!(error = message, "Vision reported an image error");
            return Err(ProviderError::Detection(message.to_string()));
        }

        let result = first.into_result();
        debug!(annotations = result.text_annotations.len(), "Vision text detection complete");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    fn client() -> RateLimitedClient {
        RateLimitedClient::new(60, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_annotate_url() {
        let provider = GoogleVisionProvider::new(
            client(),
            VisionAuth::ApiKey("k".to_string()),
            "https://vision.googleapis.com/",
            1,
        );
        assert_eq!(provider.annotate_url, "https://vision.googleapis.com/v1/images:annotate");
        assert_eq!(provider.auth_kind(), "api_key");
        assert_eq!(provider.code(), "google_vision");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("abc", 10), "abc");
    }

    #[test]
    fn test_from_settings_requires_credentials() {
        let settings = Settings::default().ocr;
        let result = GoogleVisionProvider::from_settings(&settings);
        assert!(matches!(result, Err(ProviderError::NotConfigured(_))));
    }

    #[test]
    fn test_from_settings_prefers_api_key() {
        let settings = OcrSettings {
            google_api_key: Some("secret".to_string()),
            google_credentials_path: Some("/nonexistent/creds.json".into()),
            ..Settings::default().ocr
        };
        let provider = GoogleVisionProvider::from_settings(&settings).unwrap();
        assert_eq!(provider.auth_kind(), "api_key");
    }

    #[test]
    fn test_from_settings_missing_credentials_file() {
        let settings = OcrSettings {
            google_credentials_path: Some("/nonexistent/creds.json".into()),
            ..Settings::default().ocr
        };
        let result = GoogleVisionProvider::from_settings(&settings);
        assert!(matches!(result, Err(ProviderError::NotConfigured(_))));
    }
}
