//! PaddleOCR serving client
//!
//! Implements the OcrProvider trait against a PaddleHub `ocr_system` endpoint,
//! e.g. `http://paddle:8866/predict/ocr_system`.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{debug, info, instrument};

use crate::config::OcrSettings;
use crate::domain::OcrResult;
use crate::providers::http_client::RateLimitedClient;
use crate::providers::traits::{OcrProvider, ProviderError, ProviderResult};
use super::mapper::PaddleMapper;
use super::models::{ServingRequest, ServingResponse};

/// PaddleOCR serving client
pub struct PaddleOcrProvider {
    /// Rate-limited HTTP client
    client: RateLimitedClient,

    /// Full predict URL
    endpoint: String,

    max_retries: u32,
}

impl PaddleOcrProvider {
    pub fn new(client: RateLimitedClient, endpoint: impl Into<String>, max_retries: u32) -> Self {
        PaddleOcrProvider {
            client,
            endpoint: endpoint.into(),
            max_retries,
        }
    }

    pub fn from_settings(settings: &OcrSettings) -> ProviderResult<Self> {
        let endpoint = settings.paddle_endpoint().ok_or_else(|| {
            ProviderError::NotConfigured("PADDLE_OCR_URL not set".to_string())
        })?;

        let client = RateLimitedClient::new(
            settings.rate_limit_per_minute,
            Duration::from_secs(settings.timeout_secs),
        )?;

        info!(endpoint = %endpoint, rate_limit = client.rate_limit(), "PaddleOCR initialized");

        Ok(Self::new(client, endpoint, settings.max_retries))
    }

    async fn predict(&self, request: &ServingRequest) -> ProviderResult<ServingResponse> {
        debug!(url = %self.endpoint, "PaddleOCR request");

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send_with_retry(self.max_retries)
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            let end = text.char_indices().nth(500).map(|(i, _)| i).unwrap_or(text.len());
            ProviderError::ParseError(format!("JSON parse error: {} - Body: {}", e, &text[..end]))
        })
    }
}

#[async_trait]
impl OcrProvider for PaddleOcrProvider {
    fn code(&self) -> &'static str {
        "paddle_ocr"
    }

    fn name(&self) -> &'static str {
        "PaddleOCR"
    }

    #[instrument(skip(self, image), fields(bytes = image.len()))]
    async fn detect_text(&self, image: &[u8]) -> ProviderResult<OcrResult> {
        let request = ServingRequest {
            images: vec![STANDARD.encode(image)],
        };
        let response = self.predict(&request).await?;

        if !response.is_ok() {
            return Err(ProviderError::Detection(format!(
                "PaddleOCR processing failed: {} ({})",
                response.msg, response.status
            )));
        }

        let lines = response.results.into_iter().next().unwrap_or_default();
        let result = PaddleMapper::map_lines(lines);
        debug!(annotations = result.text_annotations.len(), "PaddleOCR text detection complete");
        Ok(result)
    }
}
