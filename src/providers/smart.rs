//! OCR orchestration with fallback
//!
//! Providers are tried in order (Google Vision, then PaddleOCR). The first
//! result with meaningful text wins.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::config::OcrSettings;
use crate::domain::OcrResult;
use super::google_vision::GoogleVisionProvider;
use super::paddle::PaddleOcrProvider;
use super::{OcrProvider, ProviderError, ProviderResult};

const GOOGLE_VISION: &str = "google_vision";
const PADDLE_OCR: &str = "paddle_ocr";

/// Availability of a single OCR engine
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ServiceStatus {
    pub available: bool,
    /// "ready" or "not configured"
    pub status: String,
}

impl ServiceStatus {
    fn new(available: bool) -> Self {
        ServiceStatus {
            available,
            status: if available { "ready" } else { "not configured" }.to_string(),
        }
    }
}

/// Status of the configured OCR engines
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct OcrStatus {
    pub google_vision: ServiceStatus,
    pub paddle_ocr: ServiceStatus,
    /// Engine tried first, or "none"
    pub primary_service: String,
}

/// Ordered chain of OCR providers
#[derive(Clone)]
pub struct SmartOcr {
    providers: Vec<Arc<dyn OcrProvider>>,
    min_text_len: usize,
}

impl SmartOcr {
    pub fn with_providers(providers: Vec<Arc<dyn OcrProvider>>, min_text_len: usize) -> Self {
        SmartOcr {
            providers,
            min_text_len,
        }
    }

    /// Build the chain from settings, skipping engines that fail to initialise
    pub fn from_settings(settings: &OcrSettings) -> Self {
        let mut providers: Vec<Arc<dyn OcrProvider>> = Vec::new();

        match GoogleVisionProvider::from_settings(settings) {
            Ok(provider) => providers.push(Arc::new(provider)),
            Err(e) => warn!(error = %e, "Google Cloud Vision unavailable"),
        }

        match PaddleOcrProvider::from_settings(settings) {
            Ok(provider) => providers.push(Arc::new(provider)),
            Err(e) => warn!(error = %e, "PaddleOCR unavailable"),
        }

        let chain = Self::with_providers(providers, settings.min_text_len);
        info!(
            primary = %chain.primary_service(),
            providers = chain.providers.len(),
            "Smart OCR ready"
        );
        chain
    }

    fn has(&self, code: &str) -> bool {
        self.providers.iter().any(|p| p.code() == code)
    }

    fn primary_service(&self) -> &'static str {
        self.providers.first().map(|p| p.code()).unwrap_or("none")
    }

    /// Detect text, falling back through the chain
    ///
    /// Returns an empty result when every engine answered without
    /// meaningful text, and `AllFailed` when the last engine errored.
    pub async fn extract_text(&self, image: &[u8]) -> ProviderResult<OcrResult> {
        if self.providers.is_empty() {
            return Err(ProviderError::NotConfigured("No OCR service configured".to_string()));
        }

        let mut last_error = None;

        for provider in &self.providers {
            info!(provider = provider.code(), "Trying OCR provider");

            match provider.detect_text(image).await {
                Ok(result) if result.is_meaningful(self.min_text_len) => {
                    info!(
                        provider = provider.code(),
                        annotations = result.text_annotations.len(),
                        "OCR successful"
                    );
                    return Ok(result);
                }
                Ok(_) => {
                    warn!(provider = provider.code(), "OCR returned no meaningful text");
                    last_error = None;
                }
                Err(e) => {
                    warn!(provider = provider.code(), error = %e, "OCR provider failed");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(ProviderError::AllFailed(e.to_string())),
            None => Ok(OcrResult::default()),
        }
    }

    pub fn status(&self) -> OcrStatus {
        OcrStatus {
            google_vision: ServiceStatus::new(self.has(GOOGLE_VISION)),
            paddle_ocr: ServiceStatus::new(self.has(PADDLE_OCR)),
            primary_service: self.primary_service().to_string(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::{TextAnnotation, Vertex};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_test::assert_ok;

    pub(crate) enum Reply {
        Text(OcrResult),
        Fail(&'static str),
    }

    /// Canned provider that counts its calls
    pub(crate) struct MockProvider {
        pub code: &'static str,
        pub reply: Reply,
        pub calls: AtomicUsize,
    }

    impl MockProvider {
        pub(crate) fn new(code: &'static str, reply: Reply) -> Arc<Self> {
            Arc::new(MockProvider {
                code,
                reply,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl OcrProvider for MockProvider {
        fn code(&self) -> &'static str {
            self.code
        }

        fn name(&self) -> &'static str {
            "Mock"
        }

        async fn detect_text(&self, _image: &[u8]) -> ProviderResult<OcrResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Reply::Text(result) => Ok(result.clone()),
                Reply::Fail(msg) => Err(ProviderError::Detection(msg.to_string())),
            }
        }
    }

    pub(crate) fn text_result(text: &str) -> OcrResult {
        OcrResult {
            text_annotations: vec![TextAnnotation::new(
                text,
                vec![Vertex::new(0, 0), Vertex::new(10, 0), Vertex::new(10, 10), Vertex::new(0, 10)],
            )],
        }
    }

    fn chain(providers: Vec<Arc<MockProvider>>) -> SmartOcr {
        let providers = providers
            .into_iter()
            .map(|p| p as Arc<dyn OcrProvider>)
            .collect();
        SmartOcr::with_providers(providers, 10)
    }

    #[tokio::test]
    async fn test_primary_success_skips_fallback() {
        let google = MockProvider::new(GOOGLE_VISION, Reply::Text(text_result("PROVINSI DKI JAKARTA")));
        let paddle = MockProvider::new(PADDLE_OCR, Reply::Fail("unused"));
        let ocr = chain(vec![google.clone(), paddle.clone()]);

        let result = ocr.extract_text(b"img").await.unwrap();
        assert_eq!(result.text_annotations[0].description, "PROVINSI DKI JAKARTA");
        assert_eq!(paddle.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_falls_back_on_error() {
        let google = MockProvider::new(GOOGLE_VISION, Reply::Fail("quota"));
        let paddle = MockProvider::new(PADDLE_OCR, Reply::Text(text_result("NIK 3171012345678901")));
        let ocr = chain(vec![google, paddle.clone()]);

        let result = ocr.extract_text(b"img").await.unwrap();
        assert_eq!(result.text_annotations[0].description, "NIK 3171012345678901");
        assert_eq!(paddle.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_falls_back_on_short_text() {
        let google = MockProvider::new(GOOGLE_VISION, Reply::Text(text_result("  abc  ")));
        let paddle = MockProvider::new(PADDLE_OCR, Reply::Text(text_result("KECAMATAN MENTENG")));
        let ocr = chain(vec![google, paddle]);

        let result = ocr.extract_text(b"img").await.unwrap();
        assert_eq!(result.text_annotations[0].description, "KECAMATAN MENTENG");
    }

    #[tokio::test]
    async fn test_last_failure_is_reported() {
        let google = MockProvider::new(GOOGLE_VISION, Reply::Text(text_result("short")));
        let paddle = MockProvider::new(PADDLE_OCR, Reply::Fail("connection refused"));
        let ocr = chain(vec![google, paddle]);

        let err = ocr.extract_text(b"img").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "All OCR services failed. Last error: OCR Error: connection refused"
        );
    }

    #[tokio::test]
    async fn test_no_meaningful_text_is_empty() {
        let google = MockProvider::new(GOOGLE_VISION, Reply::Fail("quota"));
        let paddle = MockProvider::new(PADDLE_OCR, Reply::Text(OcrResult::default()));
        let ocr = chain(vec![google, paddle]);

        let result = assert_ok!(ocr.extract_text(b"img").await);
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_no_providers() {
        let ocr = SmartOcr::with_providers(Vec::new(), 10);
        assert!(matches!(
            ocr.extract_text(b"img").await,
            Err(ProviderError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_status() {
        let ocr = chain(vec![MockProvider::new(PADDLE_OCR, Reply::Fail("x"))]);
        let status = ocr.status();
        assert!(!status.google_vision.available);
        assert_eq!(status.google_vision.status, "not configured");
        assert!(status.paddle_ocr.available);
        assert_eq!(status.paddle_ocr.status, "ready");
        assert_eq!(status.primary_service, "paddle_ocr");

        let empty = SmartOcr::with_providers(Vec::new(), 10).status();
        assert_eq!(empty.primary_service, "none");
    }
}
