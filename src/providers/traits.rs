//! Provider trait definitions for OCR integrations
//!
//! This module defines the contract that all OCR provider implementations must follow.
//! Each provider (Google Cloud Vision, PaddleOCR serving) implements the `OcrProvider`
//! trait and converts its output into the shared [`OcrResult`] layout.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::OcrResult;
use super::http_client::ClientError;

// ============================================================================
// Error Types
// ============================================================================

/// Provider error types
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] ClientError),

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("OCR Error: {0}")]
    Detection(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("All OCR services failed. Last error: {0}")]
    AllFailed(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Http(ClientError::Http(err))
    }
}

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

// ============================================================================
// Provider Trait
// ============================================================================

/// Text detection backend
#[async_trait]
pub trait OcrProvider: Send + Sync {
    /// Provider code (e.g., "google_vision", "paddle_ocr")
    fn code(&self) -> &'static str;

    /// Provider display name (e.g., "Google Vision")
    fn name(&self) -> &'static str;

    /// Detect text in an encoded image
    ///
    /// # Arguments
    /// * `image` - Raw image file bytes (JPEG/PNG)
    async fn detect_text(&self, image: &[u8]) -> ProviderResult<OcrResult>;
}
