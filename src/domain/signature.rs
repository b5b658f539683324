//! Signature extraction results

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SignatureDimensions {
    pub width: u32,
    pub height: u32,
}

/// Crop rectangle of the signature in source image pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SignatureBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Response body of `POST /extract-signature`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignatureResponse {
    pub success: bool,
    pub message: String,
    /// CDN URL of the transparent PNG
    pub signature_url: Option<String>,
    pub confidence: Option<f32>,
    pub dimensions: Option<SignatureDimensions>,
}

impl SignatureResponse {
    pub fn failed(message: impl Into<String>) -> Self {
        SignatureResponse {
            success: false,
            message: message.into(),
            signature_url: None,
            confidence: None,
            dimensions: None,
        }
    }
}
