//! Google Cloud Vision API Request/Response Models
//!
//! Only the parts of `images:annotate` needed for TEXT_DETECTION are modelled.

use serde::{Deserialize, Serialize};

use crate::domain::{OcrResult, TextAnnotation};

// ============================================================================
// Request
// ============================================================================

#[derive(Debug, Serialize)]
pub struct AnnotateRequest {
    pub requests: Vec<AnnotateImageRequest>,
}

#[derive(Debug, Serialize)]
pub struct AnnotateImageRequest {
    pub image: VisionImage,
    pub features: Vec<Feature>,
}

/// Base64 encoded image content
#[derive(Debug, Serialize)]
pub struct VisionImage {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub feature_type: &'static str,
}

impl AnnotateRequest {
    /// Single-image TEXT_DETECTION request
    pub fn text_detection(content_b64: String) -> Self {
        AnnotateRequest {
            requests: vec![AnnotateImageRequest {
                image: VisionImage { content: content_b64 },
                features: vec![Feature { feature_type: "TEXT_DETECTION" }],
            }],
        }
    }
}

// ============================================================================
// Response
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AnnotateResponse {
    #[serde(default)]
    pub responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateImageResponse {
    #[serde(default)]
    pub text_annotations: Vec<TextAnnotation>,
    #[serde(default)]
    pub error: Option<VisionStatus>,
}

/// Per-image error status
#[derive(Debug, Deserialize)]
pub struct VisionStatus {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

impl AnnotateImageResponse {
    /// Error message reported for this image, if any
    pub fn error_message(&self) -> Option<&str> {
        self.error
            .as_ref()
            .map(|e| e.message.as_str())
            .filter(|m| !m.is_empty())
    }

    pub fn into_result(self) -> OcrResult {
        OcrResult {
            text_annotations: self.text_annotations,
        }
    }
}
