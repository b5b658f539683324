//! PaddleOCR Serving Request/Response Models
//!
//! Wire format of the PaddleHub `ocr_system` module served over HTTP.

use serde::{Deserialize, Serialize};

/// Status code the serving module returns on success
pub const STATUS_OK: &str = "000";

// ============================================================================
// Request
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ServingRequest {
    /// Base64 encoded images
    pub images: Vec<String>,
}

// ============================================================================
// Response
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ServingResponse {
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub status: String,
    /// One list of recognised lines per input image
    #[serde(default)]
    pub results: Vec<Vec<ServingLine>>,
}

/// A recognised text line
#[derive(Debug, Clone, Deserialize)]
pub struct ServingLine {
    pub text: String,
    #[serde(default)]
    pub confidence: f64,
    /// Corner points, clockwise from top-left
    #[serde(default)]
    pub text_region: Vec<[f64; 2]>,
}

impl ServingResponse {
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}
