//! OpenAPI 3.0 specification definition

use utoipa::OpenApi;

use crate::api::handlers::{
    health::{HealthResponse, ServicesStatus},
    info::{EndpointInfo, InfoResponse},
};
use crate::api::upload::{ErrorResponse, UploadForm};
use crate::domain::{KtpData, KtpResponse, SignatureDimensions, SignatureResponse};
use crate::providers::{OcrStatus, ServiceStatus};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "KTP OCR & Signature Extraction API",
        version = "2.0.0",
        description = "Extracts structured data from Indonesian identity cards (KTP) and isolates handwritten signatures"
    ),
    servers(
        (url = "/", description = "Current server")
    ),
    tags(
        (name = "system", description = "System health and status endpoints"),
        (name = "extraction", description = "KTP and signature extraction endpoints")
    ),
    paths(
        crate::api::handlers::health::health_check,
        crate::api::handlers::info::root,
        crate::api::handlers::ktp::extract_ktp,
        crate::api::handlers::signature::extract_signature,
    ),
    components(
        schemas(
            // System schemas
            HealthResponse,
            ServicesStatus,
            OcrStatus,
            ServiceStatus,
            InfoResponse,
            EndpointInfo,
            // Extraction schemas
            KtpData,
            KtpResponse,
            SignatureResponse,
            SignatureDimensions,
            ErrorResponse,
            UploadForm,
        )
    )
)]
pub struct ApiDoc;
