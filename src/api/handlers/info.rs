//! API information endpoint

use actix_web::HttpResponse;
use serde::Serialize;
use utoipa::ToSchema;

pub const SERVICE_NAME: &str = "KTP OCR & Signature Extraction API";

#[derive(Serialize, ToSchema)]
pub struct EndpointInfo {
    pub path: &'static str,
    pub method: &'static str,
    pub description: &'static str,
}

#[derive(Serialize, ToSchema)]
pub struct InfoResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub endpoints: Vec<EndpointInfo>,
}

const ENDPOINTS: [(&str, &str, &str); 5] = [
    ("/extract-ktp", "POST", "Extract data from KTP image"),
    ("/extract-signature", "POST", "Extract signature from image"),
    ("/health", "GET", "Health check"),
    ("/docs", "GET", "API documentation"),
    ("/redoc", "GET", "API documentation (ReDoc)"),
];

/// GET / - API information
#[utoipa::path(
    get,
    path = "/",
    tag = "system",
    responses(
        (status = 200, description = "Service name, version and endpoints", body = InfoResponse)
    )
)]
pub async fn root() -> HttpResponse {
    HttpResponse::Ok().json(InfoResponse {
        name: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        endpoints: ENDPOINTS
            .iter()
            .map(|&(path, method, description)| EndpointInfo {
                path,
                method,
                description,
            })
            .collect(),
    })
}
