//! Health check endpoint

use actix_web::{web, HttpResponse};
use serde::Serialize;
use utoipa::ToSchema;

use crate::providers::OcrStatus;
use crate::AppState;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub services: ServicesStatus,
    pub ocr: OcrStatus,
}

#[derive(Serialize, ToSchema)]
pub struct ServicesStatus {
    pub ktp_extraction: &'static str,
    pub signature_extraction: &'static str,
}

/// GET /health - Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let response = HealthResponse {
        status: "healthy",
        message: "API is running",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        services: ServicesStatus {
            ktp_extraction: "active",
            signature_extraction: "active",
        },
        ocr: state.ocr.status(),
    };

    HttpResponse::Ok().json(response)
}

#[cfg(test)]
mod tests {
    use actix_web::{test, App};
    use serde_json::Value;

    use crate::api::handlers::testing::state_with;
    use crate::providers::smart::tests::{MockProvider, Reply};

    #[actix_web::test]
    async fn test_health_reports_ocr_status() {
        let state = state_with(vec![MockProvider::new("paddle_ocr", Reply::Fail("x"))], |_| {});
        let app = test::init_service(App::new().app_data(state).configure(crate::api::configure_routes)).await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert!(resp.status().is_success());

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["message"], "API is running");
        assert_eq!(body["services"]["ktp_extraction"], "active");
        assert_eq!(body["ocr"]["google_vision"]["available"], false);
        assert_eq!(body["ocr"]["primary_service"], "paddle_ocr");
    }
}
