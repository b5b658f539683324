//! Signature extraction endpoint

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use tracing::{info, warn};

use crate::api::upload::{read_upload, ErrorResponse, UploadForm};
use crate::domain::SignatureResponse;
use crate::AppState;

/// POST /extract-signature - Isolate a signature and upload it to the CDN
#[utoipa::path(
    post,
    path = "/extract-signature",
    tag = "extraction",
    request_body(content = UploadForm, content_type = "multipart/form-data", description = "Photo of a signature on white paper in the `file` field"),
    responses(
        (status = 200, description = "Extraction result with the CDN URL of the transparent PNG", body = SignatureResponse),
        (status = 400, description = "Missing file, unsupported type or too large", body = ErrorResponse)
    )
)]
pub async fn extract_signature(state: web::Data<AppState>, payload: Multipart) -> HttpResponse {
    let upload = match read_upload(payload, &state.settings.upload).await {
        Ok(upload) => upload,
        Err(e) => {
            warn!(error = %e, "Rejected signature upload");
            return e.to_response();
        }
    };

    info!(
        filename = %upload.filename,
        bytes = upload.bytes.len(),
        "Processing signature extraction request"
    );

    let response = state.signature_service.extract_and_upload(upload.bytes).await;

    info!(success = response.success, message = %response.message, "Signature request finished");

    HttpResponse::Ok().json(response)
}

#[cfg(test)]
mod tests {
    use actix_web::{test, App};
    use serde_json::Value;

    use crate::api::handlers::testing::{multipart, png_image, state_with};

    async fn post(filename: &str, bytes: &[u8], max_file_size: u64) -> (u16, Value) {
        let state = state_with(Vec::new(), |settings| settings.upload.max_file_size = max_file_size);
        let app = test::init_service(App::new().app_data(state).configure(crate::api::configure_routes)).await;

        let (content_type, body) = multipart("file", filename, bytes);
        let req = test::TestRequest::post()
            .uri("/extract-signature")
            .insert_header(("content-type", content_type))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status().as_u16();
        (status, test::read_body_json(resp).await)
    }

    #[actix_web::test]
    async fn test_blank_page_has_no_signature() {
        let (status, body) = post("sig.png", &png_image(), 1024 * 1024).await;
        assert_eq!(status, 200);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "No signature found in image");
        assert!(body["signature_url"].is_null());
    }

    #[actix_web::test]
    async fn test_undecodable_image() {
        let (status, body) = post("sig.jpg", b"garbage", 1024 * 1024).await;
        assert_eq!(status, 200);
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().starts_with("Error: "));
    }

    #[actix_web::test]
    async fn test_too_large() {
        let (status, body) = post("sig.png", &vec![0u8; 2 * 1024 * 1024], 1536 * 1024).await;
        assert_eq!(status, 400);
        assert_eq!(body["detail"], "File size too large. Maximum 1.5MB allowed");
    }
}
