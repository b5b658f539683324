//! KTP extraction endpoint

use std::time::Instant;

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use tracing::{error, info, warn};

use crate::api::upload::{read_upload, validate_image, ErrorResponse, TempUpload, UploadForm, UploadError};
use crate::domain::KtpResponse;
use crate::AppState;

const NIK_NOT_FOUND: &str = "NIK not found. Please ensure the image is a valid KTP";

fn processing_failed(err: impl std::fmt::Display) -> HttpResponse {
    HttpResponse::Ok().json(KtpResponse::failed(format!("Processing failed: {}", err)))
}

/// POST /extract-ktp - Extract data from a KTP photo
///
/// The upload is written to the temp dir for the decode check and removed
/// when the request finishes.
#[utoipa::path(
    post,
    path = "/extract-ktp",
    tag = "extraction",
    request_body(content = UploadForm, content_type = "multipart/form-data", description = "Image in the `file` field (jpg, jpeg, png)"),
    responses(
        (status = 200, description = "Extraction result; `success` is false when no NIK is found or processing failed", body = KtpResponse),
        (status = 400, description = "Missing file, unsupported type, too large, or not an image", body = ErrorResponse)
    )
)]
pub async fn extract_ktp(state: web::Data<AppState>, payload: Multipart) -> HttpResponse {
    let start = Instant::now();

    let upload = match read_upload(payload, &state.settings.upload).await {
        Ok(upload) => upload,
        Err(e) => {
            warn!(error = %e, "Rejected KTP upload");
            return e.to_response();
        }
    };

    info!(
        filename = %upload.filename,
        bytes = upload.bytes.len(),
        "Processing KTP extraction request"
    );

    let temp = match TempUpload::write(&state.settings.upload.temp_dir, &upload.filename, &upload.bytes).await {
        Ok(temp) => temp,
        Err(e) => {
            error!(error = %e, "Failed to save upload");
            return processing_failed(e);
        }
    };

    let path = temp.path().to_path_buf();
    let is_image = tokio::task::spawn_blocking(move || validate_image(&path))
        .await
        .unwrap_or(false);
    if !is_image {
        return UploadError::InvalidImage.to_response();
    }

    let ocr = match state.ocr.extract_text(&upload.bytes).await {
        Ok(ocr) => ocr,
        Err(e) => {
            error!(error = %e, "OCR failed");
            return processing_failed(e);
        }
    };

    let data = state.ktp_extractor.extract(&ocr);

    if data.nik.is_none() {
        info!(
            annotations = ocr.text_annotations.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "No NIK found in KTP image"
        );
        return HttpResponse::Ok().json(KtpResponse::failed(NIK_NOT_FOUND));
    }

    info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        "KTP data extracted"
    );

    HttpResponse::Ok().json(KtpResponse::extracted(data))
}

#[cfg(test)]
mod tests {
    use actix_web::{test, App};
    use serde_json::Value;

    use crate::api::handlers::testing::{multipart, png_image, state_with};
    use crate::domain::{OcrResult, TextAnnotation, Vertex};
    use crate::providers::smart::tests::{text_result, MockProvider, Reply};

    fn word(label: &str, x: i32, y: i32) -> TextAnnotation {
        let w = 12 * label.chars().count() as i32;
        TextAnnotation::new(
            label,
            vec![Vertex::new(x, y), Vertex::new(x + w, y), Vertex::new(x + w, y + 20), Vertex::new(x, y + 20)],
        )
    }

    fn nik_card() -> OcrResult {
        OcrResult {
            text_annotations: vec![
                word("NIK", 40, 110),
                word(":", 200, 110),
                word("3216061812590006", 230, 110),
            ],
        }
    }

    async fn post(reply: Reply, filename: &str, bytes: &[u8]) -> (u16, Value) {
        let state = state_with(vec![MockProvider::new("google_vision", reply)], |_| {});
        let app = test::init_service(App::new().app_data(state).configure(crate::api::configure_routes)).await;

        let (content_type, body) = multipart("file", filename, bytes);
        let req = test::TestRequest::post()
            .uri("/extract-ktp")
            .insert_header(("content-type", content_type))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status().as_u16();
        (status, test::read_body_json(resp).await)
    }

    #[actix_web::test]
    async fn test_extracts_nik() {
        let (status, body) = post(Reply::Text(nik_card()), "ktp.png", &png_image()).await;
        assert_eq!(status, 200);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "KTP data extracted successfully");
        assert_eq!(body["data"]["nik"], "3216061812590006");
    }

    #[actix_web::test]
    async fn test_missing_nik() {
        let (status, body) = post(Reply::Text(text_result("SELAMAT DATANG DI BANDUNG")), "ktp.jpg", &png_image()).await;
        assert_eq!(status, 200);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], super::NIK_NOT_FOUND);
        assert!(body["data"].is_null());
    }

    #[actix_web::test]
    async fn test_ocr_failure_reported() {
        let (status, body) = post(Reply::Fail("quota exceeded"), "ktp.png", &png_image()).await;
        assert_eq!(status, 200);
        assert_eq!(body["success"], false);
        assert_eq!(
            body["message"],
            "Processing failed: All OCR services failed. Last error: OCR Error: quota exceeded"
        );
    }

    #[actix_web::test]
    async fn test_rejects_extension() {
        let (status, body) = post(Reply::Text(nik_card()), "ktp.gif", &png_image()).await;
        assert_eq!(status, 400);
        assert_eq!(body["detail"], "File type not allowed. Supported: jpg, jpeg, png");
    }

    #[actix_web::test]
    async fn test_rejects_non_image() {
        let (status, body) = post(Reply::Text(nik_card()), "ktp.png", b"plain text").await;
        assert_eq!(status, 400);
        assert_eq!(body["detail"], "Invalid image file");
    }

    #[actix_web::test]
    async fn test_missing_file_field() {
        let state = state_with(Vec::new(), |_| {});
        let app = test::init_service(App::new().app_data(state).configure(crate::api::configure_routes)).await;

        let (content_type, body) = multipart("photo", "ktp.png", &png_image());
        let req = test::TestRequest::post()
            .uri("/extract-ktp")
            .insert_header(("content-type", content_type))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 400);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["detail"], "No file selected");
    }
}
