//! API module - HTTP routes and handlers

pub mod handlers;
pub mod openapi;
pub mod upload;

use actix_web::web;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::openapi::ApiDoc;

/// Configure all API routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/extract-ktp", web::post().to(handlers::ktp::extract_ktp))
        .route("/extract-signature", web::post().to(handlers::signature::extract_signature))
        .route("/health", web::get().to(handlers::health::health_check))
        .route("/", web::get().to(handlers::info::root))
        // Swagger UI, ReDoc and OpenAPI spec
        .service(
            SwaggerUi::new("/docs/{_:.*}")
                .url("/api-docs/openapi.json", ApiDoc::openapi())
        )
        .service(Redoc::with_url("/redoc", ApiDoc::openapi()));
}
