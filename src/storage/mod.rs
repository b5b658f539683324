//! Storage module for extracted assets
//!
//! Extracted signatures are published to an HTTP file CDN.

mod cdn;

pub use cdn::CdnClient;

#[cfg(test)]
pub(crate) mod testing {
    use actix_web::dev::ServerHandle;
    use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};

    pub(crate) const STUB_API_KEY: &str = "stub-key";
    pub(crate) const STUB_FILE_URL: &str = "https://cdn.test/files/signature.png";

    async fn accept(req: HttpRequest, _body: web::Bytes) -> HttpResponse {
        let authorized = req
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            == Some("Bearer stub-key");

        if authorized {
            HttpResponse::Created().json(serde_json::json!({ "url": STUB_FILE_URL }))
        } else {
            HttpResponse::Unauthorized().finish()
        }
    }

    async fn broken(_body: web::Bytes) -> HttpResponse {
        HttpResponse::InternalServerError().finish()
    }

    async fn no_url(_body: web::Bytes) -> HttpResponse {
        HttpResponse::Ok().json(serde_json::json!({ "id": 7 }))
    }

    /// Local CDN stand-in; base URLs are `{base}/ok`, `{base}/broken` and `{base}/no-url`
    pub(crate) async fn start_stub_cdn() -> (String, ServerHandle) {
        let server = HttpServer::new(|| {
            App::new()
                .route("/ok/api/v1/files/upload", web::post().to(accept))
                .route("/broken/api/v1/files/upload", web::post().to(broken))
                .route("/no-url/api/v1/files/upload", web::post().to(no_url))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();

        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        (format!("http://{}", addr), handle)
    }
}
