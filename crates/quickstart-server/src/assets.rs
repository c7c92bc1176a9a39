//! Embedded static assets and the health endpoint.

use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use rust_embed::RustEmbed;
use serde_json::{Value, json};

#[derive(RustEmbed)]
#[folder = "assets/"]
pub struct Assets;

/// `/healthz` and `/static/{*path}`.
pub fn router() -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/static/{*path}", get(static_asset))
}

async fn healthz() -> Json<Value> {
    Json(json!({ "ok": true, "service": "quickstart-server" }))
}

async fn static_asset(Path(path): Path<String>) -> Response {
    let path = path.trim_start_matches('/');
    match Assets::get(path) {
        Some(file) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            (
                [(header::CONTENT_TYPE, mime.as_ref().to_string())],
                file.data.into_owned(),
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}
