//! Embedded static assets
//!
//! Falls back to the `ui/` directory on disk so the page can be edited
//! without rebuilding.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
};
use rust_embed::Embed;
use std::path::PathBuf;

const UI_DIR: &str = "ui";

#[derive(Embed)]
#[folder = "ui"]
struct Assets;

fn file_response(path: &str, data: Vec<u8>) -> Response {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, mime.as_ref().to_string())],
        Body::from(data),
    )
        .into_response()
}

/// Serve embedded static files, with filesystem fallback
pub async fn serve_static(req: Request<Body>) -> Response {
    let path = req.uri().path().trim_start_matches('/');

    if let Some(content) = Assets::get(path) {
        return file_response(path, content.data.into_owned());
    }

    // Never serve anything outside the UI directory
    if !path.split('/').any(|segment| segment == "..") {
        if let Ok(content) = std::fs::read(PathBuf::from(UI_DIR).join(path)) {
            return file_response(path, content);
        }
    }

    (StatusCode::NOT_FOUND, "Not found").into_response()
}

/// Get the index.html content (embedded or from filesystem)
pub fn get_index_html() -> Option<String> {
    if let Some(content) = Assets::get("index.html") {
        return String::from_utf8(content.data.into_owned()).ok();
    }

    std::fs::read_to_string(PathBuf::from(UI_DIR).join("index.html")).ok()
}
