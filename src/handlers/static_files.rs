use axum::{
    extract::Path,
    http::{header::CONTENT_TYPE, StatusCode},
    response::{Html, IntoResponse, Response},
};
use tracing::debug;

const INDEX_HTML: &str = include_str!("../../web/index.html");

/// Bundled UI assets, served under `/static/`
const ASSETS: &[(&str, &str)] = &[
    ("app.js", include_str!("../../web/app.js")),
    ("style.css", include_str!("../../web/style.css")),
];

/// UI entry document
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Bundled asset lookup
pub async fn static_file(Path(file): Path<String>) -> Response {
    match ASSETS.iter().find(|(name, _)| *name == file) {
        Some((name, body)) => ([(CONTENT_TYPE, content_type(name))], *body).into_response(),
        None => {
            debug!("Static asset '{}' not found", file);
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

fn content_type(name: &str) -> &'static str {
    match name.rsplit_once('.').map(|(_, ext)| ext) {
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("html") => "text/html",
        _ => "application/octet-stream",
    }
}
