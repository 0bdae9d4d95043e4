use utoipa::OpenApi;
use crate::models::*;

/// Convert a JSON document to YAML
#[utoipa::path(
    post,
    path = "/convert",
    request_body(content = ConvertForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Document converted", body = ConvertResponse),
        (status = 400, description = "Missing input or invalid JSON", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn convert_doc() {}

/// Keep the server alive while the page is open
#[utoipa::path(
    post,
    path = "/heartbeat",
    responses(
        (status = 200, description = "Heartbeat recorded", body = String, content_type = "text/plain")
    )
)]
#[allow(dead_code)]
pub async fn heartbeat_doc() {}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn health_check_doc() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        convert_doc,
        heartbeat_doc,
        health_check_doc,
    ),
    components(
        schemas(ConvertForm, ConvertResponse, ErrorResponse, HealthResponse)
    ),
    tags(
        (name = "json2yaml", description = "Local conversion endpoints")
    )
)]
pub struct ApiDoc;
