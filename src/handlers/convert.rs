use crate::{convert::json_to_yaml, models::{ConvertForm, ConvertResponse, ErrorResponse}};
use axum::{
    extract::{FromRequest, Multipart, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    Form, Json,
};
use tracing::{debug, error};

/// Largest accepted conversion request body
pub const CONVERT_BODY_LIMIT: usize = 10 * 1024 * 1024;

const JSON_FIELD: &str = "json_content";

/// Convert the submitted JSON document to YAML
pub async fn convert(
    request: Request,
) -> Result<(StatusCode, Json<ConvertResponse>), (StatusCode, Json<ErrorResponse>)> {

    let json_content = match read_json_content(request).await {
        Ok(content) => content,
        Err(e) => {
            error!("Failed to parse conversion form: {}", e);
            return Err(ErrorResponse::reply(StatusCode::BAD_REQUEST, "Failed to parse form data"));
        }
    };

    // Missing and empty input are request errors, not conversion errors
    let json_content = match json_content {
        Some(content) if !content.is_empty() => content,
        _ => {
            return Err(ErrorResponse::reply(StatusCode::BAD_REQUEST, "JSON content is required"));
        }
    };

    match json_to_yaml(&json_content) {
        Ok(yaml) => {
            debug!("Converted {} bytes of JSON into {} bytes of YAML", json_content.len(), yaml.len());
            Ok((StatusCode::OK, Json(ConvertResponse { yaml })))
        }
        Err(e) => {
            debug!("Conversion rejected: {}", e);
            Err(ErrorResponse::reply(StatusCode::BAD_REQUEST, format!("Conversion failed: {}", e)))
        }
    }
}

/// Pull `json_content` out of a multipart or url-encoded form
async fn read_json_content(request: Request) -> Result<Option<String>, String> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("multipart/form-data"))
        .unwrap_or(false);

    if !is_multipart {
        let Form(form) = Form::<ConvertForm>::from_request(request, &())
            .await
            .map_err(|e| e.body_text())?;
        return Ok(form.json_content);
    }

    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| e.body_text())?;
    while let Some(field) = multipart.next_field().await.map_err(|e| e.body_text())? {
        if field.name() == Some(JSON_FIELD) {
            return field.text().await.map(Some).map_err(|e| e.body_text());
        }
    }
    Ok(None)
}
