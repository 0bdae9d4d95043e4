use crate::{docs::ApiDoc, handlers, lifecycle::Lifecycle};
use axum::{extract::DefaultBodyLimit, routing::{get, post}, Json, Router};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Shared state of the HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Lifecycle,
}

/// Create the application routes
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/static/:file", get(handlers::static_file))
        .route(
            "/convert",
            post(handlers::convert).layer(DefaultBodyLimit::max(handlers::CONVERT_BODY_LIMIT)),
        )
        .route("/heartbeat", post(handlers::heartbeat))
        .route("/health", get(handlers::health_check))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{LifecycleSettings, Supervisor};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::Value;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app() -> (Router, Lifecycle) {
        let (_supervisor, trigger) = Supervisor::new();
        let lifecycle = Lifecycle::new(LifecycleSettings::default(), trigger);
        (create_routes(AppState { lifecycle: lifecycle.clone() }), lifecycle)
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, body.to_vec())
    }

    fn form_request(body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/convert")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart_request(field: &str, value: &str) -> Request<Body> {
        let boundary = "json2yaml-test-boundary";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"\r\n\r\n{value}\r\n--{boundary}--\r\n"
        );
        Request::builder()
            .method(Method::POST)
            .uri("/convert")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
            .body(Body::from(body))
            .unwrap()
    }

    fn json(body: &[u8]) -> Value {
        serde_json::from_slice(body).unwrap()
    }

    #[tokio::test]
    async fn converts_multipart_form() {
        let (router, _) = app();
        let (status, _, body) = send(router, multipart_request("json_content", r#"{"a": 1, "b": [true, null, "x"]}"#)).await;
        assert_eq!(status, StatusCode::OK);

        let yaml = json(&body)["yaml"].as_str().unwrap().to_string();
        let back: Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, serde_json::json!({"a": 1, "b": [true, null, "x"]}));
    }

    #[tokio::test]
    async fn converts_urlencoded_form() {
        let (router, _) = app();
        let (status, _, body) = send(router, form_request("json_content=%5B1%2C2%5D")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["yaml"], "- 1\n- 2\n");
    }

    #[tokio::test]
    async fn malformed_json_is_a_client_error() {
        let (router, _) = app();
        let (status, _, body) = send(router, multipart_request("json_content", r#"{"a":"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let body = json(&body);
        assert_eq!(body["code"], 400);
        assert!(body["error"].as_str().unwrap().starts_with("Conversion failed: failed to parse JSON"));
    }

    #[tokio::test]
    async fn missing_or_empty_input_is_required() {
        let (router, _) = app();
        let (status, _, body) = send(router, form_request("json_content=")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json(&body)["error"], "JSON content is required");

        let (router, _) = app();
        let (status, _, body) = send(router, multipart_request("other_field", "{}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json(&body)["error"], "JSON content is required");
    }

    #[tokio::test]
    async fn unparseable_body_is_a_form_error() {
        let (router, _) = app();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/convert")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let (status, _, body) = send(router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json(&body)["error"], "Failed to parse form data");
    }

    #[tokio::test]
    async fn convert_rejects_get() {
        let (router, _) = app();
        let request = Request::builder().uri("/convert").body(Body::empty()).unwrap();
        let (status, _, _) = send(router, request).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test(start_paused = true)]
    async fn heartbeat_refreshes_liveness_clock() {
        let (router, lifecycle) = app();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(lifecycle.tracker().time_since_last_heartbeat(), Duration::from_secs(3));

        let request = Request::builder()
            .method(Method::POST)
            .uri("/heartbeat")
            .body(Body::empty())
            .unwrap();
        let (status, headers, body) = send(router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");
        assert_eq!(headers[header::CACHE_CONTROL], "no-store");
        assert_eq!(lifecycle.tracker().time_since_last_heartbeat(), Duration::ZERO);
    }

    #[tokio::test]
    async fn serves_index_and_assets() {
        let (router, _) = app();
        let (status, headers, body) = send(router, Request::builder().uri("/").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));
        assert!(String::from_utf8(body).unwrap().contains("/static/app.js"));

        let (router, _) = app();
        let (status, headers, _) = send(router, Request::builder().uri("/static/style.css").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "text/css");

        let (router, _) = app();
        let (status, headers, body) = send(router, Request::builder().uri("/static/app.js").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "application/javascript");
        assert!(String::from_utf8(body).unwrap().contains("/heartbeat"));
    }

    #[tokio::test]
    async fn unknown_paths_are_not_found() {
        for uri in ["/static/missing.js", "/nope"] {
            let (router, _) = app();
            let (status, _, _) = send(router, Request::builder().uri(uri).body(Body::empty()).unwrap()).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        }
    }

    #[tokio::test]
    async fn health_reports_connections_without_touching_heartbeat() {
        let (router, lifecycle) = app();
        let id = lifecycle.tracker().allocate_id();
        lifecycle.tracker().on_connection_opened(id);

        let (status, _, body) = send(router, Request::builder().uri("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        let body = json(&body);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["connections"], 1);
        assert_eq!(body["shutdown_pending"], false);
    }

    #[tokio::test]
    async fn serves_openapi_document() {
        let (router, _) = app();
        let (status, _, body) = send(router, Request::builder().uri("/api-docs/openapi.json").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        let body = json(&body);
        assert!(body["paths"]["/convert"]["post"].is_object());
        assert!(body["paths"]["/heartbeat"]["post"].is_object());
    }
}
