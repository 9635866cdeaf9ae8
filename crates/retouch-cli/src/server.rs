use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::routing::any;
use axum::{Json, Router};
use retouch_engine::clients::GENERATE_PATH;
use retouch_engine::{EndpointResponse, GenerateEndpoint};
use serde_json::{json, Value};
use tracing::{info, warn};

pub fn build_router(endpoint: Arc<GenerateEndpoint>) -> Router {
    // `any` so that wrong methods reach the endpoint and get its JSON 405.
    Router::new()
        .route(GENERATE_PATH, any(generate_handler))
        .with_state(endpoint)
}

pub async fn serve(addr: SocketAddr, endpoint: GenerateEndpoint) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(bind = %addr, backend = endpoint.backend_name(), "starting retouch generate endpoint");
    axum::serve(listener, build_router(Arc::new(endpoint))).await
}

async fn generate_handler(
    State(endpoint): State<Arc<GenerateEndpoint>>,
    method: Method,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    // Backend clients block on HTTP.
    let handled =
        tokio::task::spawn_blocking(move || endpoint.handle(method.as_str(), &body)).await;
    match handled {
        Ok(EndpointResponse { status, body }) => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Json(body),
        ),
        Err(err) => {
            warn!(error = %err, "generate handler task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": err.to_string(), "error_kind": "unknown" })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine as _;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use pretty_assertions::assert_eq;
    use retouch_engine::clients::{DryrunClient, GeminiClient, MISSING_KEY_MESSAGE};
    use retouch_engine::EngineConfig;
    use tower::ServiceExt;

    use super::*;

    fn dryrun_router() -> Router {
        build_router(Arc::new(GenerateEndpoint::new(Box::new(DryrunClient))))
    }

    fn png_base64() -> String {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([30, 60, 90])));
        let mut buffer = Cursor::new(Vec::new());
        image
            .write_to(&mut buffer, ImageFormat::Png)
            .expect("png should encode");
        BASE64.encode(buffer.into_inner())
    }

    async fn send_json(
        app: Router,
        method: Method,
        body: Body,
        expected_status: StatusCode,
    ) -> Value {
        let request = Request::builder()
            .method(method)
            .uri(GENERATE_PATH)
            .header("content-type", "application/json")
            .body(body)
            .expect("request should build");

        let response = app
            .oneshot(request)
            .await
            .expect("router should return response");
        assert_eq!(response.status(), expected_status);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        serde_json::from_slice(body.as_ref()).expect("response should be valid JSON")
    }

    #[tokio::test]
    async fn non_post_methods_are_rejected() {
        let response = send_json(
            dryrun_router(),
            Method::GET,
            Body::empty(),
            StatusCode::METHOD_NOT_ALLOWED,
        )
        .await;
        assert_eq!(response["error"], json!("Method not allowed"));
        assert_eq!(response["error_kind"], json!("validation"));
    }

    #[tokio::test]
    async fn missing_fields_are_validation_errors() {
        let response = send_json(
            dryrun_router(),
            Method::POST,
            Body::from(r#"{"task_id":"","prompt":"x","parts":[]}"#),
            StatusCode::BAD_REQUEST,
        )
        .await;
        assert_eq!(response["error_kind"], json!("validation"));
    }

    #[tokio::test]
    async fn missing_credentials_win_over_body_validation() {
        let config = EngineConfig::from_lookup(|_| None);
        // The blocking HTTP client cannot be constructed on an async worker.
        let client = tokio::task::spawn_blocking(move || GeminiClient::new(&config))
            .await
            .expect("client construction should not panic");
        let app = build_router(Arc::new(GenerateEndpoint::new(Box::new(client))));
        let response = send_json(
            app,
            Method::POST,
            Body::from("not json"),
            StatusCode::INTERNAL_SERVER_ERROR,
        )
        .await;
        assert_eq!(response["error"], json!(MISSING_KEY_MESSAGE));
        assert_eq!(response["error_kind"], json!("configuration"));
    }

    #[tokio::test]
    async fn dryrun_generate_returns_data_url() {
        let body = json!({
            "task_id": "STYLE_TRANSFER_ANIME",
            "prompt": "Turn this photo into anime",
            "parts": [
                { "text": "Turn this photo into anime" },
                { "inlineData": { "mimeType": "image/png", "data": png_base64() } }
            ]
        });
        let response = send_json(
            dryrun_router(),
            Method::POST,
            Body::from(body.to_string()),
            StatusCode::OK,
        )
        .await;
        let url = response["image_url"].as_str().unwrap_or_default();
        assert!(url.starts_with("data:image/png;base64,"), "unexpected url: {url}");
    }

    #[tokio::test]
    async fn face_swap_needs_two_images() {
        let body = json!({
            "task_id": "TREND_FACE_SWAP_MV",
            "prompt": "swap",
            "parts": [
                { "text": "swap" },
                { "inlineData": { "mimeType": "image/png", "data": png_base64() } }
            ]
        });
        let response = send_json(
            dryrun_router(),
            Method::POST,
            Body::from(body.to_string()),
            StatusCode::BAD_REQUEST,
        )
        .await;
        assert_eq!(response["error_kind"], json!("validation"));
    }
}
