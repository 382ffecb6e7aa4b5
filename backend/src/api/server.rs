//! HTTP server for the Artify pinning proxy.
//!
//! Keeps the Pinata credential on the server and forwards creator uploads.
//!
//! # API Endpoints
//!
//! | Method | Path                     | Description                         |
//! |--------|--------------------------|-------------------------------------|
//! | GET    | `/health`                | Health check                        |
//! | POST   | `/api/upload-to-pinata`  | Pin a multipart file or a JSON body |
//! | GET    | `/api/logs`              | SSE stream of progress logs         |

use axum::{
    body::to_bytes,
    extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::Value;
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, log_info, log_success, LOG_BROADCASTER};
use super::types::{error_response, HealthStatus};
use crate::config::AppConfig;
use crate::error::{PinningResult, ServerError, ServerResult};
use crate::pinning::{extract_cid, PinataProvider, ProviderReply};

/// The single upload path.
pub const UPLOAD_PATH: &str = "/api/upload-to-pinata";

/// Largest accepted request body.
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

type ApiResponse = (StatusCode, Json<Value>);

#[derive(Clone)]
struct AppState {
    provider: Arc<PinataProvider>,
}

/// Build the application router around a provider.
pub fn router(provider: PinataProvider) -> Router {
    // Permissive CORS for development
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    let state = AppState { provider: Arc::new(provider) };

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route(UPLOAD_PATH, post(upload_to_pinata).fallback(method_not_allowed))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(config: &AppConfig) -> ServerResult<()> {
    let provider = PinataProvider::from_config(config)
        .map_err(|e| ServerError::Config(e.to_string()))?;

    let app = router(provider);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Artify proxy running on http://localhost:{}", config.port);
    tracing::info!("  POST {} - Pin a file or JSON document", UPLOAD_PATH);
    tracing::info!("  GET  /api/logs - SSE log stream");
    tracing::info!("  GET  /health - Health check");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Health check endpoint
async fn health() -> Json<HealthStatus> {
    Json(HealthStatus::ok(&[
        "POST /api/upload-to-pinata",
        "GET /api/logs (SSE)",
    ]))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

async fn method_not_allowed(method: Method) -> ApiResponse {
    log_error(format!("Method not allowed: {}", method));
    (StatusCode::METHOD_NOT_ALLOWED, Json(error_response("Method not allowed")))
}

/// Branch on the request content type.
async fn upload_to_pinata(State(state): State<AppState>, request: Request) -> ApiResponse {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if content_type.starts_with("multipart/form-data") {
        handle_file_upload(&state, request).await
    } else if content_type.starts_with("application/json") {
        handle_json_upload(&state, request).await
    } else {
        log_error(format!("Unsupported content type: {}", content_type));
        (StatusCode::BAD_REQUEST, Json(error_response("Unsupported content type")))
    }
}

async fn handle_file_upload(state: &AppState, request: Request) -> ApiResponse {
    let mut multipart = match Multipart::from_request(request, state).await {
        Ok(m) => m,
        Err(e) => return internal_error(&e.body_text(), "Pinata upload failed"),
    };

    let mut file: Option<(String, Option<String>, Vec<u8>)> = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return internal_error(&e.body_text(), "Pinata upload failed"),
        };

        if field.name() == Some("file") && file.is_none() {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let mime = field.content_type().map(str::to_string);
            match field.bytes().await {
                Ok(bytes) => file = Some((file_name, mime, bytes.to_vec())),
                Err(e) => return internal_error(&e.body_text(), "Pinata upload failed"),
            }
        }
    }

    let Some((file_name, mime, bytes)) = file else {
        log_error("No file uploaded");
        return (StatusCode::BAD_REQUEST, Json(error_response("No file uploaded")));
    };

    log_info(format!("Pinning file {} ({} bytes)", file_name, bytes.len()));
    let reply = state.provider.pin_file(bytes, &file_name, mime.as_deref()).await;
    relay(reply, "Pinata upload failed")
}

async fn handle_json_upload(state: &AppState, request: Request) -> ApiResponse {
    let body = match to_bytes(request.into_body(), MAX_UPLOAD_BYTES).await {
        Ok(body) => body,
        Err(e) => return internal_error(&e.to_string(), "Pinata JSON upload failed"),
    };

    let document: Value = match serde_json::from_slice(&body) {
        Ok(document) => document,
        Err(e) => return internal_error(&e.to_string(), "Pinata JSON upload failed"),
    };

    log_info("Pinning JSON document");
    let reply = state.provider.pin_json(&document).await;
    relay(reply, "Pinata JSON upload failed")
}

/// Hand the provider's answer back unchanged.
fn relay(reply: PinningResult<ProviderReply>, fallback: &str) -> ApiResponse {
    match reply {
        Ok(ProviderReply { status, body }) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            if status.is_success() {
                let cid = extract_cid(&body).unwrap_or_else(|| "?".to_string());
                log_success(format!("Pinned {}", cid));
            } else {
                log_error(format!("Pinata answered {}", status));
            }
            (status, Json(body))
        }
        Err(e) => internal_error(&e.to_string(), fallback),
    }
}

fn internal_error(message: &str, fallback: &str) -> ApiResponse {
    let message = if message.is_empty() { fallback } else { message };
    log_error(format!("{}: {}", fallback, message));
    (StatusCode::INTERNAL_SERVER_ERROR, Json(error_response(message)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Asset;
    use crate::pinning::{ContentStore, PinningClient};
    use crate::test_support::{spawn_mock_pinata, spawn_router, MockPinata, MOCK_JWT};
    use reqwest::multipart::{Form, Part};
    use serde_json::json;

    async fn spawn_proxy(jwt: &str) -> (MockPinata, String) {
        let mock = spawn_mock_pinata().await;
        let provider = PinataProvider::new(mock.upload_url(), jwt);
        let addr = spawn_router(router(provider)).await;
        (mock, format!("http://{}{}", addr, UPLOAD_PATH))
    }

    #[tokio::test]
    async fn test_non_post_is_405() {
        let (_mock, url) = spawn_proxy(MOCK_JWT).await;
        let response = reqwest::Client::new().get(&url).send().await.unwrap();
        assert_eq!(response.status(), 405);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Method not allowed");
    }

    #[tokio::test]
    async fn test_unsupported_content_type_is_400() {
        let (mock, url) = spawn_proxy(MOCK_JWT).await;
        let response = reqwest::Client::new()
            .post(&url)
            .header("content-type", "text/plain")
            .body("hello")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Unsupported content type");
        assert!(mock.uploads().is_empty());
    }

    #[tokio::test]
    async fn test_multipart_file_is_forwarded() {
        let (mock, url) = spawn_proxy(MOCK_JWT).await;
        let part = Part::bytes(vec![9, 8, 7]).file_name("art.png").mime_str("image/png").unwrap();
        let response = reqwest::Client::new()
            .post(&url)
            .multipart(Form::new().part("file", part))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["data"]["cid"], "bafymock0");

        let uploads = mock.uploads();
        assert_eq!(uploads[0].file_name, "art.png");
        assert_eq!(uploads[0].bytes, vec![9, 8, 7]);
        assert_eq!(uploads[0].network.as_deref(), Some("public"));
    }

    #[tokio::test]
    async fn test_multipart_without_file_is_400() {
        let (_mock, url) = spawn_proxy(MOCK_JWT).await;
        let response = reqwest::Client::new()
            .post(&url)
            .multipart(Form::new().text("other", "x"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "No file uploaded");
    }

    #[tokio::test]
    async fn test_json_is_pinned_as_metadata_file() {
        let (mock, url) = spawn_proxy(MOCK_JWT).await;
        let response = reqwest::Client::new()
            .post(&url)
            .json(&json!({"name": "A"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let uploads = mock.uploads();
        assert_eq!(uploads[0].file_name, "metadata.json");
        assert_eq!(uploads[0].content_type.as_deref(), Some("application/json"));
    }

    #[tokio::test]
    async fn test_invalid_json_is_500() {
        let (_mock, url) = spawn_proxy(MOCK_JWT).await;
        let response = reqwest::Client::new()
            .post(&url)
            .header("content-type", "application/json")
            .body("{nope")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 500);
        let body: Value = response.json().await.unwrap();
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_provider_status_is_relayed() {
        let (_mock, url) = spawn_proxy("expired").await;
        let response = reqwest::Client::new()
            .post(&url)
            .json(&json!({"name": "A"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 401);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"]["reason"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn test_client_through_proxy() {
        let (_mock, url) = spawn_proxy(MOCK_JWT).await;
        let client = PinningClient::new(url);

        let doc = json!({"name": "A", "description": "B", "type": "image", "image": "ipfs://X"});
        let first = client.upload_json(&doc).await.unwrap();
        let second = client
            .upload_file(&Asset::new("a.png", "image/png", vec![1]))
            .await
            .unwrap();

        assert_eq!(first.to_uri(), format!("ipfs://{}", first.0));
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_health() {
        let mock = spawn_mock_pinata().await;
        let addr = spawn_router(router(PinataProvider::new(mock.upload_url(), MOCK_JWT))).await;
        let body: Value = reqwest::get(format!("http://{}/health", addr))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "artify");
    }
}
