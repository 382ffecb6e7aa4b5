//! In-process HTTP fixtures shared by the test modules.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Multipart, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};

pub const MOCK_JWT: &str = "test-jwt";

/// Serve `router` on an ephemeral local port.
pub async fn spawn_router(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// One file received by the mock provider.
#[derive(Debug, Clone)]
pub struct MockUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    pub network: Option<String>,
}

#[derive(Clone, Default)]
struct MockState {
    uploads: Arc<Mutex<Vec<MockUpload>>>,
    counter: Arc<AtomicUsize>,
}

/// A fake Pinata v3 uploads endpoint.
pub struct MockPinata {
    addr: SocketAddr,
    state: MockState,
}

impl MockPinata {
    pub fn upload_url(&self) -> String {
        format!("http://{}/v3/files", self.addr)
    }

    pub fn uploads(&self) -> Vec<MockUpload> {
        self.state.uploads.lock().unwrap().clone()
    }
}

pub async fn spawn_mock_pinata() -> MockPinata {
    let state = MockState::default();
    let router = Router::new()
        .route("/v3/files", post(mock_upload))
        .with_state(state.clone());
    let addr = spawn_router(router).await;
    MockPinata { addr, state }
}

async fn mock_upload(
    State(state): State<MockState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> (StatusCode, Json<Value>) {
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", MOCK_JWT));
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": {"reason": "INVALID_CREDENTIALS", "details": "bad jwt"}})),
        );
    }

    let mut upload: Option<MockUpload> = None;
    let mut network = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        match field.name().unwrap_or("") {
            "file" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.unwrap().to_vec();
                upload = Some(MockUpload { file_name, content_type, bytes, network: None });
            }
            "network" => network = Some(field.text().await.unwrap()),
            _ => {}
        }
    }

    let Some(mut upload) = upload else {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "file is required"})));
    };
    upload.network = network;

    let n = state.counter.fetch_add(1, Ordering::SeqCst);
    let cid = format!("bafymock{}", n);
    let size = upload.bytes.len();
    let name = upload.file_name.clone();
    state.uploads.lock().unwrap().push(upload);

    (
        StatusCode::OK,
        Json(json!({"data": {"id": format!("file-{}", n), "name": name, "cid": cid, "size": size}})),
    )
}
