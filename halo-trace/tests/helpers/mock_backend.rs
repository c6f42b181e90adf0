//! In-process mock of the recognition backend
//!
//! Serves `/api/ocr`, `/api/search` and `/health` on an ephemeral port and
//! records every request it receives.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// What `/api/ocr` received
#[derive(Debug, Clone, Default)]
pub struct RecordedUpload {
    pub tag: Option<String>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub size: usize,
}

/// Canned response: status + JSON body
#[derive(Debug, Clone)]
pub struct Canned {
    pub status: StatusCode,
    pub body: Value,
}

impl Canned {
    pub fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    pub fn error(status: StatusCode) -> Self {
        Self {
            status,
            body: json!({ "detail": "backend failure" }),
        }
    }
}

pub struct MockState {
    ocr: Canned,
    search: Canned,
    uploads: Mutex<Vec<RecordedUpload>>,
    searches: Mutex<Vec<Value>>,
}

impl MockState {
    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn searches(&self) -> Vec<Value> {
        self.searches.lock().unwrap().clone()
    }
}

pub struct MockBackend {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockBackend {
    /// Start a backend answering with the given canned responses
    pub async fn start(ocr: Canned, search: Canned) -> Self {
        let state = Arc::new(MockState {
            ocr,
            search,
            uploads: Mutex::new(Vec::new()),
            searches: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/health", get(health))
            .route("/api/ocr", post(ocr_handler))
            .route("/api/search", post(search_handler))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

async fn ocr_handler(State(state): State<Arc<MockState>>, mut multipart: Multipart) -> impl IntoResponse {
    let mut upload = RecordedUpload::default();

    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                upload.file_name = field.file_name().map(str::to_string);
                upload.content_type = field.content_type().map(str::to_string);
                upload.size = field.bytes().await.unwrap().len();
            }
            "tag" => upload.tag = Some(field.text().await.unwrap()),
            _ => {}
        }
    }

    state.uploads.lock().unwrap().push(upload);
    (state.ocr.status, Json(state.ocr.body.clone()))
}

async fn search_handler(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> impl IntoResponse {
    state.searches.lock().unwrap().push(body);
    (state.search.status, Json(state.search.body.clone()))
}
