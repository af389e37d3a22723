// HTTP API over the RAG service
// Client errors map to 400 and everything else to 500, both with a {"detail": ...} body


use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::RagError;
use crate::config::ServerConfig;
use crate::rag::service::{ChatReply, DocumentInfo, RagService, UploadSummary};

type AppState = Arc<RagService>;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default = "default_use_rag")]
    pub use_rag: bool,
}

fn default_use_rag() -> bool {
    true
}

/// Error body returned to clients
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }

    /// Client errors keep their own message, server errors get `prefix`
    fn from_rag(error: &RagError, prefix: &str) -> Self {
        if error.is_client_error() {
            Self::bad_request(error.to_string())
        } else {
            Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                detail: format!("{}: {}", prefix, error),
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

fn cors_layer(config: &ServerConfig) -> Result<CorsLayer> {
    let origins = config
        .allowed_origins
        .iter()
        .map(|origin| {
            if origin.trim() == "*" {
                anyhow::bail!("Wildcard origin '*' cannot be combined with credentialed CORS");
            }
            HeaderValue::from_str(origin)
                .with_context(|| format!("Invalid allowed origin: {}", origin))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION]))
}

/// Build the application router around a shared service
#[inline]
pub fn build_router(service: Arc<RagService>, config: &ServerConfig) -> Result<Router> {
    Ok(Router::new()
        .route("/", get(root))
        .route("/upload", post(upload_document))
        .route("/chat", post(chat))
        .route("/documents", get(list_documents).delete(clear_documents))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors_layer(config)?)
        .layer(TraceLayer::new_for_http())
        .with_state(service))
}

/// Bind and serve until the process is stopped
#[inline]
pub async fn serve(service: Arc<RagService>, config: &ServerConfig) -> Result<()> {
    config.validate()?;
    let app = build_router(service, config)?;
    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    info!("Light RAG API listening on {}", address);
    axum::serve(listener, app)
        .await
        .context("HTTP server terminated unexpectedly")
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Light RAG API is running!" }))
}

async fn upload_document(
    State(service): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadSummary>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(ToString::to_string)
            .ok_or_else(|| ApiError::bad_request("Uploaded file has no filename"))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?;

        return service
            .upload(&filename, bytes.to_vec())
            .await
            .map(Json)
            .map_err(|e| {
                error!("Error processing {}: {}", filename, e);
                ApiError::from_rag(&e, "Error processing document")
            });
    }

    Err(ApiError::bad_request("No file uploaded"))
}

async fn chat(
    State(service): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    service
        .chat(&request.message, request.use_rag)
        .await
        .map(Json)
        .map_err(|e| {
            error!("Chat error: {}", e);
            ApiError::from_rag(&e, "Error generating response")
        })
}

async fn list_documents(State(service): State<AppState>) -> Json<Vec<DocumentInfo>> {
    Json(service.documents().await)
}

async fn clear_documents(State(service): State<AppState>) -> Json<Value> {
    service.clear().await;
    Json(json!({ "message": "All documents cleared successfully" }))
}
