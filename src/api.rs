//! REST API server for the banking assistant
//!
//! Exposes the snapshot pipelines and the chat orchestrator via HTTP
//! endpoints, one route per surface the frontend consumes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::audit::RunLog;
use crate::chat::ChatOrchestrator;
use crate::error::AgentError;
use crate::models::Domain;
use crate::pipeline::Pipelines;
use crate::state::SessionState;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct SnapshotRequest {
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub topic: String,
    pub message: String,
    pub session_id: Option<String>,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub pipelines: Arc<Pipelines>,
    pub chat: Arc<ChatOrchestrator>,
    pub run_log: Arc<RunLog>,
}

/// =============================
/// Helpers
/// =============================

fn stable_uuid_from_string(input: &str) -> uuid::Uuid {
    use sha2::{Digest, Sha256};

    let hash = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);

    // Set UUID version (4) and variant (RFC4122) bits.
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    uuid::Uuid::from_bytes(bytes)
}

fn session_uuid(value: Option<&str>) -> uuid::Uuid {
    match value {
        Some(v) if !v.trim().is_empty() => {
            uuid::Uuid::parse_str(v).unwrap_or_else(|_| stable_uuid_from_string(v))
        }
        _ => uuid::Uuid::new_v4(),
    }
}

fn error_status(error: &AgentError) -> StatusCode {
    match error {
        AgentError::UnknownTopic(_) | AgentError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        AgentError::Discovery(_) | AgentError::Connector(_) | AgentError::EmptyRetrieval(_) => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Snapshot Endpoint
/// =============================

async fn run_snapshot(
    State(state): State<ApiState>,
    Path(domain): Path<String>,
    Json(req): Json<SnapshotRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let Some(domain) = Domain::parse(&domain) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format!("Unknown snapshot domain: {}", domain))),
        );
    };

    let session_id = session_uuid(req.session_id.as_deref());
    info!(domain = %domain, session_id = %session_id, "Received snapshot request");

    let pipeline = state.pipelines.get(domain);
    let mut session = SessionState::new();

    match pipeline.run(&mut session).await {
        Ok(outcome) => {
            if let Some(input) = session.retrieval(domain) {
                if let Err(e) = state.run_log.record_snapshot(&outcome, input).await {
                    info!(error = %e, "Run log write failed, response still returned");
                }
            }

            (
                StatusCode::OK,
                Json(ApiResponse::success(serde_json::json!({
                    "session_id": session_id,
                    "run_id": outcome.run_id,
                    "pipeline": outcome.pipeline,
                    "summary": outcome.summary,
                    "steps": outcome.steps,
                    "elapsed_ms": outcome.elapsed_ms,
                    "state": session,
                }))),
            )
        }
        Err(e) => (
            error_status(&e),
            Json(ApiResponse::error(format!("Snapshot failed: {}", e))),
        ),
    }
}

/// =============================
/// Chat Endpoint
/// =============================

async fn chat_handler(
    State(state): State<ApiState>,
    Json(req): Json<ChatRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    if req.message.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("No user message found".into())),
        );
    }

    let session_id = session_uuid(req.session_id.as_deref());
    info!(topic = %req.topic, session_id = %session_id, "Received chat request");

    let mut session = SessionState::new();

    match state.chat.handle(&req.topic, &req.message, &mut session).await {
        Ok(answer) => (
            StatusCode::OK,
            Json(ApiResponse::success(serde_json::json!({
                "session_id": session_id,
                "topic": answer.topic,
                "specialist": answer.specialist,
                "answer": answer.answer,
                "confidence": answer.confidence,
                "final_response": session.final_response,
            }))),
        ),
        Err(e) => (
            error_status(&e),
            Json(ApiResponse::error(format!("Chat failed: {}", e))),
        ),
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/snapshot/:domain", post(run_snapshot))
        .route("/api/chat", post(chat_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    state: ApiState,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
