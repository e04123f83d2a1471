//! WebSocket server + REST endpoints for the registration chat.
//!
//! One inbound JSON protocol (`message`, `student_data`, `chat_with_bot`,
//! `voice_message`) and a single outbound `message` event used uniformly
//! for prompts, confirmations, and error text. Events on a connection are
//! handled to completion in arrival order, which serializes all events for
//! that user's session.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::assistant::AssistantBridge;
use crate::registration::Registrar;
use crate::store::StudentStore;
use crate::voice::VoiceBridge;

// ── JSON Protocol ───────────────────────────────────────────────────────

/// Event from client → server.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientEvent {
    Message {
        text: String,
        user_id: String,
    },
    StudentData {
        data: Map<String, Value>,
        user_id: String,
    },
    ChatWithBot {
        text: String,
        user_id: String,
    },
    VoiceMessage {
        /// Base64-encoded audio bytes.
        audio: String,
        user_id: String,
    },
}

/// Event from server → client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerEvent {
    Message { text: String },
}

// ── Application state ───────────────────────────────────────────────────

/// Shared state across WS and REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub registrar: Arc<Registrar>,
    pub voice: Arc<VoiceBridge>,
    pub assistant: Arc<AssistantBridge>,
    pub students: Arc<dyn StudentStore>,
}

/// Build the Axum router with the registration WebSocket and REST routes.
pub fn registration_routes(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .route("/api/students", get(list_students))
        .route("/api/students/{id}", get(get_student))
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Health / fallback ───────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "enroll-assist"
    }))
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"message": "Page not found"})),
    )
}

// ── WebSocket ───────────────────────────────────────────────────────────

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    info!("Registration client connecting");
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    info!("Registration client connected");

    loop {
        match socket.recv().await {
            Some(Ok(Message::Text(text))) => {
                let replies = match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => handle_client_event(event, &state).await,
                    Err(e) => {
                        debug!(error = %e, text = %text, "Unrecognized WS message from client");
                        continue;
                    }
                };
                for reply in replies {
                    let event = ServerEvent::Message { text: reply };
                    if let Ok(json) = serde_json::to_string(&event) {
                        if socket.send(Message::Text(json.into())).await.is_err() {
                            debug!("Client disconnected during send");
                            return;
                        }
                    }
                }
            }
            Some(Ok(Message::Ping(data))) => {
                if socket.send(Message::Pong(data)).await.is_err() {
                    break;
                }
            }
            Some(Ok(Message::Close(_))) | None => {
                info!("Registration client disconnected");
                break;
            }
            Some(Err(e)) => {
                warn!(error = %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    info!("WebSocket connection closed");
}

/// Dispatch one client event and collect the outbound message texts.
async fn handle_client_event(event: ClientEvent, state: &AppState) -> Vec<String> {
    match event {
        ClientEvent::Message { text, user_id } => {
            state.registrar.handle_message(&user_id, &text).await
        }
        ClientEvent::StudentData { data, user_id } => {
            state.registrar.handle_student_data(&user_id, data).await
        }
        ClientEvent::ChatWithBot { text, user_id } => {
            vec![state.assistant.chat_with_bot(&user_id, &text).await]
        }
        ClientEvent::VoiceMessage { audio, user_id } => {
            match base64::engine::general_purpose::STANDARD.decode(audio.as_bytes()) {
                Ok(bytes) => state.voice.handle_voice(&user_id, &bytes).await,
                Err(e) => {
                    debug!(user_id, error = %e, "Undecodable audio payload");
                    vec![format!("An error occurred: {e}")]
                }
            }
        }
    }
}

// ── REST Endpoints ──────────────────────────────────────────────────────

async fn list_students(State(state): State<AppState>) -> impl IntoResponse {
    match state.students.list_students().await {
        Ok(students) => Json(students).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

async fn get_student(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    let student_id = match Uuid::parse_str(&id) {
        Ok(id) => id,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": "Invalid student ID"})),
            )
                .into_response();
        }
    };

    match state.students.get_student(student_id).await {
        Ok(Some(student)) => Json(student).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Student not found"})),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}
