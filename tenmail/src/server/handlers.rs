//! HTTP handlers.

use std::sync::Arc;

use axum::extract::{Path, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

use super::{AppState, RefreshResponse};
use crate::error::{ApiError, ApiResult};
use crate::models::{EmailSession, Message};
use crate::relay::handle_socket;

/// Parse a session or message id from a path. Unparseable ids are unknown ids.
fn parse_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound)
}

pub async fn generate(State(state): State<Arc<AppState>>) -> Json<EmailSession> {
    Json(state.generate_session().await)
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<EmailSession>> {
    let id = parse_id(&session_id)?;
    Ok(Json(state.active_session(id).await?))
}

pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&session_id)?;
    state.delete_session(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn extend(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<EmailSession>> {
    let id = parse_id(&session_id)?;
    Ok(Json(state.extend_session(id).await?))
}

pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<Vec<Message>>> {
    let id = parse_id(&session_id)?;
    Ok(Json(state.list_messages(id).await?))
}

pub async fn get_message(
    State(state): State<Arc<AppState>>,
    Path((session_id, message_id)): Path<(String, String)>,
) -> ApiResult<Json<Message>> {
    let id = parse_id(&session_id)?;
    let message_id = Uuid::parse_str(&message_id).map_err(|_| ApiError::MessageNotFound)?;
    Ok(Json(state.get_message(id, message_id).await?))
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<RefreshResponse>> {
    let id = parse_id(&session_id)?;
    Ok(Json(state.refresh(id).await?))
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "sessions": state.session_count().await,
    }))
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let relay = state.relay().clone();
    ws.on_upgrade(move |socket| handle_socket(socket, relay))
}
