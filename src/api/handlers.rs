//! Request handlers.

use super::error::ApiError;
use super::AppState;
use crate::db::{ChatMessage, NewUser, User, Video};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::instrument;

type ApiResult<T> = std::result::Result<T, ApiError>;

// === Request/Response Types ===

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    #[serde(rename = "URL", alias = "url")]
    pub url: String,
    #[serde(rename = "Id", alias = "id")]
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub video_info: Video,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(rename = "Query", alias = "query")]
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
}

// === Handlers ===

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

#[instrument(skip_all)]
pub async fn ingest(
    State(state): State<AppState>,
    body: Result<Json<IngestRequest>, JsonRejection>,
) -> ApiResult<Json<IngestResponse>> {
    let Json(req) = body?;
    let result = state.ingest_video(&req.url, req.user_id).await?;

    Ok(Json(IngestResponse {
        message: result.skipped.then(|| "Video already exists".to_string()),
        video_info: result.video,
    }))
}

pub async fn list_videos(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Vec<Video>>> {
    let Path(user_id) = path?;
    Ok(Json(state.list_videos(user_id)?))
}

#[instrument(skip_all)]
pub async fn chat(
    State(state): State<AppState>,
    path: Result<Path<(i64, String)>, PathRejection>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<Json<ChatResponse>> {
    let Path((user_id, video_id)) = path?;
    let Json(req) = body?;

    let answer = state.chat(user_id, &video_id, &req.query).await?;
    Ok(Json(ChatResponse { answer }))
}

pub async fn chat_history(
    State(state): State<AppState>,
    path: Result<Path<(i64, String)>, PathRejection>,
) -> ApiResult<Json<Vec<ChatMessage>>> {
    let Path((user_id, video_id)) = path?;
    Ok(Json(state.chat_history(user_id, &video_id)?))
}

#[instrument(skip_all)]
pub async fn create_user(
    State(state): State<AppState>,
    body: Result<Json<NewUser>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let Json(new_user) = body?;
    let user = state.register_user(new_user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.list_users()?))
}

pub async fn get_user(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<User>> {
    let Path(id) = path?;
    Ok(Json(state.get_user(id)?))
}
