// ============================
// crates/backend-lib/src/handlers/messages.rs
// ============================
//! Trip chat endpoints.
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::AppJson;
use crate::auth::CurrentUser;
use crate::chat;
use crate::error::AppError;
use crate::store::Store;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SendBody {
    /// The web client posts `{"trip": <id>, "content": ...}`; `tripId`
    /// is accepted as well for symmetry with the request endpoints.
    #[serde(alias = "tripId")]
    pub trip: Uuid,
    pub content: String,
}

/// Messages for a trip, oldest first. Briefly cacheable since the room
/// relay delivers new messages live anyway.
pub async fn for_trip<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(_user): CurrentUser,
    Path(trip_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let views = chat::list_for_trip(&state.store, trip_id).await?;
    Ok((
        [(header::CACHE_CONTROL, "public, max-age=60")],
        Json(json!({ "success": true, "count": views.len(), "data": views })),
    ))
}

pub async fn send<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    AppJson(body): AppJson<SendBody>,
) -> Result<impl IntoResponse, AppError> {
    let message = chat::send(&state.store, user.id, body.trip, &body.content).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": message })),
    ))
}

pub async fn remove<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(message_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    chat::delete(&state.store, message_id, user.id).await?;
    Ok(Json(json!({ "success": true, "data": {} })))
}
