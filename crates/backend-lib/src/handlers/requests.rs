// ============================
// crates/backend-lib/src/handlers/requests.rs
// ============================
//! Join-request endpoints. All of them require a session.
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::AppJson;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::requests;
use crate::store::Store;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitBody {
    pub trip_id: Uuid,
    #[serde(default)]
    pub message: String,
}

pub async fn submit<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    AppJson(body): AppJson<SubmitBody>,
) -> Result<impl IntoResponse, AppError> {
    let request = requests::submit(&state.store, body.trip_id, user.id, &body.message).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": request })),
    ))
}

pub async fn for_trip<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(_user): CurrentUser,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let views = requests::list_for_trip(&state.store, trip_id).await?;
    Ok(Json(json!({ "success": true, "count": views.len(), "data": views })))
}

pub async fn for_user<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let views = requests::list_for_user(&state.store, user_id, user.id).await?;
    Ok(Json(json!({ "success": true, "count": views.len(), "data": views })))
}

pub async fn approve<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(request_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let request = requests::approve(&state.store, request_id, user.id).await?;
    Ok(Json(json!({ "success": true, "data": request })))
}

pub async fn reject<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(request_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let request = requests::reject(&state.store, request_id, user.id).await?;
    Ok(Json(json!({ "success": true, "data": request })))
}

pub async fn cancel<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(request_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    requests::cancel(&state.store, request_id, user.id).await?;
    Ok(Json(json!({ "success": true, "data": {} })))
}
