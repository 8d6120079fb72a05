// ============================
// crates/backend-lib/src/handlers/users.rs
// ============================
//! Public profile endpoints. Reads are open; edits are self-service.
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use super::AppJson;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::store::Store;
use crate::users;
use crate::AppState;

pub async fn get_one<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let profile = users::get(&state.store, user_id).await?;
    Ok(Json(json!({ "success": true, "data": profile })))
}

pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(user_id): Path<Uuid>,
    AppJson(body): AppJson<users::UserPatch>,
) -> Result<Json<serde_json::Value>, AppError> {
    let updated = users::update(&state.store, user_id, user.id, body).await?;
    Ok(Json(json!({ "success": true, "data": updated })))
}

pub async fn trips<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let views = users::trips_created(&state.store, user_id).await?;
    Ok(Json(json!({ "success": true, "count": views.len(), "data": views })))
}

pub async fn participations<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let views = users::participations(&state.store, user_id).await?;
    Ok(Json(json!({ "success": true, "count": views.len(), "data": views })))
}

pub async fn stats<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let stats = users::stats(&state.store, user_id).await?;
    Ok(Json(json!({ "success": true, "data": stats })))
}
