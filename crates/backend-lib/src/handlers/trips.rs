// ============================
// crates/backend-lib/src/handlers/trips.rs
// ============================
//! Trip endpoints. Reads are public; writes require a session.
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::AppJson;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::models::TripStatus;
use crate::store::{Store, TripQuery};
use crate::trips;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub destination: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub mode: Option<String>,
    #[serde(rename = "type")]
    pub trip_type: Option<String>,
    pub status: Option<TripStatus>,
    pub search: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

impl From<ListParams> for TripQuery {
    fn from(params: ListParams) -> Self {
        TripQuery {
            destination: params.destination,
            start_date: params.start_date,
            end_date: params.end_date,
            mode: params.mode,
            trip_type: params.trip_type,
            status: params.status,
            search: params.search,
            page: params.page.unwrap_or(1).max(1),
            // Normalized here so the `pages` count below and the store's
            // slicing always use the same page size.
            limit: params.limit.filter(|l| *l > 0).unwrap_or(10),
        }
    }
}

pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let query = TripQuery::from(params);
    let (views, total) = trips::list(&state.store, &query).await?;
    let pages = total.div_ceil(query.limit);
    Ok(Json(json!({
        "success": true,
        "count": views.len(),
        "total": total,
        "page": query.page,
        "pages": pages,
        "data": views,
    })))
}

pub async fn stats<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let stats = trips::stats(&state.store).await?;
    Ok(Json(json!({ "success": true, "data": stats })))
}

pub async fn by_user<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let views = trips::by_organizer(&state.store, user_id).await?;
    Ok(Json(json!({ "success": true, "count": views.len(), "data": views })))
}

pub async fn get_one<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let view = trips::get(&state.store, trip_id).await?;
    Ok(Json(json!({ "success": true, "data": view })))
}

pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    AppJson(body): AppJson<trips::NewTrip>,
) -> Result<impl IntoResponse, AppError> {
    let view = trips::create(&state.store, &user, body).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": view })),
    ))
}

pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(trip_id): Path<Uuid>,
    AppJson(body): AppJson<trips::TripPatch>,
) -> Result<Json<serde_json::Value>, AppError> {
    let view = trips::update(&state.store, trip_id, user.id, body).await?;
    Ok(Json(json!({ "success": true, "data": view })))
}

pub async fn remove<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    trips::delete(&state.store, trip_id, user.id).await?;
    Ok(Json(json!({ "success": true, "data": {} })))
}
