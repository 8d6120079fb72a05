// ============================
// crates/backend-lib/src/handlers/auth.rs
// ============================
//! Registration, login, and session endpoints.
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::AppJson;
use crate::auth::{hash_password, verify_password, CurrentUser};
use crate::error::AppError;
use crate::models::User;
use crate::store::Store;
use crate::validation;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBody {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

pub async fn register<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    AppJson(body): AppJson<RegisterBody>,
) -> Result<impl IntoResponse, AppError> {
    validation::validate_name(&body.name)?;
    validation::validate_email(&body.email)?;
    validation::validate_password(&body.password)?;

    let email = body.email.trim().to_lowercase();
    if state.store.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict(
            "An account with this email already exists".into(),
        ));
    }

    let password_hash = hash_password(&body.password)
        .map_err(|err| AppError::Internal(err.to_string()))?;
    let user = User {
        id: Uuid::new_v4(),
        name: body.name.trim().to_string(),
        email,
        password_hash,
        avatar: body.avatar,
        branch: body.branch,
        year: body.year,
        bio: body.bio,
        created_at: Utc::now(),
    };
    state.store.insert_user(user.clone()).await?;
    let token = state.sessions.new_session(user.id);
    tracing::info!(user = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "token": token, "user": user })),
    ))
}

pub async fn login<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    AppJson(body): AppJson<LoginBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let email = body.email.trim().to_lowercase();
    let user = state
        .store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| AppError::Auth("Invalid credentials".into()))?;
    if !verify_password(&user.password_hash, &body.password) {
        return Err(AppError::Auth("Invalid credentials".into()));
    }

    let token = state.sessions.new_session(user.id);
    Ok(Json(json!({ "success": true, "token": token, "user": user })))
}

pub async fn me<S: Store>(
    CurrentUser(user): CurrentUser,
) -> Json<serde_json::Value> {
    Json(json!({ "success": true, "data": user }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordBody {
    pub current_password: String,
    pub new_password: String,
}

/// Change one's own password. A fresh token is issued, matching the
/// login response shape.
pub async fn update_password<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(mut user): CurrentUser,
    AppJson(body): AppJson<UpdatePasswordBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !verify_password(&user.password_hash, &body.current_password) {
        return Err(AppError::Auth("Password is incorrect".into()));
    }
    validation::validate_password(&body.new_password)?;

    user.password_hash = hash_password(&body.new_password)
        .map_err(|err| AppError::Internal(err.to_string()))?;
    state.store.update_user(user.clone()).await?;
    tracing::info!(user = %user.id, "password changed");

    let token = state.sessions.new_session(user.id);
    Ok(Json(json!({ "success": true, "token": token, "user": user })))
}

pub async fn logout<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(_user): CurrentUser,
    headers: HeaderMap,
) -> Json<serde_json::Value> {
    if let Some(token) = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
    {
        state.sessions.revoke(token);
    }
    Json(json!({ "success": true, "data": {} }))
}
