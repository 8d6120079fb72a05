// ============================
// crates/backend-lib/src/handlers/mod.rs
// ============================
//! REST surface. All success bodies carry `"success": true`; failures go
//! through [`crate::error::AppError`].
pub mod auth;
pub mod messages;
pub mod requests;
pub mod trips;
pub mod users;

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::json;

use crate::error::AppError;
use crate::middleware::rate_limit::rate_limit;
use crate::store::Store;
use crate::AppState;

/// `axum::Json` with its rejection folded into the standard error
/// envelope, so a malformed body comes back as
/// `{"success": false, "error": ...}` like every other failure.
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(AppError::Invalid(rejection.body_text())),
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "message": "HopAlong API is running",
        "timestamp": Utc::now(),
    }))
}

/// The `/api` router, with the per-IP rate limit applied to every route.
pub fn api_router<S: Store>(state: Arc<AppState<S>>) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register::<S>))
        .route("/auth/login", post(auth::login::<S>))
        .route("/auth/logout", post(auth::logout::<S>))
        .route("/auth/me", get(auth::me::<S>))
        .route("/auth/updatepassword", put(auth::update_password::<S>))
        .route(
            "/users/{id}",
            get(users::get_one::<S>).put(users::update::<S>),
        )
        .route("/users/{id}/trips", get(users::trips::<S>))
        .route("/users/{id}/participations", get(users::participations::<S>))
        .route("/users/{id}/stats", get(users::stats::<S>))
        .route("/trips", get(trips::list::<S>).post(trips::create::<S>))
        .route("/trips/stats", get(trips::stats::<S>))
        .route("/trips/user/{id}", get(trips::by_user::<S>))
        .route(
            "/trips/{id}",
            get(trips::get_one::<S>)
                .put(trips::update::<S>)
                .delete(trips::remove::<S>),
        )
        .route("/requests", post(requests::submit::<S>))
        .route("/requests/trip/{id}", get(requests::for_trip::<S>))
        .route("/requests/user/{id}", get(requests::for_user::<S>))
        .route("/requests/{id}/approve", put(requests::approve::<S>))
        .route("/requests/{id}/reject", put(requests::reject::<S>))
        .route("/requests/{id}", delete(requests::cancel::<S>))
        .route("/messages", post(messages::send::<S>))
        .route("/messages/trip/{id}", get(messages::for_trip::<S>))
        .route("/messages/{id}", delete(messages::remove::<S>));

    Router::new()
        .nest("/api", api)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit::<S>,
        ))
        .with_state(state)
}
