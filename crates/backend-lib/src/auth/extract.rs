// ============================
// crates/backend-lib/src/auth/extract.rs
// ============================
//! Axum extractor resolving `Authorization: Bearer <token>` to a user.
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};
use std::sync::Arc;

use crate::error::AppError;
use crate::models::User;
use crate::store::Store;
use crate::AppState;

/// The authenticated caller. Protected handlers take this as an argument;
/// its absence (missing/expired token) rejects the request before the
/// handler runs.
pub struct CurrentUser(pub User);

impl<S: Store> FromRequestParts<Arc<AppState<S>>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Auth("Not authorized to access this route".into()))?;

        let session = state
            .sessions
            .get(token)
            .ok_or_else(|| AppError::Auth("Not authorized to access this route".into()))?;

        let user = state
            .store
            .get_user(session.user_id)
            .await
            .map_err(|_| AppError::Auth("Not authorized to access this route".into()))?;

        Ok(CurrentUser(user))
    }
}
