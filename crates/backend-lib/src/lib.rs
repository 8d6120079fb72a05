// ============================
// crates/backend-lib/src/lib.rs
// ============================
//! Core library for the HopAlong trip-sharing backend.

pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod relay;
pub mod requests;
pub mod store;
pub mod trips;
pub mod users;
pub mod validation;
pub mod ws_router;

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;

use crate::auth::SessionManager;
use crate::config::Settings;
use crate::middleware::rate_limit::RateLimitEntry;
use crate::relay::Relay;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState<S> {
    /// Document store backend
    pub store: S,
    /// Bearer-token sessions
    pub sessions: SessionManager,
    /// Presence and room fan-out
    pub relay: Arc<Relay>,
    /// Settings
    pub settings: Arc<Settings>,
    /// Per-IP rate-limit windows
    pub rate_limits: Arc<DashMap<String, RateLimitEntry>>,
}

impl<S> AppState<S> {
    pub fn new(store: S, settings: Settings) -> Self {
        let sessions = SessionManager::new(Duration::from_secs(settings.session_ttl_secs));
        Self {
            store,
            sessions,
            relay: Arc::new(Relay::new()),
            settings: Arc::new(settings),
            rate_limits: Arc::new(DashMap::new()),
        }
    }
}
