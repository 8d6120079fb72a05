// ============================
// crates/backend-lib/src/middleware/rate_limit.rs
// ============================
//! Fixed-window per-IP rate limiter applied to the whole REST surface.
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{extract::State, http::Request, middleware::Next, response::Response};

use crate::error::AppError;
use crate::store::Store;
use crate::AppState;

/// Per-client counter for the current window.
#[derive(Debug)]
pub struct RateLimitEntry {
    requests: u32,
    window_start: Instant,
}

pub async fn rate_limit<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let client_ip = request
        .headers()
        .get("x-real-ip")
        .or_else(|| request.headers().get("x-forwarded-for"))
        .and_then(|h| h.to_str().ok())
        .unwrap_or("unknown");

    let max_requests = state.settings.rate_limit.max_requests;
    let window = Duration::from_secs(state.settings.rate_limit.window_secs);

    // The shard guard must not be held across the await below: a handler
    // suspended mid-request would otherwise block every caller whose IP
    // hashes to the same shard.
    let allowed = {
        let mut entry = state
            .rate_limits
            .entry(client_ip.to_string())
            .or_insert_with(|| RateLimitEntry {
                requests: 0,
                window_start: Instant::now(),
            });

        if entry.window_start.elapsed() > window {
            entry.requests = 0;
            entry.window_start = Instant::now();
        }

        if entry.requests >= max_requests {
            false
        } else {
            entry.requests += 1;
            true
        }
    };

    if !allowed {
        tracing::warn!(ip = client_ip, "rate limit exceeded");
        return Err(AppError::RateLimited);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::store::MemoryStore;
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn tiny_limit_state() -> Arc<AppState<MemoryStore>> {
        let mut settings = Settings::default();
        settings.rate_limit.max_requests = 2;
        settings.rate_limit.window_secs = 600;
        Arc::new(AppState::new(MemoryStore::new(), settings))
    }

    fn app(state: Arc<AppState<MemoryStore>>) -> Router {
        Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(axum::middleware::from_fn_with_state(
                state.clone(),
                rate_limit::<MemoryStore>,
            ))
            .with_state(state)
    }

    #[tokio::test]
    async fn test_requests_over_limit_get_429() {
        let app = app(tiny_limit_state());

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .uri("/ping")
                        .header("x-real-ip", "10.0.0.1")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/ping")
                    .header("x-real-ip", "10.0.0.1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_concurrent_requests_from_one_ip_make_progress() {
        let state = tiny_limit_state();
        let slow = Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                    "done"
                }),
            )
            .layer(axum::middleware::from_fn_with_state(
                state.clone(),
                rate_limit::<MemoryStore>,
            ))
            .with_state(state);

        // Both requests are in flight at once; neither may stall the
        // other on the limiter's shard lock while the first one sleeps.
        let first = slow.clone().oneshot(
            Request::builder()
                .uri("/slow")
                .header("x-real-ip", "10.0.0.1")
                .body(Body::empty())
                .unwrap(),
        );
        let second = slow.clone().oneshot(
            Request::builder()
                .uri("/slow")
                .header("x-real-ip", "10.0.0.1")
                .body(Body::empty())
                .unwrap(),
        );
        let (a, b) = tokio::join!(first, second);
        assert_eq!(a.unwrap().status(), StatusCode::OK);
        assert_eq!(b.unwrap().status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_limits_are_per_ip() {
        let state = tiny_limit_state();
        let app = app(state);

        for ip in ["10.0.0.1", "10.0.0.2"] {
            for _ in 0..2 {
                let response = app
                    .clone()
                    .oneshot(
                        Request::builder()
                            .uri("/ping")
                            .header("x-real-ip", ip)
                            .body(Body::empty())
                            .unwrap(),
                    )
                    .await
                    .unwrap();
                assert_eq!(response.status(), StatusCode::OK);
            }
        }
    }
}
