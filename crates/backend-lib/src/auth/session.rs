// ============================
// crates/backend-lib/src/auth/session.rs
// ============================
//! Session token handling and management.
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use uuid::Uuid;

/// Session information
#[derive(Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub created_at: SystemTime,
    pub expires_at: SystemTime,
}

/// Session manager for handling bearer tokens
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<DashMap<String, Session>>,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(ttl: Duration) -> Self {
        SessionManager {
            sessions: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Create a new session for a user, returning the bearer token.
    pub fn new_session(&self, user_id: Uuid) -> String {
        let token = Uuid::new_v4().to_string();
        let now = SystemTime::now();
        self.sessions.insert(
            token.clone(),
            Session {
                user_id,
                created_at: now,
                expires_at: now + self.ttl,
            },
        );
        token
    }

    /// Resolve a token to its session, if present and unexpired.
    pub fn get(&self, token: &str) -> Option<Session> {
        let session = self.sessions.get(token)?;
        if SystemTime::now() < session.expires_at {
            Some(session.clone())
        } else {
            None
        }
    }

    pub fn revoke(&self, token: &str) {
        self.sessions.remove(token);
    }

    /// Drop expired sessions. Called periodically from a background task.
    pub fn sweep_expired(&self) {
        let now = SystemTime::now();
        self.sessions.retain(|_, session| now < session.expires_at);
    }

    /// Spawn the periodic cleanup task on the current runtime.
    pub fn start_cleanup(&self) {
        let manager = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(60 * 60));
            loop {
                interval.tick().await;
                manager.sweep_expired();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_round_trip() {
        let manager = SessionManager::new(Duration::from_secs(60));
        let user_id = Uuid::new_v4();
        let token = manager.new_session(user_id);

        let session = manager.get(&token).expect("session should resolve");
        assert_eq!(session.user_id, user_id);
        assert!(manager.get("bogus-token").is_none());
    }

    #[test]
    fn test_expired_session_not_returned() {
        let manager = SessionManager::new(Duration::from_secs(0));
        let token = manager.new_session(Uuid::new_v4());
        assert!(manager.get(&token).is_none());

        manager.sweep_expired();
        assert!(manager.sessions.is_empty());
    }

    #[test]
    fn test_revoke() {
        let manager = SessionManager::new(Duration::from_secs(60));
        let token = manager.new_session(Uuid::new_v4());
        manager.revoke(&token);
        assert!(manager.get(&token).is_none());
    }
}
