// ============================
// crates/backend-lib/src/config.rs
// ============================
//! Configuration management.
use anyhow::Result;
use serde::Deserialize;
use std::net::SocketAddr;

/// Application settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Origins allowed to call the API and open live connections
    #[serde(default = "default_origins")]
    pub allowed_origins: Vec<String>,
    /// Log filter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Session TTL in seconds
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
    /// Uniform REST rate limit
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSettings {
    /// Window length in seconds
    #[serde(default = "default_rate_window")]
    pub window_secs: u64,
    /// Requests allowed per caller per window
    #[serde(default = "default_rate_max")]
    pub max_requests: u32,
}

fn default_bind_addr() -> SocketAddr {
    "127.0.0.1:5000".parse().unwrap()
}

fn default_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string(), "http://localhost:3001".to_string()]
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_session_ttl() -> u64 {
    60 * 60 * 24 * 30 // 30 days
}

fn default_rate_window() -> u64 {
    10 * 60 // 10 minutes
}

fn default_rate_max() -> u32 {
    100
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            allowed_origins: default_origins(),
            log_level: default_log_level(),
            session_ttl_secs: default_session_ttl(),
            rate_limit: RateLimitSettings::default(),
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            window_secs: default_rate_window(),
            max_requests: default_rate_max(),
        }
    }
}

impl Settings {
    /// Load settings from `config/default.toml` (if present) merged with
    /// `HOPALONG_`-prefixed environment variables.
    pub fn load() -> Result<Self> {
        Self::load_from("config/default")
    }

    pub fn load_from(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("HOPALONG").separator("__"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.bind_addr.port(), 5000);
        assert_eq!(settings.rate_limit.max_requests, 100);
        assert_eq!(settings.rate_limit.window_secs, 600);
        assert!(!settings.allowed_origins.is_empty());
    }

    #[test]
    fn test_load_without_file_falls_back_to_defaults() {
        let settings = Settings::load_from("does/not/exist").unwrap();
        assert_eq!(settings.rate_limit.max_requests, 100);
    }
}
