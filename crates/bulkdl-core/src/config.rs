//! Client configuration.
//!
//! Everything tunable about the orchestrator lives here and is passed
//! in at construction; nothing reads module-level globals.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default backend URL, matching the development server.
const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Path of the live progress channel, relative to the backend host.
const WS_PATH: &str = "/ws/download-all/";

/// Reconnect policy for the live channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Consecutive failed open attempts before the channel is
    /// considered exhausted (default: 3)
    pub max_attempts: u32,

    /// Base reconnect delay; attempt N waits N * base_delay
    /// (default: 1500 ms)
    #[serde(with = "duration_ms")]
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_attempts: 3, base_delay: Duration::from_millis(1500) }
    }
}

/// Client configuration for the transport adapter and orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend base URL, e.g. `http://localhost:8000`
    pub base_url: String,

    /// Send cookies with every request (default: true). The server is
    /// expected to reflect an allow-list origin in its CORS policy.
    pub with_credentials: bool,

    /// Live channel reconnect policy
    pub retry: RetryConfig,

    /// Maximum silence on the live channel before it is presumed dead.
    /// Should be at least twice the server heartbeat interval
    /// (default: 30 s)
    #[serde(with = "duration_ms")]
    pub liveness_window: Duration,

    /// Walk the item list at `fallback_tick` cadence while the
    /// synchronous fallback fetch is in flight, purely for UI feedback
    /// (default: true)
    pub simulate_fallback_progress: bool,

    /// Cadence of simulated fallback progress (default: 800 ms)
    #[serde(with = "duration_ms")]
    pub fallback_tick: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            with_credentials: true,
            retry: RetryConfig::default(),
            liveness_window: Duration::from_secs(30),
            simulate_fallback_progress: true,
            fallback_tick: Duration::from_millis(800),
        }
    }
}

impl ClientConfig {
    /// Load configuration from defaults plus environment overrides.
    ///
    /// Recognized variables: `BULKDL_BASE_URL`,
    /// `BULKDL_WITH_CREDENTIALS` (`0`/`false` to disable).
    pub fn load() -> Self {
        let mut config = Self::default();
        if let Ok(base_url) = std::env::var("BULKDL_BASE_URL") {
            if !base_url.trim().is_empty() {
                config.base_url = base_url.trim().trim_end_matches('/').to_string();
            }
        }
        if let Ok(creds) = std::env::var("BULKDL_WITH_CREDENTIALS") {
            config.with_credentials = !matches!(creds.trim(), "0" | "false" | "no");
        }
        config
    }

    /// Absolute URL for an HTTP endpoint path.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Live channel URL, derived from the base URL
    /// (`http → ws`, `https → wss`).
    pub fn ws_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            base.to_string()
        };
        format!("{base}{WS_PATH}")
    }
}

/// Serialize durations as integer milliseconds.
mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert!(config.with_credentials);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_delay, Duration::from_millis(1500));
        assert_eq!(config.liveness_window, Duration::from_secs(30));
    }

    #[test]
    fn test_ws_url_scheme_mapping() {
        let mut config = ClientConfig::default();
        assert_eq!(config.ws_url(), "ws://localhost:8000/ws/download-all/");

        config.base_url = "https://dl.example.com".into();
        assert_eq!(config.ws_url(), "wss://dl.example.com/ws/download-all/");

        config.base_url = "https://dl.example.com/".into();
        assert_eq!(config.ws_url(), "wss://dl.example.com/ws/download-all/");
    }

    #[test]
    fn test_endpoint_join() {
        let config = ClientConfig::default();
        assert_eq!(config.endpoint("/downloads/history/"), "http://localhost:8000/downloads/history/");
    }
}
