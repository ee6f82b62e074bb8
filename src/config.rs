//! Runtime configuration
//!
//! Every field defaults to the matching constant in `constants`, so
//! `ClientConfig::default()` reproduces the stock behaviour.

use crate::constants::{
    COINGECKO_API_URL, ENV_API_URL, ENV_TIMEOUT_SECS, INITIAL_BACKOFF_MS, MAX_RETRY_ATTEMPTS,
    RATE_LIMIT_COOLDOWN_SECS, REFRESH_INTERVAL_SECS, REQUEST_TIMEOUT_SECS, USER_AGENT,
    WATCHLIST_KEY,
};
use std::time::Duration;

/// Settings of the resilient fetch client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API base URL, without trailing slash
    pub base_url: String,
    /// Timeout of a single HTTP call
    pub request_timeout: Duration,
    /// Attempts per fetch, the first call included
    pub max_attempts: u32,
    /// Backoff before retry `n` is `base_backoff * 2^n`
    pub base_backoff: Duration,
    /// Wait after a 429 before the single re-issue
    pub rate_limit_cooldown: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: COINGECKO_API_URL.to_string(),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            max_attempts: MAX_RETRY_ATTEMPTS,
            base_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
            rate_limit_cooldown: Duration::from_secs(RATE_LIMIT_COOLDOWN_SECS),
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    /// Defaults, with the base URL and timeout overridable from the environment
    pub fn from_env() -> Result<Self, String> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var(ENV_API_URL) {
            if url.trim().is_empty() {
                return Err(format!("{} is set but empty", ENV_API_URL));
            }
            config.base_url = url.trim_end_matches('/').to_string();
        }

        if let Ok(raw) = std::env::var(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw
                .parse()
                .map_err(|_| format!("{} must be a whole number of seconds", ENV_TIMEOUT_SECS))?;
            if secs == 0 {
                return Err(format!("{} must be positive", ENV_TIMEOUT_SECS));
            }
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

/// Settings of the market data store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Storage key of the persisted watchlist
    pub watchlist_key: String,
    /// Period of the background market refresh
    pub refresh_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            watchlist_key: WATCHLIST_KEY.to_string(),
            refresh_interval: Duration::from_secs(REFRESH_INTERVAL_SECS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = ClientConfig::default();
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.rate_limit_cooldown, Duration::from_secs(60));
        assert_eq!(StoreConfig::default().watchlist_key, "watchlist");
    }
}
