//! Constants for the coin tracker SDK
//!
//! Compile-time defaults for the fetch client, the store and the refresher.
//! Runtime overrides go through `ClientConfig` and `StoreConfig`.

/// CoinGecko API base URL
pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

/// HTTP request timeout for a single call (in seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Total attempts per fetch, the first call included
pub const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Base delay of the exponential backoff (in milliseconds)
pub const INITIAL_BACKOFF_MS: u64 = 1000;

/// Cooldown after an HTTP 429 before the request is re-issued (in seconds)
pub const RATE_LIMIT_COOLDOWN_SECS: u64 = 60;

/// How often the refresher re-issues the composite market refresh (in seconds)
pub const REFRESH_INTERVAL_SECS: u64 = 60;

/// Capacity of the store's event channel
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Storage key holding the JSON-encoded watchlist
pub const WATCHLIST_KEY: &str = "watchlist";

/// Directory name under the platform data dir used by `FileStorage`
pub const DATA_DIR_NAME: &str = "coin-tracker";

/// Default quote currency
pub const DEFAULT_CURRENCY: &str = "usd";

/// Default page size for the coin list
pub const DEFAULT_PER_PAGE: u32 = 20;

/// Default chart lookback (in days)
pub const DEFAULT_CHART_DAYS: u32 = 7;

/// User agent for HTTP requests
pub const USER_AGENT: &str = "coin-tracker-sdk/0.1.0";

/// Environment variable overriding the API base URL
pub const ENV_API_URL: &str = "COINGECKO_API_URL";

/// Environment variable overriding the request timeout (in seconds)
pub const ENV_TIMEOUT_SECS: &str = "COINGECKO_TIMEOUT_SECS";
