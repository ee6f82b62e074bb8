//! Error types for the coin tracker SDK

use thiserror::Error;

/// Failures of the HTTP layer, before any status code is known
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// No response within the per-call timeout
    #[error("request timed out")]
    Timeout,

    /// Connection could not be established or was dropped
    #[error("connection failed: {0}")]
    Connect(String),

    /// Any other failure before a full response was received
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else {
            Self::Other(err.to_string())
        }
    }
}

/// Stable classification of a fetch failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    NoConnectivity,
    NetworkError,
    NotFound,
    ServiceUnavailable,
    RateLimited,
    Unknown,
    InvalidResponse,
    InvalidRequest,
}

/// Errors returned by the fetch client
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FetchError {
    /// The connectivity probe reported the device offline
    #[error("No internet connection available")]
    NoConnectivity,

    /// No response was received
    #[error("Network error: {0}")]
    NetworkError(String),

    /// HTTP 404
    #[error("Resource not found")]
    NotFound,

    /// HTTP 500
    #[error("Market data API is experiencing issues")]
    ServiceUnavailable,

    /// HTTP 429 that persisted through the cooldown retry
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Any other non-2xx status
    #[error("Unexpected HTTP status {status}")]
    Unknown { status: u16 },

    /// 2xx response whose body could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Arguments rejected before any request was made
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl FetchError {
    /// Maps a non-success HTTP status to its error
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => Self::NotFound,
            429 => Self::RateLimited,
            500 => Self::ServiceUnavailable,
            status => Self::Unknown { status },
        }
    }

    /// Creates an InvalidRequest error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn kind(&self) -> FetchErrorKind {
        match self {
            Self::NoConnectivity => FetchErrorKind::NoConnectivity,
            Self::NetworkError(_) => FetchErrorKind::NetworkError,
            Self::NotFound => FetchErrorKind::NotFound,
            Self::ServiceUnavailable => FetchErrorKind::ServiceUnavailable,
            Self::RateLimited => FetchErrorKind::RateLimited,
            Self::Unknown { .. } => FetchErrorKind::Unknown,
            Self::InvalidResponse(_) => FetchErrorKind::InvalidResponse,
            Self::InvalidRequest(_) => FetchErrorKind::InvalidRequest,
        }
    }

    /// Whether the retry loop may attempt the call again
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidRequest(_) | Self::NoConnectivity)
    }
}

impl From<TransportError> for FetchError {
    fn from(err: TransportError) -> Self {
        Self::NetworkError(err.to_string())
    }
}

/// Errors raised while loading or persisting the watchlist
#[derive(Debug, Error)]
pub enum WatchlistError {
    /// Persisted state exists but is not a JSON array of strings
    #[error("Persisted watchlist is corrupt: {0}")]
    PersistenceCorrupt(String),

    /// Reading or writing the backing storage failed
    #[error("Watchlist storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing the watchlist failed
    #[error("Failed to encode watchlist: {0}")]
    Encode(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(FetchError::from_status(404).kind(), FetchErrorKind::NotFound);
        assert_eq!(FetchError::from_status(429).kind(), FetchErrorKind::RateLimited);
        assert_eq!(
            FetchError::from_status(500).kind(),
            FetchErrorKind::ServiceUnavailable
        );
        assert_eq!(
            FetchError::from_status(503),
            FetchError::Unknown { status: 503 }
        );
    }

    #[test]
    fn test_transport_errors_become_network_errors() {
        let err: FetchError = TransportError::Timeout.into();
        assert_eq!(err.kind(), FetchErrorKind::NetworkError);
        assert_eq!(err.to_string(), "Network error: request timed out");
    }

    #[test]
    fn test_invalid_request_is_not_retryable() {
        assert!(!FetchError::invalid_request("page must be >= 1").is_retryable());
        assert!(!FetchError::NoConnectivity.is_retryable());
        assert!(FetchError::NotFound.is_retryable());
        assert!(FetchError::RateLimited.is_retryable());
    }
}
