//! Rate-limit interceptor
//!
//! Sits between the fetch client's retry loop and the real transport. An
//! HTTP 429 costs one fixed cooldown and exactly one re-issue of the same
//! request; whatever comes back the second time is returned unchanged.

use crate::{
    error::TransportError,
    http::{ApiRequest, ApiResponse, HttpTransport},
};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;

const TOO_MANY_REQUESTS: u16 = 429;

/// Transport wrapper that waits out a 429 once before giving up
pub struct RateLimitTransport<T> {
    inner: T,
    cooldown: Duration,
}

impl<T: HttpTransport> RateLimitTransport<T> {
    pub fn new(inner: T, cooldown: Duration) -> Self {
        Self { inner, cooldown }
    }
}

#[async_trait]
impl<T: HttpTransport> HttpTransport for RateLimitTransport<T> {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let response = self.inner.send(request).await?;
        if response.status != TOO_MANY_REQUESTS {
            return Ok(response);
        }

        tracing::warn!(
            request = %request,
            cooldown_secs = self.cooldown.as_secs(),
            "Rate limited, cooling down before re-issuing request"
        );
        sleep(self.cooldown).await;

        self.inner.send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::mock::ScriptedTransport;
    use std::sync::Arc;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_then_single_reissue() {
        let inner = Arc::new(ScriptedTransport::new().respond(429, "").respond(200, "{}"));
        let transport = RateLimitTransport::new(inner.clone(), Duration::from_secs(60));
        let request = ApiRequest::get("/global");

        let start = Instant::now();
        let response = transport.send(&request).await.unwrap();

        assert_eq!(response.status, 200);
        assert!(start.elapsed() >= Duration::from_secs(60));
        assert_eq!(inner.call_count(), 2);
        assert_eq!(inner.requests()[0], inner.requests()[1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_429_is_returned() {
        let inner = Arc::new(ScriptedTransport::new().respond(429, "").respond(429, ""));
        let transport = RateLimitTransport::new(inner.clone(), Duration::from_secs(60));

        let response = transport.send(&ApiRequest::get("/global")).await.unwrap();

        assert_eq!(response.status, 429);
        assert_eq!(inner.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_statuses_pass_through() {
        let inner = Arc::new(ScriptedTransport::new().respond(500, "oops"));
        let transport = RateLimitTransport::new(inner.clone(), Duration::from_secs(60));

        let start = Instant::now();
        let response = transport.send(&ApiRequest::get("/global")).await.unwrap();

        assert_eq!(response.status, 500);
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(inner.call_count(), 1);
    }
}
