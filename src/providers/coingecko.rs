//! CoinGecko market data provider
//!
//! The resilient fetch client: connectivity check, then a bounded
//! exponential-backoff loop around a rate-limit aware transport, with status
//! classification and JSON decoding per attempt.

use crate::{
    config::ClientConfig,
    connectivity::{AlwaysOnline, Connectivity},
    error::FetchError,
    http::{ApiRequest, HttpTransport, RateLimitTransport, ReqwestTransport},
    metrics::{FetchMetrics, MetricsCollector},
    provider::MarketDataProvider,
    retry::RetryPolicy,
    types::{
        ChartRange, ChartSeries, CoinDetail, CoinListQuery, GlobalStats, MarketCoin,
        SearchResults, TrendingEntry,
    },
};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// `/search/trending` envelope
#[derive(Debug, Deserialize)]
struct TrendingResponse {
    #[serde(default)]
    coins: Vec<TrendingItem>,
}

#[derive(Debug, Deserialize)]
struct TrendingItem {
    item: TrendingEntry,
}

/// `/global` envelope
#[derive(Debug, Deserialize)]
struct GlobalResponse {
    data: GlobalStats,
}

/// CoinGecko provider
pub struct CoinGeckoProvider {
    transport: Arc<dyn HttpTransport>,
    connectivity: Arc<dyn Connectivity>,
    retry: RetryPolicy,
    metrics: MetricsCollector,
}

impl CoinGeckoProvider {
    /// Creates a provider talking to the configured API over HTTPS
    pub fn new(config: &ClientConfig) -> Result<Self, FetchError> {
        let transport = ReqwestTransport::new(config)?;
        Ok(Self::with_transport(Arc::new(transport), config))
    }

    /// Creates a provider over a custom transport.
    ///
    /// The transport is wrapped in the rate-limit interceptor, so it should
    /// return 429 responses rather than handle them.
    pub fn with_transport(transport: Arc<dyn HttpTransport>, config: &ClientConfig) -> Self {
        Self {
            transport: Arc::new(RateLimitTransport::new(
                transport,
                config.rate_limit_cooldown,
            )),
            connectivity: Arc::new(AlwaysOnline),
            retry: RetryPolicy::from(config),
            metrics: MetricsCollector::new(),
        }
    }

    /// Replaces the reachability signal checked before each fetch
    pub fn with_connectivity(mut self, connectivity: Arc<dyn Connectivity>) -> Self {
        self.connectivity = connectivity;
        self
    }

    /// Latency and success metrics of the fetches so far
    pub fn metrics(&self) -> FetchMetrics {
        self.metrics.snapshot()
    }

    /// Runs one named read through the connectivity check and retry loop
    async fn fetch<T: DeserializeOwned + Send>(
        &self,
        operation: &'static str,
        request: ApiRequest,
    ) -> Result<T, FetchError> {
        if !self.connectivity.is_online() {
            tracing::warn!(operation, "Skipping fetch, no connectivity");
            return Err(FetchError::NoConnectivity);
        }

        let start = Instant::now();
        let attempts = AtomicU32::new(0);
        let request = &request;

        let result = self
            .retry
            .run(operation, || {
                attempts.fetch_add(1, Ordering::Relaxed);
                self.fetch_once(request)
            })
            .await;

        let attempts = attempts.load(Ordering::Relaxed);
        self.metrics.record(start.elapsed(), result.is_ok(), attempts);

        if result.is_ok() {
            tracing::debug!(
                operation,
                attempts,
                latency_ms = start.elapsed().as_millis() as u64,
                "Fetched market data"
            );
        }

        result
    }

    /// A single attempt: send, classify the status, decode the body
    async fn fetch_once<T: DeserializeOwned + Send>(
        &self,
        request: &ApiRequest,
    ) -> Result<T, FetchError> {
        let response = self.transport.send(request).await?;

        if !response.is_success() {
            return Err(FetchError::from_status(response.status));
        }

        serde_json::from_str(&response.body).map_err(|e| {
            FetchError::InvalidResponse(format!("Failed to parse {}: {}", request.path, e))
        })
    }
}

/// Coin ids are interpolated into the path, so reject anything that would
/// change its shape
fn validate_coin_id(id: &str) -> Result<(), FetchError> {
    if id.trim().is_empty() {
        return Err(FetchError::invalid_request("coin id must not be empty"));
    }
    if id.contains(['/', '?', '#', '&']) || id.chars().any(char::is_whitespace) {
        return Err(FetchError::invalid_request(format!(
            "invalid coin id: {:?}",
            id
        )));
    }
    Ok(())
}

#[async_trait]
impl MarketDataProvider for CoinGeckoProvider {
    async fn get_coins(&self, query: &CoinListQuery) -> Result<Vec<MarketCoin>, FetchError> {
        query.validate()?;

        let request = ApiRequest::get("/coins/markets")
            .param("vs_currency", &query.currency)
            .param("order", query.order.as_str())
            .param("per_page", query.per_page)
            .param("page", query.page)
            .param("sparkline", false)
            .param("price_change_percentage", "24h");

        let mut coins: Vec<MarketCoin> = self.fetch("get_coins", request).await?;
        coins.truncate(query.per_page as usize);
        Ok(coins)
    }

    async fn get_trending(&self) -> Result<Vec<TrendingEntry>, FetchError> {
        let response: TrendingResponse = self
            .fetch("get_trending", ApiRequest::get("/search/trending"))
            .await?;
        Ok(response.coins.into_iter().map(|c| c.item).collect())
    }

    async fn get_coin_detail(&self, id: &str) -> Result<CoinDetail, FetchError> {
        validate_coin_id(id)?;

        let request = ApiRequest::get(format!("/coins/{}", id))
            .param("localization", false)
            .param("tickers", false)
            .param("market_data", true)
            .param("community_data", true)
            .param("developer_data", true);

        self.fetch("get_coin_detail", request).await
    }

    async fn get_chart(
        &self,
        id: &str,
        range: ChartRange,
        currency: &str,
    ) -> Result<ChartSeries, FetchError> {
        validate_coin_id(id)?;
        range.validate()?;

        let request = ApiRequest::get(format!("/coins/{}/market_chart", id))
            .param("vs_currency", currency)
            .param("days", range.as_query_value());

        let mut series: ChartSeries = self.fetch("get_chart", request).await?;
        series.sort_by_time();
        Ok(series)
    }

    async fn search(&self, query: &str) -> Result<SearchResults, FetchError> {
        let request = ApiRequest::get("/search").param("query", query);
        self.fetch("search", request).await
    }

    async fn get_global(&self) -> Result<GlobalStats, FetchError> {
        let response: GlobalResponse = self
            .fetch("get_global", ApiRequest::get("/global"))
            .await?;
        Ok(response.data)
    }

    fn provider_name(&self) -> &'static str {
        "coingecko"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::ConnectivityFlag;
    use crate::error::{FetchErrorKind, TransportError};
    use crate::http::mock::ScriptedTransport;
    use std::time::Duration;
    use tokio::time::Instant;

    const COINS_PAGE: &str = r#"[
        {"id": "bitcoin", "symbol": "btc", "name": "Bitcoin", "image": "", "current_price": 67000.0,
         "market_cap": 1.3e12, "market_cap_rank": 1, "total_volume": 2.5e10},
        {"id": "ethereum", "symbol": "eth", "name": "Ethereum", "image": "", "current_price": 3500.0,
         "market_cap": 4.2e11, "market_cap_rank": 2, "total_volume": 1.5e10}
    ]"#;

    fn provider(transport: &Arc<ScriptedTransport>) -> CoinGeckoProvider {
        CoinGeckoProvider::with_transport(transport.clone(), &ClientConfig::default())
    }

    #[tokio::test]
    async fn test_get_coins_builds_markets_request() {
        let transport = Arc::new(ScriptedTransport::new().respond(200, COINS_PAGE));
        let provider = provider(&transport);

        let coins = provider
            .get_coins(&CoinListQuery::page(3, 50))
            .await
            .unwrap();

        assert_eq!(coins.len(), 2);
        assert_eq!(coins[1].id, "ethereum");

        let request = &transport.requests()[0];
        assert_eq!(request.path, "/coins/markets");
        assert_eq!(request.query_value("vs_currency"), Some("usd"));
        assert_eq!(request.query_value("order"), Some("market_cap_desc"));
        assert_eq!(request.query_value("per_page"), Some("50"));
        assert_eq!(request.query_value("page"), Some("3"));
        assert_eq!(request.query_value("sparkline"), Some("false"));
        assert_eq!(request.query_value("price_change_percentage"), Some("24h"));
    }

    #[tokio::test]
    async fn test_get_coins_never_exceeds_page_size() {
        let transport = Arc::new(ScriptedTransport::new().respond(200, COINS_PAGE));
        let provider = provider(&transport);

        let coins = provider.get_coins(&CoinListQuery::page(1, 1)).await.unwrap();
        assert_eq!(coins.len(), 1);
        assert_eq!(coins[0].id, "bitcoin");
    }

    #[tokio::test]
    async fn test_invalid_page_fails_without_request() {
        let transport = Arc::new(ScriptedTransport::new());
        let provider = provider(&transport);

        let err = provider
            .get_coins(&CoinListQuery::page(0, 20))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FetchErrorKind::InvalidRequest);
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_offline_fails_fast() {
        let transport = Arc::new(ScriptedTransport::new().respond(
            200,
            r#"{"data": {"total_market_cap": {"usd": 1.0}, "market_cap_change_percentage_24h_usd": 0.5}}"#,
        ));
        let flag = ConnectivityFlag::new(false);
        let provider = provider(&transport).with_connectivity(Arc::new(flag.clone()));

        let err = provider.get_global().await.unwrap_err();
        assert_eq!(err, FetchError::NoConnectivity);
        assert_eq!(transport.call_count(), 0);

        flag.set_online(true);
        let stats = provider.get_global().await.unwrap();
        assert_eq!(stats.market_cap_change_percentage_24h_usd, 0.5);
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_transient_failures_then_success() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .fail(TransportError::Timeout)
                .respond(500, "")
                .respond(200, r#"{"coins": [{"item": {"id": "pepe", "coin_id": 29850, "name": "Pepe", "symbol": "PEPE", "score": 0}}]}"#),
        );
        let provider = provider(&transport);
        let start = Instant::now();

        let trending = provider.get_trending().await.unwrap();

        assert_eq!(trending.len(), 1);
        assert_eq!(trending[0].id, "pepe");
        assert_eq!(transport.call_count(), 3);
        assert!(start.elapsed() >= Duration::from_millis(1000 + 2000));

        let metrics = provider.metrics();
        assert_eq!(metrics.total_fetches, 1);
        assert_eq!(metrics.retries, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_rate_limit_surfaces_as_rate_limited() {
        let mut transport = ScriptedTransport::new();
        for _ in 0..6 {
            transport = transport.respond(429, "");
        }
        let transport = Arc::new(transport);
        let provider = provider(&transport);
        let start = Instant::now();

        let err = provider.search("doge").await.unwrap_err();

        assert_eq!(err.kind(), FetchErrorKind::RateLimited);
        // each of the 3 attempts costs one cooldown re-issue
        assert_eq!(transport.call_count(), 6);
        assert!(start.elapsed() >= Duration::from_secs(3 * 60) + Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_recovered_by_cooldown() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond(429, "")
                .respond(200, r#"{"coins": [{"id": "dogecoin", "name": "Dogecoin", "symbol": "DOGE"}], "exchanges": []}"#),
        );
        let provider = provider(&transport);

        let results = provider.search("doge").await.unwrap();

        assert_eq!(results.coins[0].id, "dogecoin");
        assert_eq!(transport.call_count(), 2);
        let requests = transport.requests();
        assert_eq!(requests[0], requests[1]);
        assert_eq!(requests[0].query_value("query"), Some("doge"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_after_retries() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond(404, r#"{"error": "coin not found"}"#)
                .respond(404, r#"{"error": "coin not found"}"#)
                .respond(404, r#"{"error": "coin not found"}"#),
        );
        let provider = provider(&transport);

        let err = provider.get_coin_detail("no-such-coin").await.unwrap_err();

        assert_eq!(err, FetchError::NotFound);
        assert_eq!(err.to_string(), "Resource not found");
        assert_eq!(transport.requests()[0].path, "/coins/no-such-coin");
        assert_eq!(
            transport.requests()[0].query_value("developer_data"),
            Some("true")
        );
    }

    #[tokio::test]
    async fn test_chart_request_and_ordering() {
        let transport = Arc::new(ScriptedTransport::new().respond(
            200,
            r#"{"prices": [[2000, 2.0], [1000, 1.0]], "market_caps": [], "total_volumes": []}"#,
        ));
        let provider = provider(&transport);

        let series = provider
            .get_chart("bitcoin", ChartRange::Max, "eur")
            .await
            .unwrap();

        assert_eq!(series.prices[0].timestamp_ms, 1000);
        let request = &transport.requests()[0];
        assert_eq!(request.path, "/coins/bitcoin/market_chart");
        assert_eq!(request.query_value("days"), Some("max"));
        assert_eq!(request.query_value("vs_currency"), Some("eur"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_undecodable_body_is_invalid_response() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond(200, "<html>")
                .respond(200, "<html>")
                .respond(200, "<html>"),
        );
        let provider = provider(&transport);

        let err = provider.get_global().await.unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::InvalidResponse);
    }

    #[test]
    fn test_coin_id_validation() {
        assert!(validate_coin_id("wrapped-bitcoin").is_ok());
        assert!(validate_coin_id("").is_err());
        assert!(validate_coin_id("../global").is_err());
        assert!(validate_coin_id("bit coin").is_err());
    }
}
