//! Provider abstraction for the market data API reads

use crate::{
    error::FetchError,
    types::{
        ChartRange, ChartSeries, CoinDetail, CoinListQuery, GlobalStats, MarketCoin,
        SearchResults, TrendingEntry,
    },
};
use async_trait::async_trait;

/// Read-only operations against a market data API
///
/// The store is the only caller; implementations hide retries, rate-limit
/// handling and transport errors behind [`FetchError`].
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetches one page of the coin list
    ///
    /// # Arguments
    /// * `query` - Page window, quote currency and sort key
    ///
    /// # Returns
    /// At most `query.per_page` coins
    async fn get_coins(&self, query: &CoinListQuery) -> Result<Vec<MarketCoin>, FetchError>;

    /// Fetches the trending coins, best first
    async fn get_trending(&self) -> Result<Vec<TrendingEntry>, FetchError>;

    /// Fetches the full detail of a coin
    async fn get_coin_detail(&self, id: &str) -> Result<CoinDetail, FetchError>;

    /// Fetches price, market cap and volume history
    ///
    /// # Arguments
    /// * `id` - Coin id
    /// * `range` - Lookback window
    /// * `currency` - Quote currency
    async fn get_chart(
        &self,
        id: &str,
        range: ChartRange,
        currency: &str,
    ) -> Result<ChartSeries, FetchError>;

    /// Searches coins by name or symbol. Callers skip empty queries.
    async fn search(&self, query: &str) -> Result<SearchResults, FetchError>;

    /// Fetches aggregate market figures
    async fn get_global(&self) -> Result<GlobalStats, FetchError>;

    /// Returns the name of this provider
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Mock provider for testing
    ///
    /// Every operation answers from a configured outcome after an optional
    /// delay. Delays are keyed like the call counters: `coins`, `trending`,
    /// `global`, `detail:<id>`, `chart:<id>`, `search:<query>`.
    #[derive(Default)]
    pub struct MockProvider {
        coins: Mutex<Option<Result<Vec<MarketCoin>, FetchError>>>,
        trending: Mutex<Option<Result<Vec<TrendingEntry>, FetchError>>>,
        details: Mutex<HashMap<String, Result<CoinDetail, FetchError>>>,
        charts: Mutex<HashMap<String, Result<ChartSeries, FetchError>>>,
        searches: Mutex<HashMap<String, Result<SearchResults, FetchError>>>,
        global: Mutex<Option<Result<GlobalStats, FetchError>>>,
        delays: Mutex<HashMap<String, Duration>>,
        calls: Mutex<HashMap<String, usize>>,
    }

    fn missing<T>(what: &str) -> Result<T, FetchError> {
        Err(FetchError::InvalidResponse(format!("mock has no {}", what)))
    }

    impl MockProvider {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_coins(&self, result: Result<Vec<MarketCoin>, FetchError>) {
            *self.coins.lock().unwrap() = Some(result);
        }

        pub fn set_trending(&self, result: Result<Vec<TrendingEntry>, FetchError>) {
            *self.trending.lock().unwrap() = Some(result);
        }

        pub fn set_detail(&self, id: &str, result: Result<CoinDetail, FetchError>) {
            self.details.lock().unwrap().insert(id.to_string(), result);
        }

        pub fn set_chart(&self, id: &str, result: Result<ChartSeries, FetchError>) {
            self.charts.lock().unwrap().insert(id.to_string(), result);
        }

        pub fn set_search(&self, query: &str, result: Result<SearchResults, FetchError>) {
            self.searches
                .lock()
                .unwrap()
                .insert(query.to_string(), result);
        }

        pub fn set_global(&self, result: Result<GlobalStats, FetchError>) {
            *self.global.lock().unwrap() = Some(result);
        }

        pub fn set_delay(&self, key: &str, delay: Duration) {
            self.delays.lock().unwrap().insert(key.to_string(), delay);
        }

        pub fn call_count(&self, key: &str) -> usize {
            self.calls.lock().unwrap().get(key).copied().unwrap_or(0)
        }

        pub fn total_calls(&self) -> usize {
            self.calls.lock().unwrap().values().sum()
        }

        async fn enter(&self, key: String) {
            *self.calls.lock().unwrap().entry(key.clone()).or_insert(0) += 1;
            let delay = self.delays.lock().unwrap().get(&key).copied();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
        }
    }

    #[async_trait]
    impl MarketDataProvider for MockProvider {
        async fn get_coins(&self, _query: &CoinListQuery) -> Result<Vec<MarketCoin>, FetchError> {
            self.enter("coins".to_string()).await;
            self.coins
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| missing("coins"))
        }

        async fn get_trending(&self) -> Result<Vec<TrendingEntry>, FetchError> {
            self.enter("trending".to_string()).await;
            self.trending
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| missing("trending"))
        }

        async fn get_coin_detail(&self, id: &str) -> Result<CoinDetail, FetchError> {
            self.enter(format!("detail:{}", id)).await;
            self.details
                .lock()
                .unwrap()
                .get(id)
                .cloned()
                .unwrap_or(Err(FetchError::NotFound))
        }

        async fn get_chart(
            &self,
            id: &str,
            _range: ChartRange,
            _currency: &str,
        ) -> Result<ChartSeries, FetchError> {
            self.enter(format!("chart:{}", id)).await;
            self.charts
                .lock()
                .unwrap()
                .get(id)
                .cloned()
                .unwrap_or(Err(FetchError::NotFound))
        }

        async fn search(&self, query: &str) -> Result<SearchResults, FetchError> {
            self.enter(format!("search:{}", query)).await;
            self.searches
                .lock()
                .unwrap()
                .get(query)
                .cloned()
                .unwrap_or_else(|| Ok(SearchResults::default()))
        }

        async fn get_global(&self) -> Result<GlobalStats, FetchError> {
            self.enter("global".to_string()).await;
            self.global
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| missing("global"))
        }

        fn provider_name(&self) -> &'static str {
            "mock"
        }
    }
}
