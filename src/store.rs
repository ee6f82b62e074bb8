//! Market data store
//!
//! Owns the cached result of every named read plus the persisted watchlist.
//! Each slot moves `Idle -> Loading -> Loaded | Errored` and keeps its last
//! good value across failures. Requests are ticketed per slot, so a response
//! that arrives after a newer request for the same slot was issued is
//! dropped instead of overwriting fresher state.

use crate::{
    config::StoreConfig,
    constants::{DEFAULT_CURRENCY, EVENT_CHANNEL_CAPACITY},
    error::{FetchError, WatchlistError},
    provider::MarketDataProvider,
    state::{FetchStatus, Slot, SlotSnapshot, StoreEvent},
    types::{
        ChartRange, ChartSeries, CoinDetail, CoinListQuery, GlobalStats, MarketCoin,
        SearchResults, TrendingEntry,
    },
    watchlist::{KeyValueStorage, Watchlist},
};
use chrono::Utc;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{broadcast, RwLock};

struct SlotInner<T> {
    snapshot: SlotSnapshot<T>,
    /// Ticket of the most recently issued request
    latest_ticket: u64,
}

/// One slot's state behind its own lock
struct SlotCell<T> {
    slot: Slot,
    inner: RwLock<SlotInner<T>>,
}

impl<T: Clone> SlotCell<T> {
    fn new(slot: Slot) -> Self {
        Self {
            slot,
            inner: RwLock::new(SlotInner {
                snapshot: SlotSnapshot::default(),
                latest_ticket: 0,
            }),
        }
    }

    /// Issues a ticket and marks the slot loading
    async fn begin(&self) -> u64 {
        let mut inner = self.inner.write().await;
        inner.latest_ticket += 1;
        inner.snapshot.status = FetchStatus::Loading;
        inner.latest_ticket
    }

    /// Applies a completion if `ticket` is still the latest. Returns the new
    /// status, or `None` when the completion was stale.
    async fn complete(&self, ticket: u64, result: Result<T, String>) -> Option<FetchStatus> {
        let mut inner = self.inner.write().await;
        if inner.latest_ticket != ticket {
            tracing::debug!(
                slot = %self.slot,
                ticket,
                latest = inner.latest_ticket,
                "Dropping stale response"
            );
            return None;
        }

        let snapshot = &mut inner.snapshot;
        match result {
            Ok(value) => {
                snapshot.value = Some(value);
                snapshot.updated_at = Some(Utc::now());
                snapshot.status = FetchStatus::Loaded;
            }
            Err(message) => {
                snapshot.status = FetchStatus::Errored(message);
            }
        }
        Some(snapshot.status.clone())
    }

    /// Empties the slot and invalidates in-flight requests
    async fn reset(&self) {
        let mut inner = self.inner.write().await;
        inner.latest_ticket += 1;
        inner.snapshot = SlotSnapshot::default();
    }

    async fn snapshot(&self) -> SlotSnapshot<T> {
        self.inner.read().await.snapshot.clone()
    }

    async fn status(&self) -> FetchStatus {
        self.inner.read().await.snapshot.status.clone()
    }
}

/// Cache of market data and the watchlist, shared by views through `Arc`
///
/// # Example
/// ```no_run
/// use coin_tracker_sdk::{ClientConfig, CoinGeckoProvider, MarketDataStore, MemoryStorage};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = CoinGeckoProvider::new(&ClientConfig::default())?;
/// let store = MarketDataStore::new(Arc::new(provider), Arc::new(MemoryStorage::new()));
///
/// store.refresh_market_data().await?;
/// if let Some(coins) = store.coins().await.value {
///     println!("{} coins cached", coins.len());
/// }
/// # Ok(())
/// # }
/// ```
pub struct MarketDataStore {
    provider: Arc<dyn MarketDataProvider>,
    storage: Arc<dyn KeyValueStorage>,
    config: StoreConfig,
    coins: SlotCell<Vec<MarketCoin>>,
    trending: SlotCell<Vec<TrendingEntry>>,
    detail: SlotCell<CoinDetail>,
    chart: SlotCell<ChartSeries>,
    global: SlotCell<GlobalStats>,
    search: SlotCell<SearchResults>,
    watchlist: Mutex<Watchlist>,
    events: broadcast::Sender<StoreEvent>,
}

impl MarketDataStore {
    /// Creates a store with default settings and loads the persisted watchlist
    pub fn new(provider: Arc<dyn MarketDataProvider>, storage: Arc<dyn KeyValueStorage>) -> Self {
        Self::with_config(provider, storage, StoreConfig::default())
    }

    pub fn with_config(
        provider: Arc<dyn MarketDataProvider>,
        storage: Arc<dyn KeyValueStorage>,
        config: StoreConfig,
    ) -> Self {
        let watchlist = Watchlist::load(storage.as_ref(), &config.watchlist_key);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        tracing::info!(
            provider = provider.provider_name(),
            watchlist = watchlist.len(),
            "Market data store initialized"
        );

        Self {
            provider,
            storage,
            config,
            coins: SlotCell::new(Slot::Coins),
            trending: SlotCell::new(Slot::Trending),
            detail: SlotCell::new(Slot::Detail),
            chart: SlotCell::new(Slot::Chart),
            global: SlotCell::new(Slot::Global),
            search: SlotCell::new(Slot::Search),
            watchlist: Mutex::new(watchlist),
            events,
        }
    }

    /// Receives every subsequent state change
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    fn publish(&self, event: StoreEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    async fn begin<T: Clone>(&self, cell: &SlotCell<T>) -> u64 {
        let ticket = cell.begin().await;
        self.publish(StoreEvent::slot_changed(cell.slot, FetchStatus::Loading));
        ticket
    }

    async fn complete<T: Clone>(&self, cell: &SlotCell<T>, ticket: u64, result: Result<T, String>) {
        if let Some(status) = cell.complete(ticket, result).await {
            if let Some(message) = status.error() {
                tracing::warn!(slot = %cell.slot, error = message, "Fetch failed");
            }
            self.publish(StoreEvent::slot_changed(cell.slot, status));
        }
    }

    /// Runs one fetch through a slot's state machine
    async fn run_fetch<T, F>(&self, cell: &SlotCell<T>, fetch: F) -> Result<(), FetchError>
    where
        T: Clone,
        F: Future<Output = Result<T, FetchError>>,
    {
        let ticket = self.begin(cell).await;
        match fetch.await {
            Ok(value) => {
                self.complete(cell, ticket, Ok(value)).await;
                Ok(())
            }
            Err(e) => {
                self.complete(cell, ticket, Err(e.to_string())).await;
                Err(e)
            }
        }
    }

    /// Fetches a page of the coin list into the coins slot
    pub async fn fetch_coins(&self, query: &CoinListQuery) -> Result<(), FetchError> {
        self.run_fetch(&self.coins, self.provider.get_coins(query))
            .await
    }

    /// Fetches the trending list into the trending slot
    pub async fn fetch_trending(&self) -> Result<(), FetchError> {
        self.run_fetch(&self.trending, self.provider.get_trending())
            .await
    }

    /// Fetches a coin's detail into the single selected-detail slot
    pub async fn fetch_coin_detail(&self, id: &str) -> Result<(), FetchError> {
        self.run_fetch(&self.detail, self.provider.get_coin_detail(id))
            .await
    }

    /// Fetches a coin's USD chart into the chart slot
    pub async fn fetch_chart(&self, id: &str, range: ChartRange) -> Result<(), FetchError> {
        self.fetch_chart_in(id, range, DEFAULT_CURRENCY).await
    }

    /// Fetches a coin's chart quoted in `currency` into the chart slot
    pub async fn fetch_chart_in(
        &self,
        id: &str,
        range: ChartRange,
        currency: &str,
    ) -> Result<(), FetchError> {
        self.run_fetch(&self.chart, self.provider.get_chart(id, range, currency))
            .await
    }

    /// Fetches global stats into the global slot
    pub async fn fetch_global(&self) -> Result<(), FetchError> {
        self.run_fetch(&self.global, self.provider.get_global())
            .await
    }

    /// Searches coins. A blank query clears the search slot without a
    /// network call.
    pub async fn search_coins(&self, query: &str) -> Result<(), FetchError> {
        let query = query.trim();
        if query.is_empty() {
            self.search.reset().await;
            self.publish(StoreEvent::slot_changed(Slot::Search, FetchStatus::Idle));
            return Ok(());
        }

        self.run_fetch(&self.search, self.provider.search(query))
            .await
    }

    /// Fetches the default coin page and global stats concurrently.
    ///
    /// Both results are applied only if both fetches succeed. Otherwise both
    /// slots report the failure and keep their previous values.
    pub async fn refresh_market_data(&self) -> Result<(), FetchError> {
        let coins_ticket = self.begin(&self.coins).await;
        let global_ticket = self.begin(&self.global).await;

        let query = CoinListQuery::default();
        let (coins, global) = futures::future::join(
            self.provider.get_coins(&query),
            self.provider.get_global(),
        )
        .await;

        match (coins, global) {
            (Ok(coins), Ok(global)) => {
                self.complete(&self.coins, coins_ticket, Ok(coins)).await;
                self.complete(&self.global, global_ticket, Ok(global)).await;
                Ok(())
            }
            (Err(e), _) | (_, Err(e)) => {
                let message = e.to_string();
                self.complete(&self.coins, coins_ticket, Err(message.clone()))
                    .await;
                self.complete(&self.global, global_ticket, Err(message))
                    .await;
                Err(e)
            }
        }
    }

    pub async fn coins(&self) -> SlotSnapshot<Vec<MarketCoin>> {
        self.coins.snapshot().await
    }

    pub async fn trending(&self) -> SlotSnapshot<Vec<TrendingEntry>> {
        self.trending.snapshot().await
    }

    pub async fn selected_coin(&self) -> SlotSnapshot<CoinDetail> {
        self.detail.snapshot().await
    }

    pub async fn chart(&self) -> SlotSnapshot<ChartSeries> {
        self.chart.snapshot().await
    }

    pub async fn global(&self) -> SlotSnapshot<GlobalStats> {
        self.global.snapshot().await
    }

    pub async fn search_results(&self) -> SlotSnapshot<SearchResults> {
        self.search.snapshot().await
    }

    /// Current status of any slot
    pub async fn status(&self, slot: Slot) -> FetchStatus {
        match slot {
            Slot::Coins => self.coins.status().await,
            Slot::Trending => self.trending.status().await,
            Slot::Detail => self.detail.status().await,
            Slot::Chart => self.chart.status().await,
            Slot::Global => self.global.status().await,
            Slot::Search => self.search.status().await,
        }
    }

    fn lock_watchlist(&self) -> MutexGuard<'_, Watchlist> {
        self.watchlist.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Applies `mutate` and persists the result. The in-memory list is
    /// rolled back if persisting fails.
    fn mutate_watchlist(
        &self,
        mutate: impl FnOnce(&mut Watchlist) -> bool,
    ) -> Result<bool, WatchlistError> {
        let mut watchlist = self.lock_watchlist();
        let previous = watchlist.clone();
        if !mutate(&mut watchlist) {
            return Ok(false);
        }

        if let Err(e) = watchlist.persist(self.storage.as_ref(), &self.config.watchlist_key) {
            tracing::error!(error = %e, "Failed to persist watchlist, rolling back");
            *watchlist = previous;
            return Err(e);
        }

        let ids = watchlist.ids().to_vec();
        drop(watchlist);
        self.publish(StoreEvent::watchlist_changed(ids));
        Ok(true)
    }

    /// Adds a coin id. Returns `false` if it was already watched.
    pub fn add_to_watchlist(&self, id: &str) -> Result<bool, WatchlistError> {
        self.mutate_watchlist(|watchlist| watchlist.insert(id.to_string()))
    }

    /// Removes a coin id. Returns `false` if it was not watched.
    pub fn remove_from_watchlist(&self, id: &str) -> Result<bool, WatchlistError> {
        self.mutate_watchlist(|watchlist| watchlist.remove(id))
    }

    pub fn is_watched(&self, id: &str) -> bool {
        self.lock_watchlist().contains(id)
    }

    /// Watched ids in insertion order
    pub fn watchlist(&self) -> Vec<String> {
        self.lock_watchlist().ids().to_vec()
    }
}
