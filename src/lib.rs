//! # Coin Tracker SDK
//!
//! Read-through cache over the public CoinGecko market data API, with a
//! persisted watchlist.
//!
//! Two layers do the work:
//!
//! - [`CoinGeckoProvider`], the fetch client. It checks connectivity, then
//!   retries each read up to 3 times with exponential backoff (1 s, 2 s).
//!   Beneath the retry loop an HTTP 429 costs a 60 s cooldown and exactly one
//!   re-issue. Failures reach callers as a [`FetchError`] with a stable
//!   [`FetchErrorKind`].
//! - [`MarketDataStore`], the cache views read from. Every read has a slot
//!   with an `Idle | Loading | Loaded | Errored` status and the last good
//!   value; changes are broadcast as [`StoreEvent`]s. The watchlist is
//!   persisted through a [`KeyValueStorage`] after every mutation.
//!
//! ## Usage
//!
//! ```no_run
//! use coin_tracker_sdk::{
//!     ClientConfig, CoinGeckoProvider, FileStorage, MarketDataStore, MarketRefresher,
//!     MemoryStorage, KeyValueStorage,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = CoinGeckoProvider::new(&ClientConfig::from_env()?)?;
//! let storage: Arc<dyn KeyValueStorage> = match FileStorage::default_location() {
//!     Some(files) => Arc::new(files),
//!     None => Arc::new(MemoryStorage::new()),
//! };
//! let store = Arc::new(MarketDataStore::new(Arc::new(provider), storage));
//!
//! // refresh coins and global stats every 60 seconds
//! let _refresher = MarketRefresher::spawn(store.clone());
//!
//! store.add_to_watchlist("bitcoin")?;
//! store.fetch_coin_detail("bitcoin").await?;
//! if let Some(detail) = store.selected_coin().await.value {
//!     println!("{}: {:?}", detail.name, detail.price_in("usd"));
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connectivity;
pub mod constants;
pub mod error;
pub mod format;
pub mod http;
pub mod metrics;
pub mod provider;
pub mod providers;
pub mod refresher;
pub mod retry;
pub mod state;
pub mod store;
pub mod types;
pub mod watchlist;

// Re-export commonly used types
pub use config::{ClientConfig, StoreConfig};
pub use connectivity::{AlwaysOnline, Connectivity, ConnectivityFlag};
pub use error::{FetchError, FetchErrorKind, TransportError, WatchlistError};
pub use metrics::FetchMetrics;
pub use provider::MarketDataProvider;
pub use providers::CoinGeckoProvider;
pub use refresher::MarketRefresher;
pub use state::{FetchStatus, Slot, SlotSnapshot, StoreEvent};
pub use store::MarketDataStore;
pub use types::{
    ChartPoint, ChartRange, ChartSeries, CoinDetail, CoinListQuery, GlobalStats, MarketCoin,
    SearchCoin, SearchResults, SortOrder, TrendingEntry,
};
pub use watchlist::{FileStorage, KeyValueStorage, MemoryStorage, Watchlist};
