//! Background market refresh
//!
//! Re-issues the composite market refresh on a fixed period. Each cycle runs
//! in its own task, so a slow cycle does not delay the next one and cycles
//! may overlap; the store's per-slot tickets keep the newest result.

use crate::store::MarketDataStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Handle of the periodic refresh task. Dropping it stops the timer.
pub struct MarketRefresher {
    handle: JoinHandle<()>,
}

impl MarketRefresher {
    /// Starts refreshing with the store's configured interval.
    ///
    /// The first cycle runs immediately and also loads the trending list.
    pub fn spawn(store: Arc<MarketDataStore>) -> Self {
        let every = store.config().refresh_interval;
        Self::spawn_with_interval(store, every)
    }

    pub fn spawn_with_interval(store: Arc<MarketDataStore>, every: Duration) -> Self {
        let handle = tokio::spawn(async move {
            tracing::info!(
                refresh_interval_secs = every.as_secs(),
                provider = store.provider_name(),
                "Starting market refresh task"
            );

            let trending_store = store.clone();
            tokio::spawn(async move {
                if let Err(e) = trending_store.fetch_trending().await {
                    tracing::warn!(error = %e, "Failed to fetch trending coins");
                }
            });

            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let store = store.clone();
                tokio::spawn(async move {
                    if let Err(e) = store.refresh_market_data().await {
                        tracing::warn!(error = %e, "Failed to refresh market data");
                    }
                });
            }
        });

        Self { handle }
    }

    /// Stops the timer. Cycles already in flight run to completion.
    pub fn shutdown(self) {
        drop(self);
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for MarketRefresher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
