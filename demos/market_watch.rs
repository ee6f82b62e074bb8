use coin_tracker_sdk::format::{format_compact, format_currency, format_percentage};
use coin_tracker_sdk::{
    ClientConfig, CoinGeckoProvider, FileStorage, KeyValueStorage, MarketDataStore,
    MarketRefresher, MemoryStorage, Slot, StoreEvent,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("Coin Tracker Market Watch");
    println!("=========================");

    let provider = CoinGeckoProvider::new(&ClientConfig::from_env()?)?;
    let storage: Arc<dyn KeyValueStorage> = match FileStorage::default_location() {
        Some(files) => Arc::new(files),
        None => Arc::new(MemoryStorage::new()),
    };
    let store = Arc::new(MarketDataStore::new(Arc::new(provider), storage));

    // Watch a couple of coins on first run
    if store.watchlist().is_empty() {
        store.add_to_watchlist("bitcoin")?;
        store.add_to_watchlist("ethereum")?;
    }

    let mut events = store.subscribe();
    let refresher = MarketRefresher::spawn(store.clone());

    // Print the dashboard after each of the first three refresh cycles
    let mut cycles = 0;
    while cycles < 3 {
        match events.recv().await? {
            StoreEvent::SlotChanged { slot, status, .. } => {
                if let Some(message) = status.error() {
                    eprintln!("{} failed: {}", slot, message);
                    continue;
                }
                if slot != Slot::Global || status.is_loading() {
                    continue;
                }
            }
            StoreEvent::WatchlistChanged { .. } => continue,
        }
        cycles += 1;

        println!("\n{:-<60}", "");
        if let Some(global) = store.global().await.value {
            println!(
                "Total market cap: {} ({})",
                format_compact(global.total_market_cap.get("usd").copied().unwrap_or(0.0)),
                format_percentage(global.market_cap_change_percentage_24h_usd, 2)
            );
        }

        let watchlist = store.watchlist();
        if let Some(coins) = store.coins().await.value {
            for coin in coins.iter().take(10) {
                let marker = if watchlist.contains(&coin.id) { '*' } else { ' ' };
                println!(
                    "{} {:<12} {:>16} {:>9}",
                    marker,
                    coin.symbol.to_uppercase(),
                    format_currency(coin.current_price.unwrap_or(0.0), 2),
                    format_percentage(coin.price_change_percentage_24h.unwrap_or(0.0), 2)
                );
            }
        }
    }

    refresher.shutdown();
    Ok(())
}
