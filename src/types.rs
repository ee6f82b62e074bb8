//! Market data entities as returned by the CoinGecko API

use crate::constants::{DEFAULT_CURRENCY, DEFAULT_PER_PAGE};
use crate::error::FetchError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One row of `/coins/markets`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketCoin {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub image: String,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub market_cap_rank: Option<u32>,
    #[serde(default)]
    pub fully_diluted_valuation: Option<f64>,
    pub total_volume: Option<f64>,
    #[serde(default)]
    pub high_24h: Option<f64>,
    #[serde(default)]
    pub low_24h: Option<f64>,
    #[serde(default)]
    pub price_change_24h: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
    #[serde(default)]
    pub market_cap_change_24h: Option<f64>,
    #[serde(default)]
    pub market_cap_change_percentage_24h: Option<f64>,
    #[serde(default)]
    pub circulating_supply: Option<f64>,
    #[serde(default)]
    pub total_supply: Option<f64>,
    #[serde(default)]
    pub max_supply: Option<f64>,
    #[serde(default)]
    pub ath: Option<f64>,
    #[serde(default)]
    pub ath_change_percentage: Option<f64>,
    #[serde(default)]
    pub ath_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub atl: Option<f64>,
    #[serde(default)]
    pub atl_change_percentage: Option<f64>,
    #[serde(default)]
    pub atl_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Image URLs of a coin in three sizes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoinImage {
    pub thumb: String,
    pub small: String,
    pub large: String,
}

/// Source repositories of a project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReposUrl {
    pub github: Vec<String>,
    pub bitbucket: Vec<String>,
}

/// External links of a project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoinLinks {
    pub homepage: Vec<String>,
    pub blockchain_site: Vec<String>,
    pub official_forum_url: Vec<String>,
    pub chat_url: Vec<String>,
    pub announcement_url: Vec<String>,
    pub twitter_screen_name: Option<String>,
    pub facebook_username: Option<String>,
    pub telegram_channel_identifier: Option<String>,
    pub subreddit_url: Option<String>,
    pub repos_url: ReposUrl,
}

impl CoinLinks {
    /// First non-empty homepage, if any
    pub fn primary_homepage(&self) -> Option<&str> {
        self.homepage
            .iter()
            .map(String::as_str)
            .find(|url| !url.trim().is_empty())
    }
}

/// Market figures of a coin detail, keyed by currency code
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailMarketData {
    pub current_price: HashMap<String, f64>,
    pub market_cap: HashMap<String, f64>,
    pub market_cap_rank: Option<u32>,
    pub total_volume: HashMap<String, f64>,
    pub high_24h: HashMap<String, f64>,
    pub low_24h: HashMap<String, f64>,
    pub ath: HashMap<String, f64>,
    pub ath_change_percentage: HashMap<String, f64>,
    pub ath_date: HashMap<String, DateTime<Utc>>,
    pub atl: HashMap<String, f64>,
    pub atl_date: HashMap<String, DateTime<Utc>>,
    pub price_change_24h: Option<f64>,
    pub price_change_percentage_24h: Option<f64>,
    pub price_change_percentage_7d: Option<f64>,
    pub price_change_percentage_14d: Option<f64>,
    pub price_change_percentage_30d: Option<f64>,
    pub price_change_percentage_60d: Option<f64>,
    pub price_change_percentage_200d: Option<f64>,
    pub price_change_percentage_1y: Option<f64>,
    pub market_cap_change_24h: Option<f64>,
    pub market_cap_change_percentage_24h: Option<f64>,
    pub circulating_supply: Option<f64>,
    pub total_supply: Option<f64>,
    pub max_supply: Option<f64>,
}

/// Social metrics. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunityData {
    pub facebook_likes: Option<u64>,
    pub twitter_followers: Option<u64>,
    pub reddit_average_posts_48h: Option<f64>,
    pub reddit_average_comments_48h: Option<f64>,
    pub reddit_subscribers: Option<u64>,
    pub reddit_accounts_active_48h: Option<u64>,
    pub telegram_channel_user_count: Option<u64>,
}

/// Line changes over the last four weeks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeChanges {
    pub additions: Option<i64>,
    pub deletions: Option<i64>,
}

/// Repository activity. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeveloperData {
    pub forks: Option<u64>,
    pub stars: Option<u64>,
    pub subscribers: Option<u64>,
    pub total_issues: Option<u64>,
    pub closed_issues: Option<u64>,
    pub pull_requests_merged: Option<u64>,
    pub pull_request_contributors: Option<u64>,
    pub code_additions_deletions_4_weeks: Option<CodeChanges>,
    pub commit_count_4_weeks: Option<u64>,
}

/// Full detail of a single coin from `/coins/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinDetail {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub description: HashMap<String, String>,
    #[serde(default)]
    pub links: CoinLinks,
    #[serde(default)]
    pub image: CoinImage,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    #[serde(default)]
    pub market_data: Option<DetailMarketData>,
    #[serde(default)]
    pub community_data: Option<CommunityData>,
    #[serde(default)]
    pub developer_data: Option<DeveloperData>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl CoinDetail {
    /// English description, empty when the API has none
    pub fn description_en(&self) -> &str {
        self.description.get("en").map(String::as_str).unwrap_or("")
    }

    /// Current price in the given currency
    pub fn price_in(&self, currency: &str) -> Option<f64> {
        self.market_data
            .as_ref()?
            .current_price
            .get(&currency.to_lowercase())
            .copied()
    }
}

/// A `(timestamp, value)` sample of a chart series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct ChartPoint {
    /// Unix timestamp in milliseconds
    pub timestamp_ms: i64,
    pub value: f64,
}

impl From<(f64, f64)> for ChartPoint {
    fn from((timestamp_ms, value): (f64, f64)) -> Self {
        Self {
            timestamp_ms: timestamp_ms as i64,
            value,
        }
    }
}

impl From<ChartPoint> for (f64, f64) {
    fn from(point: ChartPoint) -> Self {
        (point.timestamp_ms as f64, point.value)
    }
}

/// Price, market cap and volume history from `/coins/{id}/market_chart`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartSeries {
    pub prices: Vec<ChartPoint>,
    pub market_caps: Vec<ChartPoint>,
    pub total_volumes: Vec<ChartPoint>,
}

impl ChartSeries {
    /// Sorts all three series by timestamp ascending
    pub fn sort_by_time(&mut self) {
        for series in [
            &mut self.prices,
            &mut self.market_caps,
            &mut self.total_volumes,
        ] {
            series.sort_by_key(|point| point.timestamp_ms);
        }
    }

    /// Relative price change between the first and last sample, in percent
    pub fn price_change_percentage(&self) -> Option<f64> {
        let first = self.prices.first()?.value;
        let last = self.prices.last()?.value;
        if first == 0.0 {
            return None;
        }
        Some((last - first) / first * 100.0)
    }
}

/// Lookback window of a chart request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartRange {
    /// The last `n` days, `n >= 1`
    Days(u32),
    /// Everything the API has
    Max,
}

impl ChartRange {
    /// Value of the `days` query parameter
    pub fn as_query_value(&self) -> String {
        match self {
            ChartRange::Days(days) => days.to_string(),
            ChartRange::Max => "max".to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), FetchError> {
        match self {
            ChartRange::Days(0) => Err(FetchError::invalid_request("days must be >= 1")),
            _ => Ok(()),
        }
    }
}

impl Default for ChartRange {
    fn default() -> Self {
        ChartRange::Days(crate::constants::DEFAULT_CHART_DAYS)
    }
}

/// Sort key of the coin list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortOrder {
    #[default]
    MarketCapDesc,
    MarketCapAsc,
    VolumeDesc,
    VolumeAsc,
    IdAsc,
    IdDesc,
}

impl SortOrder {
    /// Value of the `order` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::MarketCapDesc => "market_cap_desc",
            SortOrder::MarketCapAsc => "market_cap_asc",
            SortOrder::VolumeDesc => "volume_desc",
            SortOrder::VolumeAsc => "volume_asc",
            SortOrder::IdAsc => "id_asc",
            SortOrder::IdDesc => "id_desc",
        }
    }
}

/// Parameters of a paginated coin list request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinListQuery {
    /// 1-based page index
    pub page: u32,
    pub per_page: u32,
    pub currency: String,
    pub order: SortOrder,
}

impl CoinListQuery {
    /// Default currency and order with the given page window
    pub fn page(page: u32, per_page: u32) -> Self {
        Self {
            page,
            per_page,
            ..Self::default()
        }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn validate(&self) -> Result<(), FetchError> {
        if self.page == 0 {
            return Err(FetchError::invalid_request("page must be >= 1"));
        }
        if self.per_page == 0 {
            return Err(FetchError::invalid_request("per_page must be >= 1"));
        }
        if self.currency.trim().is_empty() {
            return Err(FetchError::invalid_request("currency must not be empty"));
        }
        Ok(())
    }
}

impl Default for CoinListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            currency: DEFAULT_CURRENCY.to_string(),
            order: SortOrder::default(),
        }
    }
}

/// A coin from `/search/trending`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingEntry {
    pub id: String,
    #[serde(default)]
    pub coin_id: u64,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    #[serde(default)]
    pub thumb: String,
    #[serde(default)]
    pub small: String,
    #[serde(default)]
    pub large: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub price_btc: f64,
    #[serde(default)]
    pub score: u32,
}

/// Aggregate market figures from `/global`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalStats {
    pub active_cryptocurrencies: Option<u64>,
    pub total_market_cap: HashMap<String, f64>,
    pub total_volume: HashMap<String, f64>,
    pub market_cap_percentage: HashMap<String, f64>,
    pub market_cap_change_percentage_24h_usd: f64,
}

impl GlobalStats {
    /// Market cap dominance of an asset symbol, in percent
    pub fn dominance(&self, symbol: &str) -> Option<f64> {
        self.market_cap_percentage
            .get(&symbol.to_lowercase())
            .copied()
    }
}

/// A coin match from `/search`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCoin {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    #[serde(default)]
    pub thumb: String,
    #[serde(default)]
    pub large: String,
}

/// Result of `/search`. Exchange, category and NFT matches are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchResults {
    pub coins: Vec<SearchCoin>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }

    /// Cached coins whose id appears among the matches, in cache order.
    ///
    /// Only coins already present in `cached` can be returned, so matches
    /// outside the cached page are dropped.
    pub fn matching(&self, cached: &[MarketCoin]) -> Vec<MarketCoin> {
        let ids: HashSet<&str> = self.coins.iter().map(|c| c.id.as_str()).collect();
        cached
            .iter()
            .filter(|coin| ids.contains(coin.id.as_str()))
            .cloned()
            .collect()
    }
}
