//! Slot state and change events published by the store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Independently fetched unit of cached data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Coins,
    Trending,
    Detail,
    Chart,
    Global,
    Search,
}

impl Slot {
    pub fn name(&self) -> &'static str {
        match self {
            Slot::Coins => "coins",
            Slot::Trending => "trending",
            Slot::Detail => "detail",
            Slot::Chart => "chart",
            Slot::Global => "global",
            Slot::Search => "search",
        }
    }

    pub fn all() -> &'static [Slot] {
        &[
            Slot::Coins,
            Slot::Trending,
            Slot::Detail,
            Slot::Chart,
            Slot::Global,
            Slot::Search,
        ]
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Fetch status of a slot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum FetchStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Errored(String),
}

impl FetchStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, FetchStatus::Loading)
    }

    /// Error message when the last fetch failed
    pub fn error(&self) -> Option<&str> {
        match self {
            FetchStatus::Errored(message) => Some(message),
            _ => None,
        }
    }
}

/// Point-in-time copy of a slot: its status and the last good value.
///
/// `value` survives failed fetches; only a successful fetch replaces it.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotSnapshot<T> {
    pub status: FetchStatus,
    pub value: Option<T>,
    /// When `value` was last replaced
    pub updated_at: Option<DateTime<Utc>>,
}

impl<T> Default for SlotSnapshot<T> {
    fn default() -> Self {
        Self {
            status: FetchStatus::Idle,
            value: None,
            updated_at: None,
        }
    }
}

/// Change notifications for subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StoreEvent {
    /// A slot changed status (and possibly value)
    SlotChanged {
        id: Uuid,
        slot: Slot,
        status: FetchStatus,
        timestamp: DateTime<Utc>,
    },

    /// The watchlist was mutated and persisted
    WatchlistChanged {
        id: Uuid,
        ids: Vec<String>,
        timestamp: DateTime<Utc>,
    },
}

impl StoreEvent {
    pub fn slot_changed(slot: Slot, status: FetchStatus) -> Self {
        StoreEvent::SlotChanged {
            id: Uuid::new_v4(),
            slot,
            status,
            timestamp: Utc::now(),
        }
    }

    pub fn watchlist_changed(ids: Vec<String>) -> Self {
        StoreEvent::WatchlistChanged {
            id: Uuid::new_v4(),
            ids,
            timestamp: Utc::now(),
        }
    }

    /// Get the event ID
    pub fn id(&self) -> Uuid {
        match self {
            StoreEvent::SlotChanged { id, .. } => *id,
            StoreEvent::WatchlistChanged { id, .. } => *id,
        }
    }

    /// Get the event type as string
    pub fn event_type(&self) -> &'static str {
        match self {
            StoreEvent::SlotChanged { .. } => "SLOT_CHANGED",
            StoreEvent::WatchlistChanged { .. } => "WATCHLIST_CHANGED",
        }
    }
}

impl std::fmt::Display for StoreEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreEvent::SlotChanged { slot, status, .. } => match status {
                FetchStatus::Errored(message) => write!(f, "Slot {} errored: {}", slot, message),
                status => write!(f, "Slot {} is {:?}", slot, status),
            },
            StoreEvent::WatchlistChanged { ids, .. } => {
                write!(f, "Watchlist now has {} coins", ids.len())
            }
        }
    }
}
