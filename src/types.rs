//! Types for the coin watchlist and live price feed

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::WINDOW_SIZE;

/// A coin the user has opted to monitor
///
/// Entries carry an explicit `tracked` flag because the persisted blob may
/// transiently hold untracked entries mid-operation; the store's cleanup
/// pass removes them before anything is committed to storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedCoin {
    /// Stable identifier (catalog id, e.g. "bitcoin")
    pub id: String,

    /// Short label shown to the user and sent to price providers
    pub symbol: String,

    /// Always true for committed entries
    pub tracked: bool,
}

impl TrackedCoin {
    /// Creates a tracked entry. Symbols are uppercased on ingest since
    /// price providers key their responses by uppercase symbol.
    pub fn new(id: impl Into<String>, symbol: &str) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.trim().to_uppercase(),
            tracked: true,
        }
    }
}

/// Committed tracked-coin mapping, keyed by coin id
pub type WatchlistState = HashMap<String, TrackedCoin>;

/// Outcome of a watchlist mutation
///
/// Exceeding capacity is not an error: the caller resolves it by picking
/// a coin to evict (or cancelling) and retrying through
/// [`WatchlistStore::resolve_eviction`](crate::watchlist::WatchlistStore::resolve_eviction).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackOutcome {
    /// The mutation was applied and persisted
    Committed,

    /// The watchlist is full; contains the currently tracked coins so the
    /// caller can offer an eviction choice
    CapacityExceeded(Vec<TrackedCoin>),
}

/// One observed price for a tracked coin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    /// Time of observation
    pub timestamp: DateTime<Utc>,

    /// Price in USD
    pub price_usd: f64,
}

impl PriceSample {
    /// Creates a new price sample
    pub fn new(timestamp: DateTime<Utc>, price_usd: f64) -> Self {
        Self {
            timestamp,
            price_usd,
        }
    }
}

/// Fixed-length sliding window of recent price samples, oldest first
///
/// Appending beyond [`WINDOW_SIZE`] drops the oldest sample from the
/// front, so the window always holds the most recent observations.
#[derive(Debug, Clone, Default)]
pub struct PriceWindow {
    samples: VecDeque<PriceSample>,
}

impl PriceWindow {
    /// Creates an empty window
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(WINDOW_SIZE),
        }
    }

    /// Appends a sample, evicting the oldest if the window is full
    pub fn push(&mut self, sample: PriceSample) {
        if self.samples.len() >= WINDOW_SIZE {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Samples in append order (oldest first)
    pub fn samples(&self) -> Vec<PriceSample> {
        self.samples.iter().copied().collect()
    }

    /// Most recently appended sample
    pub fn latest(&self) -> Option<PriceSample> {
        self.samples.back().copied()
    }

    /// Number of samples currently held
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if no samples have been appended yet
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Lifecycle state of the live price feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    /// Not running; no windows held
    Stopped,

    /// Started against an empty tracked set: nothing to poll
    Idle,

    /// Polling loop is active
    Running,
}

/// One coin record from the market catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogCoin {
    /// Stable catalog identifier
    pub id: String,

    /// Ticker symbol
    pub symbol: String,

    /// Human-readable name
    pub name: String,

    /// Current price in USD
    pub current_price: f64,

    /// URL of the coin's logo
    pub image_url: String,
}

/// Feed events for observers (chart renderers, logging sinks)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedEvent {
    /// The feed started polling for a set of symbols
    FeedStarted {
        id: Uuid,
        symbols: Vec<String>,
        timestamp: DateTime<Utc>,
    },

    /// The feed was stopped and its windows discarded
    FeedStopped { id: Uuid, timestamp: DateTime<Utc> },

    /// A sample was appended to a coin's window
    SampleAppended {
        id: Uuid,
        symbol: String,
        price_usd: f64,
        timestamp: DateTime<Utc>,
    },

    /// A whole fetch-and-update cycle failed
    CycleFailed {
        id: Uuid,
        consecutive_failures: u32,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

impl FeedEvent {
    /// Get the event ID
    pub fn id(&self) -> Uuid {
        match self {
            FeedEvent::FeedStarted { id, .. } => *id,
            FeedEvent::FeedStopped { id, .. } => *id,
            FeedEvent::SampleAppended { id, .. } => *id,
            FeedEvent::CycleFailed { id, .. } => *id,
        }
    }

    /// Get the event type as string
    pub fn event_type(&self) -> &'static str {
        match self {
            FeedEvent::FeedStarted { .. } => "FEED_STARTED",
            FeedEvent::FeedStopped { .. } => "FEED_STOPPED",
            FeedEvent::SampleAppended { .. } => "SAMPLE_APPENDED",
            FeedEvent::CycleFailed { .. } => "CYCLE_FAILED",
        }
    }
}

impl std::fmt::Display for FeedEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedEvent::FeedStarted { symbols, .. } => {
                write!(f, "Feed started for {}", symbols.join(", "))
            }
            FeedEvent::FeedStopped { .. } => write!(f, "Feed stopped"),
            FeedEvent::SampleAppended {
                symbol, price_usd, ..
            } => {
                write!(f, "Sample appended: {} = ${:.2}", symbol, price_usd)
            }
            FeedEvent::CycleFailed {
                consecutive_failures,
                error_message,
                ..
            } => {
                write!(
                    f,
                    "Price cycle failed ({} in a row): {}",
                    consecutive_failures, error_message
                )
            }
        }
    }
}
