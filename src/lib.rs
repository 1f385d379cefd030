//! # Coin Watchlist SDK
//!
//! The core of a cryptocurrency watchlist: a capacity-bounded, persisted
//! set of tracked coins and a live price feed that polls batched USD
//! quotes for that set and keeps a sliding window of recent samples per
//! coin for charting.
//!
//! ## Usage
//!
//! ```no_run
//! use coin_watchlist_sdk::{TrackOutcome, WatchlistTracker};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let tracker = WatchlistTracker::open("./data").await?;
//!
//! // Track a coin; a full watchlist asks the caller to pick an eviction
//! match tracker.track("bitcoin", "BTC").await? {
//!     TrackOutcome::Committed => {}
//!     TrackOutcome::CapacityExceeded(tracked) => {
//!         let evict = &tracked[0];
//!         tracker.resolve_eviction(&evict.id, "bitcoin", "BTC").await?;
//!     }
//! }
//!
//! // Open the chart view: polling starts for the tracked set
//! tracker.enter_chart_view().await;
//!
//! // Render the windows
//! for (symbol, samples) in tracker.feed().windows().await {
//!     if let Some(latest) = samples.last() {
//!         println!("{}: ${:.2}", symbol, latest.price_usd);
//!     }
//! }
//!
//! tracker.leave_chart_view().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! UI toggles ──> WatchlistStore (capacity 5, persisted blob)
//!                     │ committed set
//!                     ▼
//!                PriceFeed ── polls every 2s ──> PriceProvider
//!                     │
//!                     ▼
//!                PriceWindow per coin (last 10 samples)
//! ```
//!
//! Capacity rejection is an outcome, not an error: `request_track`
//! returns [`TrackOutcome::CapacityExceeded`] with the current entries,
//! and the caller resolves it through `resolve_eviction`. Price cycles
//! that fail are logged and swallowed; the schedule keeps running and
//! existing windows stay intact.

pub mod constants;
pub mod error;
pub mod feed;
pub mod metrics;
pub mod provider;
pub mod providers;
pub mod storage;
pub mod tracker;
pub mod types;
pub mod watchlist;

// Re-export commonly used types
pub use error::{ProviderError, StorageError};
pub use feed::PriceFeed;
pub use metrics::FeedMetrics;
pub use provider::{CatalogProvider, PriceProvider};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use tracker::WatchlistTracker;
pub use types::{
    CatalogCoin, FeedEvent, FeedState, PriceSample, TrackOutcome, TrackedCoin, WatchlistState,
};
pub use watchlist::WatchlistStore;
