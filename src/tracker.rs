//! Watchlist tracker service
//!
//! Wires the watchlist store and the live price feed together: committed
//! mutations restart the feed against the new tracked set, and entering
//! or leaving the chart view starts or stops polling. UI layers talk to
//! this facade; tests and automation can drive the store and feed
//! directly through the same interfaces.

use std::path::PathBuf;
use std::sync::Arc;

use crate::{
    error::{ProviderError, StorageError},
    feed::PriceFeed,
    providers::CryptoComparePrices,
    storage::FileStore,
    types::{FeedState, TrackOutcome},
    watchlist::WatchlistStore,
};

/// Facade over a [`WatchlistStore`] and a [`PriceFeed`]
///
/// Held as an owned instance by the embedding application; there is no
/// process-wide singleton.
pub struct WatchlistTracker {
    store: WatchlistStore,
    feed: PriceFeed,
}

impl WatchlistTracker {
    /// Creates a tracker from an existing store and feed
    pub fn new(store: WatchlistStore, feed: PriceFeed) -> Self {
        Self { store, feed }
    }

    /// Opens a tracker with the default stack: file-backed persistence
    /// under `data_dir` and CryptoCompare prices
    ///
    /// An API key is picked up from the `CRYPTOCOMPARE_API_KEY`
    /// environment variable when present.
    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self, ProviderError> {
        let mut provider = CryptoComparePrices::new()?;
        if let Ok(api_key) = std::env::var("CRYPTOCOMPARE_API_KEY") {
            provider = provider.with_api_key(api_key);
        }

        let storage = Arc::new(FileStore::new(data_dir));
        let store = WatchlistStore::load(storage).await;
        let feed = PriceFeed::new(Arc::new(provider));

        Ok(Self::new(store, feed))
    }

    /// Requests that a coin be tracked; a committed admission restarts
    /// the feed against the new set
    pub async fn track(&self, id: &str, symbol: &str) -> Result<TrackOutcome, StorageError> {
        let outcome = self.store.request_track(id, symbol).await?;
        if outcome == TrackOutcome::Committed {
            self.resync_feed().await;
        }
        Ok(outcome)
    }

    /// Resolves a capacity rejection by evicting one coin for another
    pub async fn resolve_eviction(
        &self,
        remove_id: &str,
        add_id: &str,
        add_symbol: &str,
    ) -> Result<TrackOutcome, StorageError> {
        let outcome = self
            .store
            .resolve_eviction(remove_id, add_id, add_symbol)
            .await?;
        if outcome == TrackOutcome::Committed {
            self.resync_feed().await;
        }
        Ok(outcome)
    }

    /// Stops tracking a coin and restarts the feed without it
    pub async fn untrack(&self, id: &str) -> Result<TrackOutcome, StorageError> {
        let outcome = self.store.untrack(id).await?;
        self.resync_feed().await;
        Ok(outcome)
    }

    /// Starts live polling for the current tracked set
    pub async fn enter_chart_view(&self) {
        let tracked = self.store.tracked().await;
        self.feed.start(&tracked).await;
    }

    /// Stops live polling and releases the windows
    pub async fn leave_chart_view(&self) {
        self.feed.stop().await;
    }

    /// The underlying watchlist store
    pub fn store(&self) -> &WatchlistStore {
        &self.store
    }

    /// The underlying live price feed
    pub fn feed(&self) -> &PriceFeed {
        &self.feed
    }

    /// Restarts the feed when the chart view is live, so it always polls
    /// the committed set
    async fn resync_feed(&self) {
        if matches!(self.feed.state().await, FeedState::Running | FeedState::Idle) {
            let tracked = self.store.tracked().await;
            self.feed.start(&tracked).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::mock::MockPriceProvider;
    use crate::storage::MemoryStore;
    use std::time::Duration;
    use tokio::time::sleep;

    async fn tracker_with_mock() -> (WatchlistTracker, Arc<MockPriceProvider>) {
        let provider = Arc::new(MockPriceProvider::new());
        let store = WatchlistStore::load(Arc::new(MemoryStore::new())).await;
        let feed = PriceFeed::with_interval(provider.clone(), Duration::from_millis(10));
        (WatchlistTracker::new(store, feed), provider)
    }

    #[tokio::test]
    async fn committed_mutations_restart_a_live_feed() {
        let (tracker, provider) = tracker_with_mock().await;
        provider.set_price("BTC", 97000.0);
        provider.set_price("ETH", 3200.0);

        // Chart view open with nothing tracked yet
        tracker.enter_chart_view().await;
        assert_eq!(tracker.feed().state().await, FeedState::Idle);

        tracker.track("bitcoin", "BTC").await.unwrap();
        assert_eq!(tracker.feed().state().await, FeedState::Running);
        sleep(Duration::from_millis(50)).await;
        assert!(!tracker.feed().window("BTC").await.unwrap().is_empty());

        tracker.track("ethereum", "ETH").await.unwrap();
        let windows = tracker.feed().windows().await;
        assert!(windows.contains_key("BTC"));
        assert!(windows.contains_key("ETH"));

        tracker.untrack("bitcoin").await.unwrap();
        let windows = tracker.feed().windows().await;
        assert!(!windows.contains_key("BTC"));
        assert!(windows.contains_key("ETH"));

        tracker.leave_chart_view().await;
        assert_eq!(tracker.feed().state().await, FeedState::Stopped);
    }

    #[tokio::test]
    async fn mutations_leave_a_stopped_feed_stopped() {
        let (tracker, provider) = tracker_with_mock().await;
        provider.set_price("BTC", 97000.0);

        tracker.track("bitcoin", "BTC").await.unwrap();

        assert_eq!(tracker.feed().state().await, FeedState::Stopped);
        assert!(tracker.feed().windows().await.is_empty());
    }

    #[tokio::test]
    async fn rejected_admission_does_not_disturb_the_feed() {
        let (tracker, provider) = tracker_with_mock().await;
        for (id, symbol) in [
            ("coin-a", "A"),
            ("coin-b", "B"),
            ("coin-c", "C"),
            ("coin-d", "D"),
            ("coin-e", "E"),
        ] {
            provider.set_price(symbol, 1.0);
            tracker.track(id, symbol).await.unwrap();
        }

        tracker.enter_chart_view().await;
        sleep(Duration::from_millis(30)).await;
        let before: Vec<String> = {
            let mut keys: Vec<String> = tracker.feed().windows().await.into_keys().collect();
            keys.sort();
            keys
        };

        let outcome = tracker.track("coin-f", "F").await.unwrap();
        assert!(matches!(outcome, TrackOutcome::CapacityExceeded(_)));

        let after: Vec<String> = {
            let mut keys: Vec<String> = tracker.feed().windows().await.into_keys().collect();
            keys.sort();
            keys
        };
        assert_eq!(before, after);

        // Resolving the eviction swaps the feed over to the new set
        tracker
            .resolve_eviction("coin-b", "coin-f", "F")
            .await
            .unwrap();
        let windows = tracker.feed().windows().await;
        assert!(!windows.contains_key("B"));
        assert!(windows.contains_key("F"));

        tracker.leave_chart_view().await;
    }
}
