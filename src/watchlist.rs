//! Capacity-bounded watchlist store
//!
//! Single authority for which coins are tracked. Every mutation runs
//! under one lock from check to persist, so the committed mapping and the
//! durable blob never diverge and no two mutations interleave.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    constants::{MAX_TRACKED, WATCHLIST_STORAGE_KEY},
    error::StorageError,
    storage::KeyValueStore,
    types::{TrackOutcome, TrackedCoin, WatchlistState},
};

/// Persisted, capacity-bounded set of tracked coins
///
/// Capacity is enforced at admission: a request to track a coin while
/// [`MAX_TRACKED`] are already tracked is rejected with
/// [`TrackOutcome::CapacityExceeded`] and the caller resolves it through
/// [`WatchlistStore::resolve_eviction`]. Rejected requests never touch
/// durable storage.
pub struct WatchlistStore {
    storage: Arc<dyn KeyValueStore>,
    state: Mutex<WatchlistState>,
}

impl WatchlistStore {
    /// Loads the watchlist from durable storage
    ///
    /// A missing or malformed blob yields the empty watchlist; corruption
    /// is never fatal. Untracked entries left behind by an interrupted
    /// operation are scrubbed on load.
    pub async fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let mut state = match storage.get(WATCHLIST_STORAGE_KEY).await {
            Ok(Some(blob)) => match serde_json::from_str::<WatchlistState>(&blob) {
                Ok(state) => state,
                Err(e) => {
                    tracing::warn!(error = %e, "Malformed watchlist blob, starting empty");
                    WatchlistState::new()
                }
            },
            Ok(None) => WatchlistState::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read watchlist blob, starting empty");
                WatchlistState::new()
            }
        };

        let before = state.len();
        scrub(&mut state);
        if state.len() != before {
            tracing::warn!(
                removed = before - state.len(),
                "Scrubbed untracked entries left in storage"
            );
            if let Ok(blob) = serde_json::to_string(&state) {
                if let Err(e) = storage.put(WATCHLIST_STORAGE_KEY, &blob).await {
                    tracing::warn!(error = %e, "Failed to persist scrubbed watchlist");
                }
            }
        }

        Self {
            storage,
            state: Mutex::new(state),
        }
    }

    /// Snapshot of the committed mapping
    pub async fn state(&self) -> WatchlistState {
        self.state.lock().await.clone()
    }

    /// Committed tracked coins, ordered by id for stable presentation
    pub async fn tracked(&self) -> Vec<TrackedCoin> {
        sorted(&*self.state.lock().await)
    }

    /// Number of coins currently tracked
    pub async fn tracked_count(&self) -> usize {
        self.state.lock().await.len()
    }

    /// Requests that a coin be tracked
    ///
    /// Already-tracked coins are a no-op `Committed`. If the watchlist is
    /// full the request is rejected with the current entries and nothing
    /// is written; the caller picks an eviction and retries through
    /// [`resolve_eviction`](Self::resolve_eviction).
    pub async fn request_track(
        &self,
        id: &str,
        symbol: &str,
    ) -> Result<TrackOutcome, StorageError> {
        let mut state = self.state.lock().await;

        if state.get(id).map(|c| c.tracked).unwrap_or(false) {
            return Ok(TrackOutcome::Committed);
        }

        if state.len() >= MAX_TRACKED {
            tracing::debug!(id, "Tracking limit reached, admission rejected");
            return Ok(TrackOutcome::CapacityExceeded(sorted(&state)));
        }

        let prev = state.clone();
        state.insert(id.to_string(), TrackedCoin::new(id, symbol));
        self.commit(&mut state, prev).await?;

        tracing::info!(id, "Coin tracked");
        Ok(TrackOutcome::Committed)
    }

    /// Atomically evicts one coin and admits another
    ///
    /// Removing an id that is not tracked is a harmless no-op; if the
    /// removal did not actually free a slot the admission is rejected
    /// again rather than overshooting capacity.
    pub async fn resolve_eviction(
        &self,
        remove_id: &str,
        add_id: &str,
        add_symbol: &str,
    ) -> Result<TrackOutcome, StorageError> {
        let mut state = self.state.lock().await;
        let prev = state.clone();

        state.remove(remove_id);

        if state.len() >= MAX_TRACKED {
            self.commit(&mut state, prev).await?;
            tracing::debug!(
                remove_id,
                add_id,
                "Eviction freed no capacity, admission rejected"
            );
            return Ok(TrackOutcome::CapacityExceeded(sorted(&state)));
        }

        state.insert(add_id.to_string(), TrackedCoin::new(add_id, add_symbol));
        self.commit(&mut state, prev).await?;

        tracing::info!(remove_id, add_id, "Eviction resolved");
        Ok(TrackOutcome::Committed)
    }

    /// Stops tracking a coin; idempotent and always `Committed`
    pub async fn untrack(&self, id: &str) -> Result<TrackOutcome, StorageError> {
        let mut state = self.state.lock().await;
        let prev = state.clone();

        if state.remove(id).is_some() {
            self.commit(&mut state, prev).await?;
            tracing::info!(id, "Coin untracked");
        }

        Ok(TrackOutcome::Committed)
    }

    /// Removes any untracked entries and persists the cleaned mapping
    ///
    /// Mutating operations already scrub before every persist; this is
    /// the standalone self-healing pass for state loaded from elsewhere.
    pub async fn cleanup(&self) -> Result<(), StorageError> {
        let mut state = self.state.lock().await;

        let before = state.len();
        let prev = state.clone();
        scrub(&mut state);
        if state.len() != before {
            self.commit(&mut state, prev).await?;
        }

        Ok(())
    }

    /// Scrubs and persists the mapping as one atomic blob replace
    ///
    /// On a failed write the in-memory state rolls back to `prev` so
    /// memory never claims a commit storage does not hold.
    async fn commit(
        &self,
        state: &mut WatchlistState,
        prev: WatchlistState,
    ) -> Result<(), StorageError> {
        scrub(state);

        let blob = match serde_json::to_string(&*state) {
            Ok(blob) => blob,
            Err(e) => {
                *state = prev;
                return Err(StorageError::Serialize(e));
            }
        };

        if let Err(e) = self.storage.put(WATCHLIST_STORAGE_KEY, &blob).await {
            *state = prev;
            return Err(e);
        }

        Ok(())
    }
}

fn scrub(state: &mut WatchlistState) {
    state.retain(|_, coin| coin.tracked);
}

fn sorted(state: &WatchlistState) -> Vec<TrackedCoin> {
    let mut coins: Vec<TrackedCoin> = state.values().cloned().collect();
    coins.sort_by(|a, b| a.id.cmp(&b.id));
    coins
}
