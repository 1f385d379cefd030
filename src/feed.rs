//! Live price feed
//!
//! Polls a price provider for the tracked set on a fixed interval and
//! maintains one sliding window of recent samples per coin. The feed is
//! an owned instance: callers hold it, start it against a tracked set,
//! and stop it when the chart view goes away.
//!
//! Each `start` is tagged with a generation. A fetch still in flight when
//! the feed is stopped or restarted completes against a stale generation
//! and its result is discarded, so windows from different runs never mix.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
    constants::{EVENT_CHANNEL_CAPACITY, POLL_INTERVAL_MS},
    metrics::{FeedMetrics, MetricsCollector},
    provider::PriceProvider,
    types::{FeedEvent, FeedState, PriceSample, PriceWindow, TrackedCoin},
};

/// Live price feed with an owned start/stop lifecycle
pub struct PriceFeed {
    inner: Arc<FeedInner>,
    interval: Duration,
}

struct FeedInner {
    provider: Arc<dyn PriceProvider>,
    windows: RwLock<HashMap<String, PriceWindow>>,
    state: RwLock<FeedState>,
    generation: AtomicU64,
    task: std::sync::Mutex<Option<JoinHandle<()>>>,
    metrics: MetricsCollector,
    events: broadcast::Sender<FeedEvent>,
}

impl PriceFeed {
    /// Creates a feed polling at the default interval
    pub fn new(provider: Arc<dyn PriceProvider>) -> Self {
        Self::with_interval(provider, Duration::from_millis(POLL_INTERVAL_MS))
    }

    /// Creates a feed with a custom polling interval
    ///
    /// This is primarily for testing. Use `new()` in production code.
    pub fn with_interval(provider: Arc<dyn PriceProvider>, interval: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let metrics = MetricsCollector::new(provider.provider_name());

        Self {
            inner: Arc::new(FeedInner {
                provider,
                windows: RwLock::new(HashMap::new()),
                state: RwLock::new(FeedState::Stopped),
                generation: AtomicU64::new(0),
                task: std::sync::Mutex::new(None),
                metrics,
                events,
            }),
            interval,
        }
    }

    /// Starts polling for the given tracked set
    ///
    /// Any previous run is fully stopped first; its windows are discarded
    /// rather than merged, since the tracked set may have changed. An
    /// empty set leaves the feed idle with no timer scheduled. Otherwise
    /// one cycle runs immediately and the recurring schedule takes over.
    pub async fn start(&self, tracked: &[TrackedCoin]) {
        self.stop().await;

        let symbols: Vec<String> = tracked.iter().map(|c| c.symbol.clone()).collect();
        if symbols.is_empty() {
            *self.inner.state.write().await = FeedState::Idle;
            tracing::warn!("No coins tracked, price feed staying idle");
            return;
        }

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;

        {
            let mut windows = self.inner.windows.write().await;
            windows.clear();
            for symbol in &symbols {
                windows.insert(symbol.clone(), PriceWindow::new());
            }
        }
        *self.inner.state.write().await = FeedState::Running;

        self.inner.emit(FeedEvent::FeedStarted {
            id: Uuid::new_v4(),
            symbols: symbols.clone(),
            timestamp: Utc::now(),
        });
        tracing::info!(
            interval_ms = self.interval.as_millis() as u64,
            symbols = ?symbols,
            "Starting live price feed"
        );

        let inner = self.inner.clone();
        let interval = self.interval;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                // First tick completes immediately
                ticker.tick().await;

                // Cycles run detached so a slow fetch never delays the
                // next tick; stale completions are filtered by generation
                let cycle_inner = inner.clone();
                let cycle_symbols = symbols.clone();
                tokio::spawn(async move {
                    cycle_inner.run_cycle(generation, &cycle_symbols).await;
                });
            }
        });

        if let Ok(mut task) = self.inner.task.lock() {
            *task = Some(handle);
        }
    }

    /// Stops the feed and discards its windows; idempotent
    ///
    /// Effective immediately for future ticks. A fetch already in flight
    /// resolves against a stale generation and cannot mutate anything.
    pub async fn stop(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);

        if let Ok(mut task) = self.inner.task.lock() {
            if let Some(handle) = task.take() {
                handle.abort();
            }
        }

        let was_running = {
            let mut state = self.inner.state.write().await;
            std::mem::replace(&mut *state, FeedState::Stopped) == FeedState::Running
        };

        if was_running {
            self.inner.windows.write().await.clear();
            self.inner.emit(FeedEvent::FeedStopped {
                id: Uuid::new_v4(),
                timestamp: Utc::now(),
            });
            tracing::info!("Live price feed stopped");
        }
    }

    /// Current lifecycle state
    pub async fn state(&self) -> FeedState {
        *self.inner.state.read().await
    }

    /// Snapshot of every coin's window, oldest sample first
    pub async fn windows(&self) -> HashMap<String, Vec<PriceSample>> {
        self.inner
            .windows
            .read()
            .await
            .iter()
            .map(|(symbol, window)| (symbol.clone(), window.samples()))
            .collect()
    }

    /// Snapshot of one coin's window
    pub async fn window(&self, symbol: &str) -> Option<Vec<PriceSample>> {
        self.inner
            .windows
            .read()
            .await
            .get(symbol)
            .map(|w| w.samples())
    }

    /// Subscribes to feed events
    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.inner.events.subscribe()
    }

    /// Current cycle metrics, including the consecutive-failure streak
    pub async fn metrics(&self) -> FeedMetrics {
        self.inner.metrics.get_metrics().await
    }

    /// Returns the name of the backing price provider
    pub fn provider_name(&self) -> &'static str {
        self.inner.provider.provider_name()
    }
}

impl Drop for PriceFeed {
    fn drop(&mut self) {
        if let Ok(mut task) = self.inner.task.lock() {
            if let Some(handle) = task.take() {
                handle.abort();
            }
        }
    }
}

impl FeedInner {
    /// One fetch-and-update cycle
    ///
    /// All samples of a cycle share one captured timestamp so charts stay
    /// time-aligned across coins. Symbols missing from the response are
    /// skipped for this tick; a wholly failed fetch is logged and
    /// swallowed, leaving existing windows and the schedule untouched.
    async fn run_cycle(&self, generation: u64, symbols: &[String]) {
        let started = Instant::now();

        match self.provider.fetch_prices(symbols).await {
            Ok(prices) => {
                if self.generation.load(Ordering::SeqCst) != generation {
                    tracing::debug!("Discarding price cycle from a superseded run");
                    return;
                }

                let now = Utc::now();
                let mut windows = self.windows.write().await;
                for symbol in symbols {
                    match prices.get(symbol) {
                        Some(&price_usd) => {
                            if let Some(window) = windows.get_mut(symbol) {
                                window.push(PriceSample::new(now, price_usd));
                                self.emit(FeedEvent::SampleAppended {
                                    id: Uuid::new_v4(),
                                    symbol: symbol.clone(),
                                    price_usd,
                                    timestamp: now,
                                });
                            }
                        }
                        None => {
                            tracing::debug!(%symbol, "No quote this cycle, skipping");
                        }
                    }
                }
                drop(windows);

                self.metrics.record_cycle(started.elapsed(), true).await;
            }
            Err(e) => {
                if self.generation.load(Ordering::SeqCst) != generation {
                    return;
                }

                let streak = self.metrics.record_cycle(started.elapsed(), false).await;
                tracing::warn!(
                    error = %e,
                    consecutive_failures = streak,
                    "Price cycle failed, keeping schedule"
                );
                self.emit(FeedEvent::CycleFailed {
                    id: Uuid::new_v4(),
                    consecutive_failures: streak,
                    error_message: e.to_string(),
                    timestamp: Utc::now(),
                });
            }
        }
    }

    fn emit(&self, event: FeedEvent) {
        // A send with no live receivers is fine
        let _ = self.events.send(event);
    }
}
