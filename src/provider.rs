//! Provider abstractions for external market data APIs

use std::collections::HashMap;

use async_trait::async_trait;

use crate::{error::ProviderError, types::CatalogCoin};

/// Trait for batched price providers
///
/// Implementations fetch current USD prices for a set of ticker symbols
/// in one request (CryptoCompare, CoinGecko, etc.).
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Fetches current USD prices for the given symbols in a single
    /// batched request
    ///
    /// A partial map is a valid response: symbols the provider has no
    /// quote for are simply absent. Callers must tolerate gaps.
    async fn fetch_prices(
        &self,
        symbols: &[String],
    ) -> Result<HashMap<String, f64>, ProviderError>;

    /// Returns the name of this provider
    fn provider_name(&self) -> &'static str;
}

/// Trait for market catalog providers
///
/// Supplies the browsable coin list the UI renders cards from. Failures
/// surface to the caller, which renders them as an empty/error state.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Fetches the current market catalog
    async fn fetch_catalog(&self) -> Result<Vec<CatalogCoin>, ProviderError>;

    /// Returns the name of this provider
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::sync::Notify;

    /// Mock price provider for testing
    ///
    /// Responses are scripted per symbol; a fetch can be held open on a
    /// gate to exercise stop-mid-fetch behavior.
    pub struct MockPriceProvider {
        prices: Mutex<HashMap<String, f64>>,
        failing: AtomicBool,
        gate: Mutex<Option<Arc<Notify>>>,
        call_count: AtomicUsize,
    }

    impl Default for MockPriceProvider {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockPriceProvider {
        pub fn new() -> Self {
            Self {
                prices: Mutex::new(HashMap::new()),
                failing: AtomicBool::new(false),
                gate: Mutex::new(None),
                call_count: AtomicUsize::new(0),
            }
        }

        /// Scripts the price returned for a symbol
        pub fn set_price(&self, symbol: &str, price_usd: f64) {
            self.prices
                .lock()
                .unwrap()
                .insert(symbol.to_string(), price_usd);
        }

        /// Removes a symbol so it is absent from subsequent responses
        pub fn remove_price(&self, symbol: &str) {
            self.prices.lock().unwrap().remove(symbol);
        }

        /// When set, every fetch fails wholesale
        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        /// Holds the next fetch open until `gate` is notified
        pub fn hold_next_fetch(&self, gate: Arc<Notify>) {
            *self.gate.lock().unwrap() = Some(gate);
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PriceProvider for MockPriceProvider {
        async fn fetch_prices(
            &self,
            symbols: &[String],
        ) -> Result<HashMap<String, f64>, ProviderError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);

            let gate = self.gate.lock().unwrap().take();
            if let Some(gate) = gate {
                gate.notified().await;
            }

            if self.failing.load(Ordering::SeqCst) {
                return Err(ProviderError::ApiError("simulated outage".to_string()));
            }

            let prices = self.prices.lock().unwrap();
            Ok(symbols
                .iter()
                .filter_map(|s| prices.get(s).map(|p| (s.clone(), *p)))
                .collect())
        }

        fn provider_name(&self) -> &'static str {
            "mock"
        }
    }
}
