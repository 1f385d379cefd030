//! Failover price provider implementation

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::{error::ProviderError, provider::PriceProvider};

/// Price provider that attempts to fetch from multiple providers in order
/// until one succeeds.
pub struct FailoverPrices {
    providers: Vec<Arc<dyn PriceProvider>>,
}

impl FailoverPrices {
    /// Creates a new failover provider with a list of providers
    ///
    /// The providers are tried in the order they are provided.
    pub fn new(providers: Vec<Arc<dyn PriceProvider>>) -> Self {
        Self { providers }
    }
}

#[async_trait]
impl PriceProvider for FailoverPrices {
    async fn fetch_prices(
        &self,
        symbols: &[String],
    ) -> Result<HashMap<String, f64>, ProviderError> {
        let mut last_error = None;

        for provider in &self.providers {
            match provider.fetch_prices(symbols).await {
                Ok(prices) => return Ok(prices),
                Err(e) => {
                    tracing::warn!(
                        provider = provider.provider_name(),
                        error = %e,
                        "Provider failed to fetch prices"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ProviderError::InvalidResponse("No providers configured for failover".to_string())
        }))
    }

    fn provider_name(&self) -> &'static str {
        "failover"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::mock::MockPriceProvider;

    #[tokio::test]
    async fn falls_through_to_second_provider() {
        let primary = Arc::new(MockPriceProvider::new());
        primary.set_failing(true);

        let backup = Arc::new(MockPriceProvider::new());
        backup.set_price("BTC", 97000.0);

        let failover = FailoverPrices::new(vec![primary.clone(), backup.clone()]);

        let prices = failover
            .fetch_prices(&["BTC".to_string()])
            .await
            .unwrap();

        assert_eq!(prices["BTC"], 97000.0);
        assert_eq!(primary.call_count(), 1);
        assert_eq!(backup.call_count(), 1);
    }

    #[tokio::test]
    async fn surfaces_last_error_when_all_fail() {
        let a = Arc::new(MockPriceProvider::new());
        a.set_failing(true);
        let b = Arc::new(MockPriceProvider::new());
        b.set_failing(true);

        let failover = FailoverPrices::new(vec![a, b]);

        let err = failover
            .fetch_prices(&["BTC".to_string()])
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::ApiError(_)));
    }
}
