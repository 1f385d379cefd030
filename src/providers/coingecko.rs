//! CoinGecko price provider implementation

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    constants::{COINGECKO_API_URL, COINGECKO_SIMPLE_PRICE_ENDPOINT, REQUEST_TIMEOUT_SECS, USER_AGENT},
    error::ProviderError,
    provider::PriceProvider,
};

/// CoinGecko API response for simple price queries
#[derive(Debug, Deserialize)]
struct SimplePriceResponse {
    #[serde(flatten)]
    prices: HashMap<String, SimplePriceEntry>,
}

#[derive(Debug, Deserialize)]
struct SimplePriceEntry {
    usd: f64,
}

/// CoinGecko price provider
///
/// CoinGecko keys quotes by catalog id rather than ticker symbol, so the
/// provider is constructed with a symbol -> id mapping (typically built
/// from the catalog the coins were picked from). Symbols without a known
/// id are skipped, matching the partial-response contract.
pub struct CoinGeckoPrices {
    client: Client,
    ids_by_symbol: HashMap<String, String>,
}

impl CoinGeckoPrices {
    /// Creates a new CoinGecko provider with a symbol -> id mapping
    pub fn new(ids_by_symbol: HashMap<String, String>) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(ProviderError::NetworkError)?;

        Ok(Self {
            client,
            ids_by_symbol,
        })
    }

    /// Builds the simple-price URL for the resolvable symbols
    fn build_url(&self, ids: &[&str]) -> String {
        format!(
            "{}{}?ids={}&vs_currencies=usd",
            COINGECKO_API_URL,
            COINGECKO_SIMPLE_PRICE_ENDPOINT,
            ids.join(",")
        )
    }

    /// Maps id-keyed quotes back to the requested symbols
    fn parse_response(
        &self,
        response: SimplePriceResponse,
        symbols: &[String],
    ) -> HashMap<String, f64> {
        let mut result = HashMap::new();

        for symbol in symbols {
            let Some(id) = self.ids_by_symbol.get(symbol) else {
                continue;
            };
            if let Some(entry) = response.prices.get(id) {
                result.insert(symbol.clone(), entry.usd);
            }
        }

        result
    }
}

#[async_trait]
impl PriceProvider for CoinGeckoPrices {
    async fn fetch_prices(
        &self,
        symbols: &[String],
    ) -> Result<HashMap<String, f64>, ProviderError> {
        if symbols.is_empty() {
            return Ok(HashMap::new());
        }

        let ids: Vec<&str> = symbols
            .iter()
            .filter_map(|s| self.ids_by_symbol.get(s).map(String::as_str))
            .collect();

        if ids.is_empty() {
            tracing::debug!("No requested symbol maps to a CoinGecko id");
            return Ok(HashMap::new());
        }

        let url = self.build_url(&ids);
        tracing::debug!(ids = ids.len(), "Fetching prices from CoinGecko");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ProviderError::NetworkError)?;

        // Check for rate limiting
        if response.status().as_u16() == 429 {
            return Err(ProviderError::RateLimitExceeded);
        }

        // Check for other errors
        if !response.status().is_success() {
            return Err(ProviderError::ApiError(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let response_text = response.text().await.map_err(ProviderError::NetworkError)?;

        let parsed: SimplePriceResponse = serde_json::from_str(&response_text).map_err(|e| {
            ProviderError::InvalidResponse(format!(
                "Failed to parse CoinGecko response: {}. Response: {}",
                e, response_text
            ))
        })?;

        Ok(self.parse_response(parsed, symbols))
    }

    fn provider_name(&self) -> &'static str {
        "coingecko"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> CoinGeckoPrices {
        let ids = HashMap::from([
            ("BTC".to_string(), "bitcoin".to_string()),
            ("ETH".to_string(), "ethereum".to_string()),
        ]);
        CoinGeckoPrices::new(ids).unwrap()
    }

    #[test]
    fn parse_response_maps_ids_back_to_symbols() {
        let raw = r#"{"bitcoin":{"usd":97000.0},"ethereum":{"usd":3200.0}}"#;
        let parsed: SimplePriceResponse = serde_json::from_str(raw).unwrap();

        let symbols = vec!["BTC".to_string(), "ETH".to_string(), "DOGE".to_string()];
        let prices = provider().parse_response(parsed, &symbols);

        assert_eq!(prices["BTC"], 97000.0);
        assert_eq!(prices["ETH"], 3200.0);
        // DOGE has no id mapping and is skipped
        assert_eq!(prices.len(), 2);
    }
}
