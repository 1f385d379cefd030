//! CryptoCompare price provider implementation

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    constants::{CRYPTOCOMPARE_API_URL, CRYPTOCOMPARE_PRICEMULTI_ENDPOINT, REQUEST_TIMEOUT_SECS, USER_AGENT},
    error::ProviderError,
    provider::PriceProvider,
};

/// CryptoCompare `pricemulti` response: symbol -> currency -> price
#[derive(Debug, Deserialize)]
struct PriceMultiResponse(HashMap<String, HashMap<String, f64>>);

/// CryptoCompare price provider
///
/// Uses the `pricemulti` endpoint, which quotes every requested symbol in
/// one request. Symbols CryptoCompare has no quote for are absent from
/// the response rather than failing it.
pub struct CryptoComparePrices {
    client: Client,
    api_key: Option<String>,
}

impl CryptoComparePrices {
    /// Creates a new CryptoCompare provider
    pub fn new() -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(ProviderError::NetworkError)?;

        Ok(Self {
            client,
            api_key: None,
        })
    }

    /// Attaches an API key sent with every request
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Builds the pricemulti URL for the given symbols
    fn build_url(&self, symbols: &[String]) -> String {
        let fsyms = symbols.join(",");
        let mut url = format!(
            "{}{}?fsyms={}&tsyms=USD",
            CRYPTOCOMPARE_API_URL, CRYPTOCOMPARE_PRICEMULTI_ENDPOINT, fsyms
        );

        if let Some(key) = &self.api_key {
            url.push_str("&api_key=");
            url.push_str(key);
        }

        url
    }

    /// Extracts USD quotes for the requested symbols
    fn parse_response(
        &self,
        response: PriceMultiResponse,
        symbols: &[String],
    ) -> HashMap<String, f64> {
        let mut result = HashMap::new();

        for symbol in symbols {
            if let Some(price) = response.0.get(symbol).and_then(|quotes| quotes.get("USD")) {
                result.insert(symbol.clone(), *price);
            }
        }

        result
    }
}

#[async_trait]
impl PriceProvider for CryptoComparePrices {
    async fn fetch_prices(
        &self,
        symbols: &[String],
    ) -> Result<HashMap<String, f64>, ProviderError> {
        if symbols.is_empty() {
            return Ok(HashMap::new());
        }

        let url = self.build_url(symbols);
        tracing::debug!(symbols = symbols.len(), "Fetching prices from CryptoCompare");

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

        // CryptoCompare reports request-level errors with HTTP 200 and a
        // {"Response":"Error", "Message": ...} body
        if let Ok(error_body) = serde_json::from_str::<serde_json::Value>(&response_text) {
            if error_body.get("Response").and_then(|r| r.as_str()) == Some("Error") {
                let message = error_body
                    .get("Message")
                    .and_then(|m| m.as_str())
                    .unwrap_or("unknown error");
                return Err(ProviderError::ApiError(message.to_string()));
            }
        }

        let parsed: PriceMultiResponse = serde_json::from_str(&response_text).map_err(|e| {
            ProviderError::InvalidResponse(format!(
                "Failed to parse CryptoCompare response: {}. Response: {}",
                e, response_text
            ))
        })?;

        let prices = self.parse_response(parsed, symbols);

        if prices.len() < symbols.len() {
            tracing::debug!(
                requested = symbols.len(),
                returned = prices.len(),
                "CryptoCompare returned a partial quote set"
            );
        }

        Ok(prices)
    }

    fn provider_name(&self) -> &'static str {
        "cryptocompare"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> CryptoComparePrices {
        CryptoComparePrices::new().unwrap()
    }

    #[test]
    fn build_url_joins_symbols() {
        let url = provider().build_url(&["BTC".to_string(), "ETH".to_string()]);
        assert!(url.contains("fsyms=BTC,ETH"));
        assert!(url.contains("tsyms=USD"));
        assert!(!url.contains("api_key"));
    }

    #[test]
    fn build_url_appends_api_key() {
        let url = provider()
            .with_api_key("secret")
            .build_url(&["BTC".to_string()]);
        assert!(url.ends_with("&api_key=secret"));
    }

    #[test]
    fn parse_response_skips_missing_symbols() {
        let raw = r#"{"BTC":{"USD":97000.5},"ETH":{"USD":3200.0}}"#;
        let parsed: PriceMultiResponse = serde_json::from_str(raw).unwrap();

        let symbols = vec!["BTC".to_string(), "ETH".to_string(), "DOGE".to_string()];
        let prices = provider().parse_response(parsed, &symbols);

        assert_eq!(prices.len(), 2);
        assert_eq!(prices["BTC"], 97000.5);
        assert!(!prices.contains_key("DOGE"));
    }
}
