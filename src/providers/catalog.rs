//! CoinGecko market catalog provider implementation

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    constants::{CATALOG_PAGE_SIZE, COINGECKO_API_URL, COINGECKO_MARKETS_ENDPOINT, REQUEST_TIMEOUT_SECS, USER_AGENT},
    error::ProviderError,
    provider::CatalogProvider,
    types::CatalogCoin,
};

/// Raw entry from the `/coins/markets` endpoint
///
/// `current_price` and `image` can be null for delisted or brand-new
/// coins; those entries are dropped rather than failing the whole page.
#[derive(Debug, Deserialize)]
struct MarketsEntry {
    id: String,
    symbol: String,
    name: String,
    current_price: Option<f64>,
    image: Option<String>,
}

/// CoinGecko market catalog provider
pub struct CoinGeckoCatalog {
    client: Client,
}

impl CoinGeckoCatalog {
    /// Creates a new catalog provider
    pub fn new() -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(ProviderError::NetworkError)?;

        Ok(Self { client })
    }

    fn build_url(&self) -> String {
        format!(
            "{}{}?vs_currency=usd&order=market_cap_desc&per_page={}&page=1&sparkline=false",
            COINGECKO_API_URL, COINGECKO_MARKETS_ENDPOINT, CATALOG_PAGE_SIZE
        )
    }

    /// Converts raw entries to catalog coins, dropping incomplete ones
    fn parse_entries(entries: Vec<MarketsEntry>) -> Vec<CatalogCoin> {
        let mut coins = Vec::with_capacity(entries.len());

        for entry in entries {
            let (Some(current_price), Some(image_url)) = (entry.current_price, entry.image) else {
                tracing::warn!(id = %entry.id, "Skipping catalog entry with missing fields");
                continue;
            };

            coins.push(CatalogCoin {
                id: entry.id,
                symbol: entry.symbol.to_uppercase(),
                name: entry.name,
                current_price,
                image_url,
            });
        }

        coins
    }
}

#[async_trait]
impl CatalogProvider for CoinGeckoCatalog {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogCoin>, ProviderError> {
        let url = self.build_url();
        tracing::debug!("Fetching market catalog from CoinGecko");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ProviderError::NetworkError)?;

        if response.status().as_u16() == 429 {
            return Err(ProviderError::RateLimitExceeded);
        }

        if !response.status().is_success() {
            return Err(ProviderError::ApiError(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let response_text = response.text().await.map_err(ProviderError::NetworkError)?;

        let entries: Vec<MarketsEntry> = serde_json::from_str(&response_text).map_err(|e| {
            ProviderError::InvalidResponse(format!("Failed to parse catalog response: {}", e))
        })?;

        let coins = Self::parse_entries(entries);

        if coins.is_empty() {
            return Err(ProviderError::InvalidResponse(
                "No usable entries in catalog response".to_string(),
            ));
        }

        tracing::debug!(count = coins.len(), "Fetched market catalog");

        Ok(coins)
    }

    fn provider_name(&self) -> &'static str {
        "coingecko-catalog"
    }
}
