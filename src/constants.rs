//! Constants for the coin watchlist SDK
//!
//! All configuration for the watchlist and the live price feed is
//! centralized here. No runtime configuration is used - the system
//! operates transparently with these compile-time constants.

/// Maximum number of coins that may be tracked at once
pub const MAX_TRACKED: usize = 5;

/// Maximum number of price samples kept per tracked coin
pub const WINDOW_SIZE: usize = 10;

/// How often the live feed fetches prices (in milliseconds)
pub const POLL_INTERVAL_MS: u64 = 2000;

/// HTTP request timeout when fetching prices or the catalog (in seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Storage key under which the tracked-coin mapping is persisted
pub const WATCHLIST_STORAGE_KEY: &str = "tracked_coins";

/// Capacity of the feed event broadcast channel
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// CryptoCompare API base URL
pub const CRYPTOCOMPARE_API_URL: &str = "https://min-api.cryptocompare.com";

/// CryptoCompare endpoint for batched multi-symbol price queries
pub const CRYPTOCOMPARE_PRICEMULTI_ENDPOINT: &str = "/data/pricemulti";

/// CoinGecko API base URL
pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

/// CoinGecko API endpoint for simple price queries
pub const COINGECKO_SIMPLE_PRICE_ENDPOINT: &str = "/simple/price";

/// CoinGecko API endpoint for the market catalog
pub const COINGECKO_MARKETS_ENDPOINT: &str = "/coins/markets";

/// Number of catalog entries fetched per page
pub const CATALOG_PAGE_SIZE: u32 = 100;

/// User agent for HTTP requests
pub const USER_AGENT: &str = "coin-watchlist-sdk/0.1.0";
