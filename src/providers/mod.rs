//! Market data provider implementations

pub mod catalog;
pub mod coingecko;
pub mod cryptocompare;
pub mod failover;

pub use catalog::CoinGeckoCatalog;
pub use coingecko::CoinGeckoPrices;
pub use cryptocompare::CryptoComparePrices;
pub use failover::FailoverPrices;
