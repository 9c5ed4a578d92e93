//! Finnhub market-data client.
//!
//! [`CachedFetcher`] performs rate-limited HTTP GETs and caches decoded JSON
//! per `(url, ttl)`. [`FinnhubClient`] builds the quote, profile and metric
//! requests on top of it and implements [`watchlist_core::MarketDataSource`].

pub mod client;
pub mod fetcher;

#[cfg(test)]
mod test_support;

pub use client::{FinnhubClient, FinnhubConfig, DEFAULT_BASE_URL};
pub use fetcher::{redact_url, CachedFetcher, RateLimiter};
