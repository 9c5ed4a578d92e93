use async_trait::async_trait;
use crate::{FetchError, FinancialsFacet, ProfileFacet, QuoteFacet, StoreError, WatchlistEntry};

/// Market-data provider exposing the three facets fetched per symbol
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn quote(&self, symbol: &str) -> Result<QuoteFacet, FetchError>;

    async fn profile(&self, symbol: &str) -> Result<ProfileFacet, FetchError>;

    async fn financials(&self, symbol: &str) -> Result<FinancialsFacet, FetchError>;
}

/// Authoritative owner of watchlist entries, keyed by `(user_id, symbol)`.
///
/// Implementations normalize symbols with [`crate::normalize_symbol`] before
/// every operation.
#[async_trait]
pub trait WatchlistStore: Send + Sync {
    /// Entries for a user in insertion order.
    async fn list(&self, user_id: &str) -> Result<Vec<WatchlistEntry>, StoreError>;

    async fn add(&self, user_id: &str, symbol: &str, company: &str) -> Result<WatchlistEntry, StoreError>;

    async fn remove(&self, user_id: &str, symbol: &str) -> Result<(), StoreError>;

    async fn exists(&self, user_id: &str, symbol: &str) -> Result<bool, StoreError>;

    async fn symbols(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.list(user_id).await?.into_iter().map(|e| e.symbol).collect())
    }
}
