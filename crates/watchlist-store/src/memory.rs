//! In-memory watchlist storage.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use watchlist_core::{normalize_symbol, StoreError, WatchlistEntry, WatchlistStore};

/// Watchlists held in a concurrent map of user id to entries.
///
/// Each user's list keeps insertion order. The duplicate check and the insert
/// happen under the same shard lock, so two concurrent adds of one symbol
/// cannot both succeed.
#[derive(Clone, Default)]
pub struct InMemoryWatchlistStore {
    entries: Arc<DashMap<String, Vec<WatchlistEntry>>>,
}

impl InMemoryWatchlistStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WatchlistStore for InMemoryWatchlistStore {
    async fn list(&self, user_id: &str) -> Result<Vec<WatchlistEntry>, StoreError> {
        Ok(self
            .entries
            .get(user_id)
            .map(|list| list.value().clone())
            .unwrap_or_default())
    }

    async fn add(&self, user_id: &str, symbol: &str, company: &str) -> Result<WatchlistEntry, StoreError> {
        let symbol = normalize_symbol(symbol)?;
        let mut list = self.entries.entry(user_id.to_string()).or_default();

        if list.iter().any(|e| e.symbol == symbol) {
            return Err(StoreError::AlreadyExists { symbol });
        }

        let entry = WatchlistEntry::new(user_id, symbol, company.trim());
        list.push(entry.clone());
        tracing::debug!("Added {} to watchlist of {}", entry.symbol, user_id);
        Ok(entry)
    }

    async fn remove(&self, user_id: &str, symbol: &str) -> Result<(), StoreError> {
        let symbol = normalize_symbol(symbol)?;
        let not_found = || StoreError::NotFound { symbol: symbol.clone() };

        {
            let mut list = self.entries.get_mut(user_id).ok_or_else(not_found)?;
            let index = list.iter().position(|e| e.symbol == symbol).ok_or_else(not_found)?;
            list.remove(index);
        }
        // Users with no symbols left hold no map entry
        self.entries.remove_if(user_id, |_, list| list.is_empty());
        tracing::debug!("Removed {} from watchlist of {}", symbol, user_id);
        Ok(())
    }

    async fn exists(&self, user_id: &str, symbol: &str) -> Result<bool, StoreError> {
        let symbol = normalize_symbol(symbol)?;
        Ok(self
            .entries
            .get(user_id)
            .map(|list| list.iter().any(|e| e.symbol == symbol))
            .unwrap_or(false))
    }
}
