//! Watchlist actions for an identified user.
//!
//! Mutations never return an error to the caller. They report a
//! human-readable message instead and log the underlying store failure.

use serde::Serialize;
use watchlist_core::{StoreError, WatchlistEntry, WatchlistStore};

/// Why an action did not succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionFailure {
    Unauthenticated,
    AlreadyExists,
    NotFound,
    InvalidSymbol,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
    #[serde(skip)]
    pub failure: Option<ActionFailure>,
}

impl ActionResult {
    fn ok(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            failure: None,
        }
    }

    fn failed(failure: ActionFailure, message: &str) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            failure: Some(failure),
        }
    }
}

const NOT_AUTHENTICATED: &str = "User not authenticated";

pub struct WatchlistService<S> {
    store: S,
}

impl<S: WatchlistStore> WatchlistService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn add_to_watchlist(&self, user_id: &str, symbol: &str, company: &str) -> ActionResult {
        let Some(user_id) = identity(user_id) else {
            return ActionResult::failed(ActionFailure::Unauthenticated, NOT_AUTHENTICATED);
        };

        match self.store.add(user_id, symbol, company).await {
            Ok(entry) => {
                tracing::info!("{} added {} to watchlist", user_id, entry.symbol);
                ActionResult::ok("Added to watchlist")
            }
            Err(StoreError::AlreadyExists { .. }) => {
                ActionResult::failed(ActionFailure::AlreadyExists, "Stock already in watchlist")
            }
            Err(StoreError::InvalidSymbol(raw)) => {
                tracing::warn!("Rejected watchlist symbol {:?} for {}", raw, user_id);
                ActionResult::failed(ActionFailure::InvalidSymbol, "Failed to add to watchlist")
            }
            Err(e) => {
                tracing::error!("Error adding to watchlist: {}", e);
                ActionResult::failed(ActionFailure::Failed, "Failed to add to watchlist")
            }
        }
    }

    pub async fn remove_from_watchlist(&self, user_id: &str, symbol: &str) -> ActionResult {
        let Some(user_id) = identity(user_id) else {
            return ActionResult::failed(ActionFailure::Unauthenticated, NOT_AUTHENTICATED);
        };

        match self.store.remove(user_id, symbol).await {
            Ok(()) => {
                tracing::info!("{} removed {} from watchlist", user_id, symbol);
                ActionResult::ok("Removed from watchlist")
            }
            Err(StoreError::NotFound { .. }) => {
                ActionResult::failed(ActionFailure::NotFound, "Stock not found in watchlist")
            }
            Err(StoreError::InvalidSymbol(_)) => {
                ActionResult::failed(ActionFailure::InvalidSymbol, "Failed to remove from watchlist")
            }
            Err(e) => {
                tracing::error!("Error removing from watchlist: {}", e);
                ActionResult::failed(ActionFailure::Failed, "Failed to remove from watchlist")
            }
        }
    }

    /// The user's entries, or empty when unidentified or the store fails
    pub async fn user_watchlist(&self, user_id: &str) -> Vec<WatchlistEntry> {
        let Some(user_id) = identity(user_id) else {
            return Vec::new();
        };
        self.store.list(user_id).await.unwrap_or_else(|e| {
            tracing::error!("Error fetching watchlist: {}", e);
            Vec::new()
        })
    }

    pub async fn watchlist_symbols(&self, user_id: &str) -> Vec<String> {
        let Some(user_id) = identity(user_id) else {
            return Vec::new();
        };
        self.store.symbols(user_id).await.unwrap_or_else(|e| {
            tracing::error!("Error fetching watchlist symbols: {}", e);
            Vec::new()
        })
    }

    pub async fn is_in_watchlist(&self, user_id: &str, symbol: &str) -> bool {
        let Some(user_id) = identity(user_id) else {
            return false;
        };
        self.store.exists(user_id, symbol).await.unwrap_or_else(|e| {
            tracing::error!("Error checking watchlist status: {}", e);
            false
        })
    }
}

fn identity(user_id: &str) -> Option<&str> {
    let trimmed = user_id.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
