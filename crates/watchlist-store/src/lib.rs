//! Watchlist Store
//!
//! Per-user symbol lists plus the action layer that turns store results
//! into user-facing `{success, message}` outcomes.

pub mod memory;
pub mod service;

pub use memory::InMemoryWatchlistStore;
pub use service::{ActionFailure, ActionResult, WatchlistService};
