use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::FetchError;

/// Display value for any field the provider could not supply
pub const NOT_AVAILABLE: &str = "N/A";

/// A symbol tracked by a user, as owned by the watchlist store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistEntry {
    pub user_id: String,
    pub symbol: String,
    pub company: String,
    pub added_at: DateTime<Utc>,
}

impl WatchlistEntry {
    pub fn new(user_id: impl Into<String>, symbol: impl Into<String>, company: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            symbol: symbol.into(),
            company: company.into(),
            added_at: Utc::now(),
        }
    }
}

/// Point-in-time price and daily percent change
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteFacet {
    pub current_price: f64,
    pub change_percent: f64,
}

/// Company profile; market capitalization is reported in millions
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileFacet {
    pub market_capitalization: f64,
}

/// Valuation metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialsFacet {
    #[serde(rename = "peBasicExclExtraTTM")]
    pub pe_basic_excl_extra_ttm: Option<f64>,
    #[serde(rename = "peNormalizedAnnual")]
    pub pe_normalized_annual: Option<f64>,
}

/// Settled result of one facet fetch
#[derive(Debug, Clone, PartialEq)]
pub enum FacetOutcome<T> {
    Present(T),
    Absent { reason: String },
}

impl<T> FacetOutcome<T> {
    pub fn absent(reason: impl Into<String>) -> Self {
        FacetOutcome::Absent { reason: reason.into() }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            FacetOutcome::Present(value) => Some(value),
            FacetOutcome::Absent { .. } => None,
        }
    }
}

impl<T> From<Result<T, FetchError>> for FacetOutcome<T> {
    fn from(result: Result<T, FetchError>) -> Self {
        match result {
            Ok(value) => FacetOutcome::Present(value),
            Err(e) => FacetOutcome::absent(e.to_string()),
        }
    }
}

/// Direction of the daily move, used to colour the change column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeDirection {
    Up,
    Down,
    Flat,
}

impl ChangeDirection {
    pub fn from_change(change_percent: f64) -> Self {
        if change_percent > 0.0 {
            ChangeDirection::Up
        } else if change_percent < 0.0 {
            ChangeDirection::Down
        } else {
            ChangeDirection::Flat
        }
    }
}

/// Watchlist entry plus display-ready market data.
///
/// Recomputed on every request, never persisted. Optional fields are left
/// unset when enrichment was skipped; the formatted fields hold
/// [`NOT_AVAILABLE`] when enrichment ran but had no data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedWatchlistItem {
    #[serde(flatten)]
    pub entry: WatchlistEntry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_formatted: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_formatted: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pe_ratio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_direction: Option<ChangeDirection>,
}

impl EnrichedWatchlistItem {
    /// Pass-through projection with no market data attached
    pub fn unenriched(entry: WatchlistEntry) -> Self {
        Self {
            entry,
            current_price: None,
            change_percent: None,
            price_formatted: None,
            change_formatted: None,
            market_cap: None,
            pe_ratio: None,
            change_direction: None,
        }
    }

    /// Record for an item whose processing failed: every display field is N/A
    pub fn unavailable(entry: WatchlistEntry) -> Self {
        Self {
            entry,
            current_price: None,
            change_percent: None,
            price_formatted: Some(NOT_AVAILABLE.to_string()),
            change_formatted: Some(NOT_AVAILABLE.to_string()),
            market_cap: Some(NOT_AVAILABLE.to_string()),
            pe_ratio: Some(NOT_AVAILABLE.to_string()),
            change_direction: Some(ChangeDirection::Flat),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.entry.symbol
    }

    pub fn is_enriched(&self) -> bool {
        self.price_formatted.is_some()
    }
}
