//! Reconciliation of facet results into display fields.
//!
//! Everything here is pure. Absent facets contribute zero, and zero (or a
//! negative value) renders as `N/A`.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use watchlist_core::{
    ChangeDirection, EnrichedWatchlistItem, FacetOutcome, FinancialsFacet, ProfileFacet, QuoteFacet, WatchlistEntry,
    NOT_AVAILABLE,
};

/// Combine the three settled facets for one entry
pub fn reconcile(
    entry: WatchlistEntry,
    quote: &FacetOutcome<QuoteFacet>,
    profile: &FacetOutcome<ProfileFacet>,
    financials: &FacetOutcome<FinancialsFacet>,
) -> EnrichedWatchlistItem {
    let current_price = quote.value().map(|q| finite_or_zero(q.current_price)).unwrap_or(0.0);
    let change_percent = quote.value().map(|q| finite_or_zero(q.change_percent)).unwrap_or(0.0);
    let market_cap = profile
        .value()
        .map(|p| finite_or_zero(p.market_capitalization))
        .unwrap_or(0.0);
    let pe_ratio = select_pe_ratio(financials.value());

    EnrichedWatchlistItem {
        entry,
        current_price: Some(current_price),
        change_percent: Some(change_percent),
        price_formatted: Some(format_price(current_price)),
        change_formatted: Some(format_change(change_percent)),
        market_cap: Some(format_market_cap(market_cap)),
        pe_ratio: Some(format_pe_ratio(pe_ratio)),
        change_direction: Some(ChangeDirection::from_change(change_percent)),
    }
}

/// Trailing basic P/E when positive, else normalized annual P/E when positive, else 0
pub fn select_pe_ratio(financials: Option<&FinancialsFacet>) -> f64 {
    let Some(f) = financials else {
        return 0.0;
    };
    [f.pe_basic_excl_extra_ttm, f.pe_normalized_annual]
        .into_iter()
        .flatten()
        .find(|pe| pe.is_finite() && *pe > 0.0)
        .unwrap_or(0.0)
}

pub fn format_price(current_price: f64) -> String {
    if current_price > 0.0 {
        format!("${}", round_to(current_price, 2))
    } else {
        NOT_AVAILABLE.to_string()
    }
}

/// A change of exactly 0% renders as N/A, the same as missing data
pub fn format_change(change_percent: f64) -> String {
    if change_percent != 0.0 {
        let sign = if change_percent > 0.0 { "+" } else { "" };
        format!("{}{}%", sign, round_to(change_percent, 2))
    } else {
        NOT_AVAILABLE.to_string()
    }
}

/// Market cap arrives in millions; display is in billions
pub fn format_market_cap(market_cap_millions: f64) -> String {
    if market_cap_millions > 0.0 {
        format!("${}B", round_to(market_cap_millions / 1000.0, 1))
    } else {
        NOT_AVAILABLE.to_string()
    }
}

pub fn format_pe_ratio(pe_ratio: f64) -> String {
    if pe_ratio > 0.0 {
        round_to(pe_ratio, 2)
    } else {
        NOT_AVAILABLE.to_string()
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Round half away from zero on the shortest decimal form of `value`,
/// so 12.345 becomes "12.35" even though its binary value is slightly below.
/// Negative inputs keep their sign even when they round to zero.
fn round_to(value: f64, dp: u32) -> String {
    let magnitude = match Decimal::from_str(&value.abs().to_string()) {
        Ok(d) => {
            let rounded = d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
            format!("{:.*}", dp as usize, rounded)
        }
        Err(_) => format!("{:.*}", dp as usize, value.abs()),
    };

    if value < 0.0 {
        format!("-{}", magnitude)
    } else {
        magnitude
    }
}
