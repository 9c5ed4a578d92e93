pub mod config;
pub mod engine;
pub mod reconcile;

pub use config::EnrichmentConfig;
pub use engine::WatchlistEnricher;
pub use reconcile::{
    format_change, format_market_cap, format_pe_ratio, format_price, reconcile, select_pe_ratio,
};
