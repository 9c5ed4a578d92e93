use finnhub_client::FinnhubClient;
use futures_util::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use watchlist_core::{
    EnrichedWatchlistItem, EnrichmentError, FacetOutcome, FetchError, MarketDataSource, WatchlistEntry,
};

use crate::config::EnrichmentConfig;
use crate::reconcile::reconcile;

/// Attaches live quote, profile and valuation data to watchlist entries.
///
/// Every entry is enriched in its own task and the three facets of an entry
/// are fetched together. A failed facet only blanks the fields it feeds; a
/// failed task yields an all-`N/A` row. Output order always matches input.
pub struct WatchlistEnricher {
    source: Option<Arc<dyn MarketDataSource>>,
    limiter: Arc<Semaphore>,
}

impl WatchlistEnricher {
    pub fn new(config: &EnrichmentConfig) -> Self {
        match config.finnhub_config() {
            Some(finnhub) => {
                tracing::info!(
                    "Watchlist enrichment enabled (max {} concurrent items)",
                    config.max_concurrency
                );
                Self::with_source(Arc::new(FinnhubClient::new(finnhub)), config.max_concurrency)
            }
            None => {
                tracing::warn!("FINNHUB_API_KEY not set - watchlist enrichment disabled");
                Self::disabled()
            }
        }
    }

    pub fn with_source(source: Arc<dyn MarketDataSource>, max_concurrency: usize) -> Self {
        Self {
            source: Some(source),
            limiter: Arc::new(Semaphore::new(max_concurrency.max(1))),
        }
    }

    /// Enricher with no provider; entries pass through untouched
    pub fn disabled() -> Self {
        Self {
            source: None,
            limiter: Arc::new(Semaphore::new(1)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.source.is_some()
    }

    /// Enrich every entry. Never fails and never drops an entry.
    pub async fn enrich(&self, items: Vec<WatchlistEntry>) -> Vec<EnrichedWatchlistItem> {
        let Some(source) = &self.source else {
            return items.into_iter().map(EnrichedWatchlistItem::unenriched).collect();
        };
        if items.is_empty() {
            return Vec::new();
        }

        tracing::info!("Enriching {} watchlist items", items.len());

        let handles: Vec<_> = items
            .iter()
            .cloned()
            .map(|entry| {
                let source = Arc::clone(source);
                let limiter = Arc::clone(&self.limiter);
                tokio::spawn(async move {
                    let _permit = limiter.acquire_owned().await.ok();
                    enrich_item(source.as_ref(), entry).await
                })
            })
            .collect();

        // join_all keeps input order regardless of completion order
        let results = join_all(handles).await;

        items
            .into_iter()
            .zip(results)
            .map(|(entry, result)| match result {
                Ok(item) => item,
                Err(join_error) => {
                    let err = EnrichmentError::TaskFailed {
                        symbol: entry.symbol.clone(),
                        message: join_error.to_string(),
                    };
                    tracing::error!("Error enriching data for {}: {}", entry.symbol, err);
                    EnrichedWatchlistItem::unavailable(entry)
                }
            })
            .collect()
    }
}

async fn enrich_item(source: &dyn MarketDataSource, entry: WatchlistEntry) -> EnrichedWatchlistItem {
    let symbol = entry.symbol.as_str();

    let (quote, profile, financials) = tokio::join!(
        source.quote(symbol),
        source.profile(symbol),
        source.financials(symbol),
    );

    let quote = settle("quote", symbol, quote);
    let profile = settle("profile", symbol, profile);
    let financials = settle("financials", symbol, financials);

    reconcile(entry, &quote, &profile, &financials)
}

fn settle<T>(facet: &str, symbol: &str, result: Result<T, FetchError>) -> FacetOutcome<T> {
    if let Err(e) = &result {
        tracing::debug!("No {} data for {}: {}", facet, symbol, e);
    }
    FacetOutcome::from(result)
}
