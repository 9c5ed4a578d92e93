use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;
use watchlist_core::{FetchError, FinancialsFacet, MarketDataSource, ProfileFacet, QuoteFacet};

use crate::fetcher::{CachedFetcher, RateLimiter};

pub const DEFAULT_BASE_URL: &str = "https://finnhub.io/api/v1";

#[derive(Debug, Clone)]
pub struct FinnhubConfig {
    pub api_key: String,
    pub base_url: String,
    /// Requests per minute; 60 matches the free tier
    pub rate_limit: usize,
    pub timeout: Duration,
    pub quote_ttl_secs: u64,
    pub profile_ttl_secs: u64,
    pub financials_ttl_secs: u64,
}

impl FinnhubConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            rate_limit: 60,
            timeout: Duration::from_secs(10),
            quote_ttl_secs: 300,
            profile_ttl_secs: 1800,
            financials_ttl_secs: 1800,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Clone)]
pub struct FinnhubClient {
    config: FinnhubConfig,
    fetcher: CachedFetcher,
}

impl FinnhubClient {
    pub fn new(config: FinnhubConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        let fetcher = CachedFetcher::new(client, RateLimiter::per_minute(config.rate_limit));
        Self::with_fetcher(config, fetcher)
    }

    /// Share an existing fetcher (and its cache) with this client
    pub fn with_fetcher(config: FinnhubConfig, fetcher: CachedFetcher) -> Self {
        Self { config, fetcher }
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<String, FetchError> {
        let base = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        let query = params
            .iter()
            .copied()
            .chain(std::iter::once(("token", self.config.api_key.as_str())));

        Url::parse_with_params(&base, query)
            .map(String::from)
            .map_err(|e| FetchError::Transport {
                url: base,
                message: e.to_string(),
            })
    }

    /// Get the latest quote
    pub async fn get_quote(&self, symbol: &str) -> Result<QuoteFacet, FetchError> {
        let url = self.endpoint("/quote", &[("symbol", symbol)])?;
        let quote: QuoteResponse = self.fetcher.fetch(&url, self.config.quote_ttl_secs).await?;

        Ok(QuoteFacet {
            current_price: quote.c.unwrap_or(0.0),
            change_percent: quote.dp.unwrap_or(0.0),
        })
    }

    /// Get company profile
    pub async fn get_profile(&self, symbol: &str) -> Result<ProfileFacet, FetchError> {
        let url = self.endpoint("/stock/profile2", &[("symbol", symbol)])?;
        let profile: ProfileResponse = self.fetcher.fetch(&url, self.config.profile_ttl_secs).await?;

        Ok(ProfileFacet {
            market_capitalization: profile.market_capitalization.unwrap_or(0.0),
        })
    }

    /// Get the basic financials metric bundle
    pub async fn get_financials(&self, symbol: &str) -> Result<FinancialsFacet, FetchError> {
        let url = self.endpoint("/stock/metric", &[("symbol", symbol), ("metric", "all")])?;
        let metrics: MetricResponse = self.fetcher.fetch(&url, self.config.financials_ttl_secs).await?;

        Ok(metrics.metric.unwrap_or_default())
    }
}

#[async_trait]
impl MarketDataSource for FinnhubClient {
    async fn quote(&self, symbol: &str) -> Result<QuoteFacet, FetchError> {
        self.get_quote(symbol).await
    }

    async fn profile(&self, symbol: &str) -> Result<ProfileFacet, FetchError> {
        self.get_profile(symbol).await
    }

    async fn financials(&self, symbol: &str) -> Result<FinancialsFacet, FetchError> {
        self.get_financials(symbol).await
    }
}

// Response types

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    c: Option<f64>,
    dp: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileResponse {
    market_capitalization: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct MetricResponse {
    metric: Option<FinancialsFacet>,
}
