use anyhow::{Context, Result};
use finnhub_client::{FinnhubConfig, DEFAULT_BASE_URL};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct EnrichmentConfig {
    // Provider credential; enrichment is skipped when absent
    pub api_key: Option<String>,
    pub base_url: String,
    pub rate_limit: usize,           // requests per minute
    pub timeout_secs: u64,           // per HTTP request
    pub max_concurrency: usize,      // items enriched at once

    // Cache lifetimes per facet
    pub quote_ttl_secs: u64,
    pub profile_ttl_secs: u64,
    pub financials_ttl_secs: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            rate_limit: 60,
            timeout_secs: 10,
            max_concurrency: 16,
            quote_ttl_secs: 300,
            profile_ttl_secs: 1800,
            financials_ttl_secs: 1800,
        }
    }
}

impl EnrichmentConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; unset or blank variables keep their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let api_key = lookup("FINNHUB_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        let config = Self {
            api_key,
            base_url: lookup("FINNHUB_BASE_URL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.base_url),
            rate_limit: parse_var(&lookup, "FINNHUB_RATE_LIMIT", defaults.rate_limit)?,
            timeout_secs: parse_var(&lookup, "FINNHUB_TIMEOUT_SECS", defaults.timeout_secs)?,
            max_concurrency: parse_var(&lookup, "ENRICH_MAX_CONCURRENCY", defaults.max_concurrency)?,
            quote_ttl_secs: parse_var(&lookup, "QUOTE_TTL_SECS", defaults.quote_ttl_secs)?,
            profile_ttl_secs: parse_var(&lookup, "PROFILE_TTL_SECS", defaults.profile_ttl_secs)?,
            financials_ttl_secs: parse_var(&lookup, "FINANCIALS_TTL_SECS", defaults.financials_ttl_secs)?,
        };

        if config.max_concurrency == 0 {
            anyhow::bail!("ENRICH_MAX_CONCURRENCY must be at least 1");
        }

        Ok(config)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Provider settings, or `None` when no credential is configured
    pub fn finnhub_config(&self) -> Option<FinnhubConfig> {
        let api_key = self.api_key.as_deref()?;
        let mut config = FinnhubConfig::new(api_key).with_base_url(self.base_url.clone());
        config.rate_limit = self.rate_limit;
        config.timeout = Duration::from_secs(self.timeout_secs);
        config.quote_ttl_secs = self.quote_ttl_secs;
        config.profile_ttl_secs = self.profile_ttl_secs;
        config.financials_ttl_secs = self.financials_ttl_secs;
        Some(config)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", name, raw)),
        _ => Ok(default),
    }
}
