use dashmap::DashMap;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use watchlist_core::FetchError;

/// Sliding-window rate limiter: at most `max_requests` per `window` duration.
/// A limit of zero disables throttling.
#[derive(Clone)]
pub struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests,
            window,
        }
    }

    pub fn per_minute(max_requests: usize) -> Self {
        Self::new(max_requests, Duration::from_secs(60))
    }

    pub async fn acquire(&self) {
        if self.max_requests == 0 {
            return;
        }

        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            // Remove timestamps outside the window
            while let Some(&front) = ts.front() {
                if now.duration_since(front) >= self.window {
                    ts.pop_front();
                } else {
                    break;
                }
            }

            if ts.len() < self.max_requests {
                ts.push_back(now);
                return;
            }

            // Wait until the oldest request falls out of the window
            let sleep_dur = match ts.front() {
                Some(&oldest) => (oldest + self.window).duration_since(now) + Duration::from_millis(50),
                None => continue,
            };
            drop(ts);
            tracing::debug!("Rate limiter: waiting {:.1}s for Finnhub API slot", sleep_dur.as_secs_f64());
            tokio::time::sleep(sleep_dur).await;
        }
    }
}

struct CacheEntry {
    body: Value,
    expires_at: Instant,
}

/// Default spacing between sweeps of expired cache entries
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// HTTP GET with a per-call time-to-live cache.
///
/// Cheap to clone; clones share the cache and the rate limiter. Concurrent
/// misses for the same key are not coalesced, each one goes to the network.
/// Expired entries are swept on insert at most once per sweep interval, so
/// keys that are never requested again do not accumulate.
#[derive(Clone)]
pub struct CachedFetcher {
    client: Client,
    cache: Arc<DashMap<String, CacheEntry>>,
    rate_limiter: RateLimiter,
    max_retries: u32,
    retry_wait: Duration,
    created_at: Instant,
    last_sweep_ms: Arc<AtomicU64>,
    sweep_interval: Duration,
}

impl CachedFetcher {
    pub fn new(client: Client, rate_limiter: RateLimiter) -> Self {
        Self {
            client,
            cache: Arc::new(DashMap::new()),
            rate_limiter,
            max_retries: 2,
            retry_wait: Duration::from_secs(15),
            created_at: Instant::now(),
            last_sweep_ms: Arc::new(AtomicU64::new(0)),
            sweep_interval: SWEEP_INTERVAL,
        }
    }

    /// Override how often expired entries are swept
    pub fn with_sweep_interval(mut self, sweep_interval: Duration) -> Self {
        self.sweep_interval = sweep_interval;
        self
    }

    /// Override how 429 responses are retried
    pub fn with_retry(mut self, max_retries: u32, retry_wait: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_wait = retry_wait;
        self
    }

    /// Fetch `url` and decode it as `T`, reusing a cached body younger than `ttl_secs`.
    ///
    /// Malformed bodies are never cached. A TTL of zero always goes to the network.
    pub async fn fetch<T: DeserializeOwned>(&self, url: &str, ttl_secs: u64) -> Result<T, FetchError> {
        let key = cache_key(url, ttl_secs);

        if let Some(body) = self.cached(&key) {
            return decode(url, body);
        }

        let body = self.get_json(url).await?;
        let value = decode(url, body.clone())?;

        if ttl_secs > 0 {
            self.sweep_if_due();
            self.cache.insert(
                key,
                CacheEntry {
                    body,
                    expires_at: Instant::now() + Duration::from_secs(ttl_secs),
                },
            );
        }

        Ok(value)
    }

    fn cached(&self, key: &str) -> Option<Value> {
        let now = Instant::now();
        if let Some(entry) = self.cache.get(key) {
            if entry.expires_at > now {
                return Some(entry.body.clone());
            }
        }
        self.cache.remove_if(key, |_, entry| entry.expires_at <= now);
        None
    }

    /// Send a GET with rate limiting and automatic 429 retry.
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        let safe_url = redact_url(url);

        for attempt in 0..=self.max_retries {
            self.rate_limiter.acquire().await;

            let response = self.client.get(url).send().await.map_err(|e| FetchError::Transport {
                url: safe_url.clone(),
                message: e.without_url().to_string(),
            })?;

            let status = response.status();
            if status.as_u16() == 429 && attempt < self.max_retries {
                tracing::warn!(
                    "Finnhub 429 rate limited, waiting {}s before retry {}/{}",
                    self.retry_wait.as_secs(),
                    attempt + 1,
                    self.max_retries
                );
                tokio::time::sleep(self.retry_wait).await;
                continue;
            }

            if !status.is_success() {
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    url: safe_url,
                });
            }

            let bytes = response.bytes().await.map_err(|e| FetchError::Transport {
                url: safe_url.clone(),
                message: e.without_url().to_string(),
            })?;

            return serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode {
                url: safe_url,
                message: e.to_string(),
            });
        }

        Err(FetchError::Status { status: 429, url: safe_url })
    }

    /// Drop every expired entry
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.cache.retain(|_, entry| entry.expires_at > now);
    }

    fn sweep_if_due(&self) {
        let now_ms = self.created_at.elapsed().as_millis() as u64;
        let last = self.last_sweep_ms.load(Ordering::Acquire);
        if now_ms.saturating_sub(last) < self.sweep_interval.as_millis() as u64 {
            return;
        }
        // Only one caller per interval performs the sweep
        if self
            .last_sweep_ms
            .compare_exchange(last, now_ms, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let before = self.cache.len();
        self.purge_expired();
        let removed = before.saturating_sub(self.cache.len());
        if removed > 0 {
            tracing::debug!("Swept {} expired Finnhub cache entries", removed);
        }
    }

    /// Number of cached entries, including expired ones not yet purged
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

fn cache_key(url: &str, ttl_secs: u64) -> String {
    format!("{}|{}", ttl_secs, url)
}

fn decode<T: DeserializeOwned>(url: &str, body: Value) -> Result<T, FetchError> {
    serde_json::from_value(body).map_err(|e| FetchError::Decode {
        url: redact_url(url),
        message: e.to_string(),
    })
}

/// Mask the `token` query parameter so URLs are safe to log
pub fn redact_url(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };

    if !parsed.query_pairs().any(|(k, _)| k == "token") {
        return parsed.to_string();
    }

    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "token" { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    parsed.query_pairs_mut().clear().extend_pairs(pairs);
    parsed.to_string()
}
