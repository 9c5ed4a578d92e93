use thiserror::Error;

/// Failure of a single cached provider fetch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Decode error for {url}: {message}")]
    Decode { url: String, message: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{symbol} is already in the watchlist")]
    AlreadyExists { symbol: String },

    #[error("{symbol} is not in the watchlist")]
    NotFound { symbol: String },

    #[error("Invalid symbol: {0:?}")]
    InvalidSymbol(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Unexpected failure while enriching one watchlist item.
#[derive(Error, Debug)]
pub enum EnrichmentError {
    #[error("Enrichment task for {symbol} failed: {message}")]
    TaskFailed { symbol: String, message: String },
}
