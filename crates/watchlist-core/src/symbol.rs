use crate::StoreError;

/// Trim and uppercase a ticker so `"aapl "` and `"AAPL"` share one identity.
pub fn normalize_symbol(symbol: &str) -> Result<String, StoreError> {
    let normalized = symbol.trim().to_uppercase();
    if normalized.is_empty() || normalized.chars().any(char::is_whitespace) {
        return Err(StoreError::InvalidSymbol(symbol.to_string()));
    }
    Ok(normalized)
}
