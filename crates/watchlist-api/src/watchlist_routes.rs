//! Watchlist API Routes
//!
//! Per-user watchlist management. Listing attaches live market data.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use watchlist_core::EnrichedWatchlistItem;
use watchlist_store::{ActionFailure, ActionResult};

use crate::{ApiResponse, AppError, AppState};

#[derive(Deserialize)]
pub struct UserQuery {
    pub user_id: Option<String>,
}

#[derive(Deserialize)]
pub struct AddWatchlistRequest {
    #[serde(default)]
    pub user_id: String,
    pub symbol: String,
    pub company: Option<String>,
}

#[derive(Serialize)]
pub struct WatchlistResponse {
    pub items: Vec<EnrichedWatchlistItem>,
    pub count: usize,
}

#[derive(Serialize)]
pub struct WatchlistStatus {
    pub symbol: String,
    pub in_watchlist: bool,
}

pub fn watchlist_routes() -> Router<AppState> {
    Router::new()
        .route("/api/watchlist", get(get_watchlist))
        .route("/api/watchlist/symbols", get(get_watchlist_symbols))
        .route("/api/watchlist/items", post(add_to_watchlist))
        .route(
            "/api/watchlist/items/:symbol",
            get(get_watchlist_status).delete(remove_from_watchlist),
        )
}

fn require_user(query: &UserQuery) -> Result<&str, AppError> {
    query
        .user_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::with_status(StatusCode::UNAUTHORIZED, anyhow::anyhow!("User not authenticated")))
}

/// Map a failed action to its HTTP status, keeping the action's message
fn action_error(result: ActionResult) -> AppError {
    let status = match result.failure {
        Some(ActionFailure::Unauthenticated) => StatusCode::UNAUTHORIZED,
        Some(ActionFailure::AlreadyExists) => StatusCode::CONFLICT,
        Some(ActionFailure::NotFound) => StatusCode::NOT_FOUND,
        Some(ActionFailure::InvalidSymbol) => StatusCode::BAD_REQUEST,
        Some(ActionFailure::Failed) | None => StatusCode::INTERNAL_SERVER_ERROR,
    };
    AppError::with_status(status, anyhow::anyhow!(result.message))
}

/// Get the user's watchlist with market data attached
async fn get_watchlist(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<ApiResponse<WatchlistResponse>>, AppError> {
    let user_id = require_user(&query)?;

    let entries = state.watchlist.user_watchlist(user_id).await;
    let items = state.enricher.enrich(entries).await;

    Ok(Json(ApiResponse::success(WatchlistResponse {
        count: items.len(),
        items,
    })))
}

async fn get_watchlist_symbols(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<ApiResponse<Vec<String>>>, AppError> {
    let user_id = require_user(&query)?;
    Ok(Json(ApiResponse::success(state.watchlist.watchlist_symbols(user_id).await)))
}

/// Add symbol to watchlist
async fn add_to_watchlist(
    State(state): State<AppState>,
    Json(req): Json<AddWatchlistRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ActionResult>>), AppError> {
    // Company name falls back to the ticker when not supplied
    let company = req
        .company
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(req.symbol.trim());

    let result = state
        .watchlist
        .add_to_watchlist(&req.user_id, &req.symbol, company)
        .await;

    if result.success {
        Ok((StatusCode::CREATED, Json(ApiResponse::success(result))))
    } else {
        Err(action_error(result))
    }
}

/// Remove symbol from watchlist
async fn remove_from_watchlist(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<UserQuery>,
) -> Result<Json<ApiResponse<ActionResult>>, AppError> {
    let user_id = query.user_id.as_deref().unwrap_or_default();
    let result = state.watchlist.remove_from_watchlist(user_id, &symbol).await;

    if result.success {
        Ok(Json(ApiResponse::success(result)))
    } else {
        Err(action_error(result))
    }
}

async fn get_watchlist_status(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<UserQuery>,
) -> Result<Json<ApiResponse<WatchlistStatus>>, AppError> {
    let user_id = require_user(&query)?;
    let in_watchlist = state.watchlist.is_in_watchlist(user_id, &symbol).await;

    Ok(Json(ApiResponse::success(WatchlistStatus {
        symbol: symbol.trim().to_uppercase(),
        in_watchlist,
    })))
}

#[cfg(test)]
mod tests {
    use crate::{build_router, AppState};
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;
    use watchlist_core::{FetchError, FinancialsFacet, MarketDataSource, ProfileFacet, QuoteFacet};
    use watchlist_enricher::WatchlistEnricher;
    use watchlist_store::InMemoryWatchlistStore;

    struct StaticSource;

    #[async_trait]
    impl MarketDataSource for StaticSource {
        async fn quote(&self, symbol: &str) -> Result<QuoteFacet, FetchError> {
            if symbol == "DOWN" {
                return Err(FetchError::Status {
                    status: 503,
                    url: "https://provider.test/quote".to_string(),
                });
            }
            Ok(QuoteFacet {
                current_price: 189.5,
                change_percent: 1.25,
            })
        }

        async fn profile(&self, _symbol: &str) -> Result<ProfileFacet, FetchError> {
            Ok(ProfileFacet {
                market_capitalization: 2_500_000.0,
            })
        }

        async fn financials(&self, _symbol: &str) -> Result<FinancialsFacet, FetchError> {
            Ok(FinancialsFacet {
                pe_basic_excl_extra_ttm: Some(0.0),
                pe_normalized_annual: Some(9.0),
            })
        }
    }

    fn create_test_app(enricher: WatchlistEnricher) -> Router {
        build_router(AppState::new(InMemoryWatchlistStore::new(), enricher))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn add(app: &Router, user_id: &str, symbol: &str) -> (StatusCode, Value) {
        send(
            app,
            "POST",
            "/api/watchlist/items",
            Some(json!({"user_id": user_id, "symbol": symbol, "company": format!("{} Inc", symbol)})),
        )
        .await
    }

    #[tokio::test]
    async fn test_add_list_remove_round_trip() {
        let app = create_test_app(WatchlistEnricher::disabled());

        let (status, body) = add(&app, "alice", "aapl").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["message"], "Added to watchlist");

        let (status, body) = add(&app, "alice", "AAPL").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body, json!({"success": false, "error": "Stock already in watchlist"}));

        let (status, body) = send(&app, "GET", "/api/watchlist?user_id=alice", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["count"], 1);
        assert_eq!(body["data"]["items"][0]["symbol"], "AAPL");
        assert!(body["data"]["items"][0].get("priceFormatted").is_none());
        assert!(body["data"]["items"][0].get("changeDirection").is_none());

        let (status, body) = send(&app, "DELETE", "/api/watchlist/items/aapl?user_id=alice", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["message"], "Removed from watchlist");

        let (status, body) = send(&app, "DELETE", "/api/watchlist/items/AAPL?user_id=alice", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Stock not found in watchlist");
    }

    #[tokio::test]
    async fn test_list_is_enriched_in_order() {
        let app = create_test_app(WatchlistEnricher::with_source(Arc::new(StaticSource), 4));
        add(&app, "alice", "MSFT").await;
        add(&app, "alice", "DOWN").await;

        let (status, body) = send(&app, "GET", "/api/watchlist?user_id=alice", None).await;
        assert_eq!(status, StatusCode::OK);

        let items = body["data"]["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);

        assert_eq!(items[0]["symbol"], "MSFT");
        assert_eq!(items[0]["company"], "MSFT Inc");
        assert_eq!(items[0]["priceFormatted"], "$189.50");
        assert_eq!(items[0]["changeFormatted"], "+1.25%");
        assert_eq!(items[0]["marketCap"], "$2500.0B");
        assert_eq!(items[0]["peRatio"], "9.00");
        assert_eq!(items[0]["changeDirection"], "up");

        assert_eq!(items[1]["symbol"], "DOWN");
        assert_eq!(items[1]["priceFormatted"], "N/A");
        assert_eq!(items[1]["changeFormatted"], "N/A");
        assert_eq!(items[1]["marketCap"], "$2500.0B");
        assert_eq!(items[1]["changeDirection"], "flat");
    }

    #[tokio::test]
    async fn test_missing_identity_is_unauthorized() {
        let app = create_test_app(WatchlistEnricher::disabled());

        let (status, _) = send(&app, "GET", "/api/watchlist", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = add(&app, "", "AAPL").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "User not authenticated");

        let (status, _) = send(&app, "DELETE", "/api/watchlist/items/AAPL", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_invalid_symbol_is_bad_request() {
        let app = create_test_app(WatchlistEnricher::disabled());
        let (status, body) = add(&app, "alice", "   ").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_symbols_and_status() {
        let app = create_test_app(WatchlistEnricher::disabled());
        add(&app, "alice", "NVDA").await;
        add(&app, "alice", "AMD").await;
        add(&app, "bob", "TSLA").await;

        let (_, body) = send(&app, "GET", "/api/watchlist/symbols?user_id=alice", None).await;
        assert_eq!(body["data"], json!(["NVDA", "AMD"]));

        let (status, body) = send(&app, "GET", "/api/watchlist/items/nvda?user_id=alice", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!({"symbol": "NVDA", "in_watchlist": true}));

        let (_, body) = send(&app, "GET", "/api/watchlist/items/TSLA?user_id=alice", None).await;
        assert_eq!(body["data"]["in_watchlist"], false);
    }

    #[tokio::test]
    async fn test_health_reports_enrichment() {
        let (status, body) = send(&create_test_app(WatchlistEnricher::disabled()), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["enrichment_enabled"], false);

        let app = create_test_app(WatchlistEnricher::with_source(Arc::new(StaticSource), 2));
        let (_, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(body["data"]["enrichment_enabled"], true);
    }
}
