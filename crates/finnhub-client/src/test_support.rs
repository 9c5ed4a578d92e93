//! Local stand-in for the Finnhub REST API.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct ProviderStub {
    pub quote_hits: Arc<AtomicUsize>,
    pub throttled_hits: Arc<AtomicUsize>,
    pub last_query: Arc<Mutex<HashMap<String, String>>>,
}

type Params = Query<HashMap<String, String>>;

fn symbol_of(params: &HashMap<String, String>) -> &str {
    params.get("symbol").map(String::as_str).unwrap_or_default()
}

async fn quote(State(stub): State<ProviderStub>, Query(params): Params) -> impl IntoResponse {
    stub.quote_hits.fetch_add(1, Ordering::SeqCst);
    if let Ok(mut last) = stub.last_query.lock() {
        *last = params.clone();
    }
    match symbol_of(&params) {
        "DOWN" => (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"error": "down"}))),
        "NULLS" => (StatusCode::OK, Json(json!({"c": 0, "d": null, "dp": null}))),
        _ => (StatusCode::OK, Json(json!({"c": 189.5, "d": 2.3, "dp": 1.25, "h": 190.1, "l": 187.0}))),
    }
}

async fn profile(Query(params): Params) -> impl IntoResponse {
    match symbol_of(&params) {
        "NULLS" => Json(json!({})),
        _ => Json(json!({"name": "Apple Inc", "marketCapitalization": 2_500_000.0})),
    }
}

async fn metric(Query(params): Params) -> impl IntoResponse {
    match symbol_of(&params) {
        "NULLS" => Json(json!({"metric": {}, "metricType": "all"})),
        _ => Json(json!({
            "metric": {"peBasicExclExtraTTM": 12.345, "peNormalizedAnnual": 9.0, "beta": 1.2},
            "metricType": "all"
        })),
    }
}

async fn throttled(State(stub): State<ProviderStub>) -> StatusCode {
    stub.throttled_hits.fetch_add(1, Ordering::SeqCst);
    StatusCode::TOO_MANY_REQUESTS
}

/// Serve the stub on an ephemeral port and return its base URL
pub async fn spawn_provider(stub: ProviderStub) -> String {
    let app = Router::new()
        .route("/quote", get(quote))
        .route("/stock/profile2", get(profile))
        .route("/stock/metric", get(metric))
        .route("/broken", get(|| async { "definitely not json" }))
        .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
        .route("/throttled", get(throttled))
        .with_state(stub);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}
