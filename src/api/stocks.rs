use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;

use crate::api::AppState;
use crate::api::envelope::{
    ApiResponse, MSG_INVALID_KOREAN_SYMBOL, MSG_MISSING_QUERY, lookup_failure,
};
use crate::core::quote::{Quote, SymbolLookup, is_korean_code};

#[derive(Debug, Deserialize)]
pub struct KoreanParams {
    symbol: Option<String>,
}

/// `GET /stock/korean?symbol=005930`. Rejects anything that is not exactly
/// six digits before touching the network; the `.KS`/`.KQ` suffix fallback
/// happens inside the provider.
pub async fn korean_stock(
    State(state): State<AppState>,
    Query(params): Query<KoreanParams>,
) -> (StatusCode, Json<ApiResponse<Quote>>) {
    let symbol = params.symbol.unwrap_or_default();
    let symbol = symbol.trim();
    if !is_korean_code(symbol) {
        return (
            StatusCode::BAD_REQUEST,
            ApiResponse::fail(MSG_INVALID_KOREAN_SYMBOL),
        );
    }
    resolve(&state, SymbolLookup::Korean(symbol.to_string())).await
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    query: Option<String>,
}

/// `GET /stock/search?query=AAPL`. Six digits dispatches to the Korean
/// path, anything else to the global one.
pub async fn search_query(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> (StatusCode, Json<ApiResponse<Quote>>) {
    lookup_symbol(&state, params.query.as_deref().unwrap_or_default()).await
}

/// `GET /stock/search/{symbol}`, same dispatch as the query form.
pub async fn search_path(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> (StatusCode, Json<ApiResponse<Quote>>) {
    lookup_symbol(&state, &symbol).await
}

async fn lookup_symbol(state: &AppState, raw: &str) -> (StatusCode, Json<ApiResponse<Quote>>) {
    match SymbolLookup::parse(raw) {
        Ok(lookup) => resolve(state, lookup).await,
        Err(_) => (StatusCode::BAD_REQUEST, ApiResponse::fail(MSG_MISSING_QUERY)),
    }
}

async fn resolve(state: &AppState, lookup: SymbolLookup) -> (StatusCode, Json<ApiResponse<Quote>>) {
    match state.quotes.fetch_quote(&lookup).await {
        Ok(quote) => (StatusCode::OK, ApiResponse::ok(quote)),
        Err(err) => lookup_failure(err),
    }
}
