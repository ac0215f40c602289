use crate::api::AppState;
use crate::core::market::MarketOverview;
use axum::Json;
use axum::extract::State;

/// `GET /market/data`. Always 200: the service degrades to stale or
/// synthesized snapshots instead of failing.
pub async fn market_data(State(state): State<AppState>) -> Json<MarketOverview> {
    Json(state.market.overview().await)
}
