use axum::Json;
use axum::extract::Query;
use axum::http::StatusCode;
use serde::Deserialize;

use crate::api::envelope::{ApiResponse, MSG_INVALID_RANGE, MSG_MISSING_QUERY};
use crate::core::chart::{ChartRange, ChartSeries, synthesize};

#[derive(Debug, Deserialize)]
pub struct ChartParams {
    symbol: Option<String>,
    range: Option<String>,
}

/// `GET /analytics/chart?symbol=AAPL&range=3M`. The series is synthesized,
/// so this never reaches upstream; bad input is the only failure mode.
pub async fn chart(Query(params): Query<ChartParams>) -> (StatusCode, Json<ApiResponse<ChartSeries>>) {
    let symbol = params.symbol.as_deref().unwrap_or("").trim();
    if symbol.is_empty() {
        return (StatusCode::BAD_REQUEST, ApiResponse::fail(MSG_MISSING_QUERY));
    }

    let range = match params.range.as_deref().unwrap_or("").parse::<ChartRange>() {
        Ok(range) => range,
        Err(_) => return (StatusCode::BAD_REQUEST, ApiResponse::fail(MSG_INVALID_RANGE)),
    };

    (StatusCode::OK, ApiResponse::ok(synthesize(symbol, range)))
}
