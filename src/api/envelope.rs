//! Response envelope shared by the stock and chart endpoints.
//!
//! User-facing error strings are in Korean, the dashboard's locale. Log
//! lines carry the underlying English error for operators.

use crate::core::error::QuoteError;
use crate::core::quote::Quote;
use axum::Json;
use axum::http::StatusCode;
use serde::Serialize;
use tracing::warn;

pub const MSG_INVALID_KOREAN_SYMBOL: &str = "종목코드는 6자리 숫자여야 합니다";
pub const MSG_MISSING_QUERY: &str = "검색어를 입력해주세요";
pub const MSG_INVALID_RANGE: &str = "지원하지 않는 기간입니다 (1M, 3M, 6M, 1Y)";
pub const MSG_UPSTREAM_FAILURE: &str = "시세 조회에 실패했습니다. 잠시 후 다시 시도해주세요";

/// `{ success, data?, error? }` as the dashboard expects it.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        })
    }

    pub fn fail(message: impl Into<String>) -> Json<Self> {
        Json(ApiResponse {
            success: false,
            data: None,
            error: Some(message.into()),
        })
    }
}

/// Maps a failed lookup onto the HTTP status and localized message the
/// dashboard renders.
pub fn lookup_failure(err: QuoteError) -> (StatusCode, Json<ApiResponse<Quote>>) {
    warn!(error = %err, "Quote lookup failed");
    let (status, message) = match &err {
        QuoteError::InvalidSymbol(_) => (StatusCode::BAD_REQUEST, MSG_MISSING_QUERY.to_string()),
        QuoteError::NotFound(symbol) => (
            StatusCode::NOT_FOUND,
            format!("종목을 찾을 수 없습니다: {symbol}"),
        ),
        QuoteError::Upstream(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            MSG_UPSTREAM_FAILURE.to_string(),
        ),
    };
    (status, ApiResponse::fail(message))
}
