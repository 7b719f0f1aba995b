use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::rate_limit::rate_limit_headers;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    // no fallback rate is ever substituted
    #[error("Price service unavailable")]
    PriceUnavailable,

    #[error("Rate limit exceeded")]
    RateLimited {
        message: String,
        retry_after_secs: u64,
        limit: u32,
        reset_time: i64,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PriceFetchError {
    #[error("price request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("price API returned {0}")]
    Status(u16),

    #[error("price API returned no usable quotes")]
    Empty,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            AppError::PriceUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": "Price service unavailable" })),
            )
                .into_response(),
            AppError::RateLimited {
                message,
                retry_after_secs,
                limit,
                reset_time,
            } => {
                let body = json!({
                    "error": "Rate limit exceeded",
                    "message": message,
                    "retryAfter": retry_after_secs,
                });
                let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
                let headers = response.headers_mut();
                headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
                rate_limit_headers(headers, limit, 0, reset_time);
                response
            }
            AppError::Internal(msg) => {
                // Log the real error, hide it from the client
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}
