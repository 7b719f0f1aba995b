use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use super::{ClientId, check_rate_limit};
use crate::error::AppError;
use crate::metrics::REQUEST_TOTAL;
use crate::models::ConvertRequest;
use crate::rate_limit::rate_limit_headers;
use crate::state::AppState;

// POST /api/crypto/convert
pub async fn convert_handler(
    State(state): State<Arc<AppState>>,
    ClientId(client): ClientId,
    body: Bytes,
) -> Result<Response, AppError> {
    REQUEST_TOTAL.inc();

    // bad input is rejected before it can touch the quota or the cache
    let query = ConvertRequest::parse(&body)?;
    let decision = check_rate_limit(&state.strict_limiter, &client)?;

    let result = state.prices.convert(&query).await?;

    let mut response = Json(result).into_response();
    rate_limit_headers(
        response.headers_mut(),
        state.strict_limiter.limit(),
        decision.remaining,
        decision.reset_time,
    );
    Ok(response)
}
