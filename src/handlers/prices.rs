use axum::Json;
use axum::extract::{Query, State};
use std::sync::Arc;

use crate::cache::PriceMap;
use crate::error::AppError;
use crate::metrics::REQUEST_TOTAL;
use crate::models::PricesQuery;
use crate::state::AppState;

// GET /api/crypto/prices[?force=true]
pub async fn prices_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PricesQuery>,
) -> Result<Json<PriceMap>, AppError> {
    REQUEST_TOTAL.inc();

    let prices = state.prices.current_prices(query.force_refresh()).await?;
    Ok(Json(prices))
}
