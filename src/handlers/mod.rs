mod client;
mod convert;
mod health;
mod limit;
mod metrics;
mod prices;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub use client::{ClientId, client_ip_handler};
pub use convert::convert_handler;
pub use health::health_handler;
pub use limit::{check_rate_limit, enforce_rate_limit};
pub use metrics::metrics_handler;
pub use prices::prices_handler;

pub fn router(state: Arc<AppState>) -> Router {
    // routes behind the general API limiter
    let limited = Router::new()
        .route("/api/crypto/prices", get(prices_handler))
        .route("/api/client-ip", get(client_ip_handler))
        .route_layer(from_fn_with_state(
            state.api_limiter.clone(),
            enforce_rate_limit,
        ));

    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/crypto/convert", post(convert_handler)) // checks the strict limiter itself
        .merge(limited)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
