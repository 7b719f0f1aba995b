use std::sync::Arc;
use crate::pricing::PriceService;
use crate::rate_limit::RateLimiter;

// app's shared state, built once in main and handed to every handler
pub struct AppState {
    pub prices: PriceService,
    pub api_limiter: Arc<RateLimiter>,    // general API traffic
    pub strict_limiter: Arc<RateLimiter>, // conversions
}
