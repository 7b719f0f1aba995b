use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};

lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("market_requests_total", "Total number of API requests").unwrap();
    pub static ref RATE_LIMITED: Counter =
        register_counter!("market_rate_limited_total", "Requests rejected by a rate limiter").unwrap();
    pub static ref CACHE_HITS: Counter =
        register_counter!("market_price_cache_hits_total", "Price requests served from cache").unwrap();
    pub static ref CACHE_MISSES: Counter =
        register_counter!("market_price_cache_misses_total", "Price requests that needed a refetch").unwrap();
    pub static ref UPSTREAM_FAILURES: Counter =
        register_counter!("market_price_fetch_failures_total", "Failed upstream price fetches").unwrap();
    pub static ref CONVERSIONS: Counter =
        register_counter!("market_conversions_total", "Completed currency conversions").unwrap();
    pub static ref FETCH_LATENCY: Histogram = register_histogram!(
        "market_price_fetch_seconds",
        "Upstream price fetch latency in seconds"
    )
    .unwrap();
    pub static ref TRACKED_CLIENTS: Gauge =
        register_gauge!("market_rate_limit_clients", "Identifiers tracked across rate limiters").unwrap();
}
