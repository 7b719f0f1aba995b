mod cache;
mod clock;
mod config;
mod error;
mod handlers;
mod metrics;
mod models;
mod price_source;
mod pricing;
mod rate_limit;
mod state;

use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cache::PriceCache;
use crate::config::Args;
use crate::price_source::CoinGeckoSource;
use crate::pricing::PriceService;
use crate::rate_limit::{RateLimiter, sweeper};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nft_market_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // parse cli arguments
    let args = Args::parse();

    let source = CoinGeckoSource::new(
        reqwest::Client::new(),
        &args.coingecko_url,
        args.fetch_timeout(),
    );
    let api_limiter = Arc::new(RateLimiter::new("api", args.api_policy()));
    let strict_limiter = Arc::new(RateLimiter::new("strict", args.strict_policy()));

    // creating shared state
    let state = Arc::new(AppState {
        prices: PriceService::new(PriceCache::new(args.price_ttl()), Arc::new(source)),
        api_limiter: api_limiter.clone(),
        strict_limiter: strict_limiter.clone(),
    });

    // spawn the background sweeper
    let sweep_every = args.sweep_interval();
    tokio::spawn(async move {
        sweeper(vec![api_limiter, strict_limiter], sweep_every).await;
    });

    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Gateway running on http://localhost:{}", args.port);
    tracing::info!("Fetching prices from {}", args.coingecko_url);
    tracing::info!("Price cache TTL: {} seconds", args.price_ttl);
    tracing::info!(
        "API rate limit: {} requests per {} seconds",
        args.api_rate_limit,
        args.api_rate_window
    );
    tracing::info!(
        "Strict rate limit: {} requests per {} seconds",
        args.strict_rate_limit,
        args.strict_rate_window
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
