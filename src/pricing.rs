use std::sync::Arc;
use std::time::Instant;

use crate::cache::{PriceCache, PriceMap};
use crate::error::{AppError, PriceFetchError};
use crate::metrics::{CACHE_HITS, CACHE_MISSES, CONVERSIONS, FETCH_LATENCY, UPSTREAM_FAILURES};
use crate::models::{ConversionQuery, ConversionResult, round_cents};
use crate::price_source::PriceSource;

/// Ties the price cache to its upstream. Concurrent refreshes are not
/// coalesced: each stale request fetches and the last write wins.
pub struct PriceService {
    cache: PriceCache,
    source: Arc<dyn PriceSource>,
}

impl PriceService {
    pub fn new(cache: PriceCache, source: Arc<dyn PriceSource>) -> Self {
        Self { cache, source }
    }

    pub fn cache(&self) -> &PriceCache {
        &self.cache
    }

    // Fetch from upstream and swap the cache on success
    pub async fn refresh(&self) -> Result<PriceMap, PriceFetchError> {
        let start_time = Instant::now();
        let result = self.source.fetch_prices().await;
        FETCH_LATENCY.observe(start_time.elapsed().as_secs_f64());

        match result {
            Ok(prices) => {
                self.cache.set_prices(prices.clone());
                Ok(prices)
            }
            Err(e) => {
                UPSTREAM_FAILURES.inc();
                tracing::error!("Failed to fetch crypto prices: {}", e);
                Err(e)
            }
        }
    }

    pub async fn current_prices(&self, force: bool) -> Result<PriceMap, AppError> {
        if !force && self.cache.is_fresh() {
            if let Some(prices) = self.cache.get_all_prices() {
                CACHE_HITS.inc();
                tracing::debug!("Crypto prices served from fresh cache");
                return Ok(prices);
            }
        }

        CACHE_MISSES.inc();
        self.refresh().await.map_err(|_| AppError::PriceUnavailable)
    }

    /// Converts into USD at the cached rate, refreshing once first if the
    /// cache is stale. A missing rate is an error, never a guess.
    pub async fn convert(&self, query: &ConversionQuery) -> Result<ConversionResult, AppError> {
        if !self.cache.is_fresh() {
            tracing::warn!("Price cache is stale, fetching fresh prices");
            CACHE_MISSES.inc();
            self.refresh()
                .await
                .map_err(|_| AppError::PriceUnavailable)?;
        } else {
            CACHE_HITS.inc();
        }

        let rate = self
            .cache
            .get_price(query.from.symbol())
            .ok_or(AppError::PriceUnavailable)?;

        let result = ConversionResult {
            original_amount: query.amount,
            from_currency: query.from.symbol().to_string(),
            to_currency: "USD".to_string(),
            converted_amount: round_cents(query.amount * rate),
            exchange_rate: round_cents(rate),
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        };

        CONVERSIONS.inc();
        tracing::info!(
            from = %query.from,
            amount = query.amount,
            converted = result.converted_amount,
            "Crypto conversion"
        );
        Ok(result)
    }
}
