use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::cache::PriceMap;
use crate::error::PriceFetchError;
use crate::models::Currency;

/// Upstream supplier of USD prices.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_prices(&self) -> Result<PriceMap, PriceFetchError>;
}

// CoinGecko simple/price quote
#[derive(Deserialize)]
struct Quote {
    usd: Option<f64>,
}

pub struct CoinGeckoSource {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl CoinGeckoSource {
    pub fn new(client: reqwest::Client, base_url: &str, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    fn url(&self) -> String {
        let ids: Vec<&str> = Currency::ALL.iter().map(|c| c.coingecko_id()).collect();
        format!(
            "{}/simple/price?ids={}&vs_currencies=usd",
            self.base_url,
            ids.join(",")
        )
    }
}

#[async_trait]
impl PriceSource for CoinGeckoSource {
    async fn fetch_prices(&self) -> Result<PriceMap, PriceFetchError> {
        let res = self
            .client
            .get(self.url())
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(self.timeout)
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(PriceFetchError::Status(res.status().as_u16()));
        }

        let quotes: HashMap<String, Quote> = res.json().await?;
        let prices = prices_from_quotes(&quotes);
        if prices.is_empty() {
            return Err(PriceFetchError::Empty);
        }

        tracing::info!(
            currencies = ?prices.keys().collect::<Vec<_>>(),
            "Fetched crypto prices from CoinGecko"
        );
        Ok(prices)
    }
}

// keeps only positive, finite quotes for currencies we know
fn prices_from_quotes(quotes: &HashMap<String, Quote>) -> PriceMap {
    let mut prices = PriceMap::new();
    for currency in Currency::ALL {
        let Some(usd) = quotes.get(currency.coingecko_id()).and_then(|q| q.usd) else {
            continue;
        };
        if usd.is_finite() && usd > 0.0 {
            prices.insert(currency.symbol().to_string(), usd);
        } else {
            tracing::warn!(currency = currency.symbol(), usd, "Ignoring unusable quote");
        }
    }
    prices
}
