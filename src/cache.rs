use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::{Clock, SystemClock};

// symbol -> USD price
pub type PriceMap = BTreeMap<String, f64>;

pub const DEFAULT_PRICE_TTL: Duration = Duration::from_secs(60);

// Cache entry with timestamp
#[derive(Clone)]
pub struct PriceCacheEntry {
    pub data: PriceMap,
    pub timestamp: i64,
}

/// Last fetched set of prices plus a staleness check. Never fetches on its
/// own; callers decide when to refresh.
pub struct PriceCache {
    entry: RwLock<Option<PriceCacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl PriceCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entry: RwLock::new(None),
            ttl,
            clock,
        }
    }

    pub fn set_prices(&self, prices: PriceMap) {
        let entry = PriceCacheEntry {
            data: prices,
            timestamp: self.clock.now_millis(),
        };
        *self.entry.write() = Some(entry);
    }

    pub fn get_all_prices(&self) -> Option<PriceMap> {
        self.entry.read().as_ref().map(|e| e.data.clone())
    }

    pub fn get_price(&self, symbol: &str) -> Option<f64> {
        let symbol = symbol.to_uppercase();
        self.entry
            .read()
            .as_ref()
            .and_then(|e| e.data.get(&symbol).copied())
    }

    pub fn is_fresh(&self) -> bool {
        match self.entry.read().as_ref() {
            Some(e) => self.clock.now_millis() - e.timestamp < self.ttl.as_millis() as i64,
            None => false,
        }
    }
}
