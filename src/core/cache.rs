use crate::core::clock::Clock;
use crate::core::currency::{ExchangeRateSet, RateSource};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

pub const DEFAULT_RATE_TTL: Duration = Duration::from_secs(5 * 60);

struct CacheEntry {
    rates: ExchangeRateSet,
    stored_at: DateTime<Utc>,
}

/// Single-slot cache in front of a [`RateSource`].
///
/// The slot stays locked while a refresh is in flight, so callers that miss
/// at the same time wait for one fetch instead of issuing their own.
pub struct RateCache {
    source: Arc<dyn RateSource>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    slot: Mutex<Option<CacheEntry>>,
}

impl RateCache {
    pub fn new(source: Arc<dyn RateSource>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            source,
            clock,
            ttl,
            slot: Mutex::new(None),
        }
    }

    pub async fn get_rates(&self) -> ExchangeRateSet {
        let mut slot = self.slot.lock().await;
        let now = self.clock.now();

        if let Some(entry) = slot.as_ref() {
            // A clock that moved backwards keeps the entry fresh.
            let fresh = (now - entry.stored_at)
                .to_std()
                .map_or(true, |age| age < self.ttl);
            if fresh {
                debug!("Cache HIT for exchange rates");
                return entry.rates.clone();
            }
            debug!("Cache entry expired for exchange rates");
        } else {
            debug!("Cache MISS for exchange rates");
        }

        let rates = self.source.fetch_rates().await;
        *slot = Some(CacheEntry {
            rates: rates.clone(),
            stored_at: now,
        });
        debug!("Cache PUT for exchange rates");
        rates
    }
}
