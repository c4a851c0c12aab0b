//! Request-keyed TTL cache for normalized upstream responses.
//!
//! One store instance is created at startup and shared by every request
//! handler. Entries are immutable once written; a re-fetch after expiry
//! inserts a brand-new entry. Both successful payloads and upstream-caused
//! failures are stored so repeated failing requests don't hammer the
//! provider.

use crate::models::{Interval, MarketOutcome, Period};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Whether a request asks for a point quote or a history series.
///
/// Part of the cache key: a quote and a history query for the same
/// (symbol, period, interval) triple are distinct requests and must never
/// alias each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Quote,
    History,
}

/// Composite key identifying one logical request.
///
/// An exact record, not a hash digest: two logically identical requests
/// always produce an equal key and distinct requests can never collide
/// through delimiter ambiguity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Upstream symbol after asset-class formatting (always uppercase)
    pub symbol: String,
    pub period: Period,
    pub interval: Interval,
    pub kind: QueryKind,
}

struct CacheEntry {
    outcome: MarketOutcome,
    inserted_at: Instant,
}

struct CacheInner {
    entries: HashMap<CacheKey, CacheEntry>,
    /// Keys in insertion order, oldest first. Kept in sync with `entries`.
    order: VecDeque<CacheKey>,
}

/// Counters exposed by the health endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Bounded, time-expiring map from [`CacheKey`] to a previously computed
/// response.
///
/// An entry is readable only while `now - inserted_at < ttl`; an expired
/// entry is indistinguishable from an absent one. When the store is full,
/// inserting a new key evicts the oldest-inserted entry.
pub struct CacheStore {
    max_size: usize,
    ttl: Duration,
    inner: RwLock<CacheInner>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheStore {
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            max_size,
            ttl,
            inner: RwLock::new(CacheInner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up a fresh entry. Returns `None` for absent and expired entries
    /// alike; callers re-fetch in either case.
    pub async fn get(&self, key: &CacheKey) -> Option<MarketOutcome> {
        let inner = self.inner.read().await;
        let fresh = inner
            .entries
            .get(key)
            .filter(|entry| entry.inserted_at.elapsed() < self.ttl)
            .map(|entry| entry.outcome.clone());

        match fresh {
            Some(outcome) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(symbol = %key.symbol, "Cache hit");
                Some(outcome)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Insert or overwrite an entry, stamped with the current time.
    ///
    /// Expired entries are dropped first; if the store is still full and the
    /// key is new, the oldest-inserted entry is evicted silently.
    pub async fn put(&self, key: CacheKey, outcome: MarketOutcome) {
        let mut inner = self.inner.write().await;

        if inner.entries.contains_key(&key) {
            // Overwrite counts as a fresh insertion for eviction order
            inner.order.retain(|k| k != &key);
        } else {
            self.prune_expired(&mut inner);
            while inner.entries.len() >= self.max_size {
                match inner.order.pop_front() {
                    Some(oldest) => {
                        inner.entries.remove(&oldest);
                        debug!(symbol = %oldest.symbol, "Evicted oldest cache entry");
                    }
                    None => break,
                }
            }
        }

        inner.order.push_back(key.clone());
        inner.entries.insert(
            key,
            CacheEntry {
                outcome,
                inserted_at: Instant::now(),
            },
        );
    }

    fn prune_expired(&self, inner: &mut CacheInner) {
        while let Some(oldest) = inner.order.front() {
            let expired = inner
                .entries
                .get(oldest)
                .map_or(true, |entry| entry.inserted_at.elapsed() >= self.ttl);
            if !expired {
                break;
            }
            if let Some(key) = inner.order.pop_front() {
                inner.entries.remove(&key);
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len().await,
            capacity: self.max_size,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("max_size", &self.max_size)
            .field("ttl", &self.ttl)
            .finish()
    }
}
