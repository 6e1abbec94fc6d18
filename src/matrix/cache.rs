//! Bounded, thread-safe memoization of great-circle distances.
//!
//! The cache is an explicit object passed by reference; nothing is global.
//! It is keyed by the unordered pair of coordinates quantized to 1e-6
//! degrees, so `(a, b)` and `(b, a)` share an entry. When full, the least
//! recently used entry is evicted.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use crate::geo::haversine_miles;
use crate::models::Coordinate;

type PointKey = (i64, i64);
type PairKey = (PointKey, PointKey);

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub len: usize,
}

#[derive(Debug, Default)]
struct Inner {
    values: HashMap<PairKey, (f64, u64)>,
    recency: BTreeMap<u64, PairKey>,
    tick: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

/// LRU distance cache with a fixed capacity.
#[derive(Debug)]
pub struct DistanceCache {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl Default for DistanceCache {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl DistanceCache {
    /// Creates a cache holding at most `capacity` pairs (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Distance between `a` and `b`, computed on miss.
    pub fn distance(&self, a: &Coordinate, b: &Coordinate) -> f64 {
        let key = pair_key(a, b);
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.tick += 1;
        let tick = inner.tick;

        if let Some((value, last)) = inner.values.get(&key).copied() {
            inner.recency.remove(&last);
            inner.recency.insert(tick, key);
            inner.values.insert(key, (value, tick));
            inner.hits += 1;
            return value;
        }

        inner.misses += 1;
        let value = haversine_miles(a, b);
        if inner.values.len() >= self.capacity {
            if let Some((_, oldest)) = inner.recency.pop_first() {
                inner.values.remove(&oldest);
                inner.evictions += 1;
            }
        }
        inner.values.insert(key, (value, tick));
        inner.recency.insert(tick, key);
        value
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            len: inner.values.len(),
        }
    }

    /// Drops every entry and resets the counters.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        *inner = Inner::default();
    }
}

fn point_key(c: &Coordinate) -> PointKey {
    (
        (c.latitude * 1e6).round() as i64,
        (c.longitude * 1e6).round() as i64,
    )
}

fn pair_key(a: &Coordinate, b: &Coordinate) -> PairKey {
    let (ka, kb) = (point_key(a), point_key(b));
    if ka <= kb {
        (ka, kb)
    } else {
        (kb, ka)
    }
}
