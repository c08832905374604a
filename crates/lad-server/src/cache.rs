//! Elevation cache keyed by rounded coordinates.
//!
//! Only successful lookups are stored. Entries expire after a TTL and the
//! oldest entries are dropped once the cache grows past its limit.

use dashmap::DashMap;
use std::hash::Hash;
use std::time::Duration;
use tokio::time::Instant;

/// Coordinates are keyed at 1e-5 degree resolution (~1 m).
const KEY_SCALE: f64 = 100_000.0;

pub trait CacheEntry {
    fn fetched_at(&self) -> Instant;
}

pub fn prune_cache<K, V>(cache: &DashMap<K, V>, max_entries: usize, max_age: Duration)
where
    K: Clone + Eq + Hash,
    V: CacheEntry,
{
    let now = Instant::now();
    let mut entries: Vec<(K, Instant)> = cache
        .iter()
        .map(|entry| (entry.key().clone(), entry.value().fetched_at()))
        .collect();

    for (key, fetched_at) in &entries {
        if now.duration_since(*fetched_at) > max_age {
            cache.remove(key);
        }
    }

    if cache.len() <= max_entries {
        return;
    }

    entries.sort_by_key(|(_, fetched_at)| *fetched_at);
    for (key, _) in entries {
        if cache.len() <= max_entries {
            break;
        }
        cache.remove(&key);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordKey(i64, i64);

impl CoordKey {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self(
            (lat * KEY_SCALE).round() as i64,
            (lng * KEY_SCALE).round() as i64,
        )
    }
}

#[derive(Debug, Clone, Copy)]
struct CachedElevation {
    meters: f64,
    fetched_at: Instant,
}

impl CacheEntry for CachedElevation {
    fn fetched_at(&self) -> Instant {
        self.fetched_at
    }
}

#[derive(Debug)]
pub struct ElevationCache {
    entries: DashMap<CoordKey, CachedElevation>,
    ttl: Duration,
    max_entries: usize,
}

impl ElevationCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn get(&self, lat: f64, lng: f64) -> Option<f64> {
        let entry = self.entries.get(&CoordKey::new(lat, lng))?;
        if entry.fetched_at.elapsed() > self.ttl {
            return None;
        }
        Some(entry.meters)
    }

    pub fn insert(&self, lat: f64, lng: f64, meters: f64) {
        self.entries.insert(
            CoordKey::new(lat, lng),
            CachedElevation {
                meters,
                fetched_at: Instant::now(),
            },
        );
        if self.entries.len() > self.max_entries {
            prune_cache(&self.entries, self.max_entries, self.ttl);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
