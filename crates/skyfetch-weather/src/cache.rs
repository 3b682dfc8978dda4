//! Bounded in-memory cache of the latest snapshot per location.
//!
//! Holds at most [`CACHE_CAPACITY`] locations. Entries within
//! [`SAME_LOCATION_TOLERANCE`](crate::types::SAME_LOCATION_TOLERANCE) of each other
//! share a slot. When full, the entry inserted first is evicted regardless of how
//! recently it was read or replaced (FIFO, not LRU).

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::clock::Clock;
use crate::error::WeatherError;
use crate::provider::WeatherProvider;
use crate::types::{Coordinates, WeatherSnapshot};

pub const CACHE_CAPACITY: usize = 10;

/// Seconds a snapshot stays reusable after it was fetched.
pub const FRESHNESS_WINDOW_SECS: i64 = 600;

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Coordinates the snapshot was requested for
    pub location: Coordinates,
    pub snapshot: WeatherSnapshot,
    /// Fetch time in unix seconds
    pub observed_at: i64,
}

impl CacheEntry {
    pub fn new(location: Coordinates, snapshot: WeatherSnapshot, observed_at: i64) -> Self {
        Self {
            location,
            snapshot,
            observed_at,
        }
    }

    pub fn age(&self, now: i64) -> i64 {
        now - self.observed_at
    }

    pub fn is_fresh(&self, now: i64) -> bool {
        self.age(now) <= FRESHNESS_WINDOW_SECS
    }
}

/// What an [`FreshnessCache::upsert`] did with the entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Upsert {
    /// An entry for the same location was overwritten in its slot.
    Replaced,
    /// The entry took a free slot.
    Inserted,
    /// The cache was full; the oldest entry was dropped to make room.
    Evicted(CacheEntry),
}

/// Thread-safe FIFO cache guarded by a single lock.
#[derive(Debug, Default)]
pub struct FreshnessCache {
    slots: Mutex<VecDeque<CacheEntry>>,
}

impl FreshnessCache {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(VecDeque::with_capacity(CACHE_CAPACITY)),
        }
    }

    pub fn capacity(&self) -> usize {
        CACHE_CAPACITY
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    pub fn clear(&self) {
        self.slots.lock().clear();
    }

    /// Copy of all entries, oldest slot first.
    pub fn entries(&self) -> Vec<CacheEntry> {
        self.slots.lock().iter().cloned().collect()
    }

    /// First entry in slot order that matches `location`.
    pub fn lookup(&self, location: &Coordinates) -> Option<CacheEntry> {
        let slots = self.slots.lock();
        position_of(&slots, location).map(|i| slots[i].clone())
    }

    pub fn is_fresh(entry: &CacheEntry, now: i64) -> bool {
        entry.is_fresh(now)
    }

    /// Store `entry`. A slot already holding the same location keeps its stored
    /// coordinates and only takes the new snapshot and fetch time.
    pub fn upsert(&self, entry: CacheEntry) -> Upsert {
        let mut slots = self.slots.lock();

        if let Some(i) = position_of(&slots, &entry.location) {
            let slot = &mut slots[i];
            slot.snapshot = entry.snapshot;
            slot.observed_at = entry.observed_at;
            return Upsert::Replaced;
        }

        let evicted = if slots.len() >= CACHE_CAPACITY {
            slots.pop_front()
        } else {
            None
        };
        slots.push_back(entry);

        match evicted {
            Some(old) => {
                tracing::debug!("Cache full, evicted oldest entry at {}", old.location);
                Upsert::Evicted(old)
            }
            None => Upsert::Inserted,
        }
    }

    /// Overwrite the slot stored at exactly `location`. Never inserts.
    fn replace_exact(
        &self,
        location: &Coordinates,
        snapshot: WeatherSnapshot,
        observed_at: i64,
    ) -> bool {
        let mut slots = self.slots.lock();
        match slots.iter_mut().find(|entry| entry.location == *location) {
            Some(slot) => {
                slot.snapshot = snapshot;
                slot.observed_at = observed_at;
                true
            }
            None => false,
        }
    }

    /// Re-fetch every stale entry, one at a time in slot order.
    ///
    /// Stops at the first provider error and returns it; entries refreshed before
    /// the failure keep their new snapshot. The lock is not held while fetching.
    /// Returns how many entries were refreshed.
    pub async fn refresh_all<P: WeatherProvider>(
        &self,
        provider: &P,
        api_key: &str,
        clock: &dyn Clock,
    ) -> Result<usize, WeatherError> {
        let now = clock.now();
        let stale: Vec<Coordinates> = {
            let slots = self.slots.lock();
            slots
                .iter()
                .filter(|entry| {
                    let fresh = entry.is_fresh(now);
                    tracing::debug!(
                        "Cached {} is {} s old ({})",
                        entry.location,
                        entry.age(now),
                        if fresh { "fresh" } else { "stale" }
                    );
                    !fresh
                })
                .map(|entry| entry.location)
                .collect()
        };

        let mut refreshed = 0;
        for location in stale {
            let snapshot = match provider.fetch(&location, api_key).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    tracing::warn!("Refresh of {} failed, aborting: {}", location, e);
                    return Err(e);
                }
            };

            if self.replace_exact(&location, snapshot, clock.now()) {
                refreshed += 1;
            } else {
                tracing::debug!("{} was evicted while refreshing", location);
            }
        }

        Ok(refreshed)
    }
}

fn position_of(slots: &VecDeque<CacheEntry>, location: &Coordinates) -> Option<usize> {
    slots
        .iter()
        .position(|entry| entry.location.same_location(location))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::clock::manual::ManualClock;
    use crate::testing::{snapshot_at, FakeProvider};

    fn entry(lat: f64, lon: f64, name: &str, observed_at: i64) -> CacheEntry {
        let location = Coordinates::new(lat, lon);
        CacheEntry::new(location, snapshot_at(location, name), observed_at)
    }

    /// Ten locations a full degree apart.
    fn fill(cache: &FreshnessCache, observed_at: i64) {
        for i in 0..CACHE_CAPACITY {
            cache.upsert(entry(i as f64, 0.0, &format!("city-{}", i), observed_at));
        }
    }

    #[test]
    fn test_freshness_boundary() {
        let e = entry(10.0, 10.0, "a", 1_000);
        assert!(FreshnessCache::is_fresh(&e, 1_000));
        assert!(FreshnessCache::is_fresh(&e, 1_600));
        assert!(!FreshnessCache::is_fresh(&e, 1_601));
    }

    #[test]
    fn test_lookup_within_tolerance() {
        let cache = FreshnessCache::new();
        cache.upsert(entry(55.7522, 37.6156, "Moscow", 0));

        let hit = cache.lookup(&Coordinates::new(55.7580, 37.6100)).unwrap();
        assert_eq!(hit.snapshot.name, "Moscow");

        assert!(cache.lookup(&Coordinates::new(55.7722, 37.6156)).is_none());
        assert!(cache.lookup(&Coordinates::new(55.7522, 37.6356)).is_none());
    }

    #[test]
    fn test_lookup_returns_first_match_in_slot_order() {
        let cache = FreshnessCache::new();
        cache.upsert(entry(10.000, 10.0, "first", 0));
        cache.upsert(entry(10.015, 10.0, "second", 0));
        assert_eq!(cache.len(), 2);

        // Within tolerance of both stored points.
        let hit = cache.lookup(&Coordinates::new(10.008, 10.0)).unwrap();
        assert_eq!(hit.snapshot.name, "first");
    }

    #[test]
    fn test_upsert_same_location_replaces_in_place() {
        let cache = FreshnessCache::new();
        cache.upsert(entry(1.0, 1.0, "a", 0));
        cache.upsert(entry(2.0, 2.0, "b", 0));

        let outcome = cache.upsert(entry(1.004, 1.0, "a2", 50));
        assert_eq!(outcome, Upsert::Replaced);
        assert_eq!(cache.len(), 2);

        let names: Vec<String> = cache.entries().into_iter().map(|e| e.snapshot.name).collect();
        assert_eq!(names, vec!["a2", "b"]);
    }

    #[test]
    fn test_replace_keeps_stored_location() {
        let cache = FreshnessCache::new();
        cache.upsert(entry(10.000, 10.0, "A", 0));
        cache.upsert(entry(10.015, 10.0, "B", 0));

        // Matches A but sits within tolerance of B as well.
        assert_eq!(cache.upsert(entry(10.008, 10.0, "C", 30)), Upsert::Replaced);

        let entries = cache.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].location, Coordinates::new(10.000, 10.0));
        assert_eq!(entries[0].snapshot.name, "C");
        assert_eq!(entries[0].observed_at, 30);
        assert_eq!(entries[1].location, Coordinates::new(10.015, 10.0));
        assert!(!entries[0].location.same_location(&entries[1].location));
    }

    #[test]
    fn test_eleventh_insert_evicts_first() {
        let cache = FreshnessCache::new();
        fill(&cache, 0);
        assert_eq!(cache.len(), CACHE_CAPACITY);

        let outcome = cache.upsert(entry(50.0, 50.0, "newest", 0));
        match outcome {
            Upsert::Evicted(old) => assert_eq!(old.snapshot.name, "city-0"),
            other => panic!("expected eviction, got {:?}", other),
        }

        assert_eq!(cache.len(), CACHE_CAPACITY);
        assert!(cache.lookup(&Coordinates::new(0.0, 0.0)).is_none());
        for i in 1..CACHE_CAPACITY {
            assert!(cache.lookup(&Coordinates::new(i as f64, 0.0)).is_some());
        }
        assert!(cache.lookup(&Coordinates::new(50.0, 50.0)).is_some());
    }

    #[test]
    fn test_eviction_is_fifo_not_lru() {
        let cache = FreshnessCache::new();
        fill(&cache, 0);

        // Reading and replacing the oldest entry must not save it from eviction.
        cache.lookup(&Coordinates::new(0.0, 0.0)).unwrap();
        assert_eq!(cache.upsert(entry(0.0, 0.0, "city-0-again", 100)), Upsert::Replaced);

        cache.upsert(entry(50.0, 50.0, "newest", 100));
        assert!(cache.lookup(&Coordinates::new(0.0, 0.0)).is_none());
        assert!(cache.lookup(&Coordinates::new(1.0, 0.0)).is_some());
    }

    #[test]
    fn test_clear() {
        let cache = FreshnessCache::new();
        fill(&cache, 0);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), CACHE_CAPACITY);
    }

    #[tokio::test]
    async fn test_refresh_all_only_touches_stale_entries() {
        let cache = FreshnessCache::new();
        cache.upsert(entry(1.0, 1.0, "stale", 0));
        cache.upsert(entry(2.0, 2.0, "fresh", 900));

        let clock = ManualClock::at(1_000);
        let provider = FakeProvider::new();

        let refreshed = cache.refresh_all(&provider, "key", &clock).await.unwrap();

        assert_eq!(refreshed, 1);
        assert_eq!(provider.calls(), vec![Coordinates::new(1.0, 1.0)]);

        let updated = cache.lookup(&Coordinates::new(1.0, 1.0)).unwrap();
        assert_eq!(updated.observed_at, 1_000);
        assert_eq!(updated.snapshot.name, "fetch-1");
        assert_eq!(cache.lookup(&Coordinates::new(2.0, 2.0)).unwrap().snapshot.name, "fresh");
    }

    #[tokio::test]
    async fn test_refresh_all_keeps_slot_order() {
        let cache = FreshnessCache::new();
        for i in 0..4 {
            cache.upsert(entry(i as f64, 0.0, "old", 0));
        }

        let clock = ManualClock::at(5_000);
        let provider = FakeProvider::new();
        cache.refresh_all(&provider, "key", &clock).await.unwrap();

        let expected: Vec<Coordinates> = (0..4).map(|i| Coordinates::new(i as f64, 0.0)).collect();
        assert_eq!(provider.calls(), expected);
        let locations: Vec<Coordinates> = cache.entries().into_iter().map(|e| e.location).collect();
        assert_eq!(locations, expected);
    }

    #[tokio::test]
    async fn test_refresh_all_writes_back_to_own_slot() {
        let cache = FreshnessCache::new();
        cache.upsert(entry(10.000, 10.0, "A", 0));
        cache.upsert(entry(10.015, 10.0, "B", 0));
        cache.upsert(entry(10.008, 10.0, "C", 0));

        let clock = ManualClock::at(10_000);
        let provider = FakeProvider::new();
        let refreshed = cache.refresh_all(&provider, "key", &clock).await.unwrap();
        assert_eq!(refreshed, 2);

        let entries = cache.entries();
        assert_eq!(entries[0].location, Coordinates::new(10.000, 10.0));
        assert_eq!(entries[0].snapshot.name, "fetch-1");
        assert_eq!(entries[0].observed_at, 10_000);
        assert_eq!(entries[1].location, Coordinates::new(10.015, 10.0));
        assert_eq!(entries[1].snapshot.name, "fetch-2");
        assert_eq!(entries[1].observed_at, 10_000);
    }

    #[tokio::test]
    async fn test_refresh_all_fails_fast() {
        let cache = FreshnessCache::new();
        for i in 0..4 {
            cache.upsert(entry(i as f64, 0.0, &format!("old-{}", i), 0));
        }

        let clock = ManualClock::at(5_000);
        let provider = FakeProvider::failing_on(2);

        let result = cache.refresh_all(&provider, "key", &clock).await;
        assert!(matches!(result, Err(WeatherError::ProviderInternal(_))));

        // Slot 1 refreshed, slot 2 failed, slots 3 and 4 never attempted.
        assert_eq!(provider.call_count(), 2);
        let entries = cache.entries();
        assert_eq!(entries[0].snapshot.name, "fetch-1");
        assert_eq!(entries[0].observed_at, 5_000);
        assert_eq!(entries[1].snapshot.name, "old-1");
        assert_eq!(entries[2].snapshot.name, "old-2");
        assert_eq!(entries[3].snapshot.name, "old-3");
    }

    #[tokio::test]
    async fn test_refresh_all_on_empty_cache_is_noop() {
        let cache = FreshnessCache::new();
        let provider = FakeProvider::new();
        let refreshed = cache
            .refresh_all(&provider, "key", &ManualClock::at(0))
            .await
            .unwrap();
        assert_eq!(refreshed, 0);
        assert_eq!(provider.call_count(), 0);
    }
}
