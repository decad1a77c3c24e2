//! Caller-owned route cache with TTL expiry.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::models::GeoPoint;
use crate::route::RoutePath;

pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_MAX_ENTRIES: usize = 256;

#[derive(Debug, Clone)]
struct CachedRoute {
    route: RoutePath,
    fetched_at: Instant,
}

/// Routes keyed by origin/destination at 4-decimal precision.
#[derive(Debug)]
pub struct RouteCache {
    entries: DashMap<String, CachedRoute>,
    ttl: Duration,
    max_entries: usize,
}

impl Default for RouteCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_MAX_ENTRIES)
    }
}

impl RouteCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_entries,
        }
    }

    /// Returns a fresh route, evicting it if it has expired.
    pub fn get(&self, origin: GeoPoint, destination: GeoPoint) -> Option<RoutePath> {
        let key = route_key(origin, destination);
        {
            let entry = self.entries.get(&key)?;
            if entry.fetched_at.elapsed() <= self.ttl {
                return Some(entry.route.clone());
            }
        }
        self.evict_if_expired(&key);
        None
    }

    /// Re-checks expiry under the write lock, so an entry refreshed after the
    /// read guard was released survives.
    fn evict_if_expired(&self, key: &str) {
        self.entries
            .remove_if(key, |_, entry| entry.fetched_at.elapsed() > self.ttl);
    }

    pub fn insert(&self, origin: GeoPoint, destination: GeoPoint, route: RoutePath) {
        self.entries.insert(
            route_key(origin, destination),
            CachedRoute {
                route,
                fetched_at: Instant::now(),
            },
        );
        self.prune();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops expired entries, then the oldest ones beyond `max_entries`.
    fn prune(&self) {
        let mut entries: Vec<(String, Instant)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().fetched_at))
            .collect();

        for (key, fetched_at) in &entries {
            if fetched_at.elapsed() > self.ttl {
                self.entries.remove(key);
            }
        }

        if self.entries.len() <= self.max_entries {
            return;
        }

        entries.sort_by_key(|(_, fetched_at)| *fetched_at);
        for (key, _) in entries {
            if self.entries.len() <= self.max_entries {
                break;
            }
            self.entries.remove(&key);
        }
    }
}

fn route_key(origin: GeoPoint, destination: GeoPoint) -> String {
    format!(
        "{:.4},{:.4};{:.4},{:.4}",
        origin.lat, origin.lon, destination.lat, destination.lon
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route() -> RoutePath {
        RoutePath::straight_line(GeoPoint::new(30.0, -100.0), GeoPoint::new(31.0, -100.0))
    }

    #[test]
    fn test_hit_and_miss() {
        let cache = RouteCache::default();
        let origin = GeoPoint::new(30.0, -100.0);
        let dest = GeoPoint::new(31.0, -100.0);
        assert!(cache.get(origin, dest).is_none());
        cache.insert(origin, dest, route());
        assert_eq!(cache.get(origin, dest), Some(route()));
        assert!(cache.get(dest, origin).is_none(), "direction matters");
    }

    #[test]
    fn test_key_rounds_to_four_decimals() {
        let cache = RouteCache::default();
        cache.insert(GeoPoint::new(30.00001, -100.0), GeoPoint::new(31.0, -100.0), route());
        assert!(cache.get(GeoPoint::new(30.00002, -100.0), GeoPoint::new(31.0, -100.0)).is_some());
    }

    #[test]
    fn test_expired_entries_are_evicted() {
        let cache = RouteCache::new(Duration::ZERO, 10);
        let origin = GeoPoint::new(30.0, -100.0);
        let dest = GeoPoint::new(31.0, -100.0);
        cache.insert(origin, dest, route());
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get(origin, dest).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_expired_lookup_keeps_refreshed_entry() {
        let cache = RouteCache::new(Duration::from_millis(50), 10);
        let origin = GeoPoint::new(30.0, -100.0);
        let dest = GeoPoint::new(31.0, -100.0);
        let key = route_key(origin, dest);
        cache.insert(origin, dest, route());
        std::thread::sleep(Duration::from_millis(60));

        // Refreshed by another request between the expiry check and eviction.
        cache.entries.insert(
            key.clone(),
            CachedRoute {
                route: route(),
                fetched_at: Instant::now(),
            },
        );
        cache.evict_if_expired(&key);

        assert_eq!(cache.get(origin, dest), Some(route()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_prunes_oldest_beyond_capacity() {
        let cache = RouteCache::new(DEFAULT_TTL, 2);
        for i in 0..3 {
            cache.insert(GeoPoint::new(30.0 + i as f64, -100.0), GeoPoint::new(40.0, -100.0), route());
            std::thread::sleep(Duration::from_millis(2));
        }
        assert_eq!(cache.len(), 2);
        assert!(cache.get(GeoPoint::new(30.0, -100.0), GeoPoint::new(40.0, -100.0)).is_none());
        assert!(cache.get(GeoPoint::new(32.0, -100.0), GeoPoint::new(40.0, -100.0)).is_some());
    }
}
