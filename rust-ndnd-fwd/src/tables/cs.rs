//! The Content Store: a bounded cache of recently seen Data.
//!
//! Lookup is a longest-prefix walk over a name-ordered index; admission and
//! eviction go through a pluggable [`CsPolicy`], LRU by default.

use log::trace;
use lru::LruCache;
use rust_ndnd_common::name::Name;
use rust_ndnd_common::packet::{Data, Interest};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Default capacity of the Content Store, in entries.
pub const DEFAULT_CS_CAPACITY: usize = 65536;

/// Replacement policy interface. The store tells the policy about inserts,
/// hits, and erasures; the policy picks victims when the store is full.
pub trait CsPolicy: Send {
    fn on_insert(&mut self, name: &Name);
    fn on_hit(&mut self, name: &Name);
    fn select_victim(&mut self) -> Option<Name>;
}

/// Least-recently-used replacement.
pub struct LruPolicy {
    order: LruCache<Name, ()>,
}

impl LruPolicy {
    pub fn new() -> Self {
        Self {
            order: LruCache::unbounded(),
        }
    }
}

impl Default for LruPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl CsPolicy for LruPolicy {
    fn on_insert(&mut self, name: &Name) {
        self.order.push(name.clone(), ());
    }

    fn on_hit(&mut self, name: &Name) {
        self.order.get(name);
    }

    fn select_victim(&mut self) -> Option<Name> {
        self.order.pop_lru().map(|(name, _)| name)
    }
}

#[derive(Debug)]
struct CsRecord {
    data: Data,
    stale_at: Instant,
}

pub struct ContentStore {
    capacity: usize,
    index: BTreeMap<Name, CsRecord>,
    policy: Box<dyn CsPolicy>,
}

impl ContentStore {
    pub fn new(capacity: usize) -> Self {
        Self::with_policy(capacity, Box::new(LruPolicy::new()))
    }

    pub fn with_policy(capacity: usize, policy: Box<dyn CsPolicy>) -> Self {
        Self {
            capacity: capacity.max(1),
            index: BTreeMap::new(),
            policy,
        }
    }

    /// Admits `data`, evicting per policy when full. Returns the number of
    /// evicted entries.
    pub fn insert(&mut self, data: Data, now: Instant) -> usize {
        let name = data.name.clone();
        let stale_at = now + Duration::from_millis(data.freshness_period_ms);

        if let Some(record) = self.index.get_mut(&name) {
            record.data = data;
            record.stale_at = stale_at;
            self.policy.on_hit(&name);
            return 0;
        }

        let mut evicted = 0;
        while self.index.len() >= self.capacity {
            match self.policy.select_victim() {
                Some(victim) => {
                    trace!("CS evicting {}", victim);
                    self.index.remove(&victim);
                    evicted += 1;
                }
                None => break,
            }
        }

        self.index.insert(name.clone(), CsRecord { data, stale_at });
        self.policy.on_insert(&name);
        evicted
    }

    /// Longest-prefix lookup: returns the best Data matching `interest`, or
    /// nothing. A stale entry only answers Interests without MustBeFresh.
    pub fn find(&mut self, interest: &Interest, now: Instant) -> Option<&Data> {
        let hit = if interest.can_be_prefix {
            self.index
                .range(interest.name.clone()..)
                .take_while(|(name, _)| interest.name.is_prefix_of(name))
                .find(|(_, record)| !interest.must_be_fresh || record.stale_at > now)
                .map(|(name, _)| name.clone())
        } else {
            self.index
                .get(&interest.name)
                .filter(|record| !interest.must_be_fresh || record.stale_at > now)
                .map(|_| interest.name.clone())
        }?;

        self.policy.on_hit(&hit);
        self.index.get(&hit).map(|record| &record.data)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn contains(&self, name: &Name) -> bool {
        self.index.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(name: &str, freshness_ms: u64) -> Data {
        Data::new(Name::from_string(name), &b"content"[..]).with_freshness_period(freshness_ms)
    }

    #[test]
    fn test_exact_and_prefix_lookup() {
        let mut cs = ContentStore::new(16);
        let now = Instant::now();
        cs.insert(data("/a/b/x", 1000), now);

        // Exact name misses, prefix hits.
        let exact = Interest::new(Name::from_string("/a/b"));
        assert!(cs.find(&exact, now).is_none());

        let prefix = Interest::new(Name::from_string("/a/b")).with_can_be_prefix(true);
        let hit = cs.find(&prefix, now).unwrap();
        assert_eq!(hit.name, Name::from_string("/a/b/x"));

        let exact = Interest::new(Name::from_string("/a/b/x"));
        assert!(cs.find(&exact, now).is_some());
    }

    #[test]
    fn test_freshness_gating() {
        let mut cs = ContentStore::new(16);
        let now = Instant::now();
        cs.insert(data("/a", 1000), now);

        let later = now + Duration::from_millis(1500);
        let fresh = Interest::new(Name::from_string("/a")).with_must_be_fresh(true);
        let tolerant = Interest::new(Name::from_string("/a"));

        // Within the freshness period both match; after it, only the
        // tolerant Interest does.
        assert!(cs.find(&fresh, now).is_some());
        assert!(cs.find(&fresh, later).is_none());
        assert!(cs.find(&tolerant, later).is_some());
    }

    #[test]
    fn test_prefix_lookup_skips_stale_for_fresh_interest() {
        let mut cs = ContentStore::new(16);
        let now = Instant::now();
        cs.insert(data("/a/1", 0), now); // immediately stale
        cs.insert(data("/a/2", 10_000), now);

        let fresh = Interest::new(Name::from_string("/a"))
            .with_can_be_prefix(true)
            .with_must_be_fresh(true);
        let hit = cs.find(&fresh, now).unwrap();
        assert_eq!(hit.name, Name::from_string("/a/2"));
    }

    #[test]
    fn test_lru_eviction_at_capacity() {
        let mut cs = ContentStore::new(2);
        let now = Instant::now();
        cs.insert(data("/a", 1000), now);
        cs.insert(data("/b", 1000), now);

        // Touch /a so /b becomes the LRU victim.
        let touch = Interest::new(Name::from_string("/a"));
        cs.find(&touch, now).unwrap();

        let evicted = cs.insert(data("/c", 1000), now);
        assert_eq!(evicted, 1);
        assert_eq!(cs.len(), 2);
        assert!(cs.contains(&Name::from_string("/a")));
        assert!(!cs.contains(&Name::from_string("/b")));
        assert!(cs.contains(&Name::from_string("/c")));
    }

    #[test]
    fn test_reinsert_refreshes() {
        let mut cs = ContentStore::new(2);
        let now = Instant::now();
        cs.insert(data("/a", 0), now);
        cs.insert(data("/a", 5000), now);
        assert_eq!(cs.len(), 1);

        let fresh = Interest::new(Name::from_string("/a")).with_must_be_fresh(true);
        assert!(cs.find(&fresh, now + Duration::from_millis(100)).is_some());
    }
}
