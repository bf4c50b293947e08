use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tracing::{debug, trace};

use crate::clock::Clock;
use crate::dns::enums::DNSResourceType;
use crate::dns::name::normalize_name;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub record_type: DNSResourceType,
    /// Lowercased, no trailing dot
    pub domain: String,
}

impl CacheKey {
    pub fn new(record_type: DNSResourceType, domain: &str) -> Self {
        Self {
            record_type,
            domain: normalize_name(domain),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.record_type, self.domain)
    }
}

#[derive(Debug, Clone, Copy)]
struct PositiveEntry {
    value: IpAddr,
    expiry: u64,
}

/// One live positive entry as reported by [`ResolverCache::snapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSnapshotEntry {
    pub key: CacheKey,
    pub value: IpAddr,
    /// Whole seconds until expiry, rounded down
    pub ttl_remaining: u64,
}

#[derive(Debug, Default)]
pub struct CacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub negative_hits: AtomicU64,
    pub expired_evictions: AtomicU64,
}

impl CacheStats {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_negative_hit(&self) {
        self.negative_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_expired_eviction(&self) {
        self.expired_evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}

/// Two-tier resolver cache: positive answers keyed by `(type, name)` with a
/// TTL-derived expiry, and negative markers with a fixed window.
///
/// Expiry is measured in clock ticks and checked lazily on read.
pub struct ResolverCache {
    positive: DashMap<CacheKey, PositiveEntry>,
    negative: DashMap<CacheKey, u64>,
    clock: Arc<dyn Clock>,
    ticks_per_second: u64,
    negative_ttl: u64,
    stats: CacheStats,
}

impl ResolverCache {
    pub fn new(clock: Arc<dyn Clock>, ticks_per_second: u64, negative_ttl: u64) -> Self {
        Self {
            positive: DashMap::new(),
            negative: DashMap::new(),
            clock,
            ticks_per_second,
            negative_ttl,
            stats: CacheStats::default(),
        }
    }

    fn expiry_after(&self, seconds: u64) -> u64 {
        self.clock
            .ticks()
            .saturating_add(seconds.saturating_mul(self.ticks_per_second))
    }

    /// Get a cached value if one exists and hasn't expired
    pub fn get(&self, record_type: DNSResourceType, name: &str) -> Option<IpAddr> {
        let key = CacheKey::new(record_type, name);
        let now = self.clock.ticks();

        if let Some(entry) = self.positive.get(&key).map(|e| *e) {
            if now < entry.expiry {
                self.stats.record_hit();
                trace!("Cache hit for {}", key);
                return Some(entry.value);
            }
            self.positive.remove_if(&key, |_, e| e.expiry <= now);
            self.stats.record_expired_eviction();
            debug!("Removed expired cache entry for {}", key);
        }

        self.stats.record_miss();
        trace!("Cache miss for {}", key);
        None
    }

    /// Store a value; clears any negative marker for the same key.
    pub fn put(&self, record_type: DNSResourceType, name: &str, value: IpAddr, ttl: u32) {
        let key = CacheKey::new(record_type, name);
        let expiry = self.expiry_after(u64::from(ttl));
        self.negative.remove(&key);
        debug!("Cached {} -> {} (TTL: {}s)", key, value, ttl);
        self.positive.insert(key, PositiveEntry { value, expiry });
    }

    /// Mark `(type, name)` as known-absent for the negative window.
    pub fn negative_put(&self, record_type: DNSResourceType, name: &str) {
        let key = CacheKey::new(record_type, name);
        let expiry = self.expiry_after(self.negative_ttl);
        debug!("Negative cached {} for {}s", key, self.negative_ttl);
        self.negative.insert(key, expiry);
    }

    pub fn negative_get(&self, record_type: DNSResourceType, name: &str) -> bool {
        let key = CacheKey::new(record_type, name);
        let now = self.clock.ticks();

        match self.negative.get(&key).map(|e| *e) {
            Some(expiry) if now < expiry => {
                self.stats.record_negative_hit();
                trace!("Negative cache hit for {}", key);
                true
            }
            Some(_) => {
                self.negative.remove_if(&key, |_, expiry| *expiry <= now);
                self.stats.record_expired_eviction();
                false
            }
            None => false,
        }
    }

    /// Clear both tiers
    pub fn clear(&self) {
        let count = self.positive.len() + self.negative.len();
        self.positive.clear();
        self.negative.clear();
        debug!("Cleared {} cache entries", count);
    }

    /// Live positive entries with their remaining TTL.
    pub fn snapshot(&self) -> Vec<CacheSnapshotEntry> {
        let now = self.clock.ticks();
        let tps = self.ticks_per_second.max(1);
        let mut entries: Vec<_> = self
            .positive
            .iter()
            .filter(|item| now < item.value().expiry)
            .map(|item| CacheSnapshotEntry {
                key: item.key().clone(),
                value: item.value().value,
                ttl_remaining: (item.value().expiry - now) / tps,
            })
            .collect();
        entries.sort_by(|a, b| a.key.domain.cmp(&b.key.domain));
        entries
    }

    pub fn size(&self) -> usize {
        self.positive.len()
    }

    pub fn negative_size(&self) -> usize {
        self.negative.len()
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Get detailed cache information for debugging
    pub fn debug_info(&self) -> String {
        let stats = &self.stats;
        format!(
            "Cache: positive={}, negative={}, hits={}, misses={}, negative_hits={}, hit_rate={:.2}%, expired={}",
            self.size(),
            self.negative_size(),
            stats.hits.load(Ordering::Relaxed),
            stats.misses.load(Ordering::Relaxed),
            stats.negative_hits.load(Ordering::Relaxed),
            stats.hit_rate() * 100.0,
            stats.expired_evictions.load(Ordering::Relaxed)
        )
    }
}

impl fmt::Debug for ResolverCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverCache")
            .field("positive", &self.positive.len())
            .field("negative", &self.negative.len())
            .field("ticks_per_second", &self.ticks_per_second)
            .finish()
    }
}
