//! TTL cache in front of the pipeline.
//!
//! Advisory by contract: a miss, an expired entry, or a disabled cache all
//! mean "build fresh"; nothing here can fail a request. Entries are keyed by
//! the canonical address fingerprint and served as clones with the `cached`
//! provenance flag set.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use woonlens_core::{AddressKey, CompositeRecord};

struct CacheEntry {
    stored_at: Instant,
    record: CompositeRecord,
}

/// Concurrent TTL map; operations are atomic per key, no cross-key
/// transactions. At-most-one concurrent build per key is deliberately not
/// enforced — duplicated work under contention is acceptable.
pub struct ResultCache {
    ttl: Duration,
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl ResultCache {
    /// A zero TTL disables the cache entirely.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns the stored record with `cached = true` while the entry is
    /// fresh; evicts and misses otherwise.
    pub async fn get(&self, key: &AddressKey) -> Option<CompositeRecord> {
        if self.ttl.is_zero() {
            return None;
        }
        let fingerprint = key.fingerprint();

        {
            let entries = self.entries.read().await;
            let entry = entries.get(&fingerprint)?;
            if entry.stored_at.elapsed() < self.ttl {
                let mut record = entry.record.clone();
                record.cached = true;
                return Some(record);
            }
        }

        self.entries.write().await.remove(&fingerprint);
        None
    }

    /// Stores the record and sweeps any entries that have expired meanwhile.
    pub async fn put(&self, key: &AddressKey, record: &CompositeRecord) {
        if self.ttl.is_zero() {
            return;
        }
        let mut stored = record.clone();
        stored.cached = false;

        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
        entries.insert(
            key.fingerprint(),
            CacheEntry {
                stored_at: Instant::now(),
                record: stored,
            },
        );
    }

    /// Number of live entries, for the metadata endpoint.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use woonlens_core::{AddressRecord, Coordinates, Identifiers};

    fn record() -> CompositeRecord {
        CompositeRecord::empty(AddressRecord {
            display_name: "Teststraat 1, 3541ED Utrecht".to_owned(),
            street: "Teststraat".to_owned(),
            house_number: "1".to_owned(),
            postcode: "3541ED".to_owned(),
            city: "Utrecht".to_owned(),
            coordinates: Coordinates {
                longitude: 5.0693,
                latitude: 52.1083,
            },
            geojson: serde_json::json!({"type": "Point", "coordinates": [5.0693, 52.1083]}),
            identifiers: Identifiers::default(),
            municipality: "Utrecht".to_owned(),
            municipality_code: "GM0344".to_owned(),
            province: "Utrecht".to_owned(),
            province_code: "PV26".to_owned(),
        })
    }

    #[tokio::test]
    async fn hit_within_ttl_is_marked_cached() {
        let cache = ResultCache::new(Duration::from_secs(60));
        let key = AddressKey::new("3541ED", "1");
        cache.put(&key, &record()).await;

        let hit = cache.get(&key).await.expect("should hit");
        assert!(hit.cached);
        assert_eq!(hit.address.postcode, "3541ED");
    }

    #[tokio::test]
    async fn stored_record_is_unchanged_apart_from_the_flag() {
        let cache = ResultCache::new(Duration::from_secs(60));
        let key = AddressKey::new("3541ED", "1");
        let mut original = record();
        original.sources.push("demographics".to_owned());
        cache.put(&key, &original).await;

        let mut hit = cache.get(&key).await.expect("should hit");
        hit.cached = false;
        assert_eq!(
            serde_json::to_value(&hit).unwrap(),
            serde_json::to_value(&original).unwrap()
        );
    }

    #[tokio::test]
    async fn normalised_keys_share_an_entry() {
        let cache = ResultCache::new(Duration::from_secs(60));
        cache.put(&AddressKey::new("3541 ed", " 1 "), &record()).await;
        assert!(cache.get(&AddressKey::new("3541ED", "1")).await.is_some());
    }

    #[tokio::test]
    async fn expired_entries_miss_and_are_evicted() {
        let cache = ResultCache::new(Duration::from_millis(20));
        let key = AddressKey::new("3541ED", "1");
        cache.put(&key, &record()).await;
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(cache.get(&key).await.is_none());
        assert!(cache.is_empty().await, "expired entry should be evicted");
    }

    #[tokio::test]
    async fn zero_ttl_disables_the_cache() {
        let cache = ResultCache::new(Duration::ZERO);
        let key = AddressKey::new("3541ED", "1");
        cache.put(&key, &record()).await;
        assert!(cache.get(&key).await.is_none());
        assert_eq!(cache.len().await, 0);
    }
}
