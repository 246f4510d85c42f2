//! Tiered index: the three exact indices built in one pass over a batch

use super::exact_index::{
    EntityIndex, EntityOrdinal, ExactCallIndex, ExactTypeCallIndex, ExactTypeReadIndex,
    TypeMemberKey,
};
use crate::features::pattern_matching::fold_case;
use crate::shared::models::Entity;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// blake3 fingerprint of an entity batch (order-sensitive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchFingerprint([u8; 32]);

impl BatchFingerprint {
    pub fn of(entities: &[Entity]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(entities.len() as u64).to_le_bytes());
        for entity in entities {
            entity.fingerprint_into(&mut hasher);
        }
        Self(*hasher.finalize().as_bytes())
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

/// Build statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub entities: usize,
    pub type_call_keys: usize,
    pub call_keys: usize,
    pub type_read_keys: usize,
    /// Entities only reachable through the call-name index (no base type)
    pub untyped_calls: usize,
    /// Reads without a base type (not indexed)
    pub untyped_reads: usize,
}

/// Tiered entity index, read-only after `build`
#[derive(Debug, Clone)]
pub struct TieredIndex {
    entities: Vec<Entity>,
    type_call: ExactTypeCallIndex,
    call: ExactCallIndex,
    type_read: ExactTypeReadIndex,
    case_sensitive: bool,
    fingerprint: BatchFingerprint,
    stats: IndexStats,
}

impl TieredIndex {
    /// Single pass over the batch
    pub fn build(entities: Vec<Entity>, case_sensitive: bool) -> Self {
        let fingerprint = BatchFingerprint::of(&entities);
        Self::build_with_fingerprint(entities, case_sensitive, fingerprint)
    }

    fn build_with_fingerprint(
        entities: Vec<Entity>,
        case_sensitive: bool,
        fingerprint: BatchFingerprint,
    ) -> Self {
        let mut type_call = ExactTypeCallIndex::default();
        let mut call = ExactCallIndex::default();
        let mut type_read = ExactTypeReadIndex::default();
        let mut stats = IndexStats {
            entities: entities.len(),
            ..Default::default()
        };

        for (ordinal, entity) in entities.iter().enumerate() {
            match entity {
                Entity::Call(c) => {
                    match c.base_type.as_deref() {
                        Some(base_type) => type_call.insert(
                            TypeMemberKey::new(base_type, &c.call, case_sensitive),
                            ordinal,
                        ),
                        None => stats.untyped_calls += 1,
                    }

                    let simple = fold_case(&c.call, case_sensitive).into_owned();
                    let qualified = c
                        .qualified_call
                        .as_deref()
                        .map(|q| fold_case(q, case_sensitive).into_owned())
                        .filter(|q| *q != simple);
                    call.insert(simple, ordinal);
                    if let Some(qualified) = qualified {
                        call.insert(qualified, ordinal);
                    }
                }
                Entity::Read(r) => match r.base_type.as_deref() {
                    Some(base_type) => type_read.insert(
                        TypeMemberKey::new(base_type, &r.read, case_sensitive),
                        ordinal,
                    ),
                    None => stats.untyped_reads += 1,
                },
            }
        }

        stats.type_call_keys = type_call.size();
        stats.call_keys = call.size();
        stats.type_read_keys = type_read.size();

        tracing::debug!(
            entities = stats.entities,
            type_call_keys = stats.type_call_keys,
            call_keys = stats.call_keys,
            type_read_keys = stats.type_read_keys,
            "tiered index built"
        );

        Self {
            entities,
            type_call,
            call,
            type_read,
            case_sensitive,
            fingerprint,
            stats,
        }
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entity(&self, ordinal: EntityOrdinal) -> Option<&Entity> {
        self.entities.get(ordinal)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn type_call(&self) -> &ExactTypeCallIndex {
        &self.type_call
    }

    pub fn call(&self) -> &ExactCallIndex {
        &self.call
    }

    pub fn type_read(&self) -> &ExactTypeReadIndex {
        &self.type_read
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn fingerprint(&self) -> BatchFingerprint {
        self.fingerprint
    }

    pub fn stats(&self) -> IndexStats {
        self.stats
    }
}

struct CachedIndex {
    fingerprint: BatchFingerprint,
    case_sensitive: bool,
    index: Arc<TieredIndex>,
    built_at: Instant,
}

/// Reuses the last built index while the batch is unchanged and the entry is
/// younger than the TTL. A zero TTL disables reuse.
pub struct IndexCache {
    ttl: Duration,
    slot: Mutex<Option<CachedIndex>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl IndexCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the index and whether it came from the cache
    pub fn get_or_build(&self, entities: &[Entity], case_sensitive: bool) -> (Arc<TieredIndex>, bool) {
        let fingerprint = BatchFingerprint::of(entities);

        if !self.ttl.is_zero() {
            let slot = self.slot.lock();
            if let Some(cached) = slot.as_ref() {
                if cached.fingerprint == fingerprint
                    && cached.case_sensitive == case_sensitive
                    && cached.built_at.elapsed() < self.ttl
                {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(fingerprint = %fingerprint.to_hex(), "index cache hit");
                    return (Arc::clone(&cached.index), true);
                }
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let index = Arc::new(TieredIndex::build_with_fingerprint(
            entities.to_vec(),
            case_sensitive,
            fingerprint,
        ));

        if !self.ttl.is_zero() {
            *self.slot.lock() = Some(CachedIndex {
                fingerprint,
                case_sensitive,
                index: Arc::clone(&index),
                built_at: Instant::now(),
            });
        }

        (index, false)
    }

    pub fn invalidate(&self) {
        *self.slot.lock() = None;
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for IndexCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexCache")
            .field("ttl", &self.ttl)
            .field("hits", &self.hits())
            .field("misses", &self.misses())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{CallSite, PropertyRead};

    fn batch() -> Vec<Entity> {
        vec![
            CallSite::new("0", "execute")
                .with_base_type("sqlite3.Cursor")
                .with_qualified_call("sqlite3.Cursor.execute")
                .into(),
            CallSite::new("1", "system").into(),
            PropertyRead::new("2", "args").with_base_type("flask.Request").into(),
            PropertyRead::new("3", "form").into(),
            CallSite::new("4", "execute")
                .with_base_type("sqlite3.Cursor")
                .with_qualified_call("execute")
                .into(),
        ]
    }

    #[test]
    fn test_build_populates_all_indices() {
        let index = TieredIndex::build(batch(), false);

        assert_eq!(index.type_call().lookup("sqlite3.Cursor", "execute", false), &[0, 4]);
        assert_eq!(index.call().lookup("execute", false), &[0, 4]);
        assert_eq!(index.call().lookup("sqlite3.Cursor.execute", false), &[0]);
        assert_eq!(index.call().lookup("system", false), &[1]);
        assert_eq!(index.type_read().lookup("flask.Request", "args", false), &[2]);

        let stats = index.stats();
        assert_eq!(stats.entities, 5);
        assert_eq!(stats.untyped_calls, 1);
        assert_eq!(stats.untyped_reads, 1);
        assert_eq!(stats.type_read_keys, 1);
    }

    #[test]
    fn test_qualified_equal_to_simple_indexed_once() {
        let index = TieredIndex::build(batch(), false);
        // entity 4 has qualified == simple: only one entry under "execute"
        assert_eq!(index.call().lookup("execute", false).len(), 2);
    }

    #[test]
    fn test_fingerprint_stable_and_order_sensitive() {
        let a = batch();
        let mut b = batch();
        assert_eq!(BatchFingerprint::of(&a), BatchFingerprint::of(&b));

        b.swap(0, 1);
        assert_ne!(BatchFingerprint::of(&a), BatchFingerprint::of(&b));
    }

    #[test]
    fn test_index_cache_reuse() {
        let cache = IndexCache::new(Duration::from_secs(60));
        let entities = batch();

        let (first, hit) = cache.get_or_build(&entities, false);
        assert!(!hit);
        let (second, hit) = cache.get_or_build(&entities, false);
        assert!(hit);
        assert!(Arc::ptr_eq(&first, &second));

        let (_, hit) = cache.get_or_build(&entities[..2], false);
        assert!(!hit);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 2);
    }

    #[test]
    fn test_index_cache_zero_ttl_disabled() {
        let cache = IndexCache::new(Duration::ZERO);
        let entities = batch();
        cache.get_or_build(&entities, false);
        let (_, hit) = cache.get_or_build(&entities, false);
        assert!(!hit);
    }
}
