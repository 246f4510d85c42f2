//! Exact hash indices over an entity batch
//!
//! All three indices map a key to the ordinals (discovery positions) of the
//! entities it covers, in discovery order. Keys are stored case-folded unless
//! the index was built case-sensitive, so exact lookups agree with the
//! matcher's case-insensitive equality.

use crate::features::pattern_matching::fold_case;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Position of an entity in its batch (discovery order)
pub type EntityOrdinal = usize;

/// `(base_type, member)` composite key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeMemberKey {
    pub base_type: String,
    pub member: String,
}

impl TypeMemberKey {
    pub fn new(base_type: &str, member: &str, case_sensitive: bool) -> Self {
        Self {
            base_type: fold_case(base_type, case_sensitive).into_owned(),
            member: fold_case(member, case_sensitive).into_owned(),
        }
    }
}

/// Read-only index interface
pub trait EntityIndex {
    type Key;

    /// Number of distinct keys
    fn size(&self) -> usize;

    /// All keys (unordered)
    fn keys(&self) -> Box<dyn Iterator<Item = &Self::Key> + '_>;

    /// Entities under `key`, in discovery order (empty if absent)
    fn query(&self, key: &Self::Key) -> &[EntityOrdinal];
}

macro_rules! exact_index {
    ($(#[$doc:meta])* $name:ident, $key:ty) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Default)]
        pub struct $name {
            map: FxHashMap<$key, Vec<EntityOrdinal>>,
            entries: usize,
        }

        impl $name {
            pub(crate) fn insert(&mut self, key: $key, ordinal: EntityOrdinal) {
                self.map.entry(key).or_default().push(ordinal);
                self.entries += 1;
            }

            /// Total (key, entity) pairs
            pub fn entry_count(&self) -> usize {
                self.entries
            }

            /// Iterate `(key, ordinals)` pairs (unordered)
            pub fn iter(&self) -> impl Iterator<Item = (&$key, &[EntityOrdinal])> {
                self.map.iter().map(|(k, v)| (k, v.as_slice()))
            }
        }

        impl EntityIndex for $name {
            type Key = $key;

            fn size(&self) -> usize {
                self.map.len()
            }

            fn keys(&self) -> Box<dyn Iterator<Item = &Self::Key> + '_> {
                Box::new(self.map.keys())
            }

            fn query(&self, key: &Self::Key) -> &[EntityOrdinal] {
                self.map.get(key).map(Vec::as_slice).unwrap_or(&[])
            }
        }
    };
}

exact_index!(
    /// `(base_type, call)` -> call entities with both fields populated
    ExactTypeCallIndex,
    TypeMemberKey
);

exact_index!(
    /// call name -> call entities, under the simple and (if different) qualified name
    ExactCallIndex,
    String
);

exact_index!(
    /// `(base_type, read)` -> read entities with both fields populated
    ExactTypeReadIndex,
    TypeMemberKey
);

impl ExactTypeCallIndex {
    pub fn lookup(&self, base_type: &str, call: &str, case_sensitive: bool) -> &[EntityOrdinal] {
        self.query(&TypeMemberKey::new(base_type, call, case_sensitive))
    }
}

impl ExactCallIndex {
    pub fn lookup(&self, call: &str, case_sensitive: bool) -> &[EntityOrdinal] {
        self.query(&fold_case(call, case_sensitive).into_owned())
    }
}

impl ExactTypeReadIndex {
    pub fn lookup(&self, base_type: &str, read: &str, case_sensitive: bool) -> &[EntityOrdinal] {
        self.query(&TypeMemberKey::new(base_type, read, case_sensitive))
    }
}
