//! Tiered Index
//!
//! Three independent hash indices built by a single pass over an entity batch:
//!
//! ```text
//! ExactTypeCallIndex  (base_type, call) -> [entity]
//! ExactCallIndex      call | qualified_call -> [entity]
//! ExactTypeReadIndex  (base_type, read) -> [entity]
//! ```
//!
//! All lookups are O(1). The index is read-only once built and can be shared
//! across threads without locking.

mod exact_index;
mod tiered;

pub use exact_index::{
    EntityIndex, EntityOrdinal, ExactCallIndex, ExactTypeCallIndex, ExactTypeReadIndex,
    TypeMemberKey,
};
pub use tiered::{BatchFingerprint, IndexCache, IndexStats, TieredIndex};
