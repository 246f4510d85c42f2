//! Shared models (SSOT for entity facts)

mod entity;

pub use entity::{CallSite, Entity, EntityKind, MalformedEntity, PropertyRead, RawEntity};
