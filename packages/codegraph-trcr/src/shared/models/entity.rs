//! Entity model
//!
//! An entity is one occurrence of a call or a property read discovered in
//! analyzed code, with its statically resolved receiver type when type
//! inference succeeded. Entities are produced by the IR/extraction layer and
//! are immutable once indexed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::convert::TryFrom;
use thiserror::Error;

/// Entity kind (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Call,
    Read,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Call => "call",
            EntityKind::Read => "read",
        }
    }

    /// Parse the loader's kind string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "call" => Some(EntityKind::Call),
            "read" => Some(EntityKind::Read),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A call occurrence: `receiver.call(args...)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    /// Caller-assigned stable id (e.g. `file:line:col`)
    pub id: String,

    /// Statically resolved receiver type, if inference succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_type: Option<String>,

    /// Simple member name (`execute`)
    pub call: String,

    /// Fully-qualified form (`sqlite3.Cursor.execute`), alternate index key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualified_call: Option<String>,

    /// Ordered argument descriptors
    #[serde(default)]
    pub args: Vec<String>,

    /// Argument position -> compile-time constant?
    /// Positions absent from the map have unknown constness.
    #[serde(default)]
    pub is_const: BTreeMap<usize, bool>,
}

impl CallSite {
    pub fn new(id: impl Into<String>, call: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            base_type: None,
            call: call.into(),
            qualified_call: None,
            args: Vec::new(),
            is_const: BTreeMap::new(),
        }
    }

    pub fn with_base_type(mut self, base_type: impl Into<String>) -> Self {
        self.base_type = Some(base_type.into());
        self
    }

    pub fn with_qualified_call(mut self, qualified_call: impl Into<String>) -> Self {
        self.qualified_call = Some(qualified_call.into());
        self
    }

    /// Append an argument; `is_const = None` leaves its constness unknown
    pub fn with_arg(mut self, descriptor: impl Into<String>, is_const: Option<bool>) -> Self {
        let position = self.args.len();
        self.args.push(descriptor.into());
        if let Some(flag) = is_const {
            self.is_const.insert(position, flag);
        }
        self
    }
}

/// A property read occurrence: `receiver.read`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyRead {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_type: Option<String>,

    pub read: String,
}

impl PropertyRead {
    pub fn new(id: impl Into<String>, read: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            base_type: None,
            read: read.into(),
        }
    }

    pub fn with_base_type(mut self, base_type: impl Into<String>) -> Self {
        self.base_type = Some(base_type.into());
        self
    }
}

/// Extracted program fact: exactly one of a call or a property read
///
/// Deserialization goes through `RawEntity`, so a record with a blank member
/// name is rejected with the same `MalformedEntity` the loader path reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase", try_from = "RawEntity")]
pub enum Entity {
    Call(CallSite),
    Read(PropertyRead),
}

impl Entity {
    pub fn id(&self) -> &str {
        match self {
            Entity::Call(c) => &c.id,
            Entity::Read(r) => &r.id,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Call(_) => EntityKind::Call,
            Entity::Read(_) => EntityKind::Read,
        }
    }

    pub fn base_type(&self) -> Option<&str> {
        match self {
            Entity::Call(c) => c.base_type.as_deref(),
            Entity::Read(r) => r.base_type.as_deref(),
        }
    }

    /// Accessed member's simple name (`call` or `read`)
    pub fn member(&self) -> &str {
        match self {
            Entity::Call(c) => &c.call,
            Entity::Read(r) => &r.read,
        }
    }

    /// Builders accept any member string; a blank one cannot be indexed
    pub fn validate(&self) -> Result<(), MalformedEntity> {
        if !self.member().trim().is_empty() {
            return Ok(());
        }
        let field = match self {
            Entity::Call(_) => "call",
            Entity::Read(_) => "read",
        };
        Err(MalformedEntity::MissingMember {
            id: self.id().to_string(),
            kind: self.kind(),
            field: field.to_string(),
        })
    }

    pub fn qualified_call(&self) -> Option<&str> {
        match self {
            Entity::Call(c) => c.qualified_call.as_deref(),
            Entity::Read(_) => None,
        }
    }

    pub fn as_call(&self) -> Option<&CallSite> {
        match self {
            Entity::Call(c) => Some(c),
            Entity::Read(_) => None,
        }
    }

    /// Feed a canonical encoding of this entity into a batch fingerprint
    pub(crate) fn fingerprint_into(&self, hasher: &mut blake3::Hasher) {
        fn field(hasher: &mut blake3::Hasher, value: Option<&str>) {
            match value {
                Some(v) => {
                    hasher.update(&[1]);
                    hasher.update(&(v.len() as u64).to_le_bytes());
                    hasher.update(v.as_bytes());
                }
                None => {
                    hasher.update(&[0]);
                }
            }
        }

        match self {
            Entity::Call(c) => {
                hasher.update(b"C");
                field(hasher, Some(&c.id));
                field(hasher, c.base_type.as_deref());
                field(hasher, Some(&c.call));
                field(hasher, c.qualified_call.as_deref());
                hasher.update(&(c.args.len() as u64).to_le_bytes());
                for arg in &c.args {
                    field(hasher, Some(arg));
                }
                for (position, flag) in &c.is_const {
                    hasher.update(&(*position as u64).to_le_bytes());
                    hasher.update(&[*flag as u8]);
                }
            }
            Entity::Read(r) => {
                hasher.update(b"R");
                field(hasher, Some(&r.id));
                field(hasher, r.base_type.as_deref());
                field(hasher, Some(&r.read));
            }
        }
    }
}

impl From<CallSite> for Entity {
    fn from(call: CallSite) -> Self {
        Entity::Call(call)
    }
}

impl From<PropertyRead> for Entity {
    fn from(read: PropertyRead) -> Self {
        Entity::Read(read)
    }
}

/// Loader-shaped entity record
///
/// This is the duck-typed form extraction layers emit (a `kind` string and
/// optional fields). Convert with `Entity::try_from`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawEntity {
    pub id: String,
    pub kind: String,
    pub base_type: Option<String>,
    pub call: Option<String>,
    pub read: Option<String>,
    pub qualified_call: Option<String>,
    pub args: Vec<String>,
    pub is_const: BTreeMap<usize, bool>,
}

/// Entity record that cannot be indexed
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum MalformedEntity {
    #[error("entity '{id}': unknown kind '{kind}' (expected 'call' or 'read')")]
    UnknownKind { id: String, kind: String },

    #[error("entity '{id}': kind '{kind}' requires a non-empty '{field}'")]
    MissingMember {
        id: String,
        kind: EntityKind,
        field: String,
    },

    #[error("entity '{id}': both 'call' and 'read' are populated")]
    ConflictingMembers { id: String },
}

impl MalformedEntity {
    pub fn entity_id(&self) -> &str {
        match self {
            MalformedEntity::UnknownKind { id, .. }
            | MalformedEntity::MissingMember { id, .. }
            | MalformedEntity::ConflictingMembers { id } => id,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl TryFrom<RawEntity> for Entity {
    type Error = MalformedEntity;

    fn try_from(raw: RawEntity) -> Result<Self, Self::Error> {
        let kind = EntityKind::parse(&raw.kind).ok_or_else(|| MalformedEntity::UnknownKind {
            id: raw.id.clone(),
            kind: raw.kind.clone(),
        })?;

        let call = non_empty(raw.call);
        let read = non_empty(raw.read);
        if call.is_some() && read.is_some() {
            return Err(MalformedEntity::ConflictingMembers { id: raw.id });
        }

        match kind {
            EntityKind::Call => {
                let call = call.ok_or_else(|| MalformedEntity::MissingMember {
                    id: raw.id.clone(),
                    kind,
                    field: "call".to_string(),
                })?;
                Ok(Entity::Call(CallSite {
                    id: raw.id,
                    base_type: non_empty(raw.base_type),
                    call,
                    qualified_call: non_empty(raw.qualified_call),
                    args: raw.args,
                    is_const: raw.is_const,
                }))
            }
            EntityKind::Read => {
                let read = read.ok_or_else(|| MalformedEntity::MissingMember {
                    id: raw.id.clone(),
                    kind,
                    field: "read".to_string(),
                })?;
                Ok(Entity::Read(PropertyRead {
                    id: raw.id,
                    base_type: non_empty(raw.base_type),
                    read,
                }))
            }
        }
    }
}
