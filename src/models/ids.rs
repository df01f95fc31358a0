// src/models/ids.rs
// DOCUMENTATION: Client-side entity identifiers
// PURPOSE: Tell not-yet-persisted entities apart from persisted ones by type

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Wire prefix carried by temporary ids
pub const TEMPORARY_PREFIX: &str = "new-";

/// Identifier of a spot, visit or photo as seen by the client
/// DOCUMENTATION: `Temporary` entities exist only locally and need an insert;
/// `Persisted` entities carry the id the remote store assigned.
/// On the wire a temporary id is rendered as `new-<local id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityId {
    Temporary(String),
    Persisted(Uuid),
}

impl EntityId {
    /// Fresh temporary id for a locally created entity
    pub fn temporary() -> Self {
        EntityId::Temporary(Uuid::new_v4().simple().to_string())
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self, EntityId::Temporary(_))
    }

    pub fn persisted(&self) -> Option<Uuid> {
        match self {
            EntityId::Persisted(id) => Some(*id),
            EntityId::Temporary(_) => None,
        }
    }
}

impl From<Uuid> for EntityId {
    fn from(id: Uuid) -> Self {
        EntityId::Persisted(id)
    }
}

impl PartialEq<Uuid> for EntityId {
    fn eq(&self, other: &Uuid) -> bool {
        self.persisted().as_ref() == Some(other)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Temporary(local) => write!(f, "{}{}", TEMPORARY_PREFIX, local),
            EntityId::Persisted(id) => write!(f, "{}", id),
        }
    }
}

impl FromStr for EntityId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(local) = s.strip_prefix(TEMPORARY_PREFIX) {
            if local.is_empty() {
                return Err("temporary id without a local part".to_string());
            }
            return Ok(EntityId::Temporary(local.to_string()));
        }
        Uuid::parse_str(s)
            .map(EntityId::Persisted)
            .map_err(|e| format!("invalid id '{}': {}", s, e))
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
