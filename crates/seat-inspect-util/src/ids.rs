//! Strongly-typed identifiers for login/seat entities

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a seat, session or user as reported by the login service
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The three kinds of objects exposed by the login/seat service
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Seat,
    Session,
    User,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Seat, EntityKind::Session, EntityKind::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Seat => "seat",
            EntityKind::Session => "session",
            EntityKind::User => "user",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a graph node.
///
/// Two entities are the same node only if both kind and identifier match;
/// a seat and a session sharing an identifier string are distinct.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeKey {
    pub kind: EntityKind,
    pub id: EntityId,
}

impl NodeKey {
    pub fn new(kind: EntityKind, id: impl Into<EntityId>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn seat(id: impl Into<EntityId>) -> Self {
        Self::new(EntityKind::Seat, id)
    }

    pub fn session(id: impl Into<EntityId>) -> Self {
        Self::new(EntityKind::Session, id)
    }

    pub fn user(id: impl Into<EntityId>) -> Self {
        Self::new(EntityKind::User, id)
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}
