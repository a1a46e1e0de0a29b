//! Shared types for the seat-inspect pipeline

use chrono::{DateTime, Local};
use seat_inspect_util::{EntityId, EntityKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single property value as reported by the login service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Str(String),
    /// Identifiers of other entities
    Refs(Vec<EntityId>),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Identifier list; a plain non-empty string counts as a single reference
    pub fn as_refs(&self) -> Option<Vec<EntityId>> {
        match self {
            AttrValue::Refs(refs) => Some(refs.clone()),
            AttrValue::Str(s) if s.is_empty() => Some(Vec::new()),
            AttrValue::Str(s) => Some(vec![EntityId::new(s.clone())]),
            AttrValue::Int(i) => Some(vec![EntityId::new(i.to_string())]),
            AttrValue::Bool(_) => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(true) => f.write_str("yes"),
            AttrValue::Bool(false) => f.write_str("no"),
            AttrValue::Int(i) => write!(f, "{}", i),
            AttrValue::Str(s) => f.write_str(s),
            AttrValue::Refs(refs) => {
                let ids: Vec<&str> = refs.iter().map(|r| r.as_str()).collect();
                f.write_str(&ids.join(" "))
            }
        }
    }
}

/// Property bag of one object, keyed by property name
pub type PropertyBag = BTreeMap<String, AttrValue>;

/// One object exactly as the service reported it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Own identifier; a record without one cannot be placed in the graph
    #[serde(default)]
    pub id: Option<EntityId>,

    /// Set when the detail query failed and only the identifier is known
    #[serde(default)]
    pub partial: bool,

    #[serde(default)]
    pub attrs: PropertyBag,
}

impl RawRecord {
    pub fn new(id: impl Into<EntityId>, attrs: PropertyBag) -> Self {
        Self {
            id: Some(id.into()),
            partial: false,
            attrs,
        }
    }

    /// Identifier-only record for an object whose details could not be read
    pub fn bare(id: impl Into<EntityId>) -> Self {
        Self {
            id: Some(id.into()),
            partial: true,
            attrs: PropertyBag::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }
}

/// Why a detail query failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchCause {
    PermissionDenied,
    NotFound,
    Failed,
}

impl fmt::Display for FetchCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FetchCause::PermissionDenied => "permission denied",
            FetchCause::NotFound => "not found",
            FetchCause::Failed => "failed",
        })
    }
}

/// Non-fatal warning: one object's details could not be fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialFetch {
    pub kind: EntityKind,
    pub id: EntityId,
    pub cause: FetchCause,
    pub message: String,
}

impl fmt::Display for PartialFetch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: details {} ({})",
            self.kind, self.id, self.cause, self.message
        )
    }
}

/// Result of probing a session leader process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Liveness {
    Alive,
    Dead,
    Unknown,
}

/// Everything fetched in one inspection run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Description of the source the snapshot came from
    pub source: String,
    pub captured_at: DateTime<Local>,
    #[serde(default)]
    pub seats: Vec<RawRecord>,
    #[serde(default)]
    pub sessions: Vec<RawRecord>,
    #[serde(default)]
    pub users: Vec<RawRecord>,
    #[serde(default)]
    pub warnings: Vec<PartialFetch>,
    /// Liveness of session leader PIDs, when probed
    #[serde(default)]
    pub leaders: BTreeMap<u32, Liveness>,
}

impl Snapshot {
    pub fn empty(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            captured_at: Local::now(),
            seats: Vec::new(),
            sessions: Vec::new(),
            users: Vec::new(),
            warnings: Vec::new(),
            leaders: BTreeMap::new(),
        }
    }

    pub fn record_count(&self) -> usize {
        self.seats.len() + self.sessions.len() + self.users.len()
    }
}

/// Typed relation between two graph nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Relation {
    /// Seat -> Session, from the seat's session list
    Hosts,
    /// Seat -> Session, the seat's active session
    ActiveSession,
    /// Session -> Seat
    OnSeat,
    /// Session -> User
    OwnedBy,
    /// User -> Session
    Owns,
}

impl Relation {
    pub fn source_kind(&self) -> EntityKind {
        match self {
            Relation::Hosts | Relation::ActiveSession => EntityKind::Seat,
            Relation::OnSeat | Relation::OwnedBy => EntityKind::Session,
            Relation::Owns => EntityKind::User,
        }
    }

    pub fn target_kind(&self) -> EntityKind {
        match self {
            Relation::Hosts | Relation::ActiveSession | Relation::Owns => EntityKind::Session,
            Relation::OnSeat => EntityKind::Seat,
            Relation::OwnedBy => EntityKind::User,
        }
    }

    /// The relation the target is expected to report back, if any
    pub fn inverse(&self) -> Option<Relation> {
        match self {
            Relation::Hosts => Some(Relation::OnSeat),
            Relation::OnSeat => Some(Relation::Hosts),
            Relation::Owns => Some(Relation::OwnedBy),
            Relation::OwnedBy => Some(Relation::Owns),
            Relation::ActiveSession => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Hosts => "hosts",
            Relation::ActiveSession => "active-session",
            Relation::OnSeat => "on-seat",
            Relation::OwnedBy => "owned-by",
            Relation::Owns => "owns",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an edge target was among the fetched entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeTarget {
    Resolved,
    Dangling,
}

/// Where an edge came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeOrigin {
    /// Reported by the source record
    Reported,
    /// Added as the inverse of a reported edge
    Inferred,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attr_value_untagged_serialization() {
        let mut attrs = PropertyBag::new();
        attrs.insert("Active".into(), AttrValue::Bool(true));
        attrs.insert("Leader".into(), AttrValue::Int(1234));
        attrs.insert("Type".into(), AttrValue::Str("wayland".into()));
        attrs.insert(
            "Sessions".into(),
            AttrValue::Refs(vec![EntityId::new("2"), EntityId::new("c1")]),
        );

        let json = serde_json::to_string(&attrs).unwrap();
        assert!(json.contains("\"Sessions\":[\"2\",\"c1\"]"));

        let parsed: PropertyBag = serde_json::from_str(&json).unwrap();
        assert_eq!(attrs, parsed);
    }

    #[test]
    fn scalar_string_reads_as_single_ref() {
        assert_eq!(
            AttrValue::Str("seat0".into()).as_refs(),
            Some(vec![EntityId::new("seat0")])
        );
        assert_eq!(AttrValue::Str(String::new()).as_refs(), Some(vec![]));
        assert_eq!(AttrValue::Bool(true).as_refs(), None);
    }

    #[test]
    fn relation_inverses() {
        assert_eq!(Relation::Hosts.inverse(), Some(Relation::OnSeat));
        assert_eq!(Relation::OwnedBy.inverse(), Some(Relation::Owns));
        assert_eq!(Relation::ActiveSession.inverse(), None);
        for relation in [Relation::Hosts, Relation::OnSeat, Relation::Owns, Relation::OwnedBy] {
            let inverse = relation.inverse().unwrap();
            assert_eq!(relation.source_kind(), inverse.target_kind());
            assert_eq!(relation.target_kind(), inverse.source_kind());
        }
    }

    #[test]
    fn snapshot_leader_map_survives_json() {
        let mut snapshot = Snapshot::empty("fixture");
        snapshot.leaders.insert(4242, Liveness::Dead);
        snapshot.sessions.push(RawRecord::bare("3"));

        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.leaders.get(&4242), Some(&Liveness::Dead));
        assert!(parsed.sessions[0].partial);
    }

    #[test]
    fn record_without_id_deserializes() {
        let record: RawRecord = serde_json::from_str(r#"{"attrs":{"Active":true}}"#).unwrap();
        assert!(record.id.is_none());
        assert!(!record.partial);
    }
}
