//! Versioned record format for exposing an inspection to scripts

use chrono::{DateTime, Local};
use seat_inspect_util::{EntityId, EntityKind, NodeKey};
use serde::{Deserialize, Serialize};

use crate::{Category, EdgeOrigin, EdgeTarget, Finding, PartialFetch, PropertyBag, Relation};

/// An outgoing edge of a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub relation: Relation,
    pub target: NodeKey,
    pub state: EdgeTarget,
    pub origin: EdgeOrigin,
}

/// One record per graph node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    pub kind: EntityKind,
    pub id: EntityId,
    pub partial: bool,
    pub attributes: PropertyBag,
    pub edges: Vec<EdgeRecord>,
    /// Categories of every finding implicating this node
    pub findings: Vec<Category>,
}

/// Full inspection result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub version: u32,
    pub captured_at: DateTime<Local>,
    pub source: String,
    pub nodes: Vec<NodeRecord>,
    pub findings: Vec<Finding>,
    pub warnings: Vec<PartialFetch>,
}

impl Report {
    pub fn has_warnings(&self) -> bool {
        self.findings.iter().any(Finding::is_warning)
    }
}
