//! Anomaly findings produced by the invariant checker

use seat_inspect_util::NodeKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Finding severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
        })
    }
}

/// Anomaly category, in the order the checker evaluates them
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    DanglingReference,
    AsymmetricRelation,
    ActiveSessionNotListed,
    InactiveActiveSession,
    MultipleActiveSessions,
    OrphanedActiveUser,
    DeadSessionLeader,
    ClosingSession,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::DanglingReference,
        Category::AsymmetricRelation,
        Category::ActiveSessionNotListed,
        Category::InactiveActiveSession,
        Category::MultipleActiveSessions,
        Category::OrphanedActiveUser,
        Category::DeadSessionLeader,
        Category::ClosingSession,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            Category::DanglingReference => "dangling-reference",
            Category::AsymmetricRelation => "asymmetric-relation",
            Category::ActiveSessionNotListed => "active-session-not-listed",
            Category::InactiveActiveSession => "inactive-active-session",
            Category::MultipleActiveSessions => "multiple-active-sessions",
            Category::OrphanedActiveUser => "orphaned-active-user",
            Category::DeadSessionLeader => "dead-session-leader",
            Category::ClosingSession => "closing-session",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.tag() == tag)
    }

    pub fn severity(&self) -> Severity {
        match self {
            Category::OrphanedActiveUser | Category::ClosingSession => Severity::Info,
            _ => Severity::Warning,
        }
    }

    /// One-line explanation shown next to findings of this category
    pub fn description(&self) -> &'static str {
        match self {
            Category::DanglingReference => "references an entity the service did not return",
            Category::AsymmetricRelation => "relation is not reported back by the other side",
            Category::ActiveSessionNotListed => "active session is missing from the seat's sessions",
            Category::InactiveActiveSession => "seat's active session is not marked active",
            Category::MultipleActiveSessions => "more than one active session on a single-session seat",
            Category::OrphanedActiveUser => "user is logged in but none of its sessions were found",
            Category::DeadSessionLeader => "session leader process is gone",
            Category::ClosingSession => "session is stuck closing",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One reported anomaly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub category: Category,
    /// Implicated nodes, sorted and unique
    pub nodes: Vec<NodeKey>,
    pub message: String,
}

impl Finding {
    pub fn new(
        category: Category,
        nodes: impl IntoIterator<Item = NodeKey>,
        message: impl Into<String>,
    ) -> Self {
        let mut nodes: Vec<NodeKey> = nodes.into_iter().collect();
        nodes.sort();
        nodes.dedup();

        Self {
            severity: category.severity(),
            category,
            nodes,
            message: message.into(),
        }
    }

    pub fn implicates(&self, key: &NodeKey) -> bool {
        self.nodes.binary_search(key).is_ok()
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.category, self.message)
    }
}
