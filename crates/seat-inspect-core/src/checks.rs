//! Invariant checks over a built graph
//!
//! Rules run in `Category::ALL` order and each visits nodes in ascending key
//! order, so the same graph always yields the same ordered findings.

use seat_inspect_api::{Category, EdgeOrigin, Finding, Liveness, Relation};
use seat_inspect_config::CheckSettings;
use seat_inspect_util::{EntityKind, NodeKey};
use std::collections::BTreeSet;
use tracing::debug;

use crate::graph::{Graph, Node, SeatNode, SessionNode};

/// Run every rule
pub fn check(graph: &Graph) -> Vec<Finding> {
    InvariantChecker::default().check(graph)
}

/// Checker with per-rule enablement
#[derive(Debug, Clone, Default)]
pub struct InvariantChecker {
    settings: CheckSettings,
}

impl InvariantChecker {
    pub fn new(settings: &CheckSettings) -> Self {
        Self {
            settings: settings.clone(),
        }
    }

    pub fn check(&self, graph: &Graph) -> Vec<Finding> {
        let mut findings = Vec::new();

        for category in Category::ALL {
            if !self.settings.is_enabled(category) {
                debug!(check = %category, "Check disabled");
                continue;
            }

            let before = findings.len();
            match category {
                Category::DanglingReference => dangling_references(graph, &mut findings),
                Category::AsymmetricRelation => asymmetric_relations(graph, &mut findings),
                Category::ActiveSessionNotListed => active_session_not_listed(graph, &mut findings),
                Category::InactiveActiveSession => inactive_active_session(graph, &mut findings),
                Category::MultipleActiveSessions => multiple_active_sessions(graph, &mut findings),
                Category::OrphanedActiveUser => orphaned_active_users(graph, &mut findings),
                Category::DeadSessionLeader => dead_session_leaders(graph, &mut findings),
                Category::ClosingSession => closing_sessions(graph, &mut findings),
            }
            debug!(check = %category, findings = findings.len() - before, "Check finished");
        }

        findings
    }
}

fn dangling_references(graph: &Graph, out: &mut Vec<Finding>) {
    for edge in graph.dangling_edges() {
        out.push(Finding::new(
            Category::DanglingReference,
            [edge.from.clone(), edge.to.clone()],
            format!("{} {} {}, which was not returned by the service", edge.from, edge.relation, edge.to),
        ));
    }
}

fn asymmetric_relations(graph: &Graph, out: &mut Vec<Finding>) {
    let mut seen: BTreeSet<(NodeKey, NodeKey)> = BTreeSet::new();

    for edge in graph.edges() {
        if edge.origin != EdgeOrigin::Reported || !edge.is_resolved() {
            continue;
        }
        let Some(inverse) = edge.relation.inverse() else {
            continue;
        };
        // Bare targets cannot confirm or deny the relation
        let target_is_bare = graph.node(&edge.to).is_none_or(|n| n.partial);
        if target_is_bare || graph.reports(&edge.to, inverse, &edge.from) {
            continue;
        }

        let pair = if edge.from < edge.to {
            (edge.from.clone(), edge.to.clone())
        } else {
            (edge.to.clone(), edge.from.clone())
        };
        if !seen.insert(pair) {
            continue;
        }

        out.push(Finding::new(
            Category::AsymmetricRelation,
            [edge.from.clone(), edge.to.clone()],
            format!(
                "{} {} {}, but {} does not list {}",
                edge.from, edge.relation, edge.to, edge.to, edge.from
            ),
        ));
    }
}

fn full_seats(graph: &Graph) -> impl Iterator<Item = (&Node, &SeatNode)> {
    graph
        .nodes_of(EntityKind::Seat)
        .filter(|n| !n.partial)
        .filter_map(|n| n.as_seat().map(|seat| (n, seat)))
}

fn full_sessions(graph: &Graph) -> impl Iterator<Item = (&Node, &SessionNode)> {
    graph
        .nodes_of(EntityKind::Session)
        .filter(|n| !n.partial)
        .filter_map(|n| n.as_session().map(|session| (n, session)))
}

fn active_session_not_listed(graph: &Graph, out: &mut Vec<Finding>) {
    for (node, seat) in full_seats(graph) {
        let Some(active) = &seat.active_session else {
            continue;
        };
        if !graph.declares(&node.key, Relation::Hosts) || seat.sessions.contains(active) {
            continue;
        }

        let session = NodeKey::session(active.clone());
        out.push(Finding::new(
            Category::ActiveSessionNotListed,
            [node.key.clone(), session.clone()],
            format!("{} reports {} as active but does not list it among its sessions", node.key, session),
        ));
    }
}

fn inactive_active_session(graph: &Graph, out: &mut Vec<Finding>) {
    for (node, seat) in full_seats(graph) {
        let Some(active) = &seat.active_session else {
            continue;
        };
        let key = NodeKey::session(active.clone());
        let Some(session_node) = graph.node(&key) else {
            continue;
        };
        if session_node.partial {
            continue;
        }

        if let Some(session) = session_node.as_session()
            && !session.active
        {
            out.push(Finding::new(
                Category::InactiveActiveSession,
                [node.key.clone(), key.clone()],
                format!("{} reports {} as active, but the session is not marked active", node.key, key),
            ));
        }
    }
}

fn multiple_active_sessions(graph: &Graph, out: &mut Vec<Finding>) {
    for (node, seat) in full_seats(graph) {
        if seat.can_multi_session {
            continue;
        }

        let active: Vec<NodeKey> = graph
            .sessions_on_seat(&node.key)
            .into_iter()
            .filter(|key| {
                graph
                    .node(key)
                    .filter(|n| !n.partial)
                    .and_then(Node::as_session)
                    .is_some_and(|s| s.active)
            })
            .collect();

        if active.len() < 2 {
            continue;
        }

        let names: Vec<String> = active.iter().map(ToString::to_string).collect();
        out.push(Finding::new(
            Category::MultipleActiveSessions,
            std::iter::once(node.key.clone()).chain(active),
            format!("{} cannot multiplex sessions but has {} active: {}", node.key, names.len(), names.join(", ")),
        ));
    }
}

fn orphaned_active_users(graph: &Graph, out: &mut Vec<Finding>) {
    let users = graph
        .nodes_of(EntityKind::User)
        .filter(|n| !n.partial)
        .filter_map(|n| n.as_user().map(|user| (n, user)));

    for (node, user) in users {
        if !user.currently_active || !graph.sessions_of_user(&node.key).is_empty() {
            continue;
        }

        let state = user.state.as_deref().unwrap_or("active");
        out.push(Finding::new(
            Category::OrphanedActiveUser,
            [node.key.clone()],
            format!("{} is {} but none of its sessions were returned", node.key, state),
        ));
    }
}

fn dead_session_leaders(graph: &Graph, out: &mut Vec<Finding>) {
    for (node, session) in full_sessions(graph) {
        let (Some(pid), Some(Liveness::Dead)) = (session.leader, session.leader_liveness) else {
            continue;
        };
        out.push(Finding::new(
            Category::DeadSessionLeader,
            [node.key.clone()],
            format!("{} leader process {} no longer exists", node.key, pid),
        ));
    }
}

fn closing_sessions(graph: &Graph, out: &mut Vec<Finding>) {
    for (node, session) in full_sessions(graph) {
        if session.state.as_deref() != Some("closing") {
            continue;
        }
        out.push(Finding::new(
            Category::ClosingSession,
            [node.key.clone()],
            format!("{} is closing but still present", node.key),
        ));
    }
}
