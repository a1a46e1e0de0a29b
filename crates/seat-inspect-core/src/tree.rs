//! Presentation tree: seats, their sessions, and the sessions' owners

use seat_inspect_api::Relation;
use seat_inspect_util::{EntityKind, NodeKey};
use std::collections::{BTreeMap, BTreeSet};

use crate::graph::{Node, NodeView};
use crate::inspect::Inspection;

pub const NO_SEAT_LABEL: &str = "sessions without a seat";
pub const NO_SESSIONS_LABEL: &str = "users without sessions";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    /// `None` for grouping nodes
    pub key: Option<NodeKey>,
    pub label: String,
    /// Indices into `Inspection::findings`
    pub findings: Vec<usize>,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    fn group(label: &str, children: Vec<TreeNode>) -> Self {
        Self {
            key: None,
            label: label.to_string(),
            findings: Vec::new(),
            children,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    pub roots: Vec<TreeNode>,
    /// Findings implicating no rendered node
    pub unplaced: Vec<usize>,
}

impl Tree {
    pub fn from_inspection(inspection: &Inspection) -> Self {
        let mut builder = TreeBuilder {
            inspection,
            placed: BTreeSet::new(),
        };
        let graph = &inspection.graph;

        let mut roots: Vec<TreeNode> = graph
            .nodes_of(EntityKind::Seat)
            .map(|seat| {
                let children = graph
                    .sessions_on_seat(&seat.key)
                    .iter()
                    .map(|session| builder.session(session))
                    .collect();
                builder.leaf(&seat.key, children)
            })
            .collect();

        // Sessions naming a seat that was not returned hang off that seat
        let mut missing_seats: BTreeMap<NodeKey, Vec<NodeKey>> = BTreeMap::new();
        let mut seatless_keys = Vec::new();
        for session in graph
            .nodes_of(EntityKind::Session)
            .filter(|s| graph.seats_of_session(&s.key).is_empty())
        {
            let mut missing = graph
                .edges_from(&session.key)
                .filter(|e| e.relation == Relation::OnSeat && e.is_dangling())
                .peekable();
            if missing.peek().is_none() {
                seatless_keys.push(session.key.clone());
            }
            for edge in missing {
                missing_seats.entry(edge.to.clone()).or_default().push(session.key.clone());
            }
        }

        for (seat, sessions) in &missing_seats {
            let children = sessions.iter().map(|s| builder.session(s)).collect();
            roots.push(builder.leaf(seat, children));
        }

        let seatless: Vec<TreeNode> = seatless_keys.iter().map(|s| builder.session(s)).collect();
        if !seatless.is_empty() {
            roots.push(TreeNode::group(NO_SEAT_LABEL, seatless));
        }

        let idle_users: Vec<TreeNode> = graph
            .nodes_of(EntityKind::User)
            .filter(|u| graph.sessions_of_user(&u.key).is_empty())
            .map(|u| builder.leaf(&u.key, Vec::new()))
            .collect();
        if !idle_users.is_empty() {
            roots.push(TreeNode::group(NO_SESSIONS_LABEL, idle_users));
        }

        let unplaced = inspection
            .findings
            .iter()
            .enumerate()
            .filter(|(_, f)| !f.nodes.iter().any(|k| builder.placed.contains(k)))
            .map(|(i, _)| i)
            .collect();

        Self { roots, unplaced }
    }

    /// Depth-first walk yielding each node with its depth
    pub fn walk(&self) -> Vec<(usize, &TreeNode)> {
        fn visit<'a>(node: &'a TreeNode, depth: usize, out: &mut Vec<(usize, &'a TreeNode)>) {
            out.push((depth, node));
            for child in &node.children {
                visit(child, depth + 1, out);
            }
        }

        let mut out = Vec::new();
        for root in &self.roots {
            visit(root, 0, &mut out);
        }
        out
    }
}

struct TreeBuilder<'a> {
    inspection: &'a Inspection,
    placed: BTreeSet<NodeKey>,
}

impl TreeBuilder<'_> {
    fn session(&mut self, key: &NodeKey) -> TreeNode {
        let owners = self
            .inspection
            .graph
            .owners_of_session(key)
            .iter()
            .map(|user| self.leaf(user, Vec::new()))
            .collect();
        self.leaf(key, owners)
    }

    fn leaf(&mut self, key: &NodeKey, children: Vec<TreeNode>) -> TreeNode {
        self.placed.insert(key.clone());
        let label = match self.inspection.graph.node(key) {
            Some(node) => label(node),
            None => format!("{} (not found)", key),
        };
        TreeNode {
            key: Some(key.clone()),
            label,
            findings: self.inspection.findings_for(key),
            children,
        }
    }
}

fn label(node: &Node) -> String {
    let mut parts = vec![node.key.to_string()];

    if node.partial {
        parts.push("(details unavailable)".to_string());
        return parts.join(" ");
    }

    match &node.view {
        NodeView::Seat(seat) => {
            let caps: Vec<&str> = [
                (seat.can_multi_session, "multi-session"),
                (seat.can_graphical, "graphical"),
                (seat.can_tty, "tty"),
            ]
            .into_iter()
            .filter_map(|(on, name)| on.then_some(name))
            .collect();
            if !caps.is_empty() {
                parts.push(format!("({})", caps.join(", ")));
            }
        }
        NodeView::Session(session) => {
            parts.push(session.class.as_str().to_string());
            if let Some(tty) = &session.tty {
                parts.push(tty.clone());
            }
            if let Some(service) = &session.service {
                parts.push(format!("via {}", service));
            }
            if session.active {
                parts.push("active".to_string());
            }
            if let Some(state) = &session.state
                && !matches!(state.as_str(), "active" | "online")
            {
                parts.push(format!("[{}]", state));
            }
            if let Some(pid) = session.leader {
                parts.push(format!("leader {}", pid));
            }
        }
        NodeView::User(user) => {
            if let Some(name) = &user.name {
                parts.push(format!("({})", name));
            }
            if let Some(state) = &user.state {
                parts.push(state.clone());
            }
            if user.linger {
                parts.push("linger".to_string());
            }
        }
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Inspector;
    use seat_inspect_api::{AttrValue, RawRecord, Snapshot};
    use seat_inspect_config::InspectConfig;
    use seat_inspect_source_api::{bag, refs};

    fn inspect(snapshot: &Snapshot) -> Inspection {
        Inspector::new(InspectConfig::default()).analyze(snapshot).unwrap()
    }

    fn snapshot() -> Snapshot {
        let mut snapshot = Snapshot::empty("test");
        snapshot.seats.push(RawRecord::new(
            "seat0",
            bag([("Sessions", refs(["2"])), ("CanGraphical", AttrValue::Bool(true))]),
        ));
        snapshot.sessions.push(RawRecord::new(
            "2",
            bag([("Seat", refs(["seat0"])), ("User", refs(["1000"])), ("Active", AttrValue::Bool(true))]),
        ));
        snapshot.sessions.push(RawRecord::new(
            "c1",
            bag([("Seat", refs(Vec::<&str>::new())), ("User", refs(["1000"]))]),
        ));
        snapshot.users.push(RawRecord::new(
            "1000",
            bag([("Sessions", refs(["2", "c1"])), ("Name", AttrValue::Str("enrico".into()))]),
        ));
        snapshot.users.push(RawRecord::new(
            "1001",
            bag([("Sessions", refs(Vec::<&str>::new())), ("State", AttrValue::Str("lingering".into()))]),
        ));
        snapshot
    }

    #[test]
    fn seats_then_groups() {
        let tree = Tree::from_inspection(&inspect(&snapshot()));

        assert_eq!(tree.roots.len(), 3);
        assert_eq!(tree.roots[0].key, Some(NodeKey::seat("seat0")));
        assert_eq!(tree.roots[0].label, "seat/seat0 (graphical)");
        assert_eq!(tree.roots[1].label, NO_SEAT_LABEL);
        assert_eq!(tree.roots[2].label, NO_SESSIONS_LABEL);

        let session = &tree.roots[0].children[0];
        assert_eq!(session.key, Some(NodeKey::session("2")));
        assert_eq!(session.children[0].label, "user/1000 (enrico)");

        assert_eq!(tree.roots[1].children[0].key, Some(NodeKey::session("c1")));
        assert_eq!(tree.roots[2].children[0].key, Some(NodeKey::user("1001")));
        assert!(tree.unplaced.is_empty());
    }

    #[test]
    fn findings_attached_to_implicated_nodes() {
        let mut snapshot = snapshot();
        snapshot.sessions[0]
            .attrs
            .insert("Seat".into(), refs(["seat9"]));

        let inspection = inspect(&snapshot);
        let tree = Tree::from_inspection(&inspection);

        let walked = tree.walk();
        let session = walked
            .iter()
            .find(|(_, n)| n.key == Some(NodeKey::session("2")))
            .map(|(_, n)| *n)
            .unwrap();
        assert!(!session.findings.is_empty());
        for index in &session.findings {
            assert!(inspection.findings[*index].implicates(&NodeKey::session("2")));
        }
    }

    #[test]
    fn sessions_on_missing_seat_are_grouped_under_it() {
        let mut snapshot = snapshot();
        snapshot.sessions[0].attrs.insert("Seat".into(), refs(["seat9"]));
        snapshot.seats[0].attrs.insert("Sessions".into(), refs(Vec::<&str>::new()));

        let inspection = inspect(&snapshot);
        let tree = Tree::from_inspection(&inspection);

        let labels: Vec<&str> = tree.roots.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["seat/seat0 (graphical)", "seat/seat9 (not found)", NO_SEAT_LABEL, NO_SESSIONS_LABEL]
        );

        let missing = &tree.roots[1];
        assert_eq!(missing.key, Some(NodeKey::seat("seat9")));
        assert_eq!(missing.children[0].key, Some(NodeKey::session("2")));
        assert!(!missing.findings.is_empty());

        // Only the session with an empty seat stays in the seatless group
        let seatless: Vec<_> = tree.roots[2].children.iter().map(|c| c.key.clone()).collect();
        assert_eq!(seatless, vec![Some(NodeKey::session("c1"))]);
    }

    #[test]
    fn labels_show_service_and_linger() {
        let mut snapshot = snapshot();
        snapshot.sessions[0]
            .attrs
            .insert("Service".into(), AttrValue::Str("gdm-password".into()));
        snapshot.users[1].attrs.insert("Linger".into(), AttrValue::Bool(true));

        let tree = Tree::from_inspection(&inspect(&snapshot));
        let labels: Vec<&str> = tree.walk().iter().map(|(_, n)| n.label.as_str()).collect();

        assert!(labels.contains(&"session/2 other via gdm-password active"));
        assert!(labels.contains(&"user/1001 lingering linger"));
    }

    #[test]
    fn empty_inspection_has_empty_tree() {
        let tree = Tree::from_inspection(&inspect(&Snapshot::empty("test")));
        assert!(tree.roots.is_empty());
        assert!(tree.unplaced.is_empty());
        assert!(tree.walk().is_empty());
    }
}
