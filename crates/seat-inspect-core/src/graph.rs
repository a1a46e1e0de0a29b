//! Relationship graph over seats, sessions and users
//!
//! The graph is built in one pass from a fetched snapshot and never changes
//! afterwards. Every identifier reference becomes an edge: references to
//! entities that were not fetched are kept as dangling edges, and inverse
//! edges are inferred when the other side is a bare node whose details
//! could not be fetched.

use seat_inspect_api::{
    AttrValue, EdgeOrigin, EdgeTarget, Liveness, PropertyBag, RawRecord, Relation, Snapshot,
};
use seat_inspect_util::{EntityId, EntityKind, InspectError, NodeKey, Result};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Attributes carrying relations, per entity kind
fn relation_attributes(kind: EntityKind) -> &'static [(&'static str, Relation)] {
    match kind {
        EntityKind::Seat => &[("Sessions", Relation::Hosts), ("ActiveSession", Relation::ActiveSession)],
        EntityKind::Session => &[("Seat", Relation::OnSeat), ("User", Relation::OwnedBy)],
        EntityKind::User => &[("Sessions", Relation::Owns)],
    }
}

/// Coarse session classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionClass {
    Graphical,
    Console,
    Remote,
    Greeter,
    Background,
    Other,
}

impl SessionClass {
    fn classify(remote: bool, class: Option<&str>, session_type: Option<&str>) -> Self {
        if remote {
            return Self::Remote;
        }
        match (class, session_type) {
            (Some("background" | "background-light" | "manager" | "manager-early"), _) => {
                Self::Background
            }
            (Some("greeter" | "lock-screen"), _) => Self::Greeter,
            (_, Some("x11" | "wayland" | "mir")) => Self::Graphical,
            (_, Some("tty")) => Self::Console,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Graphical => "graphical",
            Self::Console => "console",
            Self::Remote => "remote",
            Self::Greeter => "greeter",
            Self::Background => "background",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatNode {
    pub sessions: Vec<EntityId>,
    pub active_session: Option<EntityId>,
    pub can_multi_session: bool,
    pub can_graphical: bool,
    pub can_tty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionNode {
    pub user: Option<EntityId>,
    pub seat: Option<EntityId>,
    pub active: bool,
    pub class: SessionClass,
    pub session_type: Option<String>,
    pub state: Option<String>,
    pub name: Option<String>,
    pub tty: Option<String>,
    pub service: Option<String>,
    pub leader: Option<u32>,
    /// Probe result for the leader, when probing ran
    pub leader_liveness: Option<Liveness>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserNode {
    pub name: Option<String>,
    pub sessions: Vec<EntityId>,
    pub state: Option<String>,
    pub linger: bool,
    /// Reported logged-in, or owning an active session
    pub currently_active: bool,
}

/// Interpreted view of a node's attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeView {
    Seat(SeatNode),
    Session(SessionNode),
    User(UserNode),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub key: NodeKey,
    /// Details could not be fetched; only the identifier is known
    pub partial: bool,
    pub attrs: PropertyBag,
    pub view: NodeView,
}

fn str_attr(attrs: &PropertyBag, name: &str) -> Option<String> {
    attrs.get(name).map(|v| v.to_string()).filter(|s| !s.is_empty())
}

fn bool_attr(attrs: &PropertyBag, name: &str) -> bool {
    attrs.get(name).and_then(AttrValue::as_bool).unwrap_or(false)
}

fn refs_attr(attrs: &PropertyBag, name: &str) -> Vec<EntityId> {
    attrs.get(name).and_then(AttrValue::as_refs).unwrap_or_default()
}

impl Node {
    fn from_record(key: NodeKey, record: &RawRecord) -> Self {
        let attrs = &record.attrs;
        let view = match key.kind {
            EntityKind::Seat => NodeView::Seat(SeatNode {
                sessions: refs_attr(attrs, "Sessions"),
                active_session: refs_attr(attrs, "ActiveSession").into_iter().next(),
                can_multi_session: bool_attr(attrs, "CanMultiSession"),
                can_graphical: bool_attr(attrs, "CanGraphical"),
                can_tty: bool_attr(attrs, "CanTTY"),
            }),
            EntityKind::Session => {
                let remote = bool_attr(attrs, "Remote");
                let session_type = str_attr(attrs, "Type");
                let class = str_attr(attrs, "Class");
                NodeView::Session(SessionNode {
                    user: refs_attr(attrs, "User").into_iter().next(),
                    seat: refs_attr(attrs, "Seat").into_iter().next(),
                    active: bool_attr(attrs, "Active"),
                    class: SessionClass::classify(remote, class.as_deref(), session_type.as_deref()),
                    session_type,
                    state: str_attr(attrs, "State"),
                    name: str_attr(attrs, "Name"),
                    tty: str_attr(attrs, "TTY"),
                    service: str_attr(attrs, "Service"),
                    leader: attrs
                        .get("Leader")
                        .and_then(AttrValue::as_int)
                        .and_then(|pid| u32::try_from(pid).ok())
                        .filter(|pid| *pid > 0),
                    leader_liveness: None,
                })
            }
            EntityKind::User => {
                let state = str_attr(attrs, "State");
                NodeView::User(UserNode {
                    name: str_attr(attrs, "Name"),
                    sessions: refs_attr(attrs, "Sessions"),
                    currently_active: matches!(state.as_deref(), Some("active" | "online")),
                    state,
                    linger: bool_attr(attrs, "Linger"),
                })
            }
        };

        Self {
            key,
            partial: record.partial,
            attrs: record.attrs.clone(),
            view,
        }
    }

    pub fn as_seat(&self) -> Option<&SeatNode> {
        match &self.view {
            NodeView::Seat(seat) => Some(seat),
            _ => None,
        }
    }

    pub fn as_session(&self) -> Option<&SessionNode> {
        match &self.view {
            NodeView::Session(session) => Some(session),
            _ => None,
        }
    }

    pub fn as_user(&self) -> Option<&UserNode> {
        match &self.view {
            NodeView::User(user) => Some(user),
            _ => None,
        }
    }
}

/// A typed, directed edge
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Edge {
    pub from: NodeKey,
    pub relation: Relation,
    pub to: NodeKey,
    pub target: EdgeTarget,
    pub origin: EdgeOrigin,
}

impl Edge {
    pub fn is_dangling(&self) -> bool {
        self.target == EdgeTarget::Dangling
    }

    pub fn is_resolved(&self) -> bool {
        self.target == EdgeTarget::Resolved
    }
}

/// Immutable relationship graph
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Graph {
    nodes: BTreeMap<NodeKey, Node>,
    /// Sorted by (from, relation, to)
    edges: Vec<Edge>,
    /// Relations each node reported, even when the reported list was empty
    declared: BTreeSet<(NodeKey, Relation)>,
}

/// Build a graph from raw records
pub fn build(sessions: &[RawRecord], seats: &[RawRecord], users: &[RawRecord]) -> Result<Graph> {
    let mut nodes = BTreeMap::new();

    for (kind, records) in [
        (EntityKind::Seat, seats),
        (EntityKind::Session, sessions),
        (EntityKind::User, users),
    ] {
        for record in records {
            let id = record
                .id
                .clone()
                .filter(|id| !id.is_empty())
                .ok_or_else(|| InspectError::malformed(kind, "record has no identifier"))?;

            let key = NodeKey::new(kind, id);
            if nodes.contains_key(&key) {
                warn!(node = %key, "Duplicate record, keeping the first");
                continue;
            }
            let node = Node::from_record(key.clone(), record);
            nodes.insert(key, node);
        }
    }

    let mut edges = Vec::new();
    let mut declared = BTreeSet::new();

    for node in nodes.values() {
        for (attr, relation) in relation_attributes(node.key.kind) {
            let Some(value) = node.attrs.get(*attr) else {
                continue;
            };
            declared.insert((node.key.clone(), *relation));

            let Some(targets) = value.as_refs() else {
                warn!(node = %node.key, attr = %attr, "Relation attribute is not an identifier list");
                continue;
            };

            let mut seen = BTreeSet::new();
            for target_id in targets {
                if !seen.insert(target_id.clone()) {
                    continue;
                }
                let to = NodeKey::new(relation.target_kind(), target_id);
                let target = if nodes.contains_key(&to) {
                    EdgeTarget::Resolved
                } else {
                    EdgeTarget::Dangling
                };
                edges.push(Edge {
                    from: node.key.clone(),
                    relation: *relation,
                    to,
                    target,
                    origin: EdgeOrigin::Reported,
                });
            }
        }
    }

    // A fully fetched record that omits a relation does not list it
    let mut inferred = BTreeSet::new();
    for edge in edges.iter().filter(|e| e.is_resolved()) {
        if let Some(inverse) = edge.relation.inverse()
            && nodes.get(&edge.to).is_some_and(|n| n.partial)
        {
            inferred.insert(Edge {
                from: edge.to.clone(),
                relation: inverse,
                to: edge.from.clone(),
                target: EdgeTarget::Resolved,
                origin: EdgeOrigin::Inferred,
            });
        }
    }
    edges.extend(inferred);
    edges.sort();

    let mut graph = Graph {
        nodes,
        edges,
        declared,
    };
    graph.derive_user_activity();

    debug!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        dangling = graph.dangling_edges().count(),
        "Graph built"
    );

    Ok(graph)
}

impl Graph {
    /// Build from a snapshot, attaching leader liveness results
    pub fn build(snapshot: &Snapshot) -> Result<Self> {
        let mut graph = self::build(&snapshot.sessions, &snapshot.seats, &snapshot.users)?;
        for node in graph.nodes.values_mut() {
            if let NodeView::Session(session) = &mut node.view
                && let Some(pid) = session.leader
            {
                session.leader_liveness = snapshot.leaders.get(&pid).copied();
            }
        }
        Ok(graph)
    }

    fn derive_user_activity(&mut self) {
        let users: Vec<NodeKey> = self
            .nodes
            .keys()
            .filter(|k| k.kind == EntityKind::User)
            .cloned()
            .collect();

        for user in users {
            let owns_active = self
                .sessions_of_user(&user)
                .iter()
                .filter_map(|s| self.nodes.get(s).and_then(Node::as_session))
                .any(|s| s.active);

            if owns_active
                && let Some(node) = self.nodes.get_mut(&user)
                && let NodeView::User(view) = &mut node.view
            {
                view.currently_active = true;
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// All nodes in ascending key order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node(&self, key: &NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    pub fn contains(&self, key: &NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn nodes_of(&self, kind: EntityKind) -> impl Iterator<Item = &Node> {
        self.nodes.values().filter(move |n| n.key.kind == kind)
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edges_from<'a>(&'a self, key: &'a NodeKey) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| &e.from == key)
    }

    pub fn dangling_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(|e| e.is_dangling())
    }

    /// Whether `key`'s record carried the attribute for `relation`
    pub fn declares(&self, key: &NodeKey, relation: Relation) -> bool {
        self.declared.contains(&(key.clone(), relation))
    }

    /// Whether `from` itself reported `relation` pointing at `to`
    pub fn reports(&self, from: &NodeKey, relation: Relation, to: &NodeKey) -> bool {
        self.edges.iter().any(|e| {
            &e.from == from && e.relation == relation && &e.to == to && e.origin == EdgeOrigin::Reported
        })
    }

    /// Resolved targets of `relation` from `from`, plus resolved sources of
    /// the inverse relation pointing at `from`
    fn linked(&self, key: &NodeKey, relation: Relation) -> Vec<NodeKey> {
        let inverse = relation.inverse();
        let mut linked: Vec<NodeKey> = self
            .edges
            .iter()
            .filter(|e| e.is_resolved())
            .filter_map(|e| {
                if &e.from == key && e.relation == relation {
                    Some(e.to.clone())
                } else if &e.to == key && Some(e.relation) == inverse {
                    Some(e.from.clone())
                } else {
                    None
                }
            })
            .collect();
        linked.sort();
        linked.dedup();
        linked
    }

    /// Sessions linked to a seat in either direction
    pub fn sessions_on_seat(&self, seat: &NodeKey) -> Vec<NodeKey> {
        self.linked(seat, Relation::Hosts)
    }

    /// Seats linked to a session in either direction
    pub fn seats_of_session(&self, session: &NodeKey) -> Vec<NodeKey> {
        self.linked(session, Relation::OnSeat)
    }

    /// Sessions linked to a user in either direction
    pub fn sessions_of_user(&self, user: &NodeKey) -> Vec<NodeKey> {
        self.linked(user, Relation::Owns)
    }

    /// Users linked to a session in either direction
    pub fn owners_of_session(&self, session: &NodeKey) -> Vec<NodeKey> {
        self.linked(session, Relation::OwnedBy)
    }
}
