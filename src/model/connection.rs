//! Undirected edges between keypoints.

use serde::{Deserialize, Serialize};

use super::EntityId;

/// An undirected link between two keypoints, referenced by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub from: EntityId,
    pub to: EntityId,
}

impl Connection {
    /// Create a connection.
    pub fn new(from: EntityId, to: EntityId) -> Self {
        Self { from, to }
    }

    /// Whether this edge joins `a` and `b`, in either direction.
    pub fn joins(&self, a: &EntityId, b: &EntityId) -> bool {
        (&self.from == a && &self.to == b) || (&self.from == b && &self.to == a)
    }

    /// Whether either endpoint is `id`.
    pub fn touches(&self, id: &EntityId) -> bool {
        &self.from == id || &self.to == id
    }
}

/// Result of asking a [`ConnectionSet`] to add an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The edge was appended.
    Added,
    /// An edge between the same endpoints already exists.
    Duplicate,
    /// Both endpoints are the same keypoint.
    SelfLoop,
}

/// Edge list with no self-loops and no duplicates in either direction.
///
/// Serializes as a plain edge array. Deserializing goes through
/// [`ConnectionSet::from_edges`], so stored duplicates and self-loops are
/// dropped on load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Connection>", into = "Vec<Connection>")]
pub struct ConnectionSet {
    edges: Vec<Connection>,
}

impl From<Vec<Connection>> for ConnectionSet {
    fn from(edges: Vec<Connection>) -> Self {
        Self::from_edges(edges)
    }
}

impl From<ConnectionSet> for Vec<Connection> {
    fn from(set: ConnectionSet) -> Self {
        set.edges
    }
}

impl ConnectionSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from raw edges, dropping self-loops and duplicates.
    pub fn from_edges(edges: impl IntoIterator<Item = Connection>) -> Self {
        let mut set = Self::new();
        for edge in edges {
            set.add(edge.from, edge.to);
        }
        set
    }

    /// Check whether `from -> to` would be accepted without adding it.
    pub fn check(&self, from: &EntityId, to: &EntityId) -> AddOutcome {
        if from == to {
            AddOutcome::SelfLoop
        } else if self.contains(from, to) {
            AddOutcome::Duplicate
        } else {
            AddOutcome::Added
        }
    }

    /// Add the edge `{from, to}` unless it is a self-loop or duplicate.
    pub fn add(&mut self, from: EntityId, to: EntityId) -> AddOutcome {
        let outcome = self.check(&from, &to);
        if outcome == AddOutcome::Added {
            log::debug!("Connected {} -> {}", from, to);
            self.edges.push(Connection::new(from, to));
        }
        outcome
    }

    /// Whether an edge joins `a` and `b` in either direction.
    pub fn contains(&self, a: &EntityId, b: &EntityId) -> bool {
        self.edges.iter().any(|c| c.joins(a, b))
    }

    /// Remove the edge joining `a` and `b`. Returns true if one was removed.
    pub fn remove(&mut self, a: &EntityId, b: &EntityId) -> bool {
        let before = self.edges.len();
        self.edges.retain(|c| !c.joins(a, b));
        before != self.edges.len()
    }

    /// Remove every edge touching `id`, returning how many went.
    pub fn remove_touching(&mut self, id: &EntityId) -> usize {
        let before = self.edges.len();
        self.edges.retain(|c| !c.touches(id));
        before - self.edges.len()
    }

    /// Edges whose endpoints both satisfy `is_live`.
    ///
    /// Consumers use this to skip dangling references instead of failing.
    pub fn resolved<'a>(
        &'a self,
        is_live: impl Fn(&EntityId) -> bool + 'a,
    ) -> impl Iterator<Item = &'a Connection> + 'a {
        self.edges
            .iter()
            .filter(move |c| is_live(&c.from) && is_live(&c.to))
    }

    /// Append an edge without the dedup checks.
    ///
    /// Lets tests build sets holding dangling edges.
    #[cfg(test)]
    pub(crate) fn push_unchecked(&mut self, edge: Connection) {
        self.edges.push(edge);
    }

    /// All edges in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Connection> {
        self.edges.iter()
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Remove all edges.
    pub fn clear(&mut self) {
        self.edges.clear();
    }
}

impl<'a> IntoIterator for &'a ConnectionSet {
    type Item = &'a Connection;
    type IntoIter = std::slice::Iter<'a, Connection>;

    fn into_iter(self) -> Self::IntoIter {
        self.edges.iter()
    }
}
