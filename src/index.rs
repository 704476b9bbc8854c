//! Shape -> connector adjacency.
//!
//! The index is the single owner of the "which connectors touch this shape"
//! relationship. Shapes and connectors never hold references to each other.
//! An entry exists for every shape in the scene, empty or not, and for no
//! other id.

use std::collections::{BTreeSet, HashMap};

use crate::shapes::{Connector, ConnectorId, ShapeId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectorIndex {
    by_shape: HashMap<ShapeId, BTreeSet<ConnectorId>>,
}

impl ConnectorIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a shape with no connectors
    pub fn track(&mut self, shape: ShapeId) {
        self.by_shape.entry(shape).or_default();
    }

    /// Stop tracking a shape, returning whatever was still attached
    pub fn forget(&mut self, shape: ShapeId) -> BTreeSet<ConnectorId> {
        self.by_shape.remove(&shape).unwrap_or_default()
    }

    /// Register a connector under both endpoints.
    ///
    /// Returns false (and changes nothing) if either endpoint is untracked.
    pub fn link(&mut self, connector: &Connector) -> bool {
        if !self.is_tracked(connector.start) || !self.is_tracked(connector.end) {
            return false;
        }
        for shape in [connector.start, connector.end] {
            if let Some(set) = self.by_shape.get_mut(&shape) {
                set.insert(connector.id);
            }
        }
        true
    }

    /// Remove a connector from both endpoints' entries
    pub fn unlink(&mut self, connector: &Connector) {
        for shape in [connector.start, connector.end] {
            if let Some(set) = self.by_shape.get_mut(&shape) {
                set.remove(&connector.id);
            }
        }
    }

    /// Whether the shape has an entry
    pub fn is_tracked(&self, shape: ShapeId) -> bool {
        self.by_shape.contains_key(&shape)
    }

    /// Connectors touching `shape`, in id order
    pub fn connectors_of(&self, shape: ShapeId) -> impl Iterator<Item = ConnectorId> + '_ {
        self.by_shape.get(&shape).into_iter().flatten().copied()
    }

    /// Number of connectors touching `shape`
    pub fn degree(&self, shape: ShapeId) -> usize {
        self.by_shape.get(&shape).map_or(0, BTreeSet::len)
    }

    /// Iterate every tracked shape and its connector set
    pub fn iter(&self) -> impl Iterator<Item = (ShapeId, &BTreeSet<ConnectorId>)> {
        self.by_shape.iter().map(|(id, set)| (*id, set))
    }

    /// Number of tracked shapes
    pub fn len(&self) -> usize {
        self.by_shape.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_shape.is_empty()
    }
}
