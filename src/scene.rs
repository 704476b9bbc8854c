//! The owned shape/connector graph.
//!
//! `Scene` is the only place shapes and connectors are stored. Every
//! mutation it exposes keeps the connector index consistent with the
//! connector collection and never leaves a connector pointing at a missing
//! shape: removing a shape removes its connectors, and inserting a connector
//! whose endpoints are not both present is refused.

use std::collections::HashMap;

use anyhow::{bail, Result};
use serde::Serialize;
use tracing::trace;

use crate::canvas::{Point, Position, Segment};
use crate::index::ConnectorIndex;
use crate::shapes::{Connector, ConnectorId, EntityId, ShapeId, ShapeNode};

/// What a mutation did, in enough detail for a view to redraw incrementally
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    pub added: Vec<EntityId>,
    pub removed: Vec<EntityId>,
    pub updated: Vec<EntityId>,
}

impl ChangeSet {
    /// Create an empty change set
    pub fn new() -> Self {
        Self::default()
    }

    /// True when nothing changed
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }

    /// Record an insertion
    pub fn record_added(&mut self, id: impl Into<EntityId>) {
        let id = id.into();
        if let Some(idx) = self.removed.iter().position(|e| *e == id) {
            // removed then restored within one notification: net effect is a redraw
            self.removed.remove(idx);
            self.record_updated(id);
        } else if !self.added.contains(&id) {
            self.added.push(id);
        }
    }

    /// Record a removal, cancelling an add seen earlier in this set
    pub fn record_removed(&mut self, id: impl Into<EntityId>) {
        let id = id.into();
        self.updated.retain(|e| *e != id);
        if let Some(idx) = self.added.iter().position(|e| *e == id) {
            self.added.remove(idx);
        } else if !self.removed.contains(&id) {
            self.removed.push(id);
        }
    }

    /// Record an in-place change (position, label, connector geometry)
    pub fn record_updated(&mut self, id: impl Into<EntityId>) {
        let id = id.into();
        if !self.added.contains(&id) && !self.removed.contains(&id) && !self.updated.contains(&id) {
            self.updated.push(id);
        }
    }

    /// Fold another change set into this one, in order
    pub fn merge(&mut self, other: ChangeSet) {
        for id in other.removed {
            self.record_removed(id);
        }
        for id in other.added {
            self.record_added(id);
        }
        for id in other.updated {
            self.record_updated(id);
        }
    }
}

/// A shape taken out of the scene together with everything needed to put it back
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedShape {
    pub shape: ShapeNode,
    /// Stacking slot the shape occupied
    pub slot: usize,
    /// Connectors removed along with the shape, in id order
    pub connectors: Vec<Connector>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    shapes: HashMap<ShapeId, ShapeNode>,
    /// Shape ids bottom to top
    z_order: Vec<ShapeId>,
    connectors: HashMap<ConnectorId, Connector>,
    index: ConnectorIndex,
}

impl Scene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a shape by id
    pub fn shape(&self, id: ShapeId) -> Option<&ShapeNode> {
        self.shapes.get(&id)
    }

    /// Look up a connector by id
    pub fn connector(&self, id: ConnectorId) -> Option<&Connector> {
        self.connectors.get(&id)
    }

    /// Whether the entity is currently in the scene
    pub fn contains(&self, id: EntityId) -> bool {
        match id {
            EntityId::Shape(id) => self.shapes.contains_key(&id),
            EntityId::Connector(id) => self.connectors.contains_key(&id),
        }
    }

    /// Shapes in stacking order, bottom first
    pub fn shapes(&self) -> impl Iterator<Item = &ShapeNode> {
        self.z_order.iter().filter_map(|id| self.shapes.get(id))
    }

    /// Connectors in no particular order
    pub fn connectors(&self) -> impl Iterator<Item = &Connector> {
        self.connectors.values()
    }

    /// Connectors attached to a shape, looked up through the index
    pub fn connectors_of(&self, shape: ShapeId) -> impl Iterator<Item = &Connector> {
        self.index
            .connectors_of(shape)
            .filter_map(|id| self.connectors.get(&id))
    }

    /// The shape -> connector index
    pub fn index(&self) -> &ConnectorIndex {
        &self.index
    }

    /// Number of shapes
    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// Number of connectors
    pub fn connector_count(&self) -> usize {
        self.connectors.len()
    }

    /// True when there are no shapes and no connectors
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty() && self.connectors.is_empty()
    }

    /// Position of a shape in the stacking order, bottom = 0
    pub fn stacking_slot(&self, id: ShapeId) -> Option<usize> {
        self.z_order.iter().position(|s| *s == id)
    }

    // --- Primitive mutations ---

    /// Insert a shape at a stacking slot (on top when `None` or out of range).
    ///
    /// Returns false if a shape with the same id is already present.
    pub(crate) fn insert_shape(&mut self, shape: ShapeNode, slot: Option<usize>, changes: &mut ChangeSet) -> bool {
        if self.shapes.contains_key(&shape.id) {
            return false;
        }
        let id = shape.id;
        let slot = slot.unwrap_or(self.z_order.len()).min(self.z_order.len());
        self.z_order.insert(slot, id);
        self.index.track(id);
        self.shapes.insert(id, shape);
        changes.record_added(id);
        trace!(shape = %id, slot, "inserted shape");
        true
    }

    /// Remove a shape and cascade to every connector attached to it
    pub(crate) fn remove_shape(&mut self, id: ShapeId, changes: &mut ChangeSet) -> Option<RemovedShape> {
        let slot = self.stacking_slot(id)?;
        let attached: Vec<ConnectorId> = self.index.connectors_of(id).collect();
        let connectors: Vec<Connector> = attached
            .into_iter()
            .filter_map(|cid| self.remove_connector(cid, changes))
            .collect();

        self.index.forget(id);
        self.z_order.remove(slot);
        let shape = self.shapes.remove(&id)?;
        changes.record_removed(id);
        trace!(shape = %id, cascaded = connectors.len(), "removed shape");
        Some(RemovedShape { shape, slot, connectors })
    }

    /// Insert a connector, resolving both endpoint ids against the live scene.
    ///
    /// Refused when the endpoints are the same shape, either endpoint is
    /// missing, or the id is already present.
    pub(crate) fn insert_connector(&mut self, connector: Connector, changes: &mut ChangeSet) -> bool {
        if connector.start == connector.end
            || self.connectors.contains_key(&connector.id)
            || !self.shapes.contains_key(&connector.start)
            || !self.shapes.contains_key(&connector.end)
        {
            return false;
        }
        if !self.index.link(&connector) {
            return false;
        }
        self.connectors.insert(connector.id, connector);
        changes.record_added(connector.id);
        trace!(connector = %connector.id, start = %connector.start, end = %connector.end, "inserted connector");
        true
    }

    pub(crate) fn remove_connector(&mut self, id: ConnectorId, changes: &mut ChangeSet) -> Option<Connector> {
        let connector = self.connectors.remove(&id)?;
        self.index.unlink(&connector);
        changes.record_removed(id);
        trace!(connector = %id, "removed connector");
        Some(connector)
    }

    /// Move a shape's anchor, invalidating every attached connector.
    ///
    /// Returns the previous position, or `None` for an unknown shape.
    pub(crate) fn set_position(&mut self, id: ShapeId, position: Position, changes: &mut ChangeSet) -> Option<Position> {
        let shape = self.shapes.get_mut(&id)?;
        let previous = shape.position;
        if previous != position {
            shape.position = position;
            changes.record_updated(id);
            for cid in self.index.connectors_of(id) {
                changes.record_updated(cid);
            }
        }
        Some(previous)
    }

    /// Replace a shape's label, returning the previous one
    pub(crate) fn set_label(&mut self, id: ShapeId, label: String, changes: &mut ChangeSet) -> Option<String> {
        let shape = self.shapes.get_mut(&id)?;
        if shape.label == label {
            return Some(label);
        }
        changes.record_updated(id);
        Some(std::mem::replace(&mut shape.label, label))
    }

    // --- Queries ---

    /// Topmost shape under a point
    pub fn shape_at(&self, p: Point) -> Option<ShapeId> {
        self.z_order
            .iter()
            .rev()
            .copied()
            .find(|id| self.shapes.get(id).is_some_and(|s| s.contains(p)))
    }

    /// Closest connector whose drawn segment passes within `tolerance` of a point
    pub fn connector_at(&self, p: Point, tolerance: f64) -> Option<ConnectorId> {
        self.connectors
            .keys()
            .filter_map(|id| {
                let distance = self.connector_geometry(*id)?.distance_to(p);
                (distance <= tolerance).then_some((*id, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
            .map(|(id, _)| id)
    }

    /// Connectors are drawn over shapes, so they win the hit test
    pub fn entity_at(&self, p: Point, tolerance: f64) -> Option<EntityId> {
        self.connector_at(p, tolerance)
            .map(EntityId::Connector)
            .or_else(|| self.shape_at(p).map(EntityId::Shape))
    }

    /// Same as [`shape`](Self::shape)
    pub fn find_shape_by_id(&self, id: ShapeId) -> Option<&ShapeNode> {
        self.shape(id)
    }

    /// Connector between two shapes regardless of direction, preferring `a -> b`.
    ///
    /// A linear scan; scenes hold tens to low hundreds of entities.
    pub fn find_connector_between(&self, a: ShapeId, b: ShapeId) -> Option<&Connector> {
        self.connectors
            .values()
            .filter(|c| c.joins(a, b))
            .min_by_key(|c| (c.start != a, c.id))
    }

    /// Current drawn geometry of a connector: centre to centre, clipped to
    /// both outlines. Recomputed from live shape positions on every call.
    pub fn connector_geometry(&self, id: ConnectorId) -> Option<Segment> {
        let connector = self.connectors.get(&id)?;
        let start = self.shapes.get(&connector.start)?;
        let end = self.shapes.get(&connector.end)?;
        Some(Segment::new(
            start.boundary_point(end.center()),
            end.boundary_point(start.center()),
        ))
    }

    /// Check referential integrity and index consistency
    pub fn validate(&self) -> Result<()> {
        for connector in self.connectors.values() {
            if connector.start == connector.end {
                bail!("connector {} joins shape {} to itself", connector.id, connector.start);
            }
            for endpoint in [connector.start, connector.end] {
                if !self.shapes.contains_key(&endpoint) {
                    bail!("connector {} references missing shape {}", connector.id, endpoint);
                }
            }
        }

        if self.index.len() != self.shapes.len() {
            bail!(
                "index tracks {} shapes but scene holds {}",
                self.index.len(),
                self.shapes.len()
            );
        }
        for (shape, set) in self.index.iter() {
            if !self.shapes.contains_key(&shape) {
                bail!("index tracks missing shape {}", shape);
            }
            for cid in set {
                match self.connectors.get(cid) {
                    Some(c) if c.touches(shape) => {}
                    Some(_) => bail!("index lists connector {} under unrelated shape {}", cid, shape),
                    None => bail!("index lists missing connector {} under shape {}", cid, shape),
                }
            }
            let expected = self.connectors.values().filter(|c| c.touches(shape)).count();
            if expected != set.len() {
                bail!("index lists {} connectors for shape {} but {} touch it", set.len(), shape, expected);
            }
        }

        if self.z_order.len() != self.shapes.len() || self.z_order.iter().any(|id| !self.shapes.contains_key(id)) {
            bail!("stacking order out of sync with shapes");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Size;
    use crate::shapes::ShapeKind;

    fn rect(x: i32, y: i32) -> ShapeNode {
        ShapeNode::new(ShapeKind::Rectangle, Position::new(x, y), Size::new(100, 50), "Rectangle")
    }

    fn scene_with(shapes: &[ShapeNode]) -> Scene {
        let mut scene = Scene::new();
        let mut changes = ChangeSet::new();
        for s in shapes {
            scene.insert_shape(s.clone(), None, &mut changes);
        }
        scene
    }

    #[test]
    fn test_change_set_nets_out() {
        let id = ShapeId::new();
        let mut changes = ChangeSet::new();
        changes.record_added(id);
        changes.record_updated(id);
        changes.record_removed(id);
        assert!(changes.is_empty());

        changes.record_removed(id);
        changes.record_added(id);
        assert_eq!(changes.updated, vec![EntityId::Shape(id)]);
        assert!(changes.added.is_empty() && changes.removed.is_empty());
    }

    #[test]
    fn test_remove_shape_cascades() {
        let (a, b, c) = (rect(0, 0), rect(200, 0), rect(400, 0));
        let mut scene = scene_with(&[a.clone(), b.clone(), c.clone()]);
        let mut changes = ChangeSet::new();
        let ab = Connector::new(a.id, b.id);
        let bc = Connector::new(b.id, c.id);
        let ca = Connector::new(c.id, a.id);
        for conn in [ab, bc, ca] {
            assert!(scene.insert_connector(conn, &mut changes));
        }

        let mut changes = ChangeSet::new();
        let removed = scene.remove_shape(a.id, &mut changes).expect("shape present");
        assert_eq!(removed.slot, 0);
        assert_eq!(removed.connectors.len(), 2);
        assert!(removed.connectors.iter().all(|c| c.touches(a.id)));
        assert_eq!(scene.connector_count(), 1);
        assert!(scene.connector(bc.id).is_some());
        assert_eq!(changes.removed.len(), 3);
        scene.validate().unwrap();
    }

    #[test]
    fn test_insert_connector_refuses_bad_endpoints() {
        let (a, b) = (rect(0, 0), rect(200, 0));
        let mut scene = scene_with(&[a.clone()]);
        let mut changes = ChangeSet::new();

        assert!(!scene.insert_connector(Connector::new(a.id, a.id), &mut changes));
        assert!(!scene.insert_connector(Connector::new(a.id, b.id), &mut changes));
        assert!(changes.is_empty());
        assert_eq!(scene.connector_count(), 0);
        scene.validate().unwrap();
    }

    #[test]
    fn test_move_invalidates_attached_connectors() {
        let (a, b, c) = (rect(0, 0), rect(200, 0), rect(400, 0));
        let mut scene = scene_with(&[a.clone(), b.clone(), c.clone()]);
        let mut changes = ChangeSet::new();
        let ab = Connector::new(a.id, b.id);
        let bc = Connector::new(b.id, c.id);
        scene.insert_connector(ab, &mut changes);
        scene.insert_connector(bc, &mut changes);

        let mut changes = ChangeSet::new();
        let before = scene.connector_geometry(ab.id).unwrap();
        assert_eq!(scene.set_position(a.id, Position::new(0, 200), &mut changes), Some(Position::new(0, 0)));
        assert_eq!(changes.updated, vec![EntityId::Shape(a.id), EntityId::Connector(ab.id)]);
        assert_ne!(scene.connector_geometry(ab.id).unwrap(), before);

        let mut unchanged = ChangeSet::new();
        scene.set_position(a.id, Position::new(0, 200), &mut unchanged);
        assert!(unchanged.is_empty());
        assert_eq!(scene.set_position(ShapeId::new(), Position::new(0, 0), &mut unchanged), None);
    }

    #[test]
    fn test_shape_at_prefers_topmost() {
        let (below, above) = (rect(0, 0), rect(40, 20));
        let scene = scene_with(&[below.clone(), above.clone()]);
        assert_eq!(scene.shape_at(Point::new(60.0, 30.0)), Some(above.id));
        assert_eq!(scene.shape_at(Point::new(10.0, 10.0)), Some(below.id));
        assert_eq!(scene.shape_at(Point::new(500.0, 500.0)), None);
    }

    #[test]
    fn test_entity_at_prefers_connector() {
        let (a, b) = (rect(0, 0), rect(300, 0));
        let mut scene = scene_with(&[a.clone(), b.clone()]);
        let ab = Connector::new(a.id, b.id);
        scene.insert_connector(ab, &mut ChangeSet::new());

        // the segment runs from (100, 25) to (300, 25)
        assert_eq!(scene.entity_at(Point::new(200.0, 27.0), 4.0), Some(EntityId::Connector(ab.id)));
        assert_eq!(scene.entity_at(Point::new(200.0, 40.0), 4.0), None);
        assert_eq!(scene.entity_at(Point::new(50.0, 25.0), 4.0), Some(EntityId::Shape(a.id)));
    }

    #[test]
    fn test_find_connector_between_is_direction_agnostic() {
        let (a, b, c) = (rect(0, 0), rect(200, 0), rect(400, 0));
        let mut scene = scene_with(&[a.clone(), b.clone(), c.clone()]);
        let ba = Connector::new(b.id, a.id);
        scene.insert_connector(ba, &mut ChangeSet::new());

        assert_eq!(scene.find_connector_between(a.id, b.id).map(|c| c.id), Some(ba.id));
        assert!(scene.find_connector_between(a.id, c.id).is_none());

        let ab = Connector::new(a.id, b.id);
        scene.insert_connector(ab, &mut ChangeSet::new());
        assert_eq!(scene.find_connector_between(a.id, b.id).map(|c| c.id), Some(ab.id));
        assert_eq!(scene.find_connector_between(b.id, a.id).map(|c| c.id), Some(ba.id));
    }

    #[test]
    fn test_reinsert_restores_stacking_slot() {
        let (a, b, c) = (rect(0, 0), rect(200, 0), rect(400, 0));
        let mut scene = scene_with(&[a.clone(), b.clone(), c.clone()]);
        let original = scene.clone();

        let mut changes = ChangeSet::new();
        let removed = scene.remove_shape(b.id, &mut changes).unwrap();
        scene.insert_shape(removed.shape, Some(removed.slot), &mut changes);
        assert_eq!(scene, original);
        assert_eq!(changes.updated, vec![EntityId::Shape(b.id)]);
    }
}
