//! The diagram model - THE source of truth for an editing session.
//!
//! Every user-level edit goes through [`Diagram`]. It:
//! - snaps raw pointer positions to the grid
//! - mutates the owned [`Scene`]
//! - records a reversible [`Command`] for each structural change
//! - accumulates a [`ChangeSet`] for the view to pick up
//!
//! Operations addressed to unknown ids, self-connections and empty history
//! are silent no-ops.

use tracing::{debug, info};

use crate::canvas::{Point, Position};
use crate::config::EditorConfig;
use crate::grid::snap_to_grid;
use crate::history::{Command, CommandHistory};
use crate::scene::{ChangeSet, Scene};
use crate::shapes::{Connector, ConnectorId, EntityId, ShapeId, ShapeKind, ShapeNode};

/// First half of a two-click connector gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingConnector {
    start: ShapeId,
}

impl PendingConnector {
    pub fn start(&self) -> ShapeId {
        self.start
    }
}

#[derive(Debug)]
pub struct Diagram {
    scene: Scene,
    history: CommandHistory,
    config: EditorConfig,
    /// Changes since the last `take_changes`
    changes: ChangeSet,
}

impl Diagram {
    pub fn new(config: EditorConfig) -> Self {
        let config = config.normalized();
        Self {
            scene: Scene::new(),
            history: CommandHistory::new(config.max_history),
            config,
            changes: ChangeSet::new(),
        }
    }

    /// The current scene
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The undo/redo history
    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    /// Active (normalized) configuration
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Snap a raw point with the configured grid size
    pub fn snap(&self, raw: Point) -> Position {
        snap_to_grid(raw, self.config.grid_size)
    }

    /// Drain the changes accumulated since the previous call
    pub fn take_changes(&mut self) -> ChangeSet {
        std::mem::take(&mut self.changes)
    }

    fn record(&mut self, command: Command) {
        self.history.record(command);
    }

    // --- Shape Operations ---

    /// Place a new shape of `kind` with its anchor at the grid point nearest `raw`
    pub fn create_shape(&mut self, kind: ShapeKind, raw: Point) -> ShapeId {
        let style = self.config.style(kind);
        let shape = ShapeNode::new(kind, self.snap(raw), style.size(), style.label.clone());
        let id = shape.id;

        info!(shape = %id, kind = kind.name(), position = %shape.position, "create shape");
        self.scene.insert_shape(shape.clone(), None, &mut self.changes);
        self.record(Command::AddShape(shape));
        id
    }

    /// Move a shape's anchor to the grid point nearest `raw`.
    ///
    /// Not recorded in history on its own: a drag calls this for every delta
    /// and [`commit_move`](Self::commit_move) once when the gesture ends.
    /// Returns false for an unknown shape.
    pub fn move_shape(&mut self, id: ShapeId, raw: Point) -> bool {
        let position = self.snap(raw);
        match self.scene.set_position(id, position, &mut self.changes) {
            Some(_) => true,
            None => {
                debug!(shape = %id, "move ignored, unknown shape");
                false
            }
        }
    }

    /// Record a finished move from `from` to the shape's current position.
    ///
    /// Nothing is recorded if the shape is gone or ended where it started.
    pub fn commit_move(&mut self, id: ShapeId, from: Position) -> bool {
        let Some(to) = self.scene.shape(id).map(|s| s.position) else {
            return false;
        };
        if to == from {
            return false;
        }
        debug!(shape = %id, %from, %to, "commit move");
        self.record(Command::MoveShape { id, from, to });
        true
    }

    /// Replace a shape's label as one undoable step
    pub fn set_label(&mut self, id: ShapeId, label: impl Into<String>) -> bool {
        let label = label.into();
        let Some(from) = self.scene.set_label(id, label.clone(), &mut self.changes) else {
            debug!(shape = %id, "relabel ignored, unknown shape");
            return false;
        };
        if from == label {
            return false;
        }
        self.record(Command::Relabel { id, from, to: label });
        true
    }

    // --- Connector Operations ---

    /// Start a connector at an existing shape
    pub fn begin_connector(&self, start: ShapeId) -> Option<PendingConnector> {
        self.scene.shape(start)?;
        Some(PendingConnector { start })
    }

    /// Finish a connector at `end`.
    ///
    /// Refused (returning `None`, recording nothing) when `end` is the start
    /// shape or either shape no longer exists.
    pub fn complete_connector(&mut self, pending: PendingConnector, end: ShapeId) -> Option<ConnectorId> {
        self.connect(pending.start, end)
    }

    /// Create a directed connector `start -> end`
    pub fn connect(&mut self, start: ShapeId, end: ShapeId) -> Option<ConnectorId> {
        let connector = Connector::new(start, end);
        if !self.scene.insert_connector(connector, &mut self.changes) {
            debug!(%start, %end, "connector refused");
            return None;
        }
        info!(connector = %connector.id, %start, %end, "connect");
        self.record(Command::AddConnector(connector));
        Some(connector.id)
    }

    // --- Deletion ---

    /// Delete every listed entity as one history step.
    ///
    /// Deleting a shape also deletes its connectors. Ids that are unknown or
    /// were already removed by an earlier cascade in the same call are
    /// skipped. Returns how many listed entities were removed.
    pub fn delete_selected(&mut self, selected: &[EntityId]) -> usize {
        let mut commands = Vec::new();

        for id in selected {
            match *id {
                EntityId::Connector(cid) => {
                    if let Some(connector) = self.scene.remove_connector(cid, &mut self.changes) {
                        commands.push(Command::DeleteConnector(connector));
                    }
                }
                EntityId::Shape(sid) => {
                    if let Some(removed) = self.scene.remove_shape(sid, &mut self.changes) {
                        commands.push(Command::DeleteShape {
                            shape: removed.shape,
                            slot: removed.slot,
                            cascaded: removed.connectors,
                        });
                    }
                }
            }
        }

        let count = commands.len();
        match count {
            0 => debug!("nothing to delete"),
            1 => self.record(commands.remove(0)),
            _ => self.record(Command::Batch(commands)),
        }
        if count > 0 {
            info!(count, "deleted selection");
        }
        count
    }

    // --- History ---

    /// Undo the last recorded step. Returns false when there is nothing to undo
    pub fn undo(&mut self) -> bool {
        match self.history.undo(&mut self.scene) {
            Some(changes) => {
                self.changes.merge(changes);
                true
            }
            None => false,
        }
    }

    /// Redo the last undone step. Returns false when there is nothing to redo
    pub fn redo(&mut self) -> bool {
        match self.history.redo(&mut self.scene) {
            Some(changes) => {
                self.changes.merge(changes);
                true
            }
            None => false,
        }
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // --- Lookups ---

    /// Look up a shape by id
    pub fn find_shape_by_id(&self, id: ShapeId) -> Option<&ShapeNode> {
        self.scene.find_shape_by_id(id)
    }

    /// Connector joining two shapes in either direction, `a -> b` first
    pub fn find_connector_between(&self, a: ShapeId, b: ShapeId) -> Option<&Connector> {
        self.scene.find_connector_between(a, b)
    }

    /// Topmost shape under a raw point
    pub fn shape_at(&self, p: Point) -> Option<ShapeId> {
        self.scene.shape_at(p)
    }

    /// Connector or shape under a raw point, using the configured hit tolerance
    pub fn entity_at(&self, p: Point) -> Option<EntityId> {
        self.scene.entity_at(p, self.config.hit_tolerance)
    }
}

impl Default for Diagram {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Size;

    fn two_shapes(diagram: &mut Diagram) -> (ShapeId, ShapeId) {
        let a = diagram.create_shape(ShapeKind::Rectangle, Point::new(0.0, 0.0));
        let b = diagram.create_shape(ShapeKind::Ellipse, Point::new(300.0, 0.0));
        (a, b)
    }

    #[test]
    fn test_create_shape_uses_config() {
        let mut diagram = Diagram::default();
        let id = diagram.create_shape(ShapeKind::Ellipse, Point::new(49.0, 51.0));
        let shape = diagram.find_shape_by_id(id).unwrap();
        assert_eq!(shape.position, Position::new(40, 60));
        assert_eq!(shape.size, Size::new(100, 100));
        assert_eq!(shape.label, "Ellipse");
        assert_eq!(diagram.take_changes().added, vec![EntityId::Shape(id)]);
        assert!(diagram.take_changes().is_empty());
    }

    #[test]
    fn test_move_snaps_and_reports_connectors() {
        let mut diagram = Diagram::default();
        let (a, b) = two_shapes(&mut diagram);
        let c = diagram.connect(a, b).unwrap();
        diagram.take_changes();

        assert!(diagram.move_shape(a, Point::new(61.0, 99.0)));
        assert_eq!(diagram.find_shape_by_id(a).unwrap().position, Position::new(60, 100));
        let changes = diagram.take_changes();
        assert_eq!(changes.updated, vec![EntityId::Shape(a), EntityId::Connector(c)]);

        // unrecorded until committed
        assert_eq!(diagram.history().undo_count(), 3);
        assert!(!diagram.move_shape(ShapeId::new(), Point::new(0.0, 0.0)));
    }

    #[test]
    fn test_commit_move_is_undoable() {
        let mut diagram = Diagram::default();
        let a = diagram.create_shape(ShapeKind::Rectangle, Point::new(0.0, 0.0));
        diagram.move_shape(a, Point::new(20.0, 0.0));
        diagram.move_shape(a, Point::new(40.0, 0.0));
        assert!(diagram.commit_move(a, Position::new(0, 0)));
        assert!(!diagram.commit_move(a, Position::new(40, 0)));

        diagram.undo();
        assert_eq!(diagram.find_shape_by_id(a).unwrap().position, Position::new(0, 0));
        diagram.redo();
        assert_eq!(diagram.find_shape_by_id(a).unwrap().position, Position::new(40, 0));
    }

    #[test]
    fn test_relabel_is_undoable() {
        let mut diagram = Diagram::default();
        let a = diagram.create_shape(ShapeKind::Rectangle, Point::new(0.0, 0.0));
        assert!(diagram.set_label(a, "Start"));
        assert!(!diagram.set_label(a, "Start"));
        assert!(!diagram.set_label(ShapeId::new(), "Nope"));

        diagram.undo();
        assert_eq!(diagram.find_shape_by_id(a).unwrap().label, "Rectangle");
        diagram.redo();
        assert_eq!(diagram.find_shape_by_id(a).unwrap().label, "Start");
    }

    #[test]
    fn test_self_connection_is_refused() {
        let mut diagram = Diagram::default();
        let a = diagram.create_shape(ShapeKind::Rectangle, Point::new(0.0, 0.0));
        let pending = diagram.begin_connector(a).unwrap();
        let undo_before = diagram.history().undo_count();

        assert_eq!(diagram.complete_connector(pending, a), None);
        assert_eq!(diagram.scene().connector_count(), 0);
        assert_eq!(diagram.history().undo_count(), undo_before);
        assert!(diagram.begin_connector(ShapeId::new()).is_none());
    }

    #[test]
    fn test_delete_selected_is_one_step() {
        let mut diagram = Diagram::default();
        let (a, b) = two_shapes(&mut diagram);
        let c = diagram.create_shape(ShapeKind::Rectangle, Point::new(0.0, 300.0));
        let ab = diagram.connect(a, b).unwrap();
        let bc = diagram.connect(b, c).unwrap();
        let before = diagram.scene().clone();

        // the connector listed after its shape is already gone by then
        let removed = diagram.delete_selected(&[EntityId::Shape(a), EntityId::Connector(ab), EntityId::Shape(c)]);
        assert_eq!(removed, 2);
        assert_eq!(diagram.scene().shape_count(), 1);
        assert_eq!(diagram.scene().connector_count(), 0);
        assert!(diagram.find_connector_between(b, c).is_none());

        assert!(diagram.undo());
        assert_eq!(diagram.scene(), &before);
        assert_eq!(diagram.find_connector_between(c, b).map(|x| x.id), Some(bc));
    }

    #[test]
    fn test_delete_nothing_keeps_redo() {
        let mut diagram = Diagram::default();
        diagram.create_shape(ShapeKind::Rectangle, Point::new(0.0, 0.0));
        diagram.undo();
        assert_eq!(diagram.delete_selected(&[EntityId::Shape(ShapeId::new())]), 0);
        assert!(diagram.can_redo());
    }

    #[test]
    fn test_undo_changes_are_reported() {
        let mut diagram = Diagram::default();
        let (a, b) = two_shapes(&mut diagram);
        let ab = diagram.connect(a, b).unwrap();
        diagram.delete_selected(&[EntityId::Shape(a)]);
        diagram.take_changes();

        diagram.undo();
        let changes = diagram.take_changes();
        assert_eq!(changes.added, vec![EntityId::Shape(a), EntityId::Connector(ab)]);
        assert!(changes.removed.is_empty());
    }
}
