//! Command-based undo/redo.
//!
//! Each [`Command`] carries the data needed to replay or reverse itself
//! against a [`Scene`] without consulting the state it was recorded in.
//! References between entities are ids, resolved again on every replay, so a
//! command stays valid after the shapes it names have been removed and
//! restored by other history steps.

use tracing::debug;

use crate::canvas::Position;
use crate::scene::{ChangeSet, Scene};
use crate::shapes::{Connector, ShapeId, ShapeNode};

/// A recorded, reversible model mutation
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddShape(ShapeNode),
    AddConnector(Connector),
    DeleteShape {
        shape: ShapeNode,
        /// Stacking slot at deletion time
        slot: usize,
        /// Connectors removed by the cascade
        cascaded: Vec<Connector>,
    },
    DeleteConnector(Connector),
    MoveShape {
        id: ShapeId,
        from: Position,
        to: Position,
    },
    Relabel {
        id: ShapeId,
        from: String,
        to: String,
    },
    /// Several commands forming one history step
    Batch(Vec<Command>),
}

impl Command {
    /// Short description for status text
    pub fn describe(&self) -> String {
        match self {
            Command::AddShape(shape) => format!("add {}", shape.kind.name()),
            Command::AddConnector(_) => "add connector".to_string(),
            Command::DeleteShape { shape, cascaded, .. } if cascaded.is_empty() => {
                format!("delete {}", shape.kind.name())
            }
            Command::DeleteShape { shape, cascaded, .. } => {
                format!("delete {} and {} connector(s)", shape.kind.name(), cascaded.len())
            }
            Command::DeleteConnector(_) => "delete connector".to_string(),
            Command::MoveShape { .. } => "move".to_string(),
            Command::Relabel { .. } => "relabel".to_string(),
            Command::Batch(commands) => format!("{} changes", commands.len()),
        }
    }

    /// Replay the command's forward effect (redo)
    pub fn apply(&self, scene: &mut Scene, changes: &mut ChangeSet) {
        match self {
            Command::AddShape(shape) => {
                scene.insert_shape(shape.clone(), None, changes);
            }
            Command::AddConnector(connector) => {
                if !scene.insert_connector(*connector, changes) {
                    debug!(connector = %connector.id, "endpoint missing on replay, connector skipped");
                }
            }
            Command::DeleteShape { shape, cascaded, .. } => {
                let removed = scene.remove_shape(shape.id, changes);
                // replay on the same timeline cascades the same connectors again
                debug_assert!(
                    removed.as_ref().is_none_or(|r| r.connectors == *cascaded),
                    "redo of delete {} cascaded a different connector set",
                    shape.id
                );
            }
            Command::DeleteConnector(connector) => {
                scene.remove_connector(connector.id, changes);
            }
            Command::MoveShape { id, to, .. } => {
                scene.set_position(*id, *to, changes);
            }
            Command::Relabel { id, to, .. } => {
                scene.set_label(*id, to.clone(), changes);
            }
            Command::Batch(commands) => {
                for command in commands {
                    command.apply(scene, changes);
                }
            }
        }
    }

    /// Reverse the command's effect (undo)
    pub fn revert(&self, scene: &mut Scene, changes: &mut ChangeSet) {
        match self {
            Command::AddShape(shape) => {
                // a freshly added shape has no connectors yet; any added since
                // were undone before this point
                scene.remove_shape(shape.id, changes);
            }
            Command::AddConnector(connector) => {
                scene.remove_connector(connector.id, changes);
            }
            Command::DeleteShape { shape, slot, cascaded } => {
                scene.insert_shape(shape.clone(), Some(*slot), changes);
                for connector in cascaded {
                    scene.insert_connector(*connector, changes);
                }
            }
            Command::DeleteConnector(connector) => {
                scene.insert_connector(*connector, changes);
            }
            Command::MoveShape { id, from, .. } => {
                scene.set_position(*id, *from, changes);
            }
            Command::Relabel { id, from, .. } => {
                scene.set_label(*id, from.clone(), changes);
            }
            Command::Batch(commands) => {
                for command in commands.iter().rev() {
                    command.revert(scene, changes);
                }
            }
        }
    }
}

/// Undo/redo stacks, most recent last
#[derive(Debug, Clone)]
pub struct CommandHistory {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
    /// Maximum number of undo steps kept
    max_history: usize,
}

impl CommandHistory {
    pub fn new(max_history: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_history: max_history.max(1),
        }
    }

    /// Record a command whose effect has already been applied.
    ///
    /// Starts a new timeline: anything that could have been redone is dropped.
    pub fn record(&mut self, command: Command) {
        debug!(command = %command.describe(), discarded_redo = self.redo_stack.len(), "recorded");
        self.undo_stack.push(command);
        self.redo_stack.clear();

        if self.undo_stack.len() > self.max_history {
            let excess = self.undo_stack.len() - self.max_history;
            self.undo_stack.drain(..excess);
        }
    }

    /// Reverse the most recent command. Returns `None` when there is nothing to undo.
    pub fn undo(&mut self, scene: &mut Scene) -> Option<ChangeSet> {
        let command = self.undo_stack.pop()?;
        let mut changes = ChangeSet::new();
        command.revert(scene, &mut changes);
        debug!(command = %command.describe(), "undo");
        self.redo_stack.push(command);
        Some(changes)
    }

    /// Replay the most recently undone command. Returns `None` when there is nothing to redo.
    pub fn redo(&mut self, scene: &mut Scene) -> Option<ChangeSet> {
        let command = self.redo_stack.pop()?;
        let mut changes = ChangeSet::new();
        command.apply(scene, &mut changes);
        debug!(command = %command.describe(), "redo");
        self.undo_stack.push(command);
        Some(changes)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of steps that can be undone
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of steps that can be redone
    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// The command `undo` would reverse next
    pub fn peek_undo(&self) -> Option<&Command> {
        self.undo_stack.last()
    }

    /// The command `redo` would replay next
    pub fn peek_redo(&self) -> Option<&Command> {
        self.redo_stack.last()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new(100)
    }
}
