//! The editor facade: the inbound surface a UI shell drives.
//!
//! Each inbound call is handled to completion (model mutated, command
//! recorded, index updated) before listeners are told what changed.

use tracing::debug;

use crate::canvas::Point;
use crate::config::EditorConfig;
use crate::diagram::Diagram;
use crate::scene::{ChangeSet, Scene};
use crate::shapes::{EntityId, ShapeId};
use crate::tools::{InteractionController, PressOutcome, ToolMode};

/// Receives a change notification after every mutating call
pub trait ChangeListener {
    fn on_change(&mut self, changes: &ChangeSet);
}

impl<F: FnMut(&ChangeSet)> ChangeListener for F {
    fn on_change(&mut self, changes: &ChangeSet) {
        self(changes)
    }
}

pub struct Editor {
    diagram: Diagram,
    controller: InteractionController,
    listeners: Vec<Box<dyn ChangeListener>>,
    status_message: Option<String>,
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            diagram: Diagram::new(config),
            controller: InteractionController::new(),
            listeners: Vec::new(),
            status_message: None,
        }
    }

    /// The underlying diagram model
    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    /// The current scene
    pub fn scene(&self) -> &Scene {
        self.diagram.scene()
    }

    /// The interaction state machine
    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    /// Register a listener for change notifications
    pub fn subscribe(&mut self, listener: impl ChangeListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Set a status message to display
    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
    }

    /// Clear the status message
    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    /// The current status message, if any
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// Human-readable current mode for the status bar
    pub fn mode_label(&self) -> String {
        self.controller.mode_label(&self.diagram)
    }

    /// Hand accumulated changes to every listener
    fn notify(&mut self) {
        let changes = self.diagram.take_changes();
        if changes.is_empty() {
            return;
        }
        debug!(
            added = changes.added.len(),
            removed = changes.removed.len(),
            updated = changes.updated.len(),
            "notify"
        );
        for listener in &mut self.listeners {
            listener.on_change(&changes);
        }
    }

    /// Commit a drag left open by the shell before starting another action
    fn settle_gesture(&mut self) {
        self.controller.finish_drag(&mut self.diagram);
    }

    // --- Inbound interface ---

    /// Switch tools
    pub fn set_tool_mode(&mut self, mode: ToolMode) {
        self.controller.set_tool_mode(&mut self.diagram, mode);
        self.set_status(format!("Tool: {}", mode.name()));
        self.notify();
    }

    /// Pointer press at a raw canvas point
    pub fn pointer_primary_activate(&mut self, p: Point) -> PressOutcome {
        let outcome = self.controller.primary_activate(&mut self.diagram, p);
        match outcome {
            PressOutcome::Created(_) => self.set_status("Placed shape"),
            PressOutcome::Connected(_) => self.set_status("Connected"),
            PressOutcome::SelfConnectRejected => self.set_status("Cannot connect a shape to itself"),
            PressOutcome::SourcePicked(_) | PressOutcome::Forwarded | PressOutcome::Ignored => {}
        }
        self.notify();
        outcome
    }

    /// Live drag of a shape; connectors follow on every call
    pub fn pointer_drag(&mut self, id: ShapeId, p: Point) -> bool {
        let moved = self.controller.drag_shape(&mut self.diagram, id, p);
        self.notify();
        moved
    }

    /// End of a drag gesture
    pub fn pointer_release(&mut self) -> bool {
        let committed = self.controller.finish_drag(&mut self.diagram);
        if committed {
            self.set_status("Moved shape");
        }
        self.notify();
        committed
    }

    /// Delete the selected entities as one undo step
    pub fn request_delete_selection(&mut self, selected: &[EntityId]) -> usize {
        self.settle_gesture();
        let count = self.diagram.delete_selected(selected);
        if count > 0 {
            self.set_status(format!("Deleted {} item(s)", count));
        }
        self.notify();
        count
    }

    /// Relabel a shape
    pub fn request_set_label(&mut self, id: ShapeId, label: impl Into<String>) -> bool {
        self.settle_gesture();
        let changed = self.diagram.set_label(id, label);
        self.notify();
        changed
    }

    /// Undo the last action
    pub fn request_undo(&mut self) -> bool {
        self.settle_gesture();
        let description = self.diagram.history().peek_undo().map(|c| c.describe());
        let undone = self.diagram.undo();
        match description {
            Some(d) if undone => self.set_status(format!("Undo {}", d)),
            _ => self.set_status("Nothing to undo"),
        }
        self.notify();
        undone
    }

    /// Redo the last undone action
    pub fn request_redo(&mut self) -> bool {
        self.settle_gesture();
        let description = self.diagram.history().peek_redo().map(|c| c.describe());
        let redone = self.diagram.redo();
        match description {
            Some(d) if redone => self.set_status(format!("Redo {}", d)),
            _ => self.set_status("Nothing to redo"),
        }
        self.notify();
        redone
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}
