//! Interaction modes: turning pointer presses plus the current tool into
//! diagram operations.
//!
//! The controller is an explicit state machine. The only state it keeps
//! between events is ids (the remembered connector source, the shape being
//! dragged), and every id is re-resolved against the diagram on use, since an
//! undo may have removed the shape in between.

mod connect;
mod create;
mod select;

use tracing::debug;

use crate::canvas::Point;
use crate::diagram::Diagram;
use crate::shapes::{ConnectorId, ShapeId, ShapeKind};

pub use select::DragState;

/// Tools offered by the toolbar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolMode {
    Select,
    CreateRectangle,
    CreateEllipse,
    Connect,
}

impl ToolMode {
    pub fn name(&self) -> &'static str {
        match self {
            ToolMode::Select => "Select",
            ToolMode::CreateRectangle => "Rectangle",
            ToolMode::CreateEllipse => "Ellipse",
            ToolMode::Connect => "Connect",
        }
    }
}

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionState {
    Select,
    Create(ShapeKind),
    /// Connect tool, waiting for the source shape
    ConnectIdle,
    /// Connect tool, source chosen, waiting for the target
    ConnectOneSelected(ShapeId),
}

impl InteractionState {
    fn for_mode(mode: ToolMode) -> Self {
        match mode {
            ToolMode::Select => InteractionState::Select,
            ToolMode::CreateRectangle => InteractionState::Create(ShapeKind::Rectangle),
            ToolMode::CreateEllipse => InteractionState::Create(ShapeKind::Ellipse),
            ToolMode::Connect => InteractionState::ConnectIdle,
        }
    }

    pub fn tool_mode(&self) -> ToolMode {
        match self {
            InteractionState::Select => ToolMode::Select,
            InteractionState::Create(ShapeKind::Rectangle) => ToolMode::CreateRectangle,
            InteractionState::Create(ShapeKind::Ellipse) => ToolMode::CreateEllipse,
            InteractionState::ConnectIdle | InteractionState::ConnectOneSelected(_) => ToolMode::Connect,
        }
    }
}

/// What a primary press did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressOutcome {
    /// Select tool: left to the shell's selection handling
    Forwarded,
    Created(ShapeId),
    /// First click of a connector landed on a shape
    SourcePicked(ShapeId),
    Connected(ConnectorId),
    /// Second click landed on the source shape itself
    SelfConnectRejected,
    /// Press hit nothing relevant
    Ignored,
}

#[derive(Debug, Clone)]
pub struct InteractionController {
    state: InteractionState,
    drag: Option<DragState>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self {
            state: InteractionState::Select,
            drag: None,
        }
    }

    /// Current state
    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn tool_mode(&self) -> ToolMode {
        self.state.tool_mode()
    }

    /// The drag in progress, if any
    pub fn drag(&self) -> Option<&DragState> {
        self.drag.as_ref()
    }

    /// Switch tools. Any connector in progress is dropped and a drag in
    /// progress is committed. Choosing Connect always restarts at the idle state.
    pub fn set_tool_mode(&mut self, diagram: &mut Diagram, mode: ToolMode) {
        self.finish_drag(diagram);
        self.state = InteractionState::for_mode(mode);
        debug!(mode = mode.name(), "tool mode");
    }

    /// Primary activation (pointer press) at a canvas point
    pub fn primary_activate(&mut self, diagram: &mut Diagram, p: Point) -> PressOutcome {
        let (next, outcome) = match self.state {
            InteractionState::Select => (self.state, select::handle_select_press()),
            InteractionState::Create(kind) => (self.state, create::handle_create_press(diagram, kind, p)),
            InteractionState::ConnectIdle => connect::handle_connect_press(diagram, None, p),
            InteractionState::ConnectOneSelected(source) => connect::handle_connect_press(diagram, Some(source), p),
        };
        if next != self.state {
            debug!(from = ?self.state, to = ?next, "interaction state");
        }
        self.state = next;
        outcome
    }

    /// Drag a shape to a new anchor. Only the select tool drags.
    pub fn drag_shape(&mut self, diagram: &mut Diagram, id: ShapeId, p: Point) -> bool {
        if self.state != InteractionState::Select {
            return false;
        }
        select::continue_drag(diagram, &mut self.drag, id, p)
    }

    /// End the drag gesture, recording it as one history step
    pub fn finish_drag(&mut self, diagram: &mut Diagram) -> bool {
        select::finish_drag(diagram, &mut self.drag)
    }

    /// Status-bar text for the current state
    pub fn mode_label(&self, diagram: &Diagram) -> String {
        match self.state {
            InteractionState::Select => "Select".to_string(),
            InteractionState::Create(kind) => format!("Place {}", kind.name()),
            InteractionState::ConnectIdle => "Connect: pick source".to_string(),
            InteractionState::ConnectOneSelected(source) => match diagram.find_shape_by_id(source) {
                Some(shape) => format!("Connect: pick target for {}", shape.label),
                None => "Connect: pick source".to_string(),
            },
        }
    }
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new()
    }
}
