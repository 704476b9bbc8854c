//! Grid-snapped diagram editing core.
//!
//! Shapes are placed on an infinite canvas, joined by directed connectors,
//! moved, relabeled and deleted, with every change undoable. The UI shell
//! drives an [`Editor`] and listens for [`ChangeSet`]s to redraw.

pub mod canvas;
pub mod config;
pub mod diagram;
pub mod editor;
pub mod grid;
pub mod history;
pub mod index;
pub mod render;
pub mod scene;
pub mod script;
pub mod shapes;
pub mod tools;

pub use canvas::{Point, Position, Segment, Size};
pub use config::EditorConfig;
pub use diagram::{Diagram, PendingConnector};
pub use editor::{ChangeListener, Editor};
pub use grid::snap_to_grid;
pub use history::{Command, CommandHistory};
pub use scene::{ChangeSet, Scene};
pub use shapes::{Connector, ConnectorId, EntityId, ShapeId, ShapeKind, ShapeNode};
pub use tools::{InteractionController, InteractionState, PressOutcome, ToolMode};
