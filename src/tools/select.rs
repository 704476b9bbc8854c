use tracing::trace;

use crate::canvas::{Point, Position};
use crate::diagram::Diagram;
use crate::shapes::ShapeId;
use crate::tools::PressOutcome;

/// State for dragging a shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragState {
    pub shape_id: ShapeId,
    /// Where the shape sat when the gesture began
    pub origin: Position,
}

/// Presses in select mode belong to the shell's selection handling
pub(super) fn handle_select_press() -> PressOutcome {
    PressOutcome::Forwarded
}

/// Move the dragged shape live so attached connectors follow every delta.
///
/// Grabbing a different shape first commits the previous drag.
pub(super) fn continue_drag(
    diagram: &mut Diagram,
    drag: &mut Option<DragState>,
    shape_id: ShapeId,
    p: Point,
) -> bool {
    if drag.is_some_and(|d| d.shape_id != shape_id) {
        finish_drag(diagram, drag);
    }
    if drag.is_none() {
        let Some(shape) = diagram.find_shape_by_id(shape_id) else {
            return false;
        };
        *drag = Some(DragState {
            shape_id,
            origin: shape.position,
        });
    }
    trace!(shape = %shape_id, x = p.x, y = p.y, "drag");
    diagram.move_shape(shape_id, p)
}

/// Finish dragging
pub(super) fn finish_drag(diagram: &mut Diagram, drag: &mut Option<DragState>) -> bool {
    match drag.take() {
        Some(state) => diagram.commit_move(state.shape_id, state.origin),
        None => false,
    }
}
