use crate::canvas::Point;
use crate::diagram::Diagram;
use crate::shapes::ShapeKind;
use crate::tools::PressOutcome;

/// Place a shape at the press point; the tool stays active for repeat placement
pub(super) fn handle_create_press(diagram: &mut Diagram, kind: ShapeKind, p: Point) -> PressOutcome {
    PressOutcome::Created(diagram.create_shape(kind, p))
}
