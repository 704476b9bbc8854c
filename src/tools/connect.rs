use tracing::debug;

use crate::canvas::Point;
use crate::diagram::Diagram;
use crate::shapes::ShapeId;
use crate::tools::{InteractionState, PressOutcome};

/// Handle a press with the connect tool.
///
/// `source` is the shape remembered from the first click, if any. A source
/// that no longer exists is forgotten and the press is treated as a first click.
pub(super) fn handle_connect_press(
    diagram: &mut Diagram,
    source: Option<ShapeId>,
    p: Point,
) -> (InteractionState, PressOutcome) {
    let hit = diagram.shape_at(p);
    let pending = source.and_then(|id| diagram.begin_connector(id));

    match (pending, hit) {
        (None, Some(shape)) => (
            InteractionState::ConnectOneSelected(shape),
            PressOutcome::SourcePicked(shape),
        ),
        (None, None) => (InteractionState::ConnectIdle, PressOutcome::Ignored),
        (Some(pending), Some(shape)) if shape == pending.start() => {
            debug!(shape = %shape, "self connection rejected");
            (
                InteractionState::ConnectOneSelected(shape),
                PressOutcome::SelfConnectRejected,
            )
        }
        (Some(pending), Some(shape)) => match diagram.complete_connector(pending, shape) {
            Some(connector) => (InteractionState::ConnectIdle, PressOutcome::Connected(connector)),
            None => (InteractionState::ConnectOneSelected(pending.start()), PressOutcome::Ignored),
        },
        // selection persists until a valid target is chosen
        (Some(pending), None) => (InteractionState::ConnectOneSelected(pending.start()), PressOutcome::Ignored),
    }
}
