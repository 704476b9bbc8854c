//! Text rendering of a scene.
//!
//! Canvas units are mapped onto character cells (a cell is taller than it
//! is wide) and each entity is rasterized onto a sparse [`Canvas`].
//! Connector geometry is taken from the live scene on every render, so
//! connectors follow moved shapes without any cached state.
//!
//! Output is limited to a window of [`MAX_COLUMNS`] by [`MAX_ROWS`] cells
//! anchored at the top-left of the scene's content.

use tracing::debug;

use crate::canvas::{
    arrow_points, ellipse_points, rect_points, segment_points, Bounds, Canvas, Point, Position, Size,
};
use crate::scene::Scene;
use crate::shapes::{ShapeKind, ShapeNode};

pub const MAX_COLUMNS: i32 = 1000;
pub const MAX_ROWS: i32 = 500;

/// Canvas units covered by one character cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellScale {
    pub cell_width: f64,
    pub cell_height: f64,
}

impl CellScale {
    pub fn to_cell(&self, p: Point) -> Position {
        Position::new(
            (p.x / self.cell_width).round() as i32,
            (p.y / self.cell_height).round() as i32,
        )
    }

    /// Canvas point at the centre of a cell
    pub fn to_point(&self, cell: Position) -> Point {
        Point::new(cell.x as f64 * self.cell_width, cell.y as f64 * self.cell_height)
    }

    fn cell_bounds(&self, shape: &ShapeNode) -> Bounds {
        let Bounds { min_x, min_y, max_x, max_y } = shape.bounds();
        let min = self.to_cell(Point::new(min_x as f64, min_y as f64));
        let max = self.to_cell(Point::new(max_x as f64, max_y as f64));
        Bounds { min_x: min.x, min_y: min.y, max_x: max.x, max_y: max.y }
    }
}

impl Default for CellScale {
    fn default() -> Self {
        Self {
            cell_width: 5.0,
            cell_height: 10.0,
        }
    }
}

/// Render a label centered inside a shape's cell bounds
fn render_label(canvas: &mut Canvas, min: Position, max: Position, text: &str) {
    let center_y = (min.y + max.y) / 2;
    let inner_width = (max.x - min.x - 1).max(0) as usize;
    let text_len = text.chars().count();
    let start_offset = if text_len < inner_width {
        ((inner_width - text_len) / 2) as i32 + 1
    } else {
        1
    };

    for (i, ch) in text.chars().enumerate() {
        let x = min.x + start_offset + i as i32;
        if x >= max.x {
            break;
        }
        canvas.set(Position::new(x, center_y), ch);
    }
}

fn render_shape(canvas: &mut Canvas, shape: &ShapeNode, cells: Bounds) {
    let min = Position::new(cells.min_x, cells.min_y);
    let max = Position::new(cells.max_x, cells.max_y);

    match shape.kind {
        ShapeKind::Rectangle => canvas.plot(rect_points(min, max)),
        ShapeKind::Ellipse => canvas.plot(ellipse_points(min, max)),
    }
    render_label(canvas, min, max, &shape.label);
}

/// Cell window the scene is drawn into, or `None` for an empty scene
fn render_window(scene: &Scene, scale: CellScale) -> Option<Bounds> {
    let (min_x, min_y) = scene
        .shapes()
        .map(|s| scale.cell_bounds(s))
        .fold(None, |acc: Option<(i32, i32)>, b| match acc {
            Some((x, y)) => Some((x.min(b.min_x), y.min(b.min_y))),
            None => Some((b.min_x, b.min_y)),
        })?;
    Some(Bounds::from_anchor(
        Position::new(min_x, min_y),
        Size::new(MAX_COLUMNS - 1, MAX_ROWS - 1),
    ))
}

/// Rasterize every shape (bottom to top) and then every connector
pub fn render_scene(scene: &Scene, scale: CellScale) -> Canvas {
    let Some(window) = render_window(scene, scale) else {
        return Canvas::new();
    };
    let mut canvas = Canvas::with_clip(window);
    let mut skipped = 0;

    for shape in scene.shapes() {
        let cells = scale.cell_bounds(shape);
        if cells.intersects(&window) {
            // edges beyond the window fall just outside the clip
            let cells = Bounds {
                min_x: cells.min_x.max(window.min_x - 1),
                min_y: cells.min_y.max(window.min_y - 1),
                max_x: cells.max_x.min(window.max_x + 1),
                max_y: cells.max_y.min(window.max_y + 1),
            };
            render_shape(&mut canvas, shape, cells);
        } else {
            skipped += 1;
        }
    }

    let window_min = scale.to_point(Position::new(window.min_x, window.min_y));
    let window_max = scale.to_point(Position::new(window.max_x, window.max_y));
    let mut connectors: Vec<_> = scene.connectors().map(|c| c.id).collect();
    connectors.sort();
    for id in connectors {
        let Some(segment) = scene.connector_geometry(id) else {
            continue;
        };
        let Some(visible) = segment.clip_to(window_min, window_max) else {
            skipped += 1;
            continue;
        };
        let from = scale.to_cell(visible.start);
        let to = scale.to_cell(visible.end);
        // no arrowhead where the target end was cut off
        if window.contains(Point::new(segment.end.x / scale.cell_width, segment.end.y / scale.cell_height)) {
            canvas.plot(arrow_points(from, to));
        } else {
            canvas.plot(segment_points(from, to));
        }
    }

    if skipped > 0 {
        debug!(skipped, "entities outside the render window");
    }
    canvas
}

/// Render a scene to a text string
pub fn render_to_text(scene: &Scene, scale: CellScale) -> String {
    render_scene(scene, scale).to_string_content()
}
