//! Canvas geometry and the sparse character canvas used for text rendering.
//!
//! Two coordinate types live here: [`Point`] is a raw, continuous canvas
//! location as delivered by pointer input, and [`Position`] is a grid-aligned
//! integer location that placed shapes use as their anchor.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A raw point on the (infinite) canvas
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

impl From<Position> for Point {
    fn from(pos: Position) -> Self {
        Point::new(pos.x as f64, pos.y as f64)
    }
}

/// Largest absolute coordinate a snapped anchor may take. Leaves room below
/// `i32::MAX` for a shape's extent on top of its anchor.
pub const CANVAS_EXTENT: i32 = 1_000_000_000;

/// A grid-aligned position (can be negative for infinite canvas feel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Width and height in canvas units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned box, inclusive on every edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl Bounds {
    pub fn from_anchor(anchor: Position, size: Size) -> Self {
        Self {
            min_x: anchor.x,
            min_y: anchor.y,
            max_x: anchor.x.saturating_add(size.width.max(0)),
            max_y: anchor.y.saturating_add(size.height.max(0)),
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x as f64
            && p.x <= self.max_x as f64
            && p.y >= self.min_y as f64
            && p.y <= self.max_y as f64
    }

    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min_x <= other.max_x && other.min_x <= self.max_x && self.min_y <= other.max_y && other.min_y <= self.max_y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x as f64 + self.max_x as f64) / 2.0,
            (self.min_y as f64 + self.max_y as f64) / 2.0,
        )
    }

    pub fn half_extents(&self) -> (f64, f64) {
        (
            (self.max_x as f64 - self.min_x as f64) / 2.0,
            (self.max_y as f64 - self.min_y as f64) / 2.0,
        )
    }
}

/// A straight segment between two canvas points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

impl Segment {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Shortest distance from `p` to any point of the segment
    pub fn distance_to(&self, p: Point) -> f64 {
        let dx = self.end.x - self.start.x;
        let dy = self.end.y - self.start.y;
        let len_sq = dx * dx + dy * dy;
        if len_sq < f64::EPSILON {
            return self.start.distance_to(p);
        }
        let t = (((p.x - self.start.x) * dx + (p.y - self.start.y) * dy) / len_sq).clamp(0.0, 1.0);
        let closest = Point::new(self.start.x + t * dx, self.start.y + t * dy);
        closest.distance_to(p)
    }

    /// The part of the segment inside the box `min..=max` (Liang-Barsky)
    pub fn clip_to(&self, min: Point, max: Point) -> Option<Segment> {
        let dx = self.end.x - self.start.x;
        let dy = self.end.y - self.start.y;
        let (mut t0, mut t1) = (0.0f64, 1.0f64);

        for (p, q) in [
            (-dx, self.start.x - min.x),
            (dx, max.x - self.start.x),
            (-dy, self.start.y - min.y),
            (dy, max.y - self.start.y),
        ] {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
            } else if p < 0.0 {
                t0 = t0.max(q / p);
            } else {
                t1 = t1.min(q / p);
            }
            if t0 > t1 {
                return None;
            }
        }

        let at = |t: f64| Point::new(self.start.x + t * dx, self.start.y + t * dy);
        Some(Segment::new(at(t0), at(t1)))
    }
}

/// Sparse character grid, one cell per character
#[derive(Debug, Clone, Default)]
pub struct Canvas {
    cells: HashMap<Position, char>,
    /// Cells outside this box are dropped
    clip: Option<Bounds>,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// A canvas that only keeps cells inside `clip`
    pub fn with_clip(clip: Bounds) -> Self {
        Self {
            cells: HashMap::new(),
            clip: Some(clip),
        }
    }

    /// Get the character at a cell, returns space if empty
    pub fn get(&self, pos: Position) -> char {
        *self.cells.get(&pos).unwrap_or(&' ')
    }

    /// Set a character at a cell
    pub fn set(&mut self, pos: Position, ch: char) {
        let inside = self.clip.is_none_or(|c| {
            pos.x >= c.min_x && pos.x <= c.max_x && pos.y >= c.min_y && pos.y <= c.max_y
        });
        if !inside {
            return;
        }
        if ch == ' ' {
            self.cells.remove(&pos);
        } else {
            self.cells.insert(pos, ch);
        }
    }

    pub fn plot(&mut self, points: impl IntoIterator<Item = (Position, char)>) {
        for (pos, ch) in points {
            self.set(pos, ch);
        }
    }

    /// Bounding box of all content (min_x, min_y, max_x, max_y)
    pub fn bounds(&self) -> Option<(i32, i32, i32, i32)> {
        let mut keys = self.cells.keys();
        let first = keys.next()?;
        Some(keys.fold(
            (first.x, first.y, first.x, first.y),
            |(min_x, min_y, max_x, max_y), pos| {
                (min_x.min(pos.x), min_y.min(pos.y), max_x.max(pos.x), max_y.max(pos.y))
            },
        ))
    }

    /// Lay the canvas out as text, trimmed to its content
    pub fn to_string_content(&self) -> String {
        let Some((min_x, min_y, max_x, max_y)) = self.bounds() else {
            return String::new();
        };

        let lines: Vec<String> = (min_y..=max_y)
            .map(|y| {
                let line: String = (min_x..=max_x).map(|x| self.get(Position::new(x, y))).collect();
                line.trim_end().to_string()
            })
            .collect();

        lines.join("\n")
    }
}

/// Cells on a line between two cells (Bresenham)
pub fn line_points(from: Position, to: Position) -> Vec<Position> {
    let mut points = Vec::new();

    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (from.x, from.y);

    loop {
        points.push(Position::new(x, y));
        if x == to.x && y == to.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }

    points
}

/// Connector body without an arrowhead
pub fn segment_points(from: Position, to: Position) -> Vec<(Position, char)> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let body = if dy == 0 {
        '─'
    } else if dx == 0 {
        '│'
    } else if (dx > 0) == (dy > 0) {
        '\\'
    } else {
        '/'
    };
    line_points(from, to).into_iter().map(|p| (p, body)).collect()
}

/// Connector body plus an arrowhead on the `to` cell
pub fn arrow_points(from: Position, to: Position) -> Vec<(Position, char)> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let mut points = segment_points(from, to);
    if let Some((_, ch)) = points.last_mut() {
        *ch = if dx.abs() > dy.abs() {
            if dx > 0 { '>' } else { '<' }
        } else if dy > 0 {
            'v'
        } else {
            '^'
        };
    }
    points
}

/// Rectangle outline between two corner cells
pub fn rect_points(from: Position, to: Position) -> Vec<(Position, char)> {
    let (min_x, max_x) = (from.x.min(to.x), from.x.max(to.x));
    let (min_y, max_y) = (from.y.min(to.y), from.y.max(to.y));

    let mut points = vec![
        (Position::new(min_x, min_y), '┌'),
        (Position::new(max_x, min_y), '┐'),
        (Position::new(min_x, max_y), '└'),
        (Position::new(max_x, max_y), '┘'),
    ];
    for x in (min_x + 1)..max_x {
        points.push((Position::new(x, min_y), '─'));
        points.push((Position::new(x, max_y), '─'));
    }
    for y in (min_y + 1)..max_y {
        points.push((Position::new(min_x, y), '│'));
        points.push((Position::new(max_x, y), '│'));
    }
    points
}

/// Rounded outline approximating an ellipse inside the given corner cells
pub fn ellipse_points(from: Position, to: Position) -> Vec<(Position, char)> {
    let (min_x, max_x) = (from.x.min(to.x), from.x.max(to.x));
    let (min_y, max_y) = (from.y.min(to.y), from.y.max(to.y));
    let mid_y = (min_y + max_y) / 2;

    let mut points = vec![
        (Position::new(min_x, min_y), '╭'),
        (Position::new(max_x, min_y), '╮'),
        (Position::new(min_x, max_y), '╰'),
        (Position::new(max_x, max_y), '╯'),
    ];
    for x in (min_x + 1)..max_x {
        points.push((Position::new(x, min_y), '─'));
        points.push((Position::new(x, max_y), '─'));
    }
    for y in (min_y + 1)..max_y {
        let (left, right) = if y == mid_y { ('(', ')') } else { ('│', '│') };
        points.push((Position::new(min_x, y), left));
        points.push((Position::new(max_x, y), right));
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_contains_edges() {
        let b = Bounds::from_anchor(Position::new(20, 40), Size::new(100, 50));
        assert!(b.contains(Point::new(20.0, 40.0)));
        assert!(b.contains(Point::new(120.0, 90.0)));
        assert!(!b.contains(Point::new(120.5, 90.0)));
        assert_eq!(b.center(), Point::new(70.0, 65.0));
    }

    #[test]
    fn test_bounds_saturate_at_the_edge() {
        let b = Bounds::from_anchor(Position::new(i32::MAX - 10, 0), Size::new(100, i32::MAX));
        assert_eq!(b.max_x, i32::MAX);
        assert!(b.min_x <= b.max_x);
        assert!(b.contains(Point::new(i32::MAX as f64, 5.0)));
        assert_eq!(b.half_extents().0, 5.0);
    }

    #[test]
    fn test_segment_distance() {
        let s = Segment::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        assert_eq!(s.distance_to(Point::new(5.0, 3.0)), 3.0);
        assert_eq!(s.distance_to(Point::new(-4.0, 3.0)), 5.0);

        let degenerate = Segment::new(Point::new(1.0, 1.0), Point::new(1.0, 1.0));
        assert_eq!(degenerate.distance_to(Point::new(4.0, 5.0)), 5.0);
    }

    #[test]
    fn test_segment_clip() {
        let s = Segment::new(Point::new(-10.0, 5.0), Point::new(30.0, 5.0));
        let clipped = s.clip_to(Point::new(0.0, 0.0), Point::new(20.0, 10.0)).unwrap();
        assert_eq!(clipped, Segment::new(Point::new(0.0, 5.0), Point::new(20.0, 5.0)));

        let inside = Segment::new(Point::new(1.0, 1.0), Point::new(2.0, 2.0));
        assert_eq!(inside.clip_to(Point::new(0.0, 0.0), Point::new(20.0, 10.0)), Some(inside));

        let outside = Segment::new(Point::new(-10.0, 50.0), Point::new(30.0, 50.0));
        assert_eq!(outside.clip_to(Point::new(0.0, 0.0), Point::new(20.0, 10.0)), None);
    }

    #[test]
    fn test_clipped_canvas_drops_outside_cells() {
        let mut canvas = Canvas::with_clip(Bounds::from_anchor(Position::new(0, 0), Size::new(2, 1)));
        canvas.plot(rect_points(Position::new(0, 0), Position::new(5, 3)));
        assert_eq!(canvas.to_string_content(), "┌──\n│");
    }

    #[test]
    fn test_line_points_endpoints() {
        let pts = line_points(Position::new(0, 0), Position::new(5, 2));
        assert_eq!(pts.first(), Some(&Position::new(0, 0)));
        assert_eq!(pts.last(), Some(&Position::new(5, 2)));
        assert_eq!(pts.len(), 6);
    }

    #[test]
    fn test_arrow_head_direction() {
        let right = arrow_points(Position::new(0, 0), Position::new(4, 0));
        assert_eq!(right.last().map(|p| p.1), Some('>'));
        let up = arrow_points(Position::new(0, 4), Position::new(0, 0));
        assert_eq!(up.last().map(|p| p.1), Some('^'));
    }

    #[test]
    fn test_canvas_to_string() {
        let mut canvas = Canvas::new();
        canvas.plot(rect_points(Position::new(0, 0), Position::new(3, 2)));
        assert_eq!(canvas.to_string_content(), "┌──┐\n│  │\n└──┘");

        canvas.set(Position::new(0, 0), ' ');
        assert_eq!(canvas.get(Position::new(0, 0)), ' ');
    }
}
