//! Diagram entities: shapes, connectors and the ids that link them.
//!
//! Entities are passive records. Relationships are expressed only through
//! ids; the owning [`Scene`](crate::scene::Scene) resolves them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::canvas::{Bounds, Point, Position, Size};

/// Shape identifier - UUID so ids are never reused within or across sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShapeId(pub Uuid);

impl ShapeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ShapeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ShapeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Connector identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectorId(pub Uuid);

impl ConnectorId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectorId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Anything that can be selected, deleted or reported as changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "entity", content = "id", rename_all = "snake_case")]
pub enum EntityId {
    Shape(ShapeId),
    Connector(ConnectorId),
}

impl From<ShapeId> for EntityId {
    fn from(id: ShapeId) -> Self {
        EntityId::Shape(id)
    }
}

impl From<ConnectorId> for EntityId {
    fn from(id: ConnectorId) -> Self {
        EntityId::Connector(id)
    }
}

/// The kinds of shape that can be placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Rectangle,
    Ellipse,
}

impl ShapeKind {
    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "Rectangle",
            ShapeKind::Ellipse => "Ellipse",
        }
    }
}

/// A placed, labeled node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeNode {
    pub id: ShapeId,
    pub kind: ShapeKind,
    /// Top-left anchor, always grid-aligned
    pub position: Position,
    pub size: Size,
    pub label: String,
}

impl ShapeNode {
    pub fn new(kind: ShapeKind, position: Position, size: Size, label: impl Into<String>) -> Self {
        Self {
            id: ShapeId::new(),
            kind,
            position,
            size,
            label: label.into(),
        }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::from_anchor(self.position, self.size)
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    /// Hit test against the shape's outline (ellipses use the ellipse itself,
    /// not their bounding box)
    pub fn contains(&self, p: Point) -> bool {
        let bounds = self.bounds();
        match self.kind {
            ShapeKind::Rectangle => bounds.contains(p),
            ShapeKind::Ellipse => {
                let c = bounds.center();
                let (rx, ry) = bounds.half_extents();
                if rx <= 0.0 || ry <= 0.0 {
                    return bounds.contains(p);
                }
                let nx = (p.x - c.x) / rx;
                let ny = (p.y - c.y) / ry;
                nx * nx + ny * ny <= 1.0
            }
        }
    }

    /// Where a ray from the centre towards `toward` leaves the outline.
    ///
    /// Falls back to the centre when `toward` coincides with it.
    pub fn boundary_point(&self, toward: Point) -> Point {
        let bounds = self.bounds();
        let c = bounds.center();
        let (hw, hh) = bounds.half_extents();
        let dx = toward.x - c.x;
        let dy = toward.y - c.y;
        let length = dx.hypot(dy);
        if length < 0.001 {
            return c;
        }

        let t = match self.kind {
            ShapeKind::Rectangle => {
                // Distance along the ray to the nearest vertical / horizontal edge
                let tx = if dx.abs() > f64::EPSILON { hw / dx.abs() } else { f64::INFINITY };
                let ty = if dy.abs() > f64::EPSILON { hh / dy.abs() } else { f64::INFINITY };
                tx.min(ty)
            }
            ShapeKind::Ellipse => {
                if hw <= 0.0 || hh <= 0.0 {
                    return c;
                }
                1.0 / ((dx / hw).powi(2) + (dy / hh).powi(2)).sqrt()
            }
        };

        if !t.is_finite() {
            return c;
        }
        Point::new(c.x + dx * t, c.y + dy * t)
    }
}

/// A directed edge between two distinct shapes; the arrowhead points at `end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connector {
    pub id: ConnectorId,
    pub start: ShapeId,
    pub end: ShapeId,
}

impl Connector {
    pub fn new(start: ShapeId, end: ShapeId) -> Self {
        Self {
            id: ConnectorId::new(),
            start,
            end,
        }
    }

    pub fn touches(&self, shape: ShapeId) -> bool {
        self.start == shape || self.end == shape
    }

    /// Whether this connector joins `a` and `b`, in either direction
    pub fn joins(&self, a: ShapeId, b: ShapeId) -> bool {
        (self.start == a && self.end == b) || (self.start == b && self.end == a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_at(x: i32, y: i32) -> ShapeNode {
        ShapeNode::new(ShapeKind::Rectangle, Position::new(x, y), Size::new(100, 50), "Rectangle")
    }

    fn ellipse_at(x: i32, y: i32) -> ShapeNode {
        ShapeNode::new(ShapeKind::Ellipse, Position::new(x, y), Size::new(100, 100), "Ellipse")
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(ShapeId::new(), ShapeId::new());
        assert_ne!(ConnectorId::new(), ConnectorId::new());
    }

    #[test]
    fn test_rectangle_hit_test_uses_bounds() {
        let r = rect_at(0, 0);
        assert!(r.contains(Point::new(0.0, 0.0)));
        assert!(r.contains(Point::new(100.0, 50.0)));
        assert!(!r.contains(Point::new(101.0, 25.0)));
    }

    #[test]
    fn test_ellipse_hit_test_excludes_corners() {
        let e = ellipse_at(0, 0);
        assert!(e.contains(Point::new(50.0, 50.0)));
        assert!(e.contains(Point::new(0.0, 50.0)));
        assert!(!e.contains(Point::new(2.0, 2.0)));
    }

    fn assert_near(actual: Point, expected: Point) {
        assert!(
            actual.distance_to(expected) < 1e-9,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn test_rectangle_boundary_point() {
        let r = rect_at(0, 0);
        // centre is (50, 25); straight right exits at x = 100
        assert_near(r.boundary_point(Point::new(500.0, 25.0)), Point::new(100.0, 25.0));
        assert_near(r.boundary_point(Point::new(50.0, 400.0)), Point::new(50.0, 50.0));
        // shallow diagonal leaves through the right edge
        assert_near(r.boundary_point(Point::new(150.0, 35.0)), Point::new(100.0, 30.0));
        assert_eq!(r.boundary_point(r.center()), r.center());
    }

    #[test]
    fn test_ellipse_boundary_point() {
        let e = ellipse_at(0, 0);
        assert_near(e.boundary_point(Point::new(50.0, -300.0)), Point::new(50.0, 0.0));
        assert_near(e.boundary_point(Point::new(400.0, 50.0)), Point::new(100.0, 50.0));
    }

    #[test]
    fn test_connector_direction() {
        let (a, b) = (ShapeId::new(), ShapeId::new());
        let c = Connector::new(a, b);
        assert!(c.touches(a) && c.touches(b));
        assert!(c.joins(a, b) && c.joins(b, a));
        assert!(!c.joins(a, ShapeId::new()));
    }
}
