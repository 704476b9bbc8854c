//! Snap-to-grid for raw pointer positions.

use crate::canvas::{Point, Position, CANVAS_EXTENT};

/// Grid spacing in canvas units
pub const DEFAULT_GRID_SIZE: i32 = 20;

/// Snap a raw point to the nearest grid intersection.
///
/// Each coordinate is rounded to the nearest multiple of `grid_size`, ties
/// rounding away from zero. A non-positive `grid_size` is treated as 1. Points
/// beyond [`CANVAS_EXTENT`] clamp to the outermost grid line inside it, so
/// snapping a snapped position is always a no-op.
pub fn snap_to_grid(point: Point, grid_size: i32) -> Position {
    let grid = grid_size.max(1);
    Position::new(snap_axis(point.x, grid), snap_axis(point.y, grid))
}

fn snap_axis(value: f64, grid: i32) -> i32 {
    let steps = (value / grid as f64).round();
    let limit = (CANVAS_EXTENT / grid) as f64;
    if steps.is_nan() {
        return 0;
    }
    steps.clamp(-limit, limit) as i32 * grid
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    fn point_strategy() -> impl Strategy<Value = Point> {
        (-1.0e6f64..1.0e6, -1.0e6f64..1.0e6).prop_map(|(x, y)| Point::new(x, y))
    }

    proptest! {
        #[test]
        fn snap_is_idempotent(p in point_strategy(), grid in 1i32..200) {
            let once = snap_to_grid(p, grid);
            prop_assert_eq!(snap_to_grid(Point::from(once), grid), once);
        }

        #[test]
        fn snap_lands_on_grid_within_half_cell(p in point_strategy(), grid in 1i32..200) {
            let snapped = snap_to_grid(p, grid);
            prop_assert_eq!(snapped.x % grid, 0);
            prop_assert_eq!(snapped.y % grid, 0);
            let half = grid as f64 / 2.0;
            prop_assert!((snapped.x as f64 - p.x).abs() <= half + 1e-9);
            prop_assert!((snapped.y as f64 - p.y).abs() <= half + 1e-9);
        }
    }
}
