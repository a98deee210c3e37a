//! Quantized cell identifiers.
//!
//! A cell is addressed by its column `x` (longitude axis) and row `y`
//! (latitude axis) at the fixed subdivision level. Columns count east from
//! the antimeridian and wrap; rows count north from the south pole and
//! clamp.

use crate::{CELLS_PER_DEGREE, RING_WIDTH, ROW_COUNT};

/// A cell in the fixed-level grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellId {
    /// Column index in `0..RING_WIDTH`
    pub x: i32,
    /// Row index in `0..ROW_COUNT`
    pub y: i32,
}

impl CellId {
    /// Create a cell from raw indices.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The cell `dx` columns east, wrapping around the antimeridian.
    pub fn shift_x(&self, dx: i32) -> Self {
        Self {
            x: (self.x + dx).rem_euclid(RING_WIDTH),
            y: self.y,
        }
    }

    /// The cell `dy` rows north, or `None` past a pole.
    pub fn shift_y(&self, dy: i32) -> Option<Self> {
        let y = self.y + dy;
        if (0..ROW_COUNT).contains(&y) {
            Some(Self { x: self.x, y })
        } else {
            None
        }
    }
}

impl std::fmt::Display for CellId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Map a coordinate to its cell.
///
/// Pure and deterministic: the same coordinate always yields the same cell.
/// Longitude 180 and -180 map to the same column; latitude 90 lands in the
/// topmost row.
pub fn cell_of(lat: f64, lng: f64) -> CellId {
    let x = (((lng + 180.0) * CELLS_PER_DEGREE as f64).floor() as i32).rem_euclid(RING_WIDTH);
    let y = ((lat + 90.0) * CELLS_PER_DEGREE as f64).floor() as i32;
    CellId {
        x,
        y: y.clamp(0, ROW_COUNT - 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = cell_of(37.7749, -122.4194);
        let b = cell_of(37.7749, -122.4194);
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_cities_distinct_cells() {
        let sf = cell_of(37.7749, -122.4194);
        let nyc = cell_of(40.7128, -74.0060);
        assert_ne!(sf, nyc);
    }

    #[test]
    fn points_in_same_quarter_degree_share_a_cell() {
        // Two spots inside the same 0.25-degree square
        let a = cell_of(37.70, -122.20);
        let b = cell_of(37.74, -122.24);
        assert_eq!(a, b);
    }

    #[test]
    fn antimeridian_wraps() {
        assert_eq!(cell_of(0.0, 180.0), cell_of(0.0, -180.0));
    }

    #[test]
    fn poles_clamp() {
        assert_eq!(cell_of(90.0, 0.0).y, ROW_COUNT - 1);
        assert_eq!(cell_of(-90.0, 0.0).y, 0);
    }

    #[test]
    fn shift_x_wraps_both_ways() {
        let west_edge = CellId::new(0, 100);
        assert_eq!(west_edge.shift_x(-1).x, RING_WIDTH - 1);
        let east_edge = CellId::new(RING_WIDTH - 1, 100);
        assert_eq!(east_edge.shift_x(1).x, 0);
    }

    #[test]
    fn shift_y_stops_at_poles() {
        assert_eq!(CellId::new(5, 0).shift_y(-1), None);
        assert_eq!(CellId::new(5, ROW_COUNT - 1).shift_y(1), None);
        assert_eq!(CellId::new(5, 10).shift_y(1), Some(CellId::new(5, 11)));
    }
}
