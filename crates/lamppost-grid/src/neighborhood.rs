//! Neighborhood expansion for proximity lookups.
//!
//! A single-cell lookup misses posts just across a cell boundary, so every
//! spatial query uses the center cell plus all adjacent cells.

use crate::cell::{cell_of, CellId};

/// Center cell plus all adjacent cells for a coordinate, center first.
pub fn neighborhood_of(lat: f64, lng: f64) -> Vec<CellId> {
    neighborhood_of_cell(cell_of(lat, lng))
}

/// Center cell plus all adjacent cells (the 3x3 block), center first.
///
/// Columns wrap around the antimeridian; rows past a pole are dropped, so
/// neighborhoods in the top and bottom rows have 6 cells instead of 9.
pub fn neighborhood_of_cell(center: CellId) -> Vec<CellId> {
    let mut cells = Vec::with_capacity(9);
    cells.push(center);
    for dy in [-1, 0, 1] {
        let Some(row) = center.shift_y(dy) else {
            continue;
        };
        for dx in [-1, 0, 1] {
            if dx == 0 && dy == 0 {
                continue;
            }
            cells.push(row.shift_x(dx));
        }
    }
    cells
}
