//! Deterministic cell assignment for grid-placed buildings.

use glam::Vec2;
use worldforge_core::{BuildingGrid, BuildingKind};

/// Planar centre of the `index`-th cell of a grid, filled row by row.
///
/// Cells are spaced `cell_size` apart and centred on the grid origin.
#[must_use]
pub fn slot_position(grid: &BuildingGrid, index: usize) -> Vec2 {
    let columns = usize::try_from(grid.columns).unwrap_or(1).max(1);
    let rows = grid.rows.max(1) as f32;
    let row = (index / columns) as f32;
    let column = (index % columns) as f32;
    let cell = grid.cell_size;
    Vec2::new(
        column * cell - (columns as f32 - 1.0) * cell / 2.0 + grid.origin[0],
        row * cell - (rows - 1.0) * cell / 2.0 + grid.origin[1],
    )
}

/// Slot for the `index`-th building of `kind`, walking that kind's grids in order.
///
/// Returns `None` once every grid accepting the kind is full.
#[must_use]
pub fn building_slot(grids: &[BuildingGrid], kind: BuildingKind, index: usize) -> Option<Vec2> {
    let mut remaining = index;
    for grid in grids.iter().filter(|grid| grid.building == kind) {
        let capacity = grid.capacity();
        if remaining < capacity {
            return Some(slot_position(grid, remaining));
        }
        remaining -= capacity;
    }
    None
}
