//! Placement clearance mask derived from the heightfield.

use crate::heightfield::{cell_center_coordinate, Heightfield};

/// Square boolean grid spanning the same extent as the heightfield.
///
/// A cell is occupied when its terrain lies below sea level or when a placed
/// entity reserved it. The grid is consulted only while placing entities.
#[derive(Clone, Debug, PartialEq)]
pub struct OccupancyGrid {
    size: usize,
    world_size: f32,
    cells: Vec<bool>,
}

impl OccupancyGrid {
    /// Builds the grid from the heightfield, marking submerged cells occupied.
    ///
    /// `resolution` overrides the side length; by default it matches the
    /// larger heightfield dimension.
    #[must_use]
    pub fn from_heightfield(
        heightfield: &Heightfield,
        resolution: Option<u32>,
        sea_level: f32,
    ) -> Self {
        let (columns, rows) = heightfield.dimensions();
        let size = resolution
            .and_then(|value| usize::try_from(value).ok())
            .filter(|value| *value > 0)
            .unwrap_or_else(|| columns.max(rows).max(1));
        let world_size = heightfield.world_size();

        let mut cells = Vec::with_capacity(size * size);
        for row in 0..size {
            let z = cell_center_coordinate(row, size, world_size);
            for column in 0..size {
                let x = cell_center_coordinate(column, size, world_size);
                cells.push(heightfield.height_at(x, z) < sea_level);
            }
        }

        Self {
            size,
            world_size,
            cells,
        }
    }

    /// Reports whether every in-bounds cell within `radius` of `(x, z)` is free.
    ///
    /// Cells outside the grid are ignored rather than treated as blocking.
    #[must_use]
    pub fn check_radius_clear(&self, x: f32, z: f32, radius: f32) -> bool {
        self.cells_within(x, z, radius)
            .into_iter()
            .all(|index| !self.cells[index])
    }

    /// Marks every in-bounds cell within `radius` of `(x, z)` as occupied.
    pub fn mark_radius_occupied(&mut self, x: f32, z: f32, radius: f32) {
        for index in self.cells_within(x, z, radius) {
            self.cells[index] = true;
        }
    }

    /// Side length of the grid in cells.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Number of occupied cells.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|cell| **cell).count()
    }

    fn cells_within(&self, x: f32, z: f32, radius: f32) -> Vec<usize> {
        let world_size = self.world_size;
        let cells_per_unit = self.size as f32 / world_size;
        let half = world_size * 0.5;
        let centre_column = ((x + half) * cells_per_unit).floor();
        let centre_row = ((z + half) * cells_per_unit).floor();
        let reach = (radius.max(0.0) * cells_per_unit).ceil();
        if !centre_column.is_finite() || !centre_row.is_finite() || !reach.is_finite() {
            return Vec::new();
        }

        let size = self.size as i64;
        let reach = (reach as i64).min(size * 2);
        let centre_column = centre_column as i64;
        let centre_row = centre_row as i64;

        let mut indices = Vec::new();
        for row_offset in -reach..=reach {
            let row = centre_row + row_offset;
            if row < 0 || row >= size {
                continue;
            }
            for column_offset in -reach..=reach {
                let column = centre_column + column_offset;
                if column < 0 || column >= size {
                    continue;
                }
                if row_offset * row_offset + column_offset * column_offset > reach * reach {
                    continue;
                }
                if let (Ok(row), Ok(column)) = (usize::try_from(row), usize::try_from(column)) {
                    indices.push(row * self.size + column);
                }
            }
        }
        indices
    }
}
