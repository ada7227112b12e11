//! Nearest-cell terrain elevation sampling.

use glam::Vec2;

/// Immutable grid of elevation samples spanning `[-S/2, S/2]²`.
///
/// Rows run along z and columns along x. Sampling maps a world coordinate
/// linearly onto the grid, clamps the index into range, and returns the raw
/// sample multiplied by the height scale. There is no interpolation.
#[derive(Clone, Debug, PartialEq)]
pub struct Heightfield {
    rows: usize,
    columns: usize,
    samples: Vec<f32>,
    world_size: f32,
    height_scale: f32,
}

impl Heightfield {
    /// Creates a single-cell field at elevation zero.
    #[must_use]
    pub fn flat(world_size: f32, height_scale: f32) -> Self {
        Self {
            rows: 1,
            columns: 1,
            samples: vec![0.0],
            world_size,
            height_scale,
        }
    }

    /// Creates a field from row-major samples.
    ///
    /// The first row fixes the column count; short rows are padded with zero
    /// and long rows truncated. An empty input yields [`Heightfield::flat`].
    #[must_use]
    pub fn from_rows(rows: &[Vec<f32>], world_size: f32, height_scale: f32) -> Self {
        let columns = rows.first().map_or(0, Vec::len);
        if columns == 0 {
            return Self::flat(world_size, height_scale);
        }

        let mut samples = Vec::with_capacity(columns * rows.len());
        for row in rows {
            samples.extend((0..columns).map(|column| {
                row.get(column)
                    .copied()
                    .filter(|sample| sample.is_finite())
                    .unwrap_or(0.0)
            }));
        }

        Self {
            rows: rows.len(),
            columns,
            samples,
            world_size,
            height_scale,
        }
    }

    /// Scaled elevation of the cell containing `(x, z)`.
    #[must_use]
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        let row = cell_index(z, self.world_size, self.rows);
        let column = cell_index(x, self.world_size, self.columns);
        self.raw(row, column).unwrap_or(0.0) * self.height_scale
    }

    /// Unscaled sample stored at the provided cell.
    #[must_use]
    pub fn raw(&self, row: usize, column: usize) -> Option<f32> {
        if row >= self.rows || column >= self.columns {
            return None;
        }
        self.samples.get(row * self.columns + column).copied()
    }

    /// Grid dimensions as `(columns, rows)`.
    #[must_use]
    pub const fn dimensions(&self) -> (usize, usize) {
        (self.columns, self.rows)
    }

    /// Side length of the world the field spans.
    #[must_use]
    pub const fn world_size(&self) -> f32 {
        self.world_size
    }

    /// World-space `(x, z)` centre of the provided cell.
    #[must_use]
    pub fn cell_center(&self, row: usize, column: usize) -> Vec2 {
        Vec2::new(
            cell_center_coordinate(column, self.columns, self.world_size),
            cell_center_coordinate(row, self.rows, self.world_size),
        )
    }
}

/// Maps a world coordinate onto `0..cells`, clamping out-of-range values.
///
/// Non-finite coordinates resolve to the first cell.
#[must_use]
pub fn cell_index(coordinate: f32, world_size: f32, cells: usize) -> usize {
    if cells == 0 {
        return 0;
    }
    let scaled = ((coordinate + world_size * 0.5) / world_size * cells as f32).floor();
    if !scaled.is_finite() || scaled < 0.0 {
        return 0;
    }
    (scaled as usize).min(cells - 1)
}

pub(crate) fn cell_center_coordinate(index: usize, cells: usize, world_size: f32) -> f32 {
    if cells == 0 {
        return 0.0;
    }
    (index as f32 + 0.5) / cells as f32 * world_size - world_size * 0.5
}
