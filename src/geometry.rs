use serde_derive::{Deserialize, Serialize};

use crate::ascii_grid::Header;

/// A raster cell, addressed by column (west to east) and row (north to
/// south). The indices are signed so that neighbourhood offsets can be
/// applied before checking whether the result lies in the study area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub column: i32,
    pub row: i32,
}

impl Cell {
    pub fn new(column: i32, row: i32) -> Cell {
        Cell { column, row }
    }

    pub fn offset(self, (d_column, d_row): (i32, i32)) -> Cell {
        Cell {
            column: self.column + d_column,
            row: self.row + d_row,
        }
    }
}

/**
The affine map between projected coordinates and raster cells.

The origin is the north-western corner of the raster, so rows count southwards
from `origin_y`:

```
# use model::geometry::{Cell, GridGeometry};
let g = GridGeometry {
    columns: 255,
    rows: 330,
    origin_x: -2985163.8955,
    origin_y: 5227968.786,
    cell_size: 25000.,
};
let origin = g.to_grid(-167889.855960219, 2409569.58522236);
assert_eq!(origin, Cell::new(113, 113));
let (x, y) = g.to_projected(origin);
assert_eq!(g.to_grid(x, y), origin);
```

The row is computed as `round((origin_y - y) / cell_size)` without taking an
absolute value, so that points north of the raster map to negative rows and are
rejected like any other point outside the study area. Applying the absolute
value before or after rounding would instead mirror those points into the
first rows, which differs exactly at cell boundaries.
 */
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    pub columns: usize,
    pub rows: usize,
    pub origin_x: f64,
    pub origin_y: f64,
    pub cell_size: f64,
}

impl GridGeometry {
    pub fn from_header(header: &Header) -> GridGeometry {
        GridGeometry {
            columns: header.columns,
            rows: header.rows,
            origin_x: header.x_corner,
            origin_y: header.y_corner + header.rows as f64 * header.cell_size,
            cell_size: header.cell_size,
        }
    }

    /// The header for rasters covering this geometry.
    pub fn header(&self, nodata: f64) -> Header {
        Header {
            columns: self.columns,
            rows: self.rows,
            x_corner: self.origin_x,
            y_corner: self.origin_y - self.rows as f64 * self.cell_size,
            cell_size: self.cell_size,
            nodata,
        }
    }

    pub fn cells(&self) -> usize {
        self.columns * self.rows
    }

    pub fn to_grid(&self, x: f64, y: f64) -> Cell {
        Cell {
            column: ((x - self.origin_x) / self.cell_size).round() as i32,
            row: ((self.origin_y - y) / self.cell_size).round() as i32,
        }
    }

    pub fn to_projected(&self, cell: Cell) -> (f64, f64) {
        (
            self.origin_x + f64::from(cell.column) * self.cell_size,
            self.origin_y - f64::from(cell.row) * self.cell_size,
        )
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.column >= 0
            && cell.row >= 0
            && (cell.column as usize) < self.columns
            && (cell.row as usize) < self.rows
    }

    /// Row-major position of a cell in a layer, if the cell is in the grid.
    pub fn index(&self, cell: Cell) -> Option<usize> {
        if self.contains(cell) {
            Some(cell.row as usize * self.columns + cell.column as usize)
        } else {
            None
        }
    }

    pub fn cell_at(&self, index: usize) -> Cell {
        Cell {
            column: (index % self.columns) as i32,
            row: (index / self.columns) as i32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn south_america() -> GridGeometry {
        GridGeometry::from_header(&Header {
            columns: 255,
            rows: 330,
            x_corner: -2985163.8955,
            y_corner: -3022031.214,
            cell_size: 25000.,
            nodata: 0.,
        })
    }

    #[test]
    fn origin_is_the_north_western_corner() {
        let g = south_america();
        assert_abs_diff_eq!(g.origin_y, 5227968.786, epsilon = 1e-6);
        assert_eq!(g.to_grid(g.origin_x, g.origin_y), Cell::new(0, 0));
        assert_abs_diff_eq!(g.header(0.).y_corner, -3022031.214, epsilon = 1e-6);
    }

    #[test]
    fn projected_coordinates_round_trip_within_a_cell() {
        let g = south_america();
        let width = g.columns as f64 * g.cell_size;
        let height = g.rows as f64 * g.cell_size;
        for i in 0..50 {
            for j in 0..50 {
                let x = g.origin_x + width * (i as f64 + 0.37) / 50.;
                let y = g.origin_y - height * (j as f64 + 0.61) / 50.;
                let cell = g.to_grid(x, y);
                let (bx, by) = g.to_projected(cell);
                assert!((bx - x).abs() <= g.cell_size);
                assert!((by - y).abs() <= g.cell_size);
                assert_eq!(g.to_grid(bx, by), cell);
            }
        }
    }

    #[test]
    fn points_north_of_the_raster_are_outside() {
        let g = south_america();
        let cell = g.to_grid(0., g.origin_y + 3. * g.cell_size);
        assert_eq!(cell.row, -3);
        assert!(!g.contains(cell));
        assert_eq!(g.index(cell), None);
    }

    #[test]
    fn index_is_row_major() {
        let g = south_america();
        assert_eq!(g.index(Cell::new(4, 2)), Some(2 * 255 + 4));
        assert_eq!(g.cell_at(2 * 255 + 4), Cell::new(4, 2));
        assert_eq!(g.index(Cell::new(255, 0)), None);
        assert_eq!(g.index(Cell::new(-1, 3)), None);
    }
}
