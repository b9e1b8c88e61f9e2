use std::ops::{Index, IndexMut};

use crate::geometry::{Cell, GridGeometry};

/// One value per raster cell, stored flat in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer<T> {
    values: Vec<T>,
    columns: usize,
}

impl<T: Copy + Default> Layer<T> {
    pub fn new(geometry: &GridGeometry) -> Self {
        Layer {
            values: vec![T::default(); geometry.cells()],
            columns: geometry.columns,
        }
    }
}

impl<T: Copy> Layer<T> {
    pub fn filled(geometry: &GridGeometry, value: T) -> Self {
        Layer {
            values: vec![value; geometry.cells()],
            columns: geometry.columns,
        }
    }

    /// Wrap row-major values. Returns `None` if their number does not match
    /// the geometry.
    pub fn from_values(geometry: &GridGeometry, values: Vec<T>) -> Option<Self> {
        if values.len() == geometry.cells() {
            Some(Layer {
                values,
                columns: geometry.columns,
            })
        } else {
            None
        }
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Replace all values, keeping the allocation.
    pub fn overwrite(&mut self, values: &[T]) {
        self.values.copy_from_slice(values);
    }

    #[inline]
    fn position(&self, cell: Cell) -> usize {
        let rows = self.values.len() / self.columns;
        assert!(
            cell.column >= 0
                && cell.row >= 0
                && (cell.column as usize) < self.columns
                && (cell.row as usize) < rows,
            "cell {:?} outside the study area",
            cell
        );
        cell.row as usize * self.columns + cell.column as usize
    }
}

impl<T: Copy> Index<Cell> for Layer<T> {
    type Output = T;

    fn index(&self, cell: Cell) -> &T {
        &self.values[self.position(cell)]
    }
}

impl<T: Copy> IndexMut<Cell> for Layer<T> {
    fn index_mut(&mut self, cell: Cell) -> &mut T {
        let i = self.position(cell);
        &mut self.values[i]
    }
}
