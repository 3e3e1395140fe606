use std::ops::Index;

use crate::{CELL_COUNT, TERRAIN_SIZE};

/// A square grid of per-cell values covering a whole terrain, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Wraps `cells`, returning `None` unless there is exactly one per terrain cell.
    #[must_use]
    pub fn from_cells(cells: Vec<T>) -> Option<Self> {
        (cells.len() == CELL_COUNT).then(|| Self { cells })
    }

    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if x >= TERRAIN_SIZE || y >= TERRAIN_SIZE {
            return None;
        }
        self.cells.get(y * TERRAIN_SIZE + x)
    }

    #[must_use]
    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        self.cells.chunks_exact(TERRAIN_SIZE)
    }

    #[must_use]
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Grid<U> {
        Grid {
            cells: self.cells.iter().map(f).collect(),
        }
    }
}

impl<T> Index<(usize, usize)> for Grid<T> {
    type Output = T;

    fn index(&self, (x, y): (usize, usize)) -> &T {
        assert!(x < TERRAIN_SIZE, "x {x} out of range");
        &self.cells[y * TERRAIN_SIZE + x]
    }
}
