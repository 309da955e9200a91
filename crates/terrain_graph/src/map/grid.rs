//! Dense, fixed-size 2D storage with bounds-checked access.
//!
//! Cells are stored row-major. Out-of-range reads and writes fail with
//! [`Error::IndexOutOfRange`] instead of clamping.
use crate::error::{Error, Result};
use crate::map::Dimensions;

/// A fixed-size, row-major 2D array of cells.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    height: usize,
    width: usize,
    cells: Vec<T>,
}

impl<T: Copy + Default> Grid<T> {
    /// Create a grid of the given size with every cell set to `T::default()`.
    pub fn new(height: usize, width: usize) -> Self {
        Self {
            height,
            width,
            cells: vec![T::default(); height * width],
        }
    }

    /// Create a zero-filled grid with the given [`Dimensions`].
    pub fn with_dimensions(dimensions: Dimensions) -> Self {
        Self::new(dimensions.height, dimensions.width)
    }

    /// Create a grid from row-major cells.
    pub fn from_cells(height: usize, width: usize, cells: Vec<T>) -> Result<Self> {
        if cells.len() != height * width {
            return Err(Error::Precondition(format!(
                "expected {} cells for a {}x{} grid but got {}",
                height * width,
                height,
                width,
                cells.len()
            )));
        }
        Ok(Self {
            height,
            width,
            cells,
        })
    }

    /// Create a grid from a list of equally long rows.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let mut cells = Vec::with_capacity(height * width);
        for (r, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(Error::Precondition(format!(
                    "row {} has {} cells, expected {}",
                    r,
                    row.len(),
                    width
                )));
            }
            cells.extend(row);
        }
        Self::from_cells(height, width, cells)
    }

    /// Copy `source` into a grid of a possibly different size.
    ///
    /// The overlapping top-left rectangle is copied and the remainder is zero-filled.
    pub fn resized_from(source: &Grid<T>, height: usize, width: usize) -> Self {
        let mut grid = Self::new(height, width);
        let rows = height.min(source.height);
        let cols = width.min(source.width);
        for r in 0..rows {
            let src = r * source.width;
            let dst = r * width;
            grid.cells[dst..dst + cols].copy_from_slice(&source.cells[src..src + cols]);
        }
        grid
    }

    /// Number of rows.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of columns.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Size of the grid.
    #[inline]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.height, self.width)
    }

    /// Total number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` if the grid has no cells.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Check whether `(row, col)` addresses a cell of this grid.
    #[inline]
    pub fn is_in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.height && col < self.width
    }

    /// Get the value at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.try_get(row, col)
            .ok_or_else(|| self.out_of_range(row, col))
    }

    /// Get the value at `(row, col)`, or `None` when it is out of range.
    #[inline]
    pub fn try_get(&self, row: usize, col: usize) -> Option<T> {
        if self.is_in_bounds(row, col) {
            Some(self.cells[row * self.width + col])
        } else {
            None
        }
    }

    /// Set the value at `(row, col)`.
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        if !self.is_in_bounds(row, col) {
            return Err(self.out_of_range(row, col));
        }
        self.cells[row * self.width + col] = value;
        Ok(())
    }

    /// Row-major view of all cells.
    #[inline]
    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    /// Mutable row-major view of all cells.
    #[inline]
    pub fn cells_mut(&mut self) -> &mut [T] {
        &mut self.cells
    }

    /// Consume the grid and return its row-major cells.
    pub fn into_cells(self) -> Vec<T> {
        self.cells
    }

    /// Iterate over the rows of the grid.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        // chunks(0) panics, so an empty row width yields no rows at all.
        self.cells.chunks(self.width.max(1)).take(self.height)
    }

    /// Visit every position in row-major order.
    pub fn for_each(&self, mut visit: impl FnMut(usize, usize)) {
        self.indexed_for_each(|r, c, _| visit(r, c));
    }

    /// Visit every position in row-major order, also passing the flat index.
    pub fn indexed_for_each(&self, mut visit: impl FnMut(usize, usize, usize)) {
        for r in 0..self.height {
            for c in 0..self.width {
                visit(r, c, r * self.width + c);
            }
        }
    }

    fn out_of_range(&self, row: usize, col: usize) -> Error {
        Error::IndexOutOfRange {
            row,
            col,
            height: self.height,
            width: self.width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Grid<i32> {
        Grid::from_rows(vec![vec![1, 2], vec![4, 5]]).unwrap()
    }

    #[test]
    fn new_is_zero_filled_with_given_dimensions() {
        let grid: Grid<i32> = Grid::new(3, 5);
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.width(), 5);
        assert!(grid.cells().iter().all(|v| *v == 0));
    }

    #[test]
    fn set_then_get_returns_value() {
        let mut grid: Grid<f64> = Grid::new(4, 3);
        for r in 0..4 {
            for c in 0..3 {
                let v = (r * 10 + c) as f64;
                grid.set(r, c, v).unwrap();
                assert_eq!(grid.get(r, c).unwrap(), v);
            }
        }
    }

    #[test]
    fn out_of_range_access_fails_instead_of_clamping() {
        let mut grid = sample();
        assert!(matches!(
            grid.get(2, 1),
            Err(Error::IndexOutOfRange { row: 2, col: 1, .. })
        ));
        assert!(matches!(
            grid.get(1, 2),
            Err(Error::IndexOutOfRange { .. })
        ));
        assert!(grid.set(2, 0, 9).is_err());
        assert!(grid.set(0, 2, 9).is_err());
        assert_eq!(grid, sample());
    }

    #[test]
    fn is_in_bounds_never_fails() {
        let grid = sample();
        assert!(grid.is_in_bounds(1, 1));
        assert!(!grid.is_in_bounds(2, 0));
        assert!(!grid.is_in_bounds(usize::MAX, usize::MAX));
    }

    #[test]
    fn from_rows_rejects_ragged_input() {
        let err = Grid::from_rows(vec![vec![1, 2], vec![3]]).unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
    }

    #[test]
    fn from_cells_rejects_wrong_length() {
        assert!(Grid::from_cells(2, 2, vec![1, 2, 3]).is_err());
    }

    #[test]
    fn resized_from_pads_smaller_source() {
        let grid = Grid::resized_from(&sample(), 3, 3);
        assert_eq!(grid.cells(), &[1, 2, 0, 4, 5, 0, 0, 0, 0]);
    }

    #[test]
    fn resized_from_crops_bigger_source() {
        let source = Grid::from_rows(vec![vec![1, 2, 3], vec![4, 5, 6], vec![7, 8, 9]]).unwrap();
        let grid = Grid::resized_from(&source, 2, 2);
        assert_eq!(grid, sample());
    }

    #[test]
    fn resized_from_handles_mixed_crop_and_pad() {
        let source = Grid::from_rows(vec![vec![1, 2, 3]]).unwrap();
        let grid = Grid::resized_from(&source, 2, 2);
        assert_eq!(grid.cells(), &[1, 2, 0, 0]);
    }

    #[test]
    fn for_each_traverses_row_major() {
        let grid: Grid<u8> = Grid::new(2, 3);
        let mut visited = Vec::new();
        grid.indexed_for_each(|r, c, i| visited.push((r, c, i)));
        assert_eq!(
            visited,
            vec![
                (0, 0, 0),
                (0, 1, 1),
                (0, 2, 2),
                (1, 0, 3),
                (1, 1, 4),
                (1, 2, 5)
            ]
        );
    }

    #[test]
    fn rows_yields_each_row_slice() {
        let grid = sample();
        let rows: Vec<&[i32]> = grid.rows().collect();
        assert_eq!(rows, vec![&[1, 2][..], &[4, 5][..]]);

        let empty: Grid<i32> = Grid::new(3, 0);
        assert_eq!(empty.rows().count(), 0);
    }
}
