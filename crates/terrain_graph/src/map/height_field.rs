//! Height fields: `f64` grids that track their extrema.
use std::path::Path;

use image::{ImageFormat, Rgba, RgbaImage};

use crate::error::{Error, Result};
use crate::map::{Dimensions, Grid};

/// A grid of heights together with its current minimum and maximum.
///
/// A field that was never written reports the sentinel extrema
/// `min = f64::MAX` and `max = f64::MIN`. Writes through [`HeightField::set`]
/// keep the extrema exact. Bulk writers going through
/// [`HeightField::cells_mut`] must call [`HeightField::recalculate_extrema`]
/// afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightField {
    grid: Grid<f64>,
    min_value: f64,
    max_value: f64,
}

impl HeightField {
    /// Create a zero-filled field.
    pub fn new(height: usize, width: usize) -> Self {
        Self {
            grid: Grid::new(height, width),
            min_value: f64::MAX,
            max_value: f64::MIN,
        }
    }

    /// Create a zero-filled field with the given [`Dimensions`].
    pub fn with_dimensions(dimensions: Dimensions) -> Self {
        Self::new(dimensions.height, dimensions.width)
    }

    /// Wrap an existing grid, computing its extrema.
    pub fn from_grid(grid: Grid<f64>) -> Self {
        let mut field = Self {
            grid,
            min_value: f64::MAX,
            max_value: f64::MIN,
        };
        field.recalculate_extrema();
        field
    }

    /// Create a field from row-major values.
    pub fn from_cells(height: usize, width: usize, cells: Vec<f64>) -> Result<Self> {
        Grid::from_cells(height, width, cells).map(Self::from_grid)
    }

    /// Create a field from equally long rows.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        Grid::from_rows(rows).map(Self::from_grid)
    }

    /// Borrow the underlying grid.
    pub fn grid(&self) -> &Grid<f64> {
        &self.grid
    }

    /// Consume the field and return the underlying grid.
    pub fn into_grid(self) -> Grid<f64> {
        self.grid
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.grid.height()
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.grid.width()
    }

    #[inline]
    pub fn dimensions(&self) -> Dimensions {
        self.grid.dimensions()
    }

    /// Smallest cell value, or `f64::MAX` for a never-written field.
    #[inline]
    pub fn min_value(&self) -> f64 {
        self.min_value
    }

    /// Largest cell value, or `f64::MIN` for a never-written field.
    #[inline]
    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    #[inline]
    pub fn is_in_bounds(&self, row: usize, col: usize) -> bool {
        self.grid.is_in_bounds(row, col)
    }

    pub fn get(&self, row: usize, col: usize) -> Result<f64> {
        self.grid.get(row, col)
    }

    /// Get the value at `(row, col)`, or `None` when it is out of range.
    #[inline]
    pub fn try_get(&self, row: usize, col: usize) -> Option<f64> {
        self.grid.try_get(row, col)
    }

    /// Set the value at `(row, col)` and keep the extrema exact.
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        let previous = self.grid.get(row, col)?;
        self.grid.set(row, col, value)?;

        let rescan = self.min_value > self.max_value
            || (previous <= self.min_value && value > previous)
            || (previous >= self.max_value && value < previous);
        if rescan {
            self.recalculate_extrema();
        } else {
            self.min_value = self.min_value.min(value);
            self.max_value = self.max_value.max(value);
        }
        Ok(())
    }

    /// Row-major view of all heights.
    #[inline]
    pub fn cells(&self) -> &[f64] {
        self.grid.cells()
    }

    /// Mutable row-major view of all heights.
    ///
    /// The extrema are not tracked through this view.
    #[inline]
    pub fn cells_mut(&mut self) -> &mut [f64] {
        self.grid.cells_mut()
    }

    /// Rescan every cell and reset the extrema.
    pub fn recalculate_extrema(&mut self) {
        let (min, max) = self
            .grid
            .cells()
            .iter()
            .fold((f64::MAX, f64::MIN), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
        self.min_value = min;
        self.max_value = max;
    }

    pub fn for_each(&self, visit: impl FnMut(usize, usize)) {
        self.grid.for_each(visit);
    }

    pub fn indexed_for_each(&self, visit: impl FnMut(usize, usize, usize)) {
        self.grid.indexed_for_each(visit);
    }

    /// Fill with zeros.
    pub fn flatten(&mut self) {
        self.flatten_to(0.0);
    }

    /// Fill every cell with `value` clamped to `[0, 1]`.
    pub fn flatten_to(&mut self, value: f64) {
        let value = value.clamp(0.0, 1.0);
        self.grid.cells_mut().fill(value);
        if self.grid.is_empty() {
            self.recalculate_extrema();
        } else {
            self.min_value = value;
            self.max_value = value;
        }
    }

    /// Rescale so that the current minimum maps to 0 and the maximum to 1.
    ///
    /// A degenerate field (flat, never written, or with non-finite extrema)
    /// becomes all zeros.
    pub fn normalize(&mut self) {
        self.normalize_with(self.min_value, self.max_value);
    }

    /// Rescale with caller-provided extrema; values may fall outside `[0, 1]`.
    pub fn normalize_with(&mut self, min: f64, max: f64) {
        let range = max - min;
        if !(range.is_finite() && range > 0.0) {
            self.grid.cells_mut().fill(0.0);
            self.min_value = 0.0;
            self.max_value = 0.0;
            return;
        }
        for v in self.grid.cells_mut() {
            *v = (*v - min) / range;
        }
        self.recalculate_extrema();
    }

    /// Normalized copy; `self` is left untouched.
    pub fn as_normalized(&self) -> Self {
        let mut copy = self.clone();
        copy.normalize();
        copy
    }

    /// Copy normalized with caller-provided extrema.
    pub fn as_normalized_with(&self, min: f64, max: f64) -> Self {
        let mut copy = self.clone();
        copy.normalize_with(min, max);
        copy
    }

    /// Crop or zero-pad into a field of the given size.
    pub fn resized(&self, height: usize, width: usize) -> Self {
        Self::from_grid(Grid::resized_from(&self.grid, height, width))
    }

    /// Apply `f` to every cell and recompute the extrema.
    pub fn map_in_place(&mut self, f: impl Fn(f64) -> f64) {
        for v in self.grid.cells_mut() {
            *v = f(*v);
        }
        self.recalculate_extrema();
    }

    /// Render as an opaque greyscale image, one pixel per cell.
    pub fn to_greyscale_image(&self) -> Result<RgbaImage> {
        let width = u32::try_from(self.width())
            .map_err(|_| Error::Precondition(format!("width {} exceeds u32", self.width())))?;
        let height = u32::try_from(self.height())
            .map_err(|_| Error::Precondition(format!("height {} exceeds u32", self.height())))?;
        let cells = self.grid.cells();
        let stride = self.width();
        Ok(RgbaImage::from_fn(width, height, |x, y| {
            let level = greyscale_level(cells[y as usize * stride + x as usize]);
            Rgba([level, level, level, u8::MAX])
        }))
    }

    /// Write the greyscale rendering as a PNG file.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        self.to_greyscale_image()?
            .save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }
}

/// Map a height to an 8-bit grey level, clamping to `[0, 1]`.
#[inline]
pub fn greyscale_level(value: f64) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}
