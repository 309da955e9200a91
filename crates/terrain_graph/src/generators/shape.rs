//! Geometric shape generators.
use glam::{IVec2, UVec2};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::generators::Generator;
use crate::map::{Dimensions, HeightField};

fn default_min_height() -> f64 {
    0.0
}

fn default_max_height() -> f64 {
    1.0
}

/// A centred pyramid rising from `min_height` at its rim to `max_height` at its apex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PyramidGenerator {
    pub dimensions: Dimensions,
    /// Footprint relative to the field, in `[0, 1]`.
    pub ratio: f64,
    #[serde(default = "default_min_height")]
    pub min_height: f64,
    #[serde(default = "default_max_height")]
    pub max_height: f64,
}

impl PyramidGenerator {
    pub const TYPE_TAG: &'static str = "PyramidGenerator";

    pub fn new(dimensions: Dimensions, ratio: f64) -> Self {
        Self {
            dimensions,
            ratio: ratio.clamp(0.0, 1.0),
            min_height: default_min_height(),
            max_height: default_max_height(),
        }
    }

    pub fn with_heights(mut self, min_height: f64, max_height: f64) -> Self {
        self.min_height = min_height.clamp(0.0, 1.0);
        self.max_height = max_height.clamp(0.0, 1.0);
        self
    }
}

/// Height contributed by one pyramid axis at offset `i` of its window.
fn axis_height(i: usize, half: usize, min: f64, max: f64) -> f64 {
    if half == 0 {
        return max;
    }
    let falloff = (half - i.abs_diff(half)) as f64 / half as f64;
    min + falloff * (max - min)
}

impl Generator for PyramidGenerator {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    fn generate(&self) -> Result<HeightField> {
        let Dimensions { height, width } = self.dimensions;
        let ratio = self.ratio.clamp(0.0, 1.0);
        let min = self.min_height.clamp(0.0, 1.0);
        let max = self.max_height.clamp(0.0, 1.0);

        let size_y = (height as f64 * ratio).floor() as usize;
        let size_x = (width as f64 * ratio).floor() as usize;
        let (half_y, half_x) = (size_y / 2, size_x / 2);
        let (offset_y, offset_x) = ((height - size_y) / 2, (width - size_x) / 2);

        let mut field = HeightField::with_dimensions(self.dimensions);
        let cells = field.cells_mut();
        for y in 0..size_y {
            let height_y = axis_height(y, half_y, min, max);
            let row = (offset_y + y) * width;
            for x in 0..size_x {
                let height_x = axis_height(x, half_x, min, max);
                cells[row + offset_x + x] = height_y.min(height_x);
            }
        }
        field.recalculate_extrema();
        Ok(field)
    }

    fn to_payload(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

fn default_height() -> f64 {
    1.0
}

/// An axis-aligned rectangle of constant height.
///
/// `size.x` and `offset.x` run along columns, `size.y` and `offset.y` along
/// rows. The rectangle may start at a negative offset and is clipped to the
/// field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RectangleGenerator {
    pub dimensions: Dimensions,
    pub size: UVec2,
    #[serde(default)]
    pub offset: IVec2,
    #[serde(default = "default_height")]
    pub height: f64,
}

impl RectangleGenerator {
    pub const TYPE_TAG: &'static str = "RectangleGenerator";

    pub fn new(dimensions: Dimensions, size: UVec2, offset: IVec2, height: f64) -> Self {
        Self {
            dimensions,
            size,
            offset,
            height,
        }
    }

    /// A rectangle anchored at the top-left corner.
    pub fn at_origin(dimensions: Dimensions, size: UVec2, height: f64) -> Self {
        Self::new(dimensions, size, IVec2::ZERO, height)
    }

    /// A centred rectangle covering `ratio` of each side.
    pub fn centered(dimensions: Dimensions, ratio: f64, height: f64) -> Self {
        let ratio = ratio.clamp(0.0, 1.0);
        let cols = (dimensions.width as f64 * ratio).floor() as u32;
        let rows = (dimensions.height as f64 * ratio).floor() as u32;
        let offset = IVec2::new(
            (dimensions.width as i32 - cols as i32) / 2,
            (dimensions.height as i32 - rows as i32) / 2,
        );
        Self::new(dimensions, UVec2::new(cols, rows), offset, height)
    }

    /// A square of side `side` anchored at `offset`.
    pub fn square(dimensions: Dimensions, side: u32, offset: IVec2, height: f64) -> Self {
        Self::new(dimensions, UVec2::splat(side), offset, height)
    }
}

impl Generator for RectangleGenerator {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    fn generate(&self) -> Result<HeightField> {
        let Dimensions { height, width } = self.dimensions;
        let clip = |start: i32, len: u32, bound: usize| {
            let start = i64::from(start);
            let end = (start + i64::from(len)).min(bound as i64);
            let start = start.clamp(0, bound as i64);
            (start as usize)..(end.max(start) as usize)
        };
        let rows = clip(self.offset.y, self.size.y, height);
        let cols = clip(self.offset.x, self.size.x, width);
        let value = self.height.clamp(0.0, 1.0);

        let mut field = HeightField::with_dimensions(self.dimensions);
        let cells = field.cells_mut();
        for r in rows {
            cells[r * width + cols.start..r * width + cols.end].fill(value);
        }
        field.recalculate_extrema();
        Ok(field)
    }

    fn to_payload(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}
