//! Map data model: dense grids and height fields.
//!
//! [`Grid`] is the bounds-checked 2D storage shared by every map type, and
//! [`HeightField`] is the `f64` specialization that flows through the node graph.
use serde::{Deserialize, Serialize};

pub mod grid;
pub mod height_field;

pub use grid::Grid;
pub use height_field::HeightField;

/// Height and width of a map in cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Dimensions {
    /// Number of rows.
    pub height: usize,
    /// Number of columns.
    pub width: usize,
}

impl Dimensions {
    /// Creates dimensions of `height` rows and `width` columns.
    pub const fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }

    /// Creates square dimensions.
    pub const fn square(size: usize) -> Self {
        Self::new(size, size)
    }

    /// Total number of cells.
    pub const fn area(&self) -> usize {
        self.height * self.width
    }

    /// The longer of the two sides.
    pub fn max_side(&self) -> usize {
        self.height.max(self.width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_dimensions_have_equal_sides() {
        let d = Dimensions::square(7);
        assert_eq!(d.height, 7);
        assert_eq!(d.width, 7);
        assert_eq!(d.area(), 49);
    }

    #[test]
    fn max_side_picks_longer_axis() {
        assert_eq!(Dimensions::new(3, 9).max_side(), 9);
        assert_eq!(Dimensions::new(12, 4).max_side(), 12);
    }

    #[test]
    fn serializes_with_pascal_case_fields() {
        let json = serde_json::to_value(Dimensions::new(2, 5)).unwrap();
        assert_eq!(json, serde_json::json!({ "Height": 2, "Width": 5 }));
    }
}
