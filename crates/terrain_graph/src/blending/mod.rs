//! Pairwise blending of two height fields.
//!
//! A [`BlendMode`] combines `left` and `right` cell by cell into a new field with
//! the dimensions of `left`. Positions not covered by `right` use the mode's
//! neutral value for the right operand. Neither input is modified.
use std::fmt;

use crate::error::Result;
use crate::map::HeightField;

pub mod modes;

pub use modes::{
    AddBlend, DarkenBlend, DifferenceBlend, LightenBlend, MaskBlend, MultiplyBlend, OverlayBlend,
    ScreenBlend, SubtractBlend,
};

/// A per-cell combination rule over `(a = left, b = right)`.
pub trait BlendMode: Send + Sync + fmt::Debug {
    /// Tag written next to the persisted parameters.
    fn type_tag(&self) -> &'static str;

    /// Value used for `b` where `right` does not cover a position of `left`.
    fn fallback(&self) -> f64;

    /// Combine one pair of cells.
    fn combine(&self, a: f64, b: f64) -> f64;

    /// Blend two fields into a new one shaped like `left`.
    fn blend(&self, left: &HeightField, right: &HeightField) -> HeightField {
        let mut out = left.clone();
        let width = left.width();
        let fallback = self.fallback();
        for (i, v) in out.cells_mut().iter_mut().enumerate() {
            let b = right.try_get(i / width, i % width).unwrap_or(fallback);
            *v = self.combine(*v, b);
        }
        out.recalculate_extrema();
        out
    }

    /// Persisted parameters. Built-in modes have none.
    fn to_payload(&self) -> Result<serde_json::Value> {
        Ok(serde_json::Value::Object(serde_json::Map::new()))
    }
}
