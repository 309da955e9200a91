//! Unary height-field transforms.
//!
//! An [`Effect`] reads a field and returns a new one. The input is never
//! modified, so a cached node result can be fed to any number of effects.
use std::fmt;

use crate::error::Result;
use crate::map::HeightField;

pub mod gaussian_blur;
pub mod tone;

pub use gaussian_blur::GaussianBlurEffect;
pub use tone::{BrightnessEffect, ContrastEffect, GammaEffect, IntensityEffect, InvertEffect};

/// A unary transform applied by image-effect nodes.
pub trait Effect: Send + Sync + fmt::Debug {
    /// Tag written next to the persisted parameters.
    fn type_tag(&self) -> &'static str;

    /// Produce the transformed field.
    fn calculate(&self, field: &HeightField) -> HeightField;

    /// Persisted parameters.
    fn to_payload(&self) -> Result<serde_json::Value>;
}

/// Clone `field` and apply `f` to every cell.
pub(crate) fn map_cells(field: &HeightField, f: impl Fn(f64) -> f64) -> HeightField {
    let mut out = field.clone();
    out.map_in_place(f);
    out
}
