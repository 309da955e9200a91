//! Constant-height generator.
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::generators::Generator;
use crate::map::{Dimensions, HeightField};

/// Fills the whole field with one height, clamped to `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FlatGenerator {
    pub dimensions: Dimensions,
    pub height: f64,
}

impl FlatGenerator {
    pub const TYPE_TAG: &'static str = "FlatGenerator";

    pub fn new(dimensions: Dimensions, height: f64) -> Self {
        Self { dimensions, height }
    }
}

impl Generator for FlatGenerator {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    fn generate(&self) -> Result<HeightField> {
        let mut field = HeightField::with_dimensions(self.dimensions);
        field.flatten_to(self.height);
        Ok(field)
    }

    fn to_payload(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}
