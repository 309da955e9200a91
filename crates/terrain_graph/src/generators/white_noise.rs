//! Uniform white noise.
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::generators::{rand01, seeded_rng, Generator};
use crate::map::{Dimensions, HeightField};

/// Independent uniform samples in `[0, 1)` per cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WhiteNoiseGenerator {
    pub dimensions: Dimensions,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl WhiteNoiseGenerator {
    pub const TYPE_TAG: &'static str = "WhiteNoiseGenerator";

    pub fn new(dimensions: Dimensions, seed: Option<u64>) -> Self {
        Self { dimensions, seed }
    }
}

impl Generator for WhiteNoiseGenerator {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    fn generate(&self) -> Result<HeightField> {
        let mut rng = seeded_rng(self.seed);
        let mut field = HeightField::with_dimensions(self.dimensions);
        for v in field.cells_mut() {
            *v = rand01(&mut rng);
        }
        field.recalculate_extrema();
        Ok(field)
    }

    fn to_payload(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}
