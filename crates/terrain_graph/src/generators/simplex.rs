//! Open simplex noise and its fractal (FBM) sum.
use glam::DVec2;
use noise::{NoiseFn, OpenSimplex};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::generators::{resolve_seed, Generator};
use crate::map::{Dimensions, HeightField};

fn unit_scale() -> DVec2 {
    DVec2::ONE
}

/// 32-bit seed for the noise source. The high half is folded into the low
/// half, so seeds below 2^32 pass through unchanged.
fn noise_seed(seed: Option<u64>) -> u32 {
    let seed = resolve_seed(seed);
    (seed ^ (seed >> 32)) as u32
}

/// Evaluate `sample(col, row)` for every cell, one rayon task per row.
fn sample_field(dimensions: Dimensions, sample: impl Fn(f64, f64) -> f64 + Sync) -> HeightField {
    let mut field = HeightField::with_dimensions(dimensions);
    if dimensions.width > 0 {
        field
            .cells_mut()
            .par_chunks_mut(dimensions.width)
            .enumerate()
            .for_each(|(r, row)| {
                for (c, cell) in row.iter_mut().enumerate() {
                    *cell = sample(c as f64, r as f64);
                }
            });
    }
    field.recalculate_extrema();
    field
}

/// Single-octave open simplex noise remapped to `[0, 1]`.
///
/// The noise source may overshoot `[-1, 1]` slightly, so the result is clamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SimplexGenerator {
    pub dimensions: Dimensions,
    /// Sampling step per column (`x`) and per row (`y`).
    #[serde(default = "unit_scale")]
    pub scale: DVec2,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl SimplexGenerator {
    pub const TYPE_TAG: &'static str = "SimplexGenerator";

    pub fn new(dimensions: Dimensions, seed: Option<u64>) -> Self {
        Self {
            dimensions,
            scale: unit_scale(),
            seed,
        }
    }

    pub fn with_scale(mut self, scale: DVec2) -> Self {
        self.scale = scale;
        self
    }
}

impl Generator for SimplexGenerator {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    fn generate(&self) -> Result<HeightField> {
        let noise = OpenSimplex::new(noise_seed(self.seed));
        let scale = self.scale;
        Ok(sample_field(self.dimensions, |x, y| {
            ((noise.get([x * scale.x, y * scale.y]) + 1.0) / 2.0).clamp(0.0, 1.0)
        }))
    }

    fn to_payload(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Fractional Brownian motion over open simplex noise.
///
/// Each octave doubles the frequency and multiplies the amplitude by
/// `persistence`. The sum is divided by the total amplitude and remapped to
/// `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FbmSimplexGenerator {
    pub dimensions: Dimensions,
    pub iterations: u32,
    pub persistence: f64,
    #[serde(default = "unit_scale")]
    pub scale: DVec2,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl FbmSimplexGenerator {
    pub const TYPE_TAG: &'static str = "FbmSimplexGenerator";

    pub fn new(
        dimensions: Dimensions,
        iterations: u32,
        persistence: f64,
        scale: DVec2,
        seed: Option<u64>,
    ) -> Result<Self> {
        let generator = Self {
            dimensions,
            iterations,
            persistence,
            scale,
            seed,
        };
        generator.validate()?;
        Ok(generator)
    }

    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(Error::Precondition(
                "fbm noise needs at least one iteration".into(),
            ));
        }
        Ok(())
    }
}

impl Generator for FbmSimplexGenerator {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    fn generate(&self) -> Result<HeightField> {
        self.validate()?;
        let noise = OpenSimplex::new(noise_seed(self.seed));
        let iterations = self.iterations;
        let persistence = self.persistence;
        let scale = self.scale;

        Ok(sample_field(self.dimensions, |x, y| {
            let mut sum = 0.0;
            let mut total = 0.0;
            let mut amplitude = 1.0;
            let mut frequency = scale;
            for _ in 0..iterations {
                sum += noise.get([x * frequency.x, y * frequency.y]) * amplitude;
                total += amplitude;
                amplitude *= persistence;
                frequency *= 2.0;
            }
            ((sum / total) * 0.5 + 0.5).clamp(0.0, 1.0)
        }))
    }

    fn to_payload(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}
