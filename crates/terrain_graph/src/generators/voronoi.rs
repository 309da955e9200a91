//! Voronoi (cellular) distance noise.
use std::collections::HashSet;

use rand::RngCore;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::generators::{rand_below, seeded_rng, Generator};
use crate::map::{Dimensions, HeightField};

fn default_exponent() -> f64 {
    1.0
}

/// Distance to the nearest of a set of random lattice points, normalized to `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VoronoiGenerator {
    pub dimensions: Dimensions,
    pub point_count: usize,
    #[serde(default = "default_exponent")]
    pub exponent: f64,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl VoronoiGenerator {
    pub const TYPE_TAG: &'static str = "VoronoiGenerator";

    /// One point per cell of the longer side, linear distance.
    pub fn new(dimensions: Dimensions, seed: Option<u64>) -> Self {
        Self {
            dimensions,
            point_count: dimensions.max_side(),
            exponent: default_exponent(),
            seed,
        }
    }

    pub fn with_point_count(mut self, point_count: usize) -> Self {
        self.point_count = point_count;
        self
    }

    pub fn with_exponent(mut self, exponent: f64) -> Self {
        self.exponent = exponent;
        self
    }

    /// Checks the point count and that the distance exponent is finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        if self.point_count == 0 {
            return Err(Error::Precondition(
                "voronoi noise needs at least one point".into(),
            ));
        }
        if !(self.exponent.is_finite() && self.exponent >= 0.0) {
            return Err(Error::Precondition(format!(
                "voronoi exponent must be finite and non-negative, got {}",
                self.exponent
            )));
        }
        Ok(())
    }
}

/// Pick `count` distinct flat indices in `0..area`.
fn distinct_points(area: usize, count: usize, rng: &mut dyn RngCore) -> Vec<usize> {
    let count = count.min(area);
    if count * 2 >= area {
        // Dense: partial Fisher-Yates over every index.
        let mut all: Vec<usize> = (0..area).collect();
        for i in 0..count {
            let j = i + rand_below(rng, area - i);
            all.swap(i, j);
        }
        all.truncate(count);
        return all;
    }

    let mut seen = HashSet::with_capacity(count);
    let mut points = Vec::with_capacity(count);
    while points.len() < count {
        let p = rand_below(rng, area);
        if seen.insert(p) {
            points.push(p);
        }
    }
    points
}

impl Generator for VoronoiGenerator {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    fn generate(&self) -> Result<HeightField> {
        let Dimensions { height, width } = self.dimensions;
        let mut field = HeightField::with_dimensions(self.dimensions);
        if field.cells().is_empty() {
            return Ok(field);
        }
        self.validate()?;

        let mut rng = seeded_rng(self.seed);
        let points: Vec<(i64, i64)> = distinct_points(height * width, self.point_count, &mut rng)
            .into_iter()
            .map(|i| ((i / width) as i64, (i % width) as i64))
            .collect();

        let exponent = self.exponent;
        field
            .cells_mut()
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(r, row)| {
                let r = r as i64;
                for (c, cell) in row.iter_mut().enumerate() {
                    let c = c as i64;
                    let nearest = points
                        .iter()
                        .map(|&(pr, pc)| (pr - r).pow(2) + (pc - c).pow(2))
                        .min()
                        .unwrap_or_default();
                    *cell = (nearest as f64).sqrt().powf(exponent);
                }
            });

        field.recalculate_extrema();
        field.normalize();
        Ok(field)
    }

    fn to_payload(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}
