//! Diamond-square fractal noise.
//!
//! The algorithm works on square grids with a side of `2^k + 1`. Requested
//! lengths are rounded up to the next such side and the result is cropped back.
//! Indexing wraps around and values written to the first row or column are
//! mirrored to the opposite edge, so the output tiles.
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::generators::{rand01, seeded_rng, Generator};
use crate::map::{Dimensions, Grid, HeightField};

/// The diamond-square algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiamondSquare {
    seed: Option<u64>,
}

impl DiamondSquare {
    pub fn new(seed: Option<u64>) -> Self {
        Self { seed }
    }

    /// Smallest `2^k + 1` side that can hold `length` cells (at least 2).
    pub fn side_for(length: usize) -> usize {
        (length.max(2) - 1).next_power_of_two() + 1
    }

    /// Generate a `length x length` grid from four random corners.
    pub fn generate(&self, length: usize, h: f64) -> Grid<f64> {
        let mut rng = seeded_rng(self.seed);
        let corners = [
            rand01(&mut rng),
            rand01(&mut rng),
            rand01(&mut rng),
            rand01(&mut rng),
        ];
        Self::from_corners(length, h, &corners, &mut rng)
    }

    /// Generate a `length x length` grid from caller-provided corners.
    ///
    /// `corners` is used cyclically in the order top-left, top-right,
    /// bottom-left, bottom-right and must hold at least one value.
    pub fn generate_with_corners(
        &self,
        length: usize,
        h: f64,
        corners: &[f64],
    ) -> Result<Grid<f64>> {
        if corners.is_empty() {
            return Err(Error::Precondition(
                "diamond-square needs at least one corner value".into(),
            ));
        }
        let mut rng = seeded_rng(self.seed);
        Ok(Self::from_corners(length, h, corners, &mut rng))
    }

    /// Continue from a square, pre-seeded grid.
    ///
    /// The seed is padded up to the next `2^k + 1` side and the first
    /// `seed_level` iterations are skipped, so the coarse structure of the
    /// seed survives. The padded grid is returned without cropping.
    pub fn generate_from_seed(
        &self,
        seed: &Grid<f64>,
        seed_level: usize,
        h: f64,
    ) -> Result<Grid<f64>> {
        if seed.height() != seed.width() {
            return Err(Error::Precondition(format!(
                "diamond-square needs a square seed, got {}x{}",
                seed.height(),
                seed.width()
            )));
        }
        let side = Self::side_for(seed.width());
        let mut map = Grid::resized_from(seed, side, side);
        let mut rng = seeded_rng(self.seed);
        subdivide(&mut map, h, seed_level, &mut rng);
        Ok(map)
    }

    fn from_corners(length: usize, h: f64, corners: &[f64], rng: &mut dyn RngCore) -> Grid<f64> {
        let side = Self::side_for(length);
        let last = side - 1;
        let n = corners.len();

        let mut map = Grid::new(side, side);
        let cells = map.cells_mut();
        cells[0] = corners[0];
        cells[last] = corners[1 % n];
        cells[last * side] = corners[2 % n];
        cells[last * side + last] = corners[3 % n];

        subdivide(&mut map, h, 0, rng);
        Grid::resized_from(&map, length, length)
    }
}

#[inline]
fn displacement(rng: &mut dyn RngCore, h: f64) -> f64 {
    rand01(rng) * 2.0 * h - h
}

fn subdivide(map: &mut Grid<f64>, mut h: f64, skip: usize, rng: &mut dyn RngCore) {
    let n = map.width();
    if n < 3 {
        return;
    }
    let last = n - 1;
    let at = |r: usize, c: usize| r * n + c;
    let cells = map.cells_mut();

    let mut side = last;
    let mut iteration = 0;
    while side > 1 {
        if iteration >= skip {
            let half = side / 2;

            // Diamond step: centre of every square.
            for r in (0..last).step_by(side) {
                for c in (0..last).step_by(side) {
                    let avg = (cells[at(r, c)]
                        + cells[at(r + side, c)]
                        + cells[at(r, c + side)]
                        + cells[at(r + side, c + side)])
                        / 4.0;
                    cells[at(r + half, c + half)] = (avg + displacement(rng, h)).clamp(-1.0, 1.0);
                }
            }

            // Square step: edge midpoints, wrapping around the borders.
            for r in (0..last).step_by(half) {
                let mut c = (r + half) % side;
                while c < last {
                    let avg = (cells[at((r + last - half) % last, c)]
                        + cells[at((r + half) % last, c)]
                        + cells[at(r, (c + half) % last)]
                        + cells[at(r, (c + last - half) % last)])
                        / 4.0;
                    let v = (avg + displacement(rng, h)).clamp(-1.0, 1.0);
                    cells[at(r, c)] = v;
                    if r == 0 {
                        cells[at(last, c)] = v;
                    }
                    if c == 0 {
                        cells[at(r, last)] = v;
                    }
                    c += side;
                }
            }
        }
        iteration += 1;
        side /= 2;
        h /= 2.0;
    }
}

fn default_randomness() -> f64 {
    2.0
}

/// Diamond-square noise over the longer side, cropped to the dimensions.
///
/// Values lie in `[-1, 1]` and are not normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiamondSquareGenerator {
    pub dimensions: Dimensions,
    #[serde(default = "default_randomness")]
    pub randomness: f64,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl DiamondSquareGenerator {
    pub const TYPE_TAG: &'static str = "DiamondSquareGenerator";

    pub fn new(dimensions: Dimensions, seed: Option<u64>) -> Self {
        Self {
            dimensions,
            randomness: default_randomness(),
            seed,
        }
    }

    pub fn with_randomness(mut self, randomness: f64) -> Self {
        self.randomness = randomness;
        self
    }
}

impl Generator for DiamondSquareGenerator {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    fn generate(&self) -> Result<HeightField> {
        let length = self.dimensions.max_side();
        let square = DiamondSquare::new(self.seed).generate(length, self.randomness);
        Ok(HeightField::from_grid(Grid::resized_from(
            &square,
            self.dimensions.height,
            self.dimensions.width,
        )))
    }

    fn to_payload(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_rounds_up_to_power_of_two_plus_one() {
        assert_eq!(DiamondSquare::side_for(0), 2);
        assert_eq!(DiamondSquare::side_for(2), 2);
        assert_eq!(DiamondSquare::side_for(3), 3);
        assert_eq!(DiamondSquare::side_for(5), 5);
        assert_eq!(DiamondSquare::side_for(6), 9);
        assert_eq!(DiamondSquare::side_for(101), 129);
    }

    #[test]
    fn same_seed_is_bit_identical() {
        let a = DiamondSquare::new(Some(5)).generate(33, 2.0);
        let b = DiamondSquare::new(Some(5)).generate(33, 2.0);
        assert_eq!(a, b);
    }

    #[test]
    fn corner_seed_is_retained_without_randomness() {
        let grid = DiamondSquare::new(Some(1))
            .generate_with_corners(5, 0.0, &[0.0, 1.0])
            .unwrap();
        // Clockwise from the top-left corner.
        assert_eq!(grid.get(0, 0).unwrap(), 0.0);
        assert_eq!(grid.get(0, 4).unwrap(), 1.0);
        assert_eq!(grid.get(4, 4).unwrap(), 1.0);
        assert_eq!(grid.get(4, 0).unwrap(), 0.0);
    }

    #[test]
    fn equal_corners_without_randomness_stay_flat() {
        let grid = DiamondSquare::new(None)
            .generate_with_corners(9, 0.0, &[0.5])
            .unwrap();
        assert!(grid.cells().iter().all(|v| (*v - 0.5).abs() < 1e-12));
    }

    #[test]
    fn empty_corner_seed_is_rejected() {
        let err = DiamondSquare::new(None)
            .generate_with_corners(5, 1.0, &[])
            .unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
    }

    #[test]
    fn values_stay_in_signed_unit_range() {
        let grid = DiamondSquare::new(Some(77)).generate(65, 8.0);
        assert!(grid.cells().iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn output_tiles_across_edges() {
        let grid = DiamondSquare::new(Some(3)).generate(17, 1.0);
        for i in 1..16 {
            assert_eq!(grid.get(0, i).unwrap(), grid.get(16, i).unwrap());
            assert_eq!(grid.get(i, 0).unwrap(), grid.get(i, 16).unwrap());
        }
    }

    #[test]
    fn generate_from_seed_rejects_non_square_seed() {
        let seed: Grid<f64> = Grid::new(3, 5);
        let err = DiamondSquare::new(None)
            .generate_from_seed(&seed, 0, 1.0)
            .unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
    }

    #[test]
    fn generate_from_seed_skips_leading_iterations() {
        let seed = Grid::from_rows(vec![
            vec![0.1, 0.2, 0.3],
            vec![0.4, 0.5, 0.6],
            vec![0.7, 0.8, 0.9],
        ])
        .unwrap();
        let kept = DiamondSquare::new(Some(1))
            .generate_from_seed(&seed, 1, 1.0)
            .unwrap();
        assert_eq!(kept, seed);

        let refined = DiamondSquare::new(Some(1))
            .generate_from_seed(&seed, 0, 1.0)
            .unwrap();
        assert_eq!(refined.get(0, 0).unwrap(), 0.1);
        assert_ne!(refined, seed);
    }

    #[test]
    fn generate_from_seed_pads_to_valid_side() {
        let seed: Grid<f64> = Grid::new(4, 4);
        let grid = DiamondSquare::new(Some(2))
            .generate_from_seed(&seed, 0, 0.5)
            .unwrap();
        assert_eq!(grid.dimensions(), Dimensions::square(5));
    }

    #[test]
    fn generator_crops_to_requested_dimensions() {
        let field = DiamondSquareGenerator::new(Dimensions::new(5, 12), Some(8))
            .generate()
            .unwrap();
        assert_eq!(field.dimensions(), Dimensions::new(5, 12));
        assert!(field.min_value() >= -1.0);
        assert!(field.max_value() <= 1.0);
    }

    #[test]
    fn randomness_defaults_when_missing_from_payload() {
        let g: DiamondSquareGenerator = serde_json::from_value(serde_json::json!({
            "Dimensions": { "Height": 4, "Width": 4 },
            "Seed": 3
        }))
        .unwrap();
        assert_eq!(g.randomness, 2.0);
        assert_eq!(g.seed, Some(3));
    }
}
