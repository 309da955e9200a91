//! Generators produce a [`HeightField`] from nothing but their parameters.
//!
//! Every generator is a pure function of its dimensions, parameters and seed.
//! A missing seed (`None`) draws a fresh one from a single process-wide source
//! at generation time.
use std::fmt;
use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::error::Result;
use crate::map::{Dimensions, HeightField};

pub mod diamond_square;
pub mod flat;
pub mod shape;
pub mod simplex;
pub mod voronoi;
pub mod white_noise;

pub use diamond_square::{DiamondSquare, DiamondSquareGenerator};
pub use flat::FlatGenerator;
pub use shape::{PyramidGenerator, RectangleGenerator};
pub use simplex::{FbmSimplexGenerator, SimplexGenerator};
pub use voronoi::VoronoiGenerator;
pub use white_noise::WhiteNoiseGenerator;

/// A source node: produces a height field without inputs.
pub trait Generator: Send + Sync + fmt::Debug {
    /// Tag written next to the persisted parameters.
    fn type_tag(&self) -> &'static str;

    /// Size of the produced field.
    fn dimensions(&self) -> Dimensions;

    /// Produce a new field.
    fn generate(&self) -> Result<HeightField>;

    /// Persisted parameters.
    fn to_payload(&self) -> Result<serde_json::Value>;
}

fn default_source() -> &'static Mutex<StdRng> {
    static SOURCE: OnceLock<Mutex<StdRng>> = OnceLock::new();
    SOURCE.get_or_init(|| {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        Mutex::new(StdRng::seed_from_u64(nanos))
    })
}

/// Resolve an optional seed, drawing from the process-wide source when absent.
pub fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| {
        default_source()
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .next_u64()
    })
}

/// Deterministic generator for a resolved seed.
pub(crate) fn seeded_rng(seed: Option<u64>) -> StdRng {
    StdRng::seed_from_u64(resolve_seed(seed))
}

/// Generate a random float in the range [0, 1).
#[inline]
pub(crate) fn rand01(rng: &mut dyn RngCore) -> f64 {
    (rng.next_u64() >> 11) as f64 / (1u64 << 53) as f64
}

/// Generate a random index in `0..bound`. `bound` must be non-zero.
#[inline]
pub(crate) fn rand_below(rng: &mut dyn RngCore, bound: usize) -> usize {
    ((rand01(rng) * bound as f64) as usize).min(bound - 1)
}
