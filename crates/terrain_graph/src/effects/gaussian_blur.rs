//! Separable gaussian blur.
//!
//! The kernel is applied horizontally, then vertically. Samples outside the
//! field are clamped to the nearest edge cell.
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::effects::Effect;
use crate::error::{Error, Result};
use crate::map::HeightField;

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct BlurParams {
    deviation: f64,
    #[serde(default)]
    radius: Option<usize>,
}

/// Gaussian blur with standard deviation `deviation`.
///
/// `radius` is the kernel width in cells; when absent it is derived from the
/// deviation as `ceil(3 * deviation) * 2 + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", try_from = "BlurParams")]
pub struct GaussianBlurEffect {
    deviation: f64,
    radius: Option<usize>,
}

impl GaussianBlurEffect {
    pub const TYPE_TAG: &'static str = "GaussianBlurEffect";

    /// Widest kernel accepted, whether given or derived from the deviation.
    pub const MAX_KERNEL_WIDTH: usize = 4097;

    pub fn new(deviation: f64, radius: Option<usize>) -> Result<Self> {
        // The squared deviation divides every exponent, so it must stay normal.
        if !(deviation.is_finite() && deviation > 0.0 && (deviation * deviation).is_normal()) {
            return Err(Error::Precondition(format!(
                "blur deviation must be a positive number, got {deviation}"
            )));
        }
        match radius {
            Some(0) => return Err(Error::Precondition("blur radius must be non-zero".into())),
            Some(r) if r > Self::MAX_KERNEL_WIDTH => {
                return Err(Error::Precondition(format!(
                    "blur radius {r} exceeds {}",
                    Self::MAX_KERNEL_WIDTH
                )));
            }
            Some(_) => {}
            None => {
                if (deviation * 3.0).ceil() > (Self::MAX_KERNEL_WIDTH / 2) as f64 {
                    return Err(Error::Precondition(format!(
                        "blur deviation {deviation} needs a kernel wider than {}",
                        Self::MAX_KERNEL_WIDTH
                    )));
                }
            }
        }
        Ok(Self { deviation, radius })
    }

    pub fn deviation(&self) -> f64 {
        self.deviation
    }

    pub fn radius(&self) -> Option<usize> {
        self.radius
    }

    /// Number of kernel taps.
    pub fn kernel_width(&self) -> usize {
        self.radius
            .unwrap_or_else(|| (self.deviation * 3.0).ceil() as usize * 2 + 1)
    }

    /// Normalized kernel weights, centred on `kernel_width() / 2`.
    pub fn kernel(&self) -> Vec<f64> {
        let width = self.kernel_width();
        let half = (width / 2) as f64;
        let sigma = self.deviation;
        let scale = 1.0 / ((2.0 * std::f64::consts::PI).sqrt() * sigma);

        let mut kernel: Vec<f64> = (0..width)
            .map(|i| {
                let d = i as f64 - half;
                scale * (-(d * d) / (2.0 * sigma * sigma)).exp()
            })
            .collect();
        let sum: f64 = kernel.iter().sum();
        for w in &mut kernel {
            *w /= sum;
        }
        kernel
    }
}

impl TryFrom<BlurParams> for GaussianBlurEffect {
    type Error = Error;

    fn try_from(params: BlurParams) -> Result<Self> {
        Self::new(params.deviation, params.radius)
    }
}

#[inline]
fn clamp_offset(center: usize, tap: usize, half: usize, len: usize) -> usize {
    (center + tap).saturating_sub(half).min(len - 1)
}

fn horizontal_pass(source: &[f64], width: usize, kernel: &[f64]) -> Vec<f64> {
    let half = kernel.len() / 2;
    let mut out = vec![0.0; source.len()];
    out.par_chunks_mut(width)
        .zip(source.par_chunks(width))
        .for_each(|(dst, src)| {
            for (c, cell) in dst.iter_mut().enumerate() {
                *cell = kernel
                    .iter()
                    .enumerate()
                    .map(|(i, w)| src[clamp_offset(c, i, half, width)] * w)
                    .sum();
            }
        });
    out
}

fn vertical_pass(source: &[f64], width: usize, height: usize, kernel: &[f64]) -> Vec<f64> {
    let half = kernel.len() / 2;
    let mut out = vec![0.0; source.len()];
    out.par_chunks_mut(width)
        .enumerate()
        .for_each(|(r, dst)| {
            for (c, cell) in dst.iter_mut().enumerate() {
                *cell = kernel
                    .iter()
                    .enumerate()
                    .map(|(i, w)| source[clamp_offset(r, i, half, height) * width + c] * w)
                    .sum();
            }
        });
    out
}

impl Effect for GaussianBlurEffect {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn calculate(&self, field: &HeightField) -> HeightField {
        let (height, width) = (field.height(), field.width());
        if field.cells().is_empty() {
            return field.clone();
        }
        let kernel = self.kernel();
        let blurred_rows = horizontal_pass(field.cells(), width, &kernel);
        let blurred = vertical_pass(&blurred_rows, width, height, &kernel);

        let mut out = HeightField::new(height, width);
        out.cells_mut().copy_from_slice(&blurred);
        out.recalculate_extrema();
        out
    }

    fn to_payload(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}
