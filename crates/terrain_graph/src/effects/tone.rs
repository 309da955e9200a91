//! Per-cell tone adjustments.
use serde::{Deserialize, Serialize};

use crate::effects::{map_cells, Effect};
use crate::error::{Error, Result};
use crate::map::HeightField;

/// Adds a constant to every cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BrightnessEffect {
    pub brightness: f64,
}

impl BrightnessEffect {
    pub const TYPE_TAG: &'static str = "BrightnessEffect";

    pub fn new(brightness: f64) -> Self {
        Self { brightness }
    }
}

impl Effect for BrightnessEffect {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn calculate(&self, field: &HeightField) -> HeightField {
        map_cells(field, |v| v + self.brightness)
    }

    fn to_payload(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Stretches values away from (or towards) mid-grey.
///
/// `contrast` is on the classic 8-bit scale, roughly `-255..=255`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContrastEffect {
    pub contrast: f64,
}

impl ContrastEffect {
    pub const TYPE_TAG: &'static str = "ContrastEffect";

    pub fn new(contrast: f64) -> Self {
        Self { contrast }
    }

    /// Slope applied around 0.5.
    pub fn factor(&self) -> f64 {
        (259.0 * (self.contrast + 255.0)) / (255.0 * (259.0 - self.contrast))
    }
}

impl Effect for ContrastEffect {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn calculate(&self, field: &HeightField) -> HeightField {
        let factor = self.factor();
        map_cells(field, |v| factor * (v - 0.5) + 0.5)
    }

    fn to_payload(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GammaParams {
    gamma: f64,
}

/// Raises every cell to `1 / gamma`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", try_from = "GammaParams")]
pub struct GammaEffect {
    gamma: f64,
}

impl GammaEffect {
    pub const TYPE_TAG: &'static str = "GammaEffect";

    /// `gamma` must be finite and strictly positive.
    pub fn new(gamma: f64) -> Result<Self> {
        if !(gamma.is_finite() && gamma > 0.0) {
            return Err(Error::Precondition(format!(
                "gamma must be a positive number, got {gamma}"
            )));
        }
        Ok(Self { gamma })
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }
}

impl TryFrom<GammaParams> for GammaEffect {
    type Error = Error;

    fn try_from(params: GammaParams) -> Result<Self> {
        Self::new(params.gamma)
    }
}

impl Effect for GammaEffect {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn calculate(&self, field: &HeightField) -> HeightField {
        let correction = 1.0 / self.gamma;
        map_cells(field, |v| v.powf(correction))
    }

    fn to_payload(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Multiplies every cell by a constant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IntensityEffect {
    pub intensity: f64,
}

impl IntensityEffect {
    pub const TYPE_TAG: &'static str = "IntensityEffect";

    pub fn new(intensity: f64) -> Self {
        Self { intensity }
    }
}

impl Effect for IntensityEffect {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn calculate(&self, field: &HeightField) -> HeightField {
        map_cells(field, |v| v * self.intensity)
    }

    fn to_payload(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// `1 - v`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvertEffect;

impl InvertEffect {
    pub const TYPE_TAG: &'static str = "InvertEffect";
}

impl Effect for InvertEffect {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn calculate(&self, field: &HeightField) -> HeightField {
        map_cells(field, |v| 1.0 - v)
    }

    fn to_payload(&self) -> Result<serde_json::Value> {
        Ok(serde_json::Value::Object(serde_json::Map::new()))
    }
}
