//! Built-in blend modes.
use crate::blending::BlendMode;

/// `a + b`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddBlend;

impl AddBlend {
    pub const TYPE_TAG: &'static str = "AddBlend";
}

impl BlendMode for AddBlend {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn fallback(&self) -> f64 {
        0.0
    }

    fn combine(&self, a: f64, b: f64) -> f64 {
        a + b
    }
}

/// `a - b`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubtractBlend;

impl SubtractBlend {
    pub const TYPE_TAG: &'static str = "SubtractBlend";
}

impl BlendMode for SubtractBlend {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn fallback(&self) -> f64 {
        0.0
    }

    fn combine(&self, a: f64, b: f64) -> f64 {
        a - b
    }
}

/// `a * b`, with uncovered cells kept as they are.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MultiplyBlend;

impl MultiplyBlend {
    pub const TYPE_TAG: &'static str = "MultiplyBlend";
}

impl BlendMode for MultiplyBlend {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn fallback(&self) -> f64 {
        1.0
    }

    fn combine(&self, a: f64, b: f64) -> f64 {
        a * b
    }
}

/// `1 - (1 - a)(1 - b)`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScreenBlend;

impl ScreenBlend {
    pub const TYPE_TAG: &'static str = "ScreenBlend";
}

impl BlendMode for ScreenBlend {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn fallback(&self) -> f64 {
        1.0
    }

    fn combine(&self, a: f64, b: f64) -> f64 {
        1.0 - (1.0 - a) * (1.0 - b)
    }
}

/// `min(a, b)`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DarkenBlend;

impl DarkenBlend {
    pub const TYPE_TAG: &'static str = "DarkenBlend";
}

impl BlendMode for DarkenBlend {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn fallback(&self) -> f64 {
        1.0
    }

    fn combine(&self, a: f64, b: f64) -> f64 {
        a.min(b)
    }
}

/// `max(a, b)`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LightenBlend;

impl LightenBlend {
    pub const TYPE_TAG: &'static str = "LightenBlend";
}

impl BlendMode for LightenBlend {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn fallback(&self) -> f64 {
        0.0
    }

    fn combine(&self, a: f64, b: f64) -> f64 {
        a.max(b)
    }
}

/// Multiply below mid-grey, screen above it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayBlend;

impl OverlayBlend {
    pub const TYPE_TAG: &'static str = "OverlayBlend";
}

impl BlendMode for OverlayBlend {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn fallback(&self) -> f64 {
        0.0
    }

    fn combine(&self, a: f64, b: f64) -> f64 {
        if a < 0.5 {
            2.0 * a * b
        } else {
            1.0 - 2.0 * (1.0 - a) * (1.0 - b)
        }
    }
}

/// `|a - b|`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DifferenceBlend;

impl DifferenceBlend {
    pub const TYPE_TAG: &'static str = "DifferenceBlend";
}

impl BlendMode for DifferenceBlend {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn fallback(&self) -> f64 {
        0.0
    }

    fn combine(&self, a: f64, b: f64) -> f64 {
        (a - b).max(b - a)
    }
}

/// `a * b`, with uncovered cells masked out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaskBlend;

impl MaskBlend {
    pub const TYPE_TAG: &'static str = "MaskBlend";
}

impl BlendMode for MaskBlend {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn fallback(&self) -> f64 {
        0.0
    }

    fn combine(&self, a: f64, b: f64) -> f64 {
        a * b
    }
}
