#![forbid(unsafe_code)]
//! terrain_graph: height-field synthesis with a memoized, parallel node graph.
//!
//! Modules:
//! - map: dense grids and height fields (extrema tracking, normalization, greyscale output)
//! - generators: flat, white noise, diamond-square, voronoi, simplex / fbm, pyramid, rectangle
//! - blending: per-cell blend modes folded over several fields
//! - effects: tone adjustments and a separable gaussian blur
//! - graph: node arena, wave scheduling and evaluation on a worker pool
//! - serialization: typed-envelope JSON documents for a node subgraph
//!
//! For examples and docs, see README and docs.rs.
pub mod blending;
pub mod effects;
pub mod error;
pub mod generators;
pub mod graph;
pub mod map;
pub mod serialization;

/// Convenient re-exports for common types. Import with `use terrain_graph::prelude::*;`.
pub mod prelude {
    pub use crate::blending::{
        AddBlend, BlendMode, DarkenBlend, DifferenceBlend, LightenBlend, MaskBlend,
        MultiplyBlend, OverlayBlend, ScreenBlend, SubtractBlend,
    };
    pub use crate::effects::{
        BrightnessEffect, ContrastEffect, Effect, GammaEffect, GaussianBlurEffect,
        IntensityEffect, InvertEffect,
    };
    pub use crate::error::{Error, Result};
    pub use crate::generators::{
        DiamondSquare, DiamondSquareGenerator, FbmSimplexGenerator, FlatGenerator, Generator,
        PyramidGenerator, RectangleGenerator, SimplexGenerator, VoronoiGenerator,
        WhiteNoiseGenerator,
    };
    pub use crate::graph::{ExecutionConfig, ExecutionStatus, NodeGraph, NodeId, NodeKind};
    pub use crate::map::{Dimensions, Grid, HeightField};
    pub use crate::serialization::{DocumentFormat, GraphRoot, GraphSerializer, TypeRegistry};
}
