//! # SuitGis Algorithms
//!
//! Suitability modelling for raster layers.
//!
//! ## Algorithm Categories
//!
//! - **statistics**: layer statistics, 100-point sample curves, histograms
//! - **membership**: fuzzy membership kernels, discrete remaps, rescaling
//! - **overlay**: criterion pipelines and the weighted-overlay model

mod cellwise;
mod maybe_rayon;

pub mod membership;
pub mod overlay;
pub mod statistics;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::membership::{
        resolve, FuzzyMembership, Kernel, KernelParams, Remap, ResolvedKernel,
        ResolvedTransform, ScaleRange, TransformKind, TransformationSpec,
    };
    pub use crate::overlay::{
        weighted_overlay, CompositeSurface, CriterionLayer, OverlayConfig, RescaledLayer,
        SuitabilityModel, TransformPreview, TransformedLayer, WeightMethod, WeightedOverlay,
    };
    pub use crate::statistics::{
        histogram, Histogram, LayerSample, LayerStatistics, SampleCurve, SAMPLE_POINTS,
    };
    pub use suitgis_core::prelude::*;
}
