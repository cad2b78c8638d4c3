//! Criterion pipelines and weighted overlay
//!
//! - Criterion: one named layer taken from raw values to rescaled scores
//! - Weighted: weighted sum of criteria into a composite suitability surface

mod criterion;
mod weighted;

pub use criterion::{CriterionLayer, RescaledLayer, TransformPreview, TransformedLayer};
pub use weighted::{
    weighted_overlay, CompositeSurface, OverlayConfig, OverlayParams, SuitabilityModel,
    WeightMethod, WeightedOverlay,
};
