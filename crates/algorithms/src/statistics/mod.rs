//! Statistics over raster layers
//!
//! - **layer**: finite-value statistics, the 100-point sample curve and the
//!   [`LayerSample`] that bundles them with the source raster
//! - **histogram**: equal-width binning of value sequences for reporting

mod histogram;
mod layer;

pub use histogram::{histogram, Histogram};
pub use layer::{LayerSample, LayerStatistics, SampleCurve, SAMPLE_POINTS};
