//! Criterion layers
//!
//! A criterion moves through three typed stages:
//!
//! ```text
//! LayerSample --transform--> TransformedLayer --rescale--> RescaledLayer
//! ```
//!
//! Each stage owns its raster and sample curve, so a stage can only be
//! reached from the one before it.

use serde::Serialize;
use suitgis_core::raster::Raster;
use suitgis_core::{Error, Result};
use tracing::debug;

use crate::membership::{resolve, Rescaler, ResolvedTransform, TransformationSpec};
use crate::statistics::{histogram, Histogram, LayerSample, LayerStatistics, SampleCurve};

/// Layer after the membership transform, before rescaling
#[derive(Debug, Clone)]
pub struct TransformedLayer {
    resolved: ResolvedTransform,
    raster: Raster<f64>,
    curve: SampleCurve,
}

impl TransformedLayer {
    /// Resolve `spec` against the sample's statistics and apply it
    pub fn from_sample(sample: &LayerSample, spec: &TransformationSpec) -> Result<Self> {
        let resolved = resolve(spec, sample.statistics())?;
        let (raster, curve) = resolved.apply(sample.raster(), sample.curve())?;
        Ok(Self {
            resolved,
            raster,
            curve,
        })
    }

    pub fn resolved(&self) -> &ResolvedTransform {
        &self.resolved
    }

    pub fn raster(&self) -> &Raster<f64> {
        &self.raster
    }

    pub fn curve(&self) -> &SampleCurve {
        &self.curve
    }

    /// Fit the rescale on this layer's finite cells and apply it to the
    /// raster and curve alike
    pub fn rescale(self) -> Result<RescaledLayer> {
        let rescaler = Rescaler::fit(&self.raster, self.resolved.scale)?;
        let raster = rescaler.rescale_raster(&self.raster)?;
        let curve = rescaler.rescale_curve(&self.curve);
        Ok(RescaledLayer {
            resolved: self.resolved,
            raster,
            curve,
            rescaler,
        })
    }
}

/// Final stage of a criterion: scores on the target scale
#[derive(Debug, Clone)]
pub struct RescaledLayer {
    resolved: ResolvedTransform,
    raster: Raster<f64>,
    curve: SampleCurve,
    rescaler: Rescaler,
}

impl RescaledLayer {
    pub fn resolved(&self) -> &ResolvedTransform {
        &self.resolved
    }

    pub fn raster(&self) -> &Raster<f64> {
        &self.raster
    }

    pub fn curve(&self) -> &SampleCurve {
        &self.curve
    }

    pub fn rescaler(&self) -> &Rescaler {
        &self.rescaler
    }

    pub fn into_raster(self) -> Raster<f64> {
        self.raster
    }
}

/// Data behind a transform plot: the source histogram and the `(x, y)`
/// points of the sample curve
#[derive(Debug, Clone, Serialize)]
pub struct TransformPreview {
    pub histogram: Histogram,
    pub curve: Vec<(f64, f64)>,
}

/// A named input layer and, once transformed, its scores
#[derive(Debug, Clone)]
pub struct CriterionLayer {
    name: String,
    sample: LayerSample,
    output: Option<RescaledLayer>,
}

impl CriterionLayer {
    /// Sample `raster` as a new criterion.
    ///
    /// Fails with [`Error::EmptyLayer`] when it has no finite cell.
    pub fn new(name: impl Into<String>, raster: Raster<f64>) -> Result<Self> {
        Ok(Self::from_sample(name, LayerSample::new(raster)?))
    }

    pub fn from_sample(name: impl Into<String>, sample: LayerSample) -> Self {
        Self {
            name: name.into(),
            sample,
            output: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sample(&self) -> &LayerSample {
        &self.sample
    }

    pub fn statistics(&self) -> &LayerStatistics {
        self.sample.statistics()
    }

    /// Result of the last successful [`transform`](Self::transform)
    pub fn output(&self) -> Option<&RescaledLayer> {
        self.output.as_ref()
    }

    pub fn is_transformed(&self) -> bool {
        self.output.is_some()
    }

    /// Transform and rescale this criterion, replacing any previous output.
    ///
    /// A failed transform leaves the criterion untransformed.
    pub fn transform(&mut self, spec: &TransformationSpec) -> Result<&RescaledLayer> {
        self.output = None;
        let rescaled = TransformedLayer::from_sample(&self.sample, spec)?.rescale()?;
        let (t_min, t_max) = rescaled.rescaler().source_bounds();
        debug!(
            criterion = %self.name,
            kind = %rescaled.resolved().kind(),
            t_min,
            t_max,
            "criterion transformed"
        );
        Ok(self.output.insert(rescaled))
    }

    /// Spec with every derived parameter written out, if transformed
    pub fn resolved_spec(&self) -> Option<TransformationSpec> {
        self.output.as_ref().map(|o| o.resolved().to_spec())
    }

    /// Source histogram plus the current sample curve: the identity curve
    /// before transforming, the rescaled curve after.
    pub fn preview(&self, n_bins: usize) -> Result<TransformPreview> {
        let curve = match &self.output {
            Some(out) => out.curve().points(),
            None => self.sample.curve().points(),
        };
        Ok(TransformPreview {
            histogram: histogram(self.sample.values(), n_bins)?,
            curve,
        })
    }

    /// Histogram of the rescaled scores
    pub fn transformed_histogram(&self, n_bins: usize) -> Result<Histogram> {
        let out = self.output.as_ref().ok_or_else(|| {
            Error::config(format!("criterion '{}' has not been transformed", self.name))
        })?;
        histogram(&out.raster().finite_values(), n_bins)
    }
}
