//! Rescaling of transformed layers onto a target range
//!
//! The affine map is fitted on the transformed raster's own finite min/max
//! and then applied, unchanged, to both the raster and its sample curve.

use serde::{Deserialize, Serialize};
use suitgis_core::raster::Raster;
use suitgis_core::{Error, Result};
use tracing::debug;

use crate::cellwise::map_cells;
use crate::statistics::{LayerStatistics, SampleCurve};

/// Target range `[from, to]` of a rescale. `from > to` flips the scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleRange {
    #[serde(rename = "fromScale")]
    pub from: f64,
    #[serde(rename = "toScale")]
    pub to: f64,
}

impl ScaleRange {
    pub fn new(from: f64, to: f64) -> Self {
        Self { from, to }
    }

    /// `to - from`
    pub fn span(&self) -> f64 {
        self.to - self.from
    }
}

impl Default for ScaleRange {
    fn default() -> Self {
        Self::new(1.0, 10.0)
    }
}

/// Affine map from a transformed distribution's `[t_min, t_max]` onto a
/// [`ScaleRange`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rescaler {
    t_min: f64,
    t_max: f64,
    scale: ScaleRange,
}

impl Rescaler {
    /// Fit on the finite cells of `transformed`.
    ///
    /// Fails with [`Error::EmptyLayer`] when no cell survived the transform
    /// and with [`Error::DegenerateRange`] when every cell has the same value.
    pub fn fit(transformed: &Raster<f64>, scale: ScaleRange) -> Result<Self> {
        let stats = LayerStatistics::from_raster(transformed)?;
        Self::from_bounds(stats.min, stats.max, scale)
    }

    /// Build from explicit bounds
    pub fn from_bounds(t_min: f64, t_max: f64, scale: ScaleRange) -> Result<Self> {
        if t_max == t_min {
            return Err(Error::DegenerateRange {
                what: "rescale of a constant transformed layer",
                value: t_min,
            });
        }
        Ok(Self { t_min, t_max, scale })
    }

    /// `[t_min, t_max]` the map was fitted on
    pub fn source_bounds(&self) -> (f64, f64) {
        (self.t_min, self.t_max)
    }

    pub fn scale(&self) -> ScaleRange {
        self.scale
    }

    /// `(v - t_min) / (t_max - t_min) * (to - from) + from`
    pub fn apply(&self, v: f64) -> f64 {
        (v - self.t_min) / (self.t_max - self.t_min) * self.scale.span() + self.scale.from
    }

    pub fn rescale_raster(&self, raster: &Raster<f64>) -> Result<Raster<f64>> {
        map_cells(raster, |v| self.apply(v))
    }

    pub fn rescale_curve(&self, curve: &SampleCurve) -> SampleCurve {
        curve.map_outputs(|y| self.apply(y))
    }
}

/// Rescale a transformed raster and its curve with one shared affine map
pub fn rescale(
    raster: &Raster<f64>,
    curve: &SampleCurve,
    scale: ScaleRange,
) -> Result<(Raster<f64>, SampleCurve, Rescaler)> {
    let rescaler = Rescaler::fit(raster, scale)?;
    debug!(
        t_min = rescaler.t_min,
        t_max = rescaler.t_max,
        from = scale.from,
        to = scale.to,
        "rescaling transformed layer"
    );
    let scaled = rescaler.rescale_raster(raster)?;
    Ok((scaled, rescaler.rescale_curve(curve), rescaler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rescale_hits_target_bounds() {
        let raster = Raster::from_vec(vec![0.2, 0.5, f64::NAN, 0.8], 2, 2).unwrap();
        let curve = SampleCurve::spanning(0.2, 0.8);
        let (scaled, scaled_curve, rescaler) =
            rescale(&raster, &curve, ScaleRange::new(1.0, 10.0)).unwrap();

        assert_relative_eq!(scaled.get(0, 0).unwrap(), 1.0);
        assert_relative_eq!(scaled.get(0, 1).unwrap(), 5.5, epsilon = 1e-12);
        assert!(scaled.get(1, 0).unwrap().is_nan());
        assert_relative_eq!(scaled.get(1, 1).unwrap(), 10.0, epsilon = 1e-12);

        assert_eq!(rescaler.source_bounds(), (0.2, 0.8));
        assert_relative_eq!(scaled_curve.outputs()[0], 1.0);
        assert_relative_eq!(scaled_curve.outputs()[99], 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_curve_uses_grid_bounds() {
        // The curve spans a wider range than the grid, so it overshoots
        // the target scale instead of being stretched on its own.
        let raster = Raster::from_vec(vec![1.0, 2.0], 1, 2).unwrap();
        let curve = SampleCurve::spanning(0.0, 3.0);
        let (_, scaled_curve, _) = rescale(&raster, &curve, ScaleRange::new(0.0, 1.0)).unwrap();
        assert_relative_eq!(scaled_curve.outputs()[0], -1.0);
        assert_relative_eq!(scaled_curve.outputs()[99], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_inverted_scale() {
        let rescaler = Rescaler::from_bounds(0.0, 4.0, ScaleRange::new(10.0, 1.0)).unwrap();
        assert_relative_eq!(rescaler.apply(0.0), 10.0);
        assert_relative_eq!(rescaler.apply(4.0), 1.0);
        assert_relative_eq!(rescaler.apply(2.0), 5.5);
    }

    #[test]
    fn test_constant_layer_is_degenerate() {
        let raster = Raster::filled(3, 3, 0.5);
        let err = Rescaler::fit(&raster, ScaleRange::default()).unwrap_err();
        assert!(matches!(err, Error::DegenerateRange { .. }));
    }

    #[test]
    fn test_all_nodata_is_empty() {
        let raster = Raster::filled(2, 2, f64::NAN);
        let err = Rescaler::fit(&raster, ScaleRange::default()).unwrap_err();
        assert!(matches!(err, Error::EmptyLayer));
    }
}
