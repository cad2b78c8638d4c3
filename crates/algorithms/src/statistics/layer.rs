//! Layer statistics and sample curves
//!
//! Every criterion starts here: one reduction pass over the source raster
//! yields [`LayerStatistics`], which drive kernel default parameters, and a
//! [`SampleCurve`] spanning `[min, max]` that previews the kernel shape
//! without touching the full grid.

use serde::{Deserialize, Serialize};
use suitgis_core::raster::Raster;
use suitgis_core::{Error, Result};

/// Number of points in a [`SampleCurve`]
pub const SAMPLE_POINTS: usize = 100;

/// Statistics over the finite cells of a layer.
///
/// `min <= mean <= max` and `std_dev >= 0` always hold. The standard
/// deviation is the population form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerStatistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
    /// Number of finite cells
    pub count: usize,
}

impl LayerStatistics {
    /// Compute statistics over the finite cells of `raster`.
    ///
    /// Fails with [`Error::EmptyLayer`] when no cell is finite.
    pub fn from_raster(raster: &Raster<f64>) -> Result<Self> {
        let stats = raster.statistics();
        match (stats.min, stats.max, stats.mean, stats.std_dev) {
            (Some(min), Some(max), Some(mean), Some(std_dev)) => Ok(Self {
                min,
                max,
                mean,
                std_dev,
                count: stats.valid_count,
            }),
            _ => Err(Error::EmptyLayer),
        }
    }

    /// Same as [`from_raster`](Self::from_raster) over a plain slice.
    /// Non-finite entries are skipped.
    pub fn from_values(values: &[f64]) -> Result<Self> {
        let (mut min, mut max, mut sum, mut count) = (f64::INFINITY, f64::NEG_INFINITY, 0.0, 0usize);
        for &v in values.iter().filter(|v| v.is_finite()) {
            min = min.min(v);
            max = max.max(v);
            sum += v;
            count += 1;
        }
        if count == 0 {
            return Err(Error::EmptyLayer);
        }

        let mean = (sum / count as f64).clamp(min, max);
        let var = values
            .iter()
            .filter(|v| v.is_finite())
            .map(|&v| (v - mean).powi(2))
            .sum::<f64>()
            / count as f64;

        Ok(Self {
            min,
            max,
            mean,
            std_dev: var.sqrt(),
            count,
        })
    }

    /// `max - min`
    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    /// `(max + min) / 2`
    pub fn midpoint(&self) -> f64 {
        (self.max + self.min) / 2.0
    }
}

/// [`SAMPLE_POINTS`] evenly spaced `(input, output)` pairs over a layer's
/// value range.
///
/// Inputs are `min + i * (max - min) / 99`. Outputs start equal to the
/// inputs and are replaced by the kernel and rescale passes, so the curve
/// always shows exactly what was done to the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleCurve {
    inputs: Vec<f64>,
    outputs: Vec<f64>,
}

impl SampleCurve {
    /// Identity curve over `[min, max]`. A constant layer yields
    /// [`SAMPLE_POINTS`] identical points.
    pub fn spanning(min: f64, max: f64) -> Self {
        let step = (max - min) / (SAMPLE_POINTS - 1) as f64;
        let inputs: Vec<f64> = (0..SAMPLE_POINTS).map(|i| min + i as f64 * step).collect();
        Self {
            outputs: inputs.clone(),
            inputs,
        }
    }

    pub fn inputs(&self) -> &[f64] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[f64] {
        &self.outputs
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// `(input, output)` pairs in input order
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.inputs
            .iter()
            .copied()
            .zip(self.outputs.iter().copied())
            .collect()
    }

    /// New curve whose outputs are `f(input)`
    pub(crate) fn from_inputs<F: Fn(f64) -> f64>(&self, f: F) -> Self {
        Self {
            inputs: self.inputs.clone(),
            outputs: self.inputs.iter().map(|&x| f(x)).collect(),
        }
    }

    /// New curve whose outputs are `f(output)`
    pub(crate) fn map_outputs<F: Fn(f64) -> f64>(&self, f: F) -> Self {
        Self {
            inputs: self.inputs.clone(),
            outputs: self.outputs.iter().map(|&y| f(y)).collect(),
        }
    }
}

/// A source layer with its finite values, statistics and identity sample
/// curve: the first stage of the criterion pipeline.
#[derive(Debug, Clone)]
pub struct LayerSample {
    raster: Raster<f64>,
    values: Vec<f64>,
    statistics: LayerStatistics,
    curve: SampleCurve,
}

impl LayerSample {
    /// Fails with [`Error::EmptyLayer`] when the raster has no finite cell
    pub fn new(raster: Raster<f64>) -> Result<Self> {
        let values = raster.finite_values();
        let statistics = LayerStatistics::from_values(&values)?;
        let curve = SampleCurve::spanning(statistics.min, statistics.max);
        Ok(Self {
            raster,
            values,
            statistics,
            curve,
        })
    }

    pub fn raster(&self) -> &Raster<f64> {
        &self.raster
    }

    /// Finite cell values in row-major order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn statistics(&self) -> &LayerStatistics {
        &self.statistics
    }

    pub fn curve(&self) -> &SampleCurve {
        &self.curve
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn layer(values: Vec<f64>) -> Raster<f64> {
        let n = values.len();
        Raster::from_vec(values, 1, n).unwrap()
    }

    #[test]
    fn test_statistics_exclude_nodata() {
        let stats =
            LayerStatistics::from_raster(&layer(vec![1.0, f64::NAN, 2.0, 3.0, 4.0, 5.0])).unwrap();
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
        assert_relative_eq!(stats.mean, 3.0);
        assert_relative_eq!(stats.std_dev, 2.0f64.sqrt());
        assert_eq!(stats.count, 5);
        assert_relative_eq!(stats.midpoint(), 3.0);
        assert_relative_eq!(stats.range(), 4.0);
    }

    #[test]
    fn test_from_values_matches_raster() {
        let values = vec![1500.0, 2200.0, f64::INFINITY, 3100.0, 587.0];
        let from_slice = LayerStatistics::from_values(&values).unwrap();
        let from_grid = LayerStatistics::from_raster(&layer(vec![1500.0, 2200.0, f64::NAN, 3100.0, 587.0]))
            .unwrap();
        assert_eq!(from_slice.count, 4);
        assert_eq!(from_slice.min, from_grid.min);
        assert_eq!(from_slice.max, from_grid.max);
        assert_relative_eq!(from_slice.mean, from_grid.mean);
        assert_relative_eq!(from_slice.std_dev, from_grid.std_dev, epsilon = 1e-9);
        assert!(matches!(LayerStatistics::from_values(&[]).unwrap_err(), Error::EmptyLayer));
    }

    #[test]
    fn test_empty_layer() {
        let err = LayerStatistics::from_raster(&layer(vec![f64::NAN; 4])).unwrap_err();
        assert!(matches!(err, Error::EmptyLayer));
        assert!(matches!(
            LayerSample::new(layer(vec![f64::NAN])).unwrap_err(),
            Error::EmptyLayer
        ));
    }

    #[test]
    fn test_sample_skips_sentinel() {
        let mut raster = layer(vec![-9999.0, 587.0, 4066.0]);
        raster.set_nodata(Some(-9999.0));
        let sample = LayerSample::new(raster).unwrap();
        assert_eq!(sample.values(), &[587.0, 4066.0]);
        assert_eq!(sample.statistics().min, 587.0);
        assert_eq!(sample.statistics().count, 2);
    }

    #[test]
    fn test_sample_curve_spacing() {
        let curve = SampleCurve::spanning(587.0, 4066.0);
        assert_eq!(curve.len(), SAMPLE_POINTS);
        assert_eq!(curve.inputs()[0], 587.0);
        assert_relative_eq!(curve.inputs()[99], 4066.0, epsilon = 1e-9);
        assert_relative_eq!(
            curve.inputs()[1] - curve.inputs()[0],
            (4066.0 - 587.0) / 99.0,
            epsilon = 1e-9
        );
        assert!(curve.inputs().windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(curve.inputs(), curve.outputs());
    }

    #[test]
    fn test_constant_layer_curve_is_flat() {
        let sample = LayerSample::new(layer(vec![7.0; 6])).unwrap();
        assert_eq!(sample.curve().len(), SAMPLE_POINTS);
        assert!(sample.curve().inputs().iter().all(|&x| x == 7.0));
        assert_eq!(sample.statistics().std_dev, 0.0);
    }

    #[test]
    fn test_curve_mapping_keeps_inputs() {
        let curve = SampleCurve::spanning(0.0, 99.0);
        let doubled = curve.from_inputs(|x| 2.0 * x);
        let shifted = doubled.map_outputs(|y| y + 1.0);
        assert_eq!(shifted.inputs(), curve.inputs());
        assert_eq!(shifted.points()[10], (10.0, 21.0));
    }
}
