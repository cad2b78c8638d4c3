//! Weighted overlay of rescaled criteria
//!
//! `out = Σ wᵢ·vᵢ`, where `wᵢ` is the weight as given (`multiplier`) or the
//! weight divided by 100 (`percentage`). A no-data cell in any layer makes
//! the composite cell no-data.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use suitgis_core::raster::Raster;
use suitgis_core::{Algorithm, Error, Result};
use tracing::{debug, warn};

use super::criterion::CriterionLayer;
use crate::maybe_rayon::*;
use crate::membership::{ScaleRange, TransformationSpec};
use crate::statistics::{histogram, Histogram, LayerStatistics};

/// How weights are interpreted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightMethod {
    /// Weights are used as given
    #[default]
    Multiplier,
    /// Weights are percentages and divided by 100
    Percentage,
}

impl WeightMethod {
    /// Factor applied to a layer for weight `w`
    pub fn effective(&self, w: f64) -> f64 {
        match self {
            WeightMethod::Multiplier => w,
            WeightMethod::Percentage => w / 100.0,
        }
    }
}

impl fmt::Display for WeightMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightMethod::Multiplier => f.write_str("multiplier"),
            WeightMethod::Percentage => f.write_str("percentage"),
        }
    }
}

impl FromStr for WeightMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "multiplier" => Ok(WeightMethod::Multiplier),
            "percentage" => Ok(WeightMethod::Percentage),
            other => Err(Error::config(format!(
                "unknown weight method '{}' (expected multiplier or percentage)",
                other
            ))),
        }
    }
}

/// Model-wide settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverlayConfig {
    pub weight_method: WeightMethod,
    /// Scale given to criterion specs that leave theirs unset
    pub from_scale: f64,
    pub to_scale: f64,
}

impl OverlayConfig {
    pub fn scale(&self) -> ScaleRange {
        ScaleRange::new(self.from_scale, self.to_scale)
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            weight_method: WeightMethod::Multiplier,
            from_scale: 1.0,
            to_scale: 10.0,
        }
    }
}

/// Weighted sum of co-registered layers.
///
/// Checks, in order: one weight per layer ([`Error::WeightCountMismatch`]),
/// at least one layer ([`Error::Config`]) and identical shapes
/// ([`Error::SizeMismatch`]).
pub fn weighted_overlay(
    layers: &[&Raster<f64>],
    weights: &[f64],
    method: WeightMethod,
) -> Result<Raster<f64>> {
    if layers.len() != weights.len() {
        return Err(Error::WeightCountMismatch {
            criteria: layers.len(),
            weights: weights.len(),
        });
    }
    let first = layers
        .first()
        .ok_or_else(|| Error::config("weighted overlay needs at least one layer"))?;
    let (rows, cols) = first.shape();
    for layer in &layers[1..] {
        if layer.shape() != (rows, cols) {
            return Err(Error::SizeMismatch {
                er: rows,
                ec: cols,
                ar: layer.rows(),
                ac: layer.cols(),
            });
        }
    }

    let factors: Vec<f64> = weights.iter().map(|&w| method.effective(w)).collect();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            'cells: for (col, out) in row_data.iter_mut().enumerate() {
                let mut sum = 0.0;
                for (layer, &factor) in layers.iter().zip(&factors) {
                    let v = unsafe { layer.get_unchecked(row, col) };
                    if layer.is_nodata(v) {
                        continue 'cells;
                    }
                    sum += factor * v;
                }
                *out = sum;
            }
            row_data
        })
        .collect();

    let mut output = first.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    output.replace_data(data)?;
    Ok(output)
}

/// The suitability surface produced by a model
#[derive(Debug, Clone)]
pub struct CompositeSurface {
    raster: Raster<f64>,
}

impl CompositeSurface {
    pub fn new(raster: Raster<f64>) -> Self {
        Self { raster }
    }

    pub fn raster(&self) -> &Raster<f64> {
        &self.raster
    }

    pub fn into_raster(self) -> Raster<f64> {
        self.raster
    }

    /// Finite composite values in row-major order
    pub fn values(&self) -> Vec<f64> {
        self.raster.finite_values()
    }

    /// Min, max, mean and standard deviation of the finite cells
    pub fn statistics(&self) -> Result<LayerStatistics> {
        LayerStatistics::from_values(&self.values())
    }

    pub fn histogram(&self, n_bins: usize) -> Result<Histogram> {
        histogram(&self.values(), n_bins)
    }
}

/// Ordered criteria, their weights and the resulting surface
#[derive(Debug, Clone, Default)]
pub struct SuitabilityModel {
    config: OverlayConfig,
    criteria: Vec<CriterionLayer>,
    weights: Vec<f64>,
    surface: Option<CompositeSurface>,
}

impl SuitabilityModel {
    pub fn new(config: OverlayConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn add_criterion(&mut self, layer: CriterionLayer, weight: f64) {
        self.criteria.push(layer);
        self.weights.push(weight);
    }

    /// Add a criterion with weight 1
    pub fn add_criterion_default(&mut self, layer: CriterionLayer) {
        self.add_criterion(layer, 1.0);
    }

    /// Replace every weight at once
    pub fn set_weights(&mut self, weights: Vec<f64>) -> Result<()> {
        if weights.len() != self.criteria.len() {
            return Err(Error::WeightCountMismatch {
                criteria: self.criteria.len(),
                weights: weights.len(),
            });
        }
        self.weights = weights;
        Ok(())
    }

    pub fn criteria(&self) -> &[CriterionLayer] {
        &self.criteria
    }

    pub fn criteria_mut(&mut self) -> &mut [CriterionLayer] {
        &mut self.criteria
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Transform every criterion with its own spec, in parallel.
    ///
    /// Specs without `fromScale`/`toScale` take the model's scale. Every
    /// criterion is attempted, so afterwards each one holds output from this
    /// batch or none at all. The first failure in criterion order is returned.
    pub fn transform_criteria(&mut self, specs: &[TransformationSpec]) -> Result<()> {
        if specs.len() != self.criteria.len() {
            return Err(Error::config(format!(
                "{} criteria but {} transformation specs",
                self.criteria.len(),
                specs.len()
            )));
        }

        let scale = self.config.scale();
        let specs: Vec<TransformationSpec> = specs
            .iter()
            .map(|spec| {
                let mut spec = spec.clone();
                if spec.from_scale.is_none() && spec.to_scale.is_none() {
                    spec.from_scale = Some(scale.from);
                    spec.to_scale = Some(scale.to);
                }
                spec
            })
            .collect();

        let results: Vec<Result<()>> = self
            .criteria
            .iter_mut()
            .zip(specs.iter())
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|(criterion, spec)| criterion.transform(spec).map(|_| ()))
            .collect();
        results.into_iter().collect()
    }

    /// Aggregate the transformed criteria into the composite surface.
    ///
    /// Fails with [`Error::Config`] while any criterion is untransformed.
    pub fn calculate(&mut self) -> Result<&CompositeSurface> {
        let mut layers = Vec::with_capacity(self.criteria.len());
        for criterion in &self.criteria {
            let out = criterion.output().ok_or_else(|| {
                Error::config(format!(
                    "criterion '{}' must be transformed before the overlay",
                    criterion.name()
                ))
            })?;
            if out.resolved().scale != self.config.scale() {
                debug!(
                    criterion = criterion.name(),
                    from = out.resolved().scale.from,
                    to = out.resolved().scale.to,
                    "criterion scale differs from the model scale"
                );
            }
            layers.push(out.raster());
        }

        if self.config.weight_method == WeightMethod::Percentage {
            let total: f64 = self.weights.iter().sum();
            if (total - 100.0).abs() > 1e-9 {
                warn!(total, "percentage weights do not sum to 100");
            }
        }

        let raster = weighted_overlay(&layers, &self.weights, self.config.weight_method)?;
        debug!(
            criteria = layers.len(),
            method = %self.config.weight_method,
            "weighted overlay computed"
        );
        Ok(self.surface.insert(CompositeSurface::new(raster)))
    }

    /// Surface from the last successful [`calculate`](Self::calculate)
    pub fn surface(&self) -> Option<&CompositeSurface> {
        self.surface.as_ref()
    }
}

/// Parameters for [`WeightedOverlay`]
#[derive(Debug, Clone, Default)]
pub struct OverlayParams {
    /// One weight per layer; empty gives every layer weight 1
    pub weights: Vec<f64>,
    pub method: WeightMethod,
}

/// Weighted overlay algorithm
#[derive(Debug, Clone, Default)]
pub struct WeightedOverlay;

impl Algorithm for WeightedOverlay {
    type Input = Vec<Raster<f64>>;
    type Output = Raster<f64>;
    type Params = OverlayParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "WeightedOverlay"
    }

    fn description(&self) -> &'static str {
        "Weighted sum of co-registered suitability layers"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let layers: Vec<&Raster<f64>> = input.iter().collect();
        let weights = if params.weights.is_empty() {
            vec![1.0; layers.len()]
        } else {
            params.weights
        };
        weighted_overlay(&layers, &weights, params.method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::Kernel;
    use approx::assert_relative_eq;

    fn row(values: Vec<f64>) -> Raster<f64> {
        let n = values.len();
        Raster::from_vec(values, 1, n).unwrap()
    }

    #[test]
    fn test_multiplier_and_percentage_agree() {
        let a = row(vec![1.0, 2.0, 3.0]);
        let b = row(vec![4.0, 5.0, 6.0]);
        let m = weighted_overlay(&[&a, &b], &[0.25, 0.75], WeightMethod::Multiplier).unwrap();
        let p = weighted_overlay(&[&a, &b], &[25.0, 75.0], WeightMethod::Percentage).unwrap();
        for (col, expected) in [3.25, 4.25, 5.25].into_iter().enumerate() {
            assert_relative_eq!(m.get(0, col).unwrap(), expected);
            assert_relative_eq!(p.get(0, col).unwrap(), expected);
        }
    }

    #[test]
    fn test_nodata_propagates() {
        let a = row(vec![1.0, f64::NAN, 3.0]);
        let b = row(vec![4.0, 5.0, f64::NAN]);
        let out = weighted_overlay(&[&a, &b], &[1.0, 1.0], WeightMethod::Multiplier).unwrap();
        assert_eq!(out.get(0, 0).unwrap(), 5.0);
        assert!(out.get(0, 1).unwrap().is_nan());
        assert!(out.get(0, 2).unwrap().is_nan());
    }

    #[test]
    fn test_sentinel_nodata_propagates() {
        let mut a = row(vec![1.0, -9999.0]);
        a.set_nodata(Some(-9999.0));
        let b = row(vec![1.0, 1.0]);
        let out = weighted_overlay(&[&a, &b], &[1.0, 1.0], WeightMethod::Multiplier).unwrap();
        assert_eq!(out.get(0, 0).unwrap(), 2.0);
        assert!(out.get(0, 1).unwrap().is_nan());
    }

    #[test]
    fn test_overlay_errors() {
        let a = row(vec![1.0, 2.0]);
        let b = Raster::from_vec(vec![1.0, 2.0], 2, 1).unwrap();
        assert!(matches!(
            weighted_overlay(&[&a], &[1.0, 2.0], WeightMethod::Multiplier).unwrap_err(),
            Error::WeightCountMismatch { criteria: 1, weights: 2 }
        ));
        assert!(matches!(
            weighted_overlay(&[], &[], WeightMethod::Multiplier).unwrap_err(),
            Error::Config(_)
        ));
        assert!(matches!(
            weighted_overlay(&[&a, &b], &[1.0, 1.0], WeightMethod::Multiplier).unwrap_err(),
            Error::SizeMismatch { .. }
        ));
    }

    #[test]
    fn test_weight_method_parsing() {
        assert_eq!("Percentage".parse::<WeightMethod>().unwrap(), WeightMethod::Percentage);
        assert!("ratio".parse::<WeightMethod>().is_err());
        let config: OverlayConfig = serde_json::from_str(r#"{ "weightMethod": "percentage" }"#).unwrap();
        assert_eq!(config.weight_method, WeightMethod::Percentage);
        assert_eq!(config.scale(), ScaleRange::new(1.0, 10.0));
    }

    #[test]
    fn test_model_requires_transform() {
        let mut model = SuitabilityModel::new(OverlayConfig::default());
        model.add_criterion_default(CriterionLayer::new("a", row(vec![1.0, 2.0])).unwrap());
        assert!(matches!(model.calculate().unwrap_err(), Error::Config(_)));
        assert!(model.surface().is_none());
    }

    #[test]
    fn test_model_end_to_end() {
        let mut model = SuitabilityModel::new(OverlayConfig::default());
        model.add_criterion(CriterionLayer::new("slope", row(vec![0.0, 5.0, 10.0])).unwrap(), 2.0);
        model.add_criterion_default(CriterionLayer::new("landuse", row(vec![11.0, 41.0, 42.0])).unwrap());

        let specs = vec![
            TransformationSpec::continuous(Kernel::Linear),
            TransformationSpec::unique(vec![(41.0, 10.0), (42.0, 10.0), (11.0, 1.0)]),
        ];
        model.transform_criteria(&specs).unwrap();
        assert!(model.criteria().iter().all(|c| c.is_transformed()));

        let surface = model.calculate().unwrap();
        // slope rescales to [1, 5.5, 10], land use to [1, 10, 10]
        assert_relative_eq!(surface.raster().get(0, 0).unwrap(), 3.0);
        assert_relative_eq!(surface.raster().get(0, 1).unwrap(), 21.0);
        assert_relative_eq!(surface.raster().get(0, 2).unwrap(), 30.0);

        let stats = surface.statistics().unwrap();
        assert_eq!(stats.min, 3.0);
        assert_eq!(stats.max, 30.0);
        assert_eq!(surface.values().len(), 3);
        assert_eq!(surface.histogram(3).unwrap().total(), 3);
    }

    #[test]
    fn test_failed_batch_leaves_no_stale_output() {
        let mut model = SuitabilityModel::default();
        model.add_criterion_default(CriterionLayer::new("a", row(vec![1.0, 2.0, 3.0])).unwrap());
        model.add_criterion_default(CriterionLayer::new("b", row(vec![1.0, 2.0, 3.0])).unwrap());
        model
            .transform_criteria(&[
                TransformationSpec::continuous(Kernel::Linear),
                TransformationSpec::continuous(Kernel::Linear),
            ])
            .unwrap();

        let mut unknown = TransformationSpec::continuous(Kernel::Linear);
        unknown.name = Some("tiny".into());
        let err = model
            .transform_criteria(&[
                unknown,
                TransformationSpec::continuous(Kernel::Linear).with_scale(10.0, 1.0),
            ])
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let criteria = model.criteria();
        assert!(!criteria[0].is_transformed());
        // the later criterion reflects the second batch, not the first
        let b = criteria[1].output().unwrap();
        assert_eq!(b.raster().get(0, 0).unwrap(), 10.0);
        assert_eq!(b.raster().get(0, 2).unwrap(), 1.0);
        assert!(matches!(model.calculate().unwrap_err(), Error::Config(_)));
    }

    #[test]
    fn test_transform_criteria_count() {
        let mut model = SuitabilityModel::default();
        model.add_criterion_default(CriterionLayer::new("a", row(vec![1.0, 2.0])).unwrap());
        assert!(matches!(
            model.transform_criteria(&[]).unwrap_err(),
            Error::Config(_)
        ));
        assert!(matches!(
            model.set_weights(vec![1.0, 2.0]).unwrap_err(),
            Error::WeightCountMismatch { .. }
        ));
    }

    #[test]
    fn test_weighted_overlay_algorithm() {
        let out = WeightedOverlay
            .execute_default(vec![row(vec![1.0, 2.0]), row(vec![3.0, 4.0])])
            .unwrap();
        assert_eq!(out.get(0, 0).unwrap(), 4.0);
        assert_eq!(out.get(0, 1).unwrap(), 6.0);
    }
}
