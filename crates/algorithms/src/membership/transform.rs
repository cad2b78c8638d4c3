//! Resolved transformations and their application to a layer

use suitgis_core::raster::Raster;
use suitgis_core::{Algorithm, Error, Result};
use tracing::debug;

use super::kernel::ResolvedKernel;
use super::remap::{RangeRemap, UniqueRemap};
use super::rescale::{rescale, ScaleRange};
use super::spec::{Remap, TransformKind, TransformationSpec};
use crate::cellwise::{count_lost_cells, map_cells};
use crate::statistics::{LayerStatistics, SampleCurve};

/// What a resolved transformation does to each value
#[derive(Debug, Clone, PartialEq)]
pub enum TransformMethod {
    Unique(UniqueRemap),
    Range(RangeRemap),
    Continuous(ResolvedKernel),
}

/// A transformation with every parameter fixed for one layer
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTransform {
    pub method: TransformMethod,
    pub scale: ScaleRange,
}

/// Resolve a caller-supplied spec against a layer's statistics.
///
/// Unknown names, a missing scale and a remap of the wrong shape fail with
/// [`Error::Config`]; collapsed kernel denominators with
/// [`Error::DegenerateRange`].
pub fn resolve(spec: &TransformationSpec, stats: &LayerStatistics) -> Result<ResolvedTransform> {
    let kind = spec.kind()?;
    let scale = spec.scale()?;

    let method = match kind {
        TransformKind::Unique => match &spec.remap {
            Some(Remap::Values(pairs)) => TransformMethod::Unique(UniqueRemap::new(pairs.clone())),
            Some(Remap::Intervals(_)) => {
                return Err(Error::config(
                    "unique remap expects [value, to] pairs, got [start, end, to] triples",
                ))
            }
            None => return Err(Error::config("unique transformation requires a 'remap' table")),
        },
        TransformKind::Range => match &spec.remap {
            Some(Remap::Intervals(intervals)) => {
                TransformMethod::Range(RangeRemap::new(intervals.clone()))
            }
            // `[]` deserializes as an empty pair list
            Some(Remap::Values(pairs)) if pairs.is_empty() => {
                TransformMethod::Range(RangeRemap::new(Vec::new()))
            }
            Some(Remap::Values(_)) => {
                return Err(Error::config(
                    "range remap expects [start, end, to] triples, got [value, to] pairs",
                ))
            }
            None => return Err(Error::config("range transformation requires a 'remap' table")),
        },
        TransformKind::Continuous => {
            let kernel = spec.kernel()?;
            TransformMethod::Continuous(ResolvedKernel::resolve(
                kernel,
                &spec.params,
                stats,
                Some(scale),
            )?)
        }
    };

    debug!(kind = %kind, method = ?method, "resolved transformation");
    Ok(ResolvedTransform { method, scale })
}

impl ResolvedTransform {
    pub fn kind(&self) -> TransformKind {
        match self.method {
            TransformMethod::Unique(_) => TransformKind::Unique,
            TransformMethod::Range(_) => TransformKind::Range,
            TransformMethod::Continuous(_) => TransformKind::Continuous,
        }
    }

    /// Transform every valid cell and the sample curve with the same
    /// parameters.
    ///
    /// Discrete remaps leave the curve as it is. A valid cell whose output is
    /// not finite (`ln` of a non-positive argument, overflow) fails with
    /// [`Error::Config`].
    pub fn apply(&self, raster: &Raster<f64>, curve: &SampleCurve) -> Result<(Raster<f64>, SampleCurve)> {
        let (out, out_curve) = match &self.method {
            TransformMethod::Unique(remap) => (map_cells(raster, |v| remap.apply(v))?, curve.clone()),
            TransformMethod::Range(remap) => (map_cells(raster, |v| remap.apply(v))?, curve.clone()),
            TransformMethod::Continuous(kernel) => (
                map_cells(raster, |v| kernel.evaluate(v))?,
                curve.from_inputs(|x| kernel.evaluate(x)),
            ),
        };

        let lost = count_lost_cells(raster, &out);
        if lost > 0 {
            let what = match &self.method {
                TransformMethod::Continuous(kernel) => format!("kernel '{}'", kernel.kernel()),
                _ => format!("{} remap", self.kind()),
            };
            return Err(Error::config(format!(
                "{} is undefined for {} valid cell(s)",
                what, lost
            )));
        }
        Ok((out, out_curve))
    }

    /// Spec that resolves back to `self` against the same layer, with every
    /// derived parameter written out
    pub fn to_spec(&self) -> TransformationSpec {
        let spec = match &self.method {
            TransformMethod::Unique(remap) => TransformationSpec::unique(remap.pairs().to_vec()),
            TransformMethod::Range(remap) => TransformationSpec::range(remap.intervals()),
            TransformMethod::Continuous(kernel) => {
                TransformationSpec::continuous(kernel.kernel()).with_params(kernel.to_params())
            }
        };
        spec.with_scale(self.scale.from, self.scale.to)
    }
}

/// Transform and rescale a whole raster in one call
pub fn fuzzy_membership(raster: &Raster<f64>, spec: &TransformationSpec) -> Result<Raster<f64>> {
    let stats = LayerStatistics::from_raster(raster)?;
    let resolved = resolve(spec, &stats)?;
    let curve = SampleCurve::spanning(stats.min, stats.max);
    let (transformed, curve) = resolved.apply(raster, &curve)?;
    let (scaled, _, _) = rescale(&transformed, &curve, resolved.scale)?;
    Ok(scaled)
}

/// Fuzzy membership algorithm
#[derive(Debug, Clone, Default)]
pub struct FuzzyMembership;

impl Algorithm for FuzzyMembership {
    type Input = Raster<f64>;
    type Output = Raster<f64>;
    type Params = TransformationSpec;
    type Error = Error;

    fn name(&self) -> &'static str {
        "FuzzyMembership"
    }

    fn description(&self) -> &'static str {
        "Transform a raster with a membership kernel or remap and rescale it onto a target range"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        fuzzy_membership(&input, &params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::kernel::Kernel;
    use crate::membership::spec::KernelParams;
    use approx::assert_relative_eq;

    fn row(values: Vec<f64>) -> Raster<f64> {
        let n = values.len();
        Raster::from_vec(values, 1, n).unwrap()
    }

    fn stats_of(raster: &Raster<f64>) -> LayerStatistics {
        LayerStatistics::from_raster(raster).unwrap()
    }

    #[test]
    fn test_resolve_requires_scale() {
        let raster = row(vec![1.0, 2.0, 3.0]);
        let spec = TransformationSpec::continuous(Kernel::Linear);
        assert!(matches!(
            resolve(&spec, &stats_of(&raster)).unwrap_err(),
            Error::Config(_)
        ));
    }

    #[test]
    fn test_resolve_rejects_wrong_remap_shape() {
        let raster = row(vec![1.0, 2.0, 3.0]);
        let stats = stats_of(&raster);
        let mut spec = TransformationSpec::unique(vec![]).with_scale(1.0, 10.0);
        spec.remap = Some(Remap::Intervals(vec![(0.0, 1.0, 2.0)]));
        assert!(matches!(resolve(&spec, &stats).unwrap_err(), Error::Config(_)));

        let mut spec = TransformationSpec::range(vec![]).with_scale(1.0, 10.0);
        spec.remap = Some(Remap::Values(vec![(1.0, 2.0)]));
        assert!(matches!(resolve(&spec, &stats).unwrap_err(), Error::Config(_)));

        spec.remap = None;
        assert!(matches!(resolve(&spec, &stats).unwrap_err(), Error::Config(_)));
    }

    #[test]
    fn test_unique_keeps_curve() {
        let raster = row(vec![1.0, 2.0, 3.0]);
        let stats = stats_of(&raster);
        let resolved = resolve(
            &TransformationSpec::unique(vec![(2.0, 20.0)]).with_scale(1.0, 10.0),
            &stats,
        )
        .unwrap();
        let curve = SampleCurve::spanning(stats.min, stats.max);
        let (out, out_curve) = resolved.apply(&raster, &curve).unwrap();
        assert_eq!(out.get(0, 0).unwrap(), 1.0);
        assert_eq!(out.get(0, 1).unwrap(), 20.0);
        assert_eq!(out_curve, curve);
    }

    #[test]
    fn test_continuous_curve_matches_grid() {
        let raster = row(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let stats = stats_of(&raster);
        let resolved = resolve(
            &TransformationSpec::continuous(Kernel::Near).with_scale(1.0, 10.0),
            &stats,
        )
        .unwrap();
        let curve = SampleCurve::spanning(stats.min, stats.max);
        let (out, out_curve) = resolved.apply(&raster, &curve).unwrap();
        assert_eq!(out.get(0, 2).unwrap(), 1.0);
        assert_relative_eq!(out_curve.outputs()[0], out.get(0, 0).unwrap());
        assert_relative_eq!(out_curve.outputs()[99], out.get(0, 4).unwrap(), epsilon = 1e-12);
    }

    #[test]
    fn test_non_finite_outputs_are_config_errors() {
        let raster = row(vec![1.0, 2.0, 3.0, f64::NAN]);
        let stats = stats_of(&raster);
        let spec = TransformationSpec::continuous(Kernel::Logarithm)
            .with_scale(1.0, 10.0)
            .with_params(KernelParams {
                in_shift: Some(2.0),
                base_factor: Some(1.0),
                ..Default::default()
            });
        let resolved = resolve(&spec, &stats).unwrap();
        // ln(-1) and ln(0); the NaN source cell does not count
        match resolved.apply(&raster, &SampleCurve::spanning(stats.min, stats.max)) {
            Err(Error::Config(msg)) => {
                assert!(msg.contains("logarithm"), "{}", msg);
                assert!(msg.contains("2 valid"), "{}", msg);
            }
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_to_spec_round_trips() {
        let raster = row(vec![1.0, 4.0, 9.0, 16.0]);
        let stats = stats_of(&raster);
        let specs = vec![
            TransformationSpec::continuous(Kernel::Gaussian).with_scale(1.0, 10.0),
            TransformationSpec::continuous(Kernel::Power).with_scale(1.0, 10.0),
            TransformationSpec::unique(vec![(4.0, 1.0)]).with_scale(0.0, 1.0),
            TransformationSpec::range(vec![(0.0, 5.0, 1.0)]).with_scale(0.0, 1.0),
        ];
        for spec in specs {
            let resolved = resolve(&spec, &stats).unwrap();
            let written = resolved.to_spec();
            assert_eq!(resolve(&written, &stats).unwrap(), resolved);
        }
    }

    #[test]
    fn test_fuzzy_membership_algorithm() {
        let raster = row(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let out = FuzzyMembership
            .execute(raster, TransformationSpec::default())
            .unwrap();
        assert_eq!(out.get(0, 0).unwrap(), 0.0);
        assert_relative_eq!(out.get(0, 2).unwrap(), 0.5);
        assert_eq!(out.get(0, 4).unwrap(), 1.0);
    }
}
