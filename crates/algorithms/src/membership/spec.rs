//! Transformation configuration as supplied by callers
//!
//! A [`TransformationSpec`] is loose on purpose: it is what a model file or a
//! caller hands over, with kind and kernel given by name and most parameters
//! optional. [`resolve`](super::resolve) turns it into a
//! [`ResolvedTransform`](super::ResolvedTransform) once per layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use suitgis_core::{Error, Result};

use super::kernel::Kernel;
use super::rescale::ScaleRange;

/// Transformation families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformKind {
    /// Exact-match value remap
    Unique,
    /// Half-open interval remap
    Range,
    /// One of the continuous membership kernels
    Continuous,
}

impl TransformKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransformKind::Unique => "unique",
            TransformKind::Range => "range",
            TransformKind::Continuous => "continuous",
        }
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransformKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "unique" => Ok(TransformKind::Unique),
            "range" => Ok(TransformKind::Range),
            "continuous" | "continous" => Ok(TransformKind::Continuous),
            other => Err(Error::config(format!(
                "unknown transformation kind '{}' (expected unique, range or continuous)",
                other
            ))),
        }
    }
}

/// Remap table for the discrete kinds.
///
/// In JSON a `unique` table is a list of `[value, to]` pairs and a `range`
/// table a list of `[start, end, to]` triples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Remap {
    Values(Vec<(f64, f64)>),
    Intervals(Vec<(f64, f64, f64)>),
}

/// Optional kernel parameters. Anything left `None` is derived from the
/// layer statistics when the spec is resolved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KernelParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mid_point: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spread: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_multiplier: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub std_multiplier: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_shift: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exponent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_intercept_percent: Option<f64>,
}

/// One layer's transformation configuration.
///
/// # Example
///
/// ```ignore
/// let spec: TransformationSpec = serde_json::from_str(
///     r#"{ "kind": "continuous", "name": "near", "fromScale": 1, "toScale": 10 }"#,
/// )?;
/// let same = TransformationSpec::continuous(Kernel::Near).with_scale(1.0, 10.0);
/// assert_eq!(spec, same);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformationSpec {
    /// `unique`, `range` or `continuous`
    pub kind: String,
    /// Kernel name, `continuous` only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remap: Option<Remap>,
    #[serde(flatten)]
    pub params: KernelParams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_scale: Option<f64>,
}

impl TransformationSpec {
    fn with_kind(kind: TransformKind) -> Self {
        Self {
            kind: kind.as_str().to_string(),
            name: None,
            remap: None,
            params: KernelParams::default(),
            from_scale: None,
            to_scale: None,
        }
    }

    /// Exact-match remap from `(value, to)` pairs
    pub fn unique(pairs: Vec<(f64, f64)>) -> Self {
        Self {
            remap: Some(Remap::Values(pairs)),
            ..Self::with_kind(TransformKind::Unique)
        }
    }

    /// Interval remap from `(start, end, to)` triples, matched as `(start, end]`
    pub fn range(intervals: Vec<(f64, f64, f64)>) -> Self {
        Self {
            remap: Some(Remap::Intervals(intervals)),
            ..Self::with_kind(TransformKind::Range)
        }
    }

    /// Continuous kernel with every parameter left to derivation
    pub fn continuous(kernel: Kernel) -> Self {
        Self {
            name: Some(kernel.as_str().to_string()),
            ..Self::with_kind(TransformKind::Continuous)
        }
    }

    pub fn with_scale(mut self, from: f64, to: f64) -> Self {
        self.from_scale = Some(from);
        self.to_scale = Some(to);
        self
    }

    pub fn with_params(mut self, params: KernelParams) -> Self {
        self.params = params;
        self
    }

    /// Parsed transformation kind
    pub fn kind(&self) -> Result<TransformKind> {
        self.kind.parse()
    }

    /// Parsed kernel name. Fails when `name` is missing or unknown.
    pub fn kernel(&self) -> Result<Kernel> {
        self.name
            .as_deref()
            .ok_or_else(|| Error::config("continuous transformation requires a kernel 'name'"))?
            .parse()
    }

    /// Target scale range. Both ends are required and must be finite.
    pub fn scale(&self) -> Result<ScaleRange> {
        match (self.from_scale, self.to_scale) {
            (Some(from), Some(to)) if from.is_finite() && to.is_finite() => {
                Ok(ScaleRange::new(from, to))
            }
            (Some(_), Some(_)) => Err(Error::config("fromScale and toScale must be finite")),
            _ => Err(Error::config("fromScale and toScale are required")),
        }
    }
}

impl Default for TransformationSpec {
    /// Linear stretch of the layer range onto `[0, 1]`
    fn default() -> Self {
        Self::continuous(Kernel::Linear).with_scale(0.0, 1.0)
    }
}
