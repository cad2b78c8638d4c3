//! Continuous fuzzy membership kernels
//!
//! Each kernel has a closed-form per-value formula and a rule for deriving
//! missing parameters from the layer's [`LayerStatistics`]. Derivation runs
//! once per layer in [`ResolvedKernel::resolve`]; evaluation is then a pure
//! function of the cell value.
//!
//! | kernel | f(x) |
//! |---|---|
//! | small | 1 / (1 + (x / mid)^spread) |
//! | large | 1 / (1 + (x / mid)^spread), negative spread |
//! | mssmall | std' / (x - mean' + std') above mean', else 1 |
//! | mslarge | 1 - std' / (x - mean' + std') above mean', else 0 |
//! | gaussian | exp(-spread * (x - mid)^2) |
//! | near | 1 / (1 + spread * (x - mid)^2) |
//! | linear | clamp((x - minX) / (maxX - minX)) |
//! | symmetriclinear | triangle peaking halfway between minX and maxX |
//! | exponential | exp((x - inShift) * baseFactor) |
//! | logarithm | ln((x - inShift) * baseFactor) |
//! | power | (x - inShift)^exponent |
//! | logisticgrowth / logisticdecay | 100 / (1 + a * exp((x - min) * b)) |

use std::f64::consts::LN_10;
use std::fmt;
use std::str::FromStr;
use suitgis_core::{Error, Result};

use super::rescale::ScaleRange;
use super::spec::KernelParams;
use crate::statistics::LayerStatistics;

/// Logistic kernels saturate at this value
const LOGISTIC_CEILING: f64 = 100.0;

/// Continuous membership kernel names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kernel {
    Small,
    Large,
    MsSmall,
    MsLarge,
    Gaussian,
    Near,
    Linear,
    SymmetricLinear,
    Exponential,
    Logarithm,
    Power,
    LogisticGrowth,
    LogisticDecay,
}

impl Kernel {
    pub const ALL: [Kernel; 13] = [
        Kernel::Small,
        Kernel::Large,
        Kernel::MsSmall,
        Kernel::MsLarge,
        Kernel::Gaussian,
        Kernel::Near,
        Kernel::Linear,
        Kernel::SymmetricLinear,
        Kernel::Exponential,
        Kernel::Logarithm,
        Kernel::Power,
        Kernel::LogisticGrowth,
        Kernel::LogisticDecay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Kernel::Small => "small",
            Kernel::Large => "large",
            Kernel::MsSmall => "mssmall",
            Kernel::MsLarge => "mslarge",
            Kernel::Gaussian => "gaussian",
            Kernel::Near => "near",
            Kernel::Linear => "linear",
            Kernel::SymmetricLinear => "symmetriclinear",
            Kernel::Exponential => "exponential",
            Kernel::Logarithm => "logarithm",
            Kernel::Power => "power",
            Kernel::LogisticGrowth => "logisticgrowth",
            Kernel::LogisticDecay => "logisticdecay",
        }
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kernel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Kernel::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| Error::config(format!("unknown kernel '{}'", s.trim())))
    }
}

/// A kernel with every parameter fixed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolvedKernel {
    Small { mid_point: f64, spread: f64 },
    Large { mid_point: f64, spread: f64 },
    /// `mean` and `std_dev` are the layer values already multiplied
    MsSmall {
        mean_multiplier: f64,
        std_multiplier: f64,
        mean: f64,
        std_dev: f64,
    },
    MsLarge {
        mean_multiplier: f64,
        std_multiplier: f64,
        mean: f64,
        std_dev: f64,
    },
    Gaussian { mid_point: f64, spread: f64 },
    Near { mid_point: f64, spread: f64 },
    Linear { min_x: f64, max_x: f64 },
    SymmetricLinear { min_x: f64, max_x: f64 },
    Exponential { in_shift: f64, base_factor: f64 },
    Logarithm { in_shift: f64, base_factor: f64 },
    Power { in_shift: f64, exponent: f64 },
    /// `origin` is the layer minimum, `a` and `b` follow from the y-intercept
    LogisticGrowth {
        y_intercept_percent: f64,
        origin: f64,
        a: f64,
        b: f64,
    },
    LogisticDecay {
        y_intercept_percent: f64,
        origin: f64,
        a: f64,
        b: f64,
    },
}

fn degenerate(what: &'static str, value: f64) -> Error {
    Error::DegenerateRange { what, value }
}

/// Scale range required to derive a parameter
fn require_scale(kernel: Kernel, scale: Option<ScaleRange>) -> Result<ScaleRange> {
    scale.ok_or_else(|| {
        Error::config(format!(
            "{} kernel needs fromScale and toScale to derive its parameters",
            kernel
        ))
    })
}

/// `(in_shift, base_factor)` such that `(x - in_shift) * base_factor` sends
/// the layer `min` to `t_from` and `max` to `t_to`. Explicit values win.
fn solve_shift_and_factor(
    params: &KernelParams,
    stats: &LayerStatistics,
    t_from: f64,
    t_to: f64,
) -> Result<(f64, f64)> {
    let in_shift = match params.in_shift {
        Some(v) => v,
        None => (stats.min * t_to - stats.max * t_from) / (t_to - t_from),
    };
    let base_factor = match params.base_factor {
        Some(v) => v,
        None => {
            if stats.range() == 0.0 {
                return Err(degenerate("baseFactor derivation (max == min)", stats.min));
            }
            (t_to - t_from) / stats.range()
        }
    };
    Ok((in_shift, base_factor))
}

fn resolve_logistic(
    params: &KernelParams,
    stats: &LayerStatistics,
    default_intercept: f64,
) -> Result<(f64, f64, f64, f64)> {
    let y = params.y_intercept_percent.unwrap_or(default_intercept);
    if !(y > 0.0 && y < LOGISTIC_CEILING) {
        return Err(Error::config(format!(
            "yInterceptPercent must lie strictly between 0 and 100, got {}",
            y
        )));
    }
    let half = 0.5 * (stats.max + stats.min) - stats.min;
    if half == 0.0 {
        return Err(degenerate("logistic half-range (max == min)", stats.min));
    }
    let a = LOGISTIC_CEILING / y - 1.0;
    let b = -a.ln() / half;
    Ok((y, stats.min, a, b))
}

impl ResolvedKernel {
    /// Fill every parameter of `kernel`, deriving what `params` leaves unset.
    ///
    /// `scale` is only consulted by the kernels whose defaults depend on the
    /// target range (exponential, logarithm, power).
    pub fn resolve(
        kernel: Kernel,
        params: &KernelParams,
        stats: &LayerStatistics,
        scale: Option<ScaleRange>,
    ) -> Result<Self> {
        let resolved = match kernel {
            Kernel::Small | Kernel::Large => {
                let mid_point = params.mid_point.unwrap_or_else(|| stats.midpoint());
                if mid_point == 0.0 {
                    return Err(degenerate("midPoint of a ratio kernel", mid_point));
                }
                if kernel == Kernel::Small {
                    let spread = params.spread.unwrap_or(5.0);
                    ResolvedKernel::Small { mid_point, spread }
                } else {
                    let spread = params.spread.unwrap_or(-5.0);
                    ResolvedKernel::Large { mid_point, spread }
                }
            }

            Kernel::MsSmall | Kernel::MsLarge => {
                let mean_multiplier = params.mean_multiplier.unwrap_or(1.0);
                let std_multiplier = params.std_multiplier.unwrap_or(1.0);
                let mean = mean_multiplier * stats.mean;
                let std_dev = std_multiplier * stats.std_dev;
                if kernel == Kernel::MsSmall {
                    ResolvedKernel::MsSmall {
                        mean_multiplier,
                        std_multiplier,
                        mean,
                        std_dev,
                    }
                } else {
                    ResolvedKernel::MsLarge {
                        mean_multiplier,
                        std_multiplier,
                        mean,
                        std_dev,
                    }
                }
            }

            Kernel::Gaussian | Kernel::Near => {
                let mid_point = params.mid_point.unwrap_or_else(|| stats.midpoint());
                let spread = match params.spread {
                    Some(s) => s,
                    None => {
                        let half = mid_point - stats.min;
                        if half == 0.0 {
                            return Err(degenerate("spread derivation (midPoint == min)", mid_point));
                        }
                        let numerator = if kernel == Kernel::Gaussian {
                            LN_10 * 4.0
                        } else {
                            36.0
                        };
                        numerator / (half * half)
                    }
                };
                if kernel == Kernel::Gaussian {
                    ResolvedKernel::Gaussian { mid_point, spread }
                } else {
                    ResolvedKernel::Near { mid_point, spread }
                }
            }

            Kernel::Linear | Kernel::SymmetricLinear => {
                let min_x = params.min_x.unwrap_or(stats.min);
                let max_x = params.max_x.unwrap_or(stats.max);
                if max_x < min_x {
                    return Err(Error::config(format!(
                        "{} kernel needs minX <= maxX, got {} > {}",
                        kernel, min_x, max_x
                    )));
                }
                if max_x == min_x {
                    return Err(degenerate("linear span (maxX == minX)", min_x));
                }
                if kernel == Kernel::Linear {
                    ResolvedKernel::Linear { min_x, max_x }
                } else {
                    ResolvedKernel::SymmetricLinear { min_x, max_x }
                }
            }

            Kernel::Exponential => {
                let (in_shift, base_factor) =
                    if let (Some(s), Some(f)) = (params.in_shift, params.base_factor) {
                        (s, f)
                    } else {
                        let scale = require_scale(kernel, scale)?;
                        if scale.from <= 0.0 || scale.to <= 0.0 {
                            return Err(Error::config(
                                "exponential kernel needs positive fromScale and toScale",
                            ));
                        }
                        let (t_from, t_to) = (scale.from.ln(), scale.to.ln());
                        if t_to == t_from {
                            return Err(Error::config(
                                "exponential kernel needs fromScale != toScale",
                            ));
                        }
                        solve_shift_and_factor(params, stats, t_from, t_to)?
                    };
                ResolvedKernel::Exponential {
                    in_shift,
                    base_factor,
                }
            }

            Kernel::Logarithm => {
                let (in_shift, base_factor) =
                    if let (Some(s), Some(f)) = (params.in_shift, params.base_factor) {
                        (s, f)
                    } else {
                        let scale = require_scale(kernel, scale)?;
                        let (t_from, t_to) = (scale.from.exp(), scale.to.exp());
                        if !t_from.is_finite() || !t_to.is_finite() {
                            return Err(Error::config(
                                "logarithm kernel scale is too large to exponentiate",
                            ));
                        }
                        if t_to == t_from {
                            return Err(Error::config(
                                "logarithm kernel needs fromScale != toScale",
                            ));
                        }
                        solve_shift_and_factor(params, stats, t_from, t_to)?
                    };
                ResolvedKernel::Logarithm {
                    in_shift,
                    base_factor,
                }
            }

            Kernel::Power => {
                let (in_shift, exponent) =
                    if let (Some(s), Some(e)) = (params.in_shift, params.exponent) {
                        (s, e)
                    } else {
                        let scale = require_scale(kernel, scale)?;
                        let (shift, exponent) = power_defaults(stats, scale)?;
                        (
                            params.in_shift.unwrap_or(shift),
                            params.exponent.unwrap_or(exponent),
                        )
                    };
                ResolvedKernel::Power { in_shift, exponent }
            }

            Kernel::LogisticGrowth => {
                let (y_intercept_percent, origin, a, b) = resolve_logistic(params, stats, 1.0)?;
                ResolvedKernel::LogisticGrowth {
                    y_intercept_percent,
                    origin,
                    a,
                    b,
                }
            }

            Kernel::LogisticDecay => {
                let (y_intercept_percent, origin, a, b) = resolve_logistic(params, stats, 99.0)?;
                ResolvedKernel::LogisticDecay {
                    y_intercept_percent,
                    origin,
                    a,
                    b,
                }
            }
        };
        Ok(resolved)
    }

    pub fn kernel(&self) -> Kernel {
        match self {
            ResolvedKernel::Small { .. } => Kernel::Small,
            ResolvedKernel::Large { .. } => Kernel::Large,
            ResolvedKernel::MsSmall { .. } => Kernel::MsSmall,
            ResolvedKernel::MsLarge { .. } => Kernel::MsLarge,
            ResolvedKernel::Gaussian { .. } => Kernel::Gaussian,
            ResolvedKernel::Near { .. } => Kernel::Near,
            ResolvedKernel::Linear { .. } => Kernel::Linear,
            ResolvedKernel::SymmetricLinear { .. } => Kernel::SymmetricLinear,
            ResolvedKernel::Exponential { .. } => Kernel::Exponential,
            ResolvedKernel::Logarithm { .. } => Kernel::Logarithm,
            ResolvedKernel::Power { .. } => Kernel::Power,
            ResolvedKernel::LogisticGrowth { .. } => Kernel::LogisticGrowth,
            ResolvedKernel::LogisticDecay { .. } => Kernel::LogisticDecay,
        }
    }

    /// Membership of a single value
    #[inline]
    pub fn evaluate(&self, x: f64) -> f64 {
        match *self {
            ResolvedKernel::Small { mid_point, spread }
            | ResolvedKernel::Large { mid_point, spread } => {
                1.0 / (1.0 + (x / mid_point).powf(spread))
            }
            ResolvedKernel::MsSmall { mean, std_dev, .. } => {
                if x > mean {
                    std_dev / (x - mean + std_dev)
                } else {
                    1.0
                }
            }
            ResolvedKernel::MsLarge { mean, std_dev, .. } => {
                if x > mean {
                    1.0 - std_dev / (x - mean + std_dev)
                } else {
                    0.0
                }
            }
            ResolvedKernel::Gaussian { mid_point, spread } => {
                (-spread * (x - mid_point).powi(2)).exp()
            }
            ResolvedKernel::Near { mid_point, spread } => {
                1.0 / (1.0 + spread * (x - mid_point).powi(2))
            }
            ResolvedKernel::Linear { min_x, max_x } => {
                if x < min_x {
                    0.0
                } else if x > max_x {
                    1.0
                } else {
                    (x - min_x) / (max_x - min_x)
                }
            }
            ResolvedKernel::SymmetricLinear { min_x, max_x } => {
                let half = 0.5 * (max_x - min_x);
                let peak = min_x + half;
                if x < min_x || x > max_x {
                    0.0
                } else if x < peak {
                    (x - min_x) / half
                } else {
                    (max_x - x) / half
                }
            }
            ResolvedKernel::Exponential {
                in_shift,
                base_factor,
            } => ((x - in_shift) * base_factor).exp(),
            ResolvedKernel::Logarithm {
                in_shift,
                base_factor,
            } => ((x - in_shift) * base_factor).ln(),
            ResolvedKernel::Power { in_shift, exponent } => (x - in_shift).powf(exponent),
            ResolvedKernel::LogisticGrowth { origin, a, b, .. }
            | ResolvedKernel::LogisticDecay { origin, a, b, .. } => {
                LOGISTIC_CEILING / (1.0 + a * ((x - origin) * b).exp())
            }
        }
    }

    /// The caller-facing parameters this kernel was resolved to.
    ///
    /// Feeding them back through [`ResolvedKernel::resolve`] with the same
    /// statistics reproduces `self`.
    pub fn to_params(&self) -> KernelParams {
        let mut p = KernelParams::default();
        match *self {
            ResolvedKernel::Small { mid_point, spread }
            | ResolvedKernel::Large { mid_point, spread }
            | ResolvedKernel::Gaussian { mid_point, spread }
            | ResolvedKernel::Near { mid_point, spread } => {
                p.mid_point = Some(mid_point);
                p.spread = Some(spread);
            }
            ResolvedKernel::MsSmall {
                mean_multiplier,
                std_multiplier,
                ..
            }
            | ResolvedKernel::MsLarge {
                mean_multiplier,
                std_multiplier,
                ..
            } => {
                p.mean_multiplier = Some(mean_multiplier);
                p.std_multiplier = Some(std_multiplier);
            }
            ResolvedKernel::Linear { min_x, max_x }
            | ResolvedKernel::SymmetricLinear { min_x, max_x } => {
                p.min_x = Some(min_x);
                p.max_x = Some(max_x);
            }
            ResolvedKernel::Exponential {
                in_shift,
                base_factor,
            }
            | ResolvedKernel::Logarithm {
                in_shift,
                base_factor,
            } => {
                p.in_shift = Some(in_shift);
                p.base_factor = Some(base_factor);
            }
            ResolvedKernel::Power { in_shift, exponent } => {
                p.in_shift = Some(in_shift);
                p.exponent = Some(exponent);
            }
            ResolvedKernel::LogisticGrowth {
                y_intercept_percent,
                ..
            }
            | ResolvedKernel::LogisticDecay {
                y_intercept_percent,
                ..
            } => {
                p.y_intercept_percent = Some(y_intercept_percent);
            }
        }
        p
    }
}

/// Default `(in_shift, exponent)` for the power kernel, chosen by the lower
/// end of the target scale.
fn power_defaults(stats: &LayerStatistics, scale: ScaleRange) -> Result<(f64, f64)> {
    if scale.from == 0.0 {
        let in_shift = stats.min;
        if scale.to <= 1.0 {
            return Ok((in_shift, 1.0));
        }
        let span = stats.max - in_shift;
        if span == 0.0 {
            return Err(degenerate("power exponent derivation (max == min)", stats.min));
        }
        Ok((in_shift, scale.to.ln() / span))
    } else if scale.from == 1.0 {
        let in_shift = stats.min - 1.0;
        if scale.to <= 0.0 {
            return Err(Error::config("power kernel needs a positive toScale"));
        }
        let denom = (stats.max - in_shift).ln();
        if denom == 0.0 {
            return Err(degenerate("power exponent derivation (max == min)", stats.min));
        }
        Ok((in_shift, scale.to.ln() / denom))
    } else {
        Ok((stats.min, 2.0))
    }
}
