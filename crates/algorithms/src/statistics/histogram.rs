//! Equal-width histograms
//!
//! Rendering is left to the caller; this only produces bin edges and counts
//! for source layers, transformed layers and composite surfaces.

use serde::Serialize;
use suitgis_core::{Error, Result};

/// Histogram with `counts.len()` bins and `counts.len() + 1` edges.
///
/// Every bin is half-open `[lo, hi)` except the last, which is closed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// `(lo, hi, count)` per bin
    pub fn bins(&self) -> impl Iterator<Item = (f64, f64, usize)> + '_ {
        self.edges
            .windows(2)
            .zip(self.counts.iter())
            .map(|(e, &c)| (e[0], e[1], c))
    }

    /// Number of values binned
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Bin the finite entries of `values` into `n_bins` equal-width bins over
/// their `[min, max]` range.
///
/// A constant sequence is binned over `[v - 0.5, v + 0.5]`.
pub fn histogram(values: &[f64], n_bins: usize) -> Result<Histogram> {
    if n_bins == 0 {
        return Err(Error::InvalidParameter {
            name: "n_bins",
            value: n_bins.to_string(),
            reason: "must be at least 1".into(),
        });
    }

    let (mut lo, mut hi) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        return Err(Error::EmptyLayer);
    }
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / n_bins as f64;
    let edges: Vec<f64> = (0..=n_bins).map(|i| lo + i as f64 * width).collect();

    let mut counts = vec![0usize; n_bins];
    for &v in values.iter().filter(|v| v.is_finite()) {
        let idx = (((v - lo) / width).floor() as usize).min(n_bins - 1);
        counts[idx] += 1;
    }

    Ok(Histogram { edges, counts })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_counts() {
        let h = histogram(&[1.0, 2.0, 2.0, 3.0, 3.0, 3.0, 4.0], 3).unwrap();
        assert_eq!(h.edges, vec![1.0, 2.0, 3.0, 4.0]);
        // max lands in the closed last bin
        assert_eq!(h.counts, vec![1, 2, 4]);
        assert_eq!(h.total(), 7);
    }

    #[test]
    fn test_histogram_skips_nan() {
        let h = histogram(&[0.0, f64::NAN, 10.0], 2).unwrap();
        assert_eq!(h.counts, vec![1, 1]);
    }

    #[test]
    fn test_constant_values() {
        let h = histogram(&[5.0; 4], 4).unwrap();
        assert_eq!(h.edges.first(), Some(&4.5));
        assert_eq!(h.edges.last(), Some(&5.5));
        assert_eq!(h.total(), 4);
    }

    #[test]
    fn test_bins_iterator() {
        let h = histogram(&[0.0, 1.0], 2).unwrap();
        let bins: Vec<_> = h.bins().collect();
        assert_eq!(bins, vec![(0.0, 0.5, 1), (0.5, 1.0, 1)]);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            histogram(&[1.0], 0).unwrap_err(),
            Error::InvalidParameter { name: "n_bins", .. }
        ));
        assert!(matches!(histogram(&[], 10).unwrap_err(), Error::EmptyLayer));
    }
}
