//! Discrete value remaps
//!
//! Both tables are lookups, not classifications: a value with no entry keeps
//! its original value instead of becoming no-data.

use std::collections::HashMap;

/// Hash key for an exact `f64` match. `-0.0` and `0.0` share a key.
fn key(v: f64) -> u64 {
    if v == 0.0 {
        0.0f64.to_bits()
    } else {
        v.to_bits()
    }
}

/// Exact-match remap.
///
/// Duplicate source values keep the last target, matching a dictionary
/// built from the pairs in order.
#[derive(Debug, Clone, PartialEq)]
pub struct UniqueRemap {
    pairs: Vec<(f64, f64)>,
    lookup: HashMap<u64, f64>,
}

impl UniqueRemap {
    pub fn new(pairs: Vec<(f64, f64)>) -> Self {
        let lookup = pairs.iter().map(|&(from, to)| (key(from), to)).collect();
        Self { pairs, lookup }
    }

    /// Remapped value, or `v` when it has no entry
    #[inline]
    pub fn apply(&self, v: f64) -> f64 {
        self.lookup.get(&key(v)).copied().unwrap_or(v)
    }

    /// Pairs as given
    pub fn pairs(&self) -> &[(f64, f64)] {
        &self.pairs
    }
}

/// One `(start, end] -> value` interval
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeEntry {
    pub start: f64,
    pub end: f64,
    pub value: f64,
}

impl RangeEntry {
    pub fn new(start: f64, end: f64, value: f64) -> Self {
        Self { start, end, value }
    }

    #[inline]
    pub fn contains(&self, v: f64) -> bool {
        v > self.start && v <= self.end
    }
}

/// Interval remap over left-open, right-closed intervals.
///
/// Overlapping intervals are allowed; the first one listed wins.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeRemap {
    entries: Vec<RangeEntry>,
}

impl RangeRemap {
    pub fn new(intervals: Vec<(f64, f64, f64)>) -> Self {
        Self {
            entries: intervals
                .into_iter()
                .map(|(start, end, value)| RangeEntry::new(start, end, value))
                .collect(),
        }
    }

    /// Remapped value, or `v` when no interval contains it
    #[inline]
    pub fn apply(&self, v: f64) -> f64 {
        self.entries
            .iter()
            .find(|e| e.contains(v))
            .map_or(v, |e| e.value)
    }

    pub fn entries(&self) -> &[RangeEntry] {
        &self.entries
    }

    /// `(start, end, value)` triples as given
    pub fn intervals(&self) -> Vec<(f64, f64, f64)> {
        self.entries
            .iter()
            .map(|e| (e.start, e.end, e.value))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_hit_and_miss() {
        let remap = UniqueRemap::new(vec![(41.0, 10.0), (42.0, 10.0), (11.0, 1.0)]);
        assert_eq!(remap.apply(41.0), 10.0);
        assert_eq!(remap.apply(11.0), 1.0);
        // unmapped values pass through
        assert_eq!(remap.apply(7.0), 7.0);
    }

    #[test]
    fn test_unique_last_duplicate_wins() {
        let remap = UniqueRemap::new(vec![(1.0, 5.0), (1.0, 9.0)]);
        assert_eq!(remap.apply(1.0), 9.0);
        assert_eq!(remap.pairs().len(), 2);
    }

    #[test]
    fn test_unique_signed_zero() {
        let remap = UniqueRemap::new(vec![(-0.0, 3.0)]);
        assert_eq!(remap.apply(0.0), 3.0);
    }

    #[test]
    fn test_range_bounds() {
        let remap = RangeRemap::new(vec![(0.0, 10.0, 1.0), (10.0, 20.0, 2.0)]);
        // start is exclusive
        assert_eq!(remap.apply(0.0), 0.0);
        assert_eq!(remap.apply(0.5), 1.0);
        // end is inclusive
        assert_eq!(remap.apply(10.0), 1.0);
        assert_eq!(remap.apply(10.1), 2.0);
        assert_eq!(remap.apply(20.0), 2.0);
        assert_eq!(remap.apply(25.0), 25.0);
    }

    #[test]
    fn test_range_overlap_first_wins() {
        let remap = RangeRemap::new(vec![(0.0, 10.0, 1.0), (5.0, 15.0, 2.0)]);
        assert_eq!(remap.apply(7.0), 1.0);
        assert_eq!(remap.apply(12.0), 2.0);
        assert_eq!(remap.intervals(), vec![(0.0, 10.0, 1.0), (5.0, 15.0, 2.0)]);
    }
}
