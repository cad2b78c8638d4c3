//! Row-parallel per-cell passes shared by the transform and rescale stages

use crate::maybe_rayon::*;
use suitgis_core::raster::Raster;
use suitgis_core::Result;

/// Apply `f` to every valid cell of `raster`, producing a raster of the same
/// shape and georeferencing.
///
/// No-data cells stay NaN. Results of `f` are written unchanged, so callers
/// check valid cells with [`count_lost_cells`].
pub(crate) fn map_cells<F>(raster: &Raster<f64>, f: F) -> Result<Raster<f64>>
where
    F: Fn(f64) -> f64 + Sync + Send,
{
    let (rows, cols) = raster.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let val = unsafe { raster.get_unchecked(row, col) };
                if raster.is_nodata(val) {
                    continue;
                }
                *out = f(val);
            }
            row_data
        })
        .collect();

    let mut output = raster.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    output.replace_data(data)?;
    Ok(output)
}

/// Cells that are valid in `source` but not finite in `mapped`
pub(crate) fn count_lost_cells(source: &Raster<f64>, mapped: &Raster<f64>) -> usize {
    source
        .data()
        .iter()
        .zip(mapped.data().iter())
        .filter(|(&s, m)| !source.is_nodata(s) && !m.is_finite())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_cells_preserves_nodata() {
        let raster = Raster::from_vec(vec![1.0, f64::NAN, 3.0, 4.0], 2, 2).unwrap();
        let out = map_cells(&raster, |v| v * 2.0).unwrap();
        assert_eq!(out.get(0, 0).unwrap(), 2.0);
        assert!(out.get(0, 1).unwrap().is_nan());
        assert_eq!(out.get(1, 1).unwrap(), 8.0);
    }

    #[test]
    fn test_lost_cells_ignore_source_nodata() {
        let raster = Raster::from_vec(vec![-1.0, 0.0, 1.0, f64::NAN], 1, 4).unwrap();
        let out = map_cells(&raster, f64::ln).unwrap();
        assert!(out.get(0, 0).unwrap().is_nan());
        assert_eq!(out.get(0, 1).unwrap(), f64::NEG_INFINITY);
        assert_eq!(out.get(0, 2).unwrap(), 0.0);
        assert_eq!(count_lost_cells(&raster, &out), 2);
    }

    #[test]
    fn test_map_cells_honours_explicit_sentinel() {
        let mut raster = Raster::from_vec(vec![-9999.0, 5.0], 1, 2).unwrap();
        raster.set_nodata(Some(-9999.0));
        let out = map_cells(&raster, |v| v + 1.0).unwrap();
        assert!(out.get(0, 0).unwrap().is_nan());
        assert_eq!(out.get(0, 1).unwrap(), 6.0);
    }
}
