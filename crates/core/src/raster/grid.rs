//! Main Raster type

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, RasterElement};
use ndarray::{Array2, ArrayView2};

/// A georeferenced 2D raster grid.
///
/// `Raster<T>` stores values of type `T` in a row-major grid together with
/// its [`GeoTransform`] and an optional explicit no-data value. For floating
/// point rasters NaN is always treated as no-data, whether or not a sentinel
/// is set.
///
/// # Example
///
/// ```ignore
/// use suitgis_core::Raster;
///
/// let mut raster: Raster<f64> = Raster::new(100, 100);
/// raster.set(10, 20, 42.0)?;
/// let stats = raster.statistics();
/// ```
#[derive(Debug, Clone)]
pub struct Raster<T: RasterElement> {
    /// Raster data stored in row-major order (row, col)
    data: Array2<T>,
    /// Affine transformation
    transform: GeoTransform,
    /// No-data value
    nodata: Option<T>,
}

impl<T: RasterElement> Raster<T> {
    /// Create a new raster filled with zeros
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::from_array(Array2::zeros((rows, cols)))
    }

    /// Create a new raster filled with a specific value
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self::from_array(Array2::from_elem((rows, cols), value))
    }

    /// Create a raster from row-major data
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }

        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;

        Ok(Self::from_array(array))
    }

    /// Create a raster from an ndarray
    pub fn from_array(data: Array2<T>) -> Self {
        Self {
            data,
            transform: GeoTransform::default(),
            nodata: None,
        }
    }

    /// Create a zero-filled raster of another element type sharing this
    /// raster's georeferencing
    pub fn with_same_meta<U: RasterElement>(&self, rows: usize, cols: usize) -> Raster<U> {
        Raster {
            data: Array2::zeros((rows, cols)),
            transform: self.transform,
            nodata: None,
        }
    }

    /// Replace the cell data, keeping georeferencing and no-data.
    ///
    /// `data` must be row-major with exactly `rows * cols` cells.
    pub fn replace_data(&mut self, data: Vec<T>) -> Result<()> {
        let (rows, cols) = self.shape();
        self.data = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;
        Ok(())
    }

    // Dimensions

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the raster has no cells
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // Data access

    /// Get value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Get value at (row, col) without bounds checking
    ///
    /// # Safety
    /// Caller must ensure row < self.rows() and col < self.cols()
    pub unsafe fn get_unchecked(&self, row: usize, col: usize) -> T {
        unsafe { *self.data.uget((row, col)) }
    }

    /// Set value at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        if row >= self.rows() || col >= self.cols() {
            return Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        self.data[(row, col)] = value;
        Ok(())
    }

    /// Get a view of the underlying data
    pub fn view(&self) -> ArrayView2<'_, T> {
        self.data.view()
    }

    /// Get a reference to the underlying array
    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    // Metadata

    /// Get the geotransform
    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Set the geotransform
    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    /// Get the no-data value
    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    /// Set the no-data value
    pub fn set_nodata(&mut self, nodata: Option<T>) {
        self.nodata = nodata;
    }

    // Value checks

    /// Check if a value is no-data
    pub fn is_nodata(&self, value: T) -> bool {
        value.is_nodata(self.nodata)
    }

    /// Check if cell at (row, col) contains no-data
    pub fn is_nodata_at(&self, row: usize, col: usize) -> Result<bool> {
        let value = self.get(row, col)?;
        Ok(self.is_nodata(value))
    }

    /// Widen every cell to `f64`, mapping no-data cells to NaN.
    ///
    /// Integer class rasters go through this before scoring.
    pub fn to_f64(&self) -> Raster<f64> {
        let data = self.data.mapv(|v| {
            if v.is_nodata(self.nodata) {
                f64::NAN
            } else {
                v.to_f64().unwrap_or(f64::NAN)
            }
        });
        Raster {
            data,
            transform: self.transform,
            nodata: Some(f64::NAN),
        }
    }

    /// All finite, non-no-data cell values in row-major order
    pub fn finite_values(&self) -> Vec<f64> {
        self.data
            .iter()
            .filter(|v| !self.is_nodata(**v))
            .filter_map(|v| v.to_f64())
            .filter(|v| v.is_finite())
            .collect()
    }

    // Statistics

    /// Calculate basic statistics over the finite cells
    pub fn statistics(&self) -> RasterStatistics {
        let values = self.finite_values();
        let count = values.len();

        if count == 0 {
            return RasterStatistics {
                min: None,
                max: None,
                mean: None,
                std_dev: None,
                valid_count: 0,
                nodata_count: self.len(),
            };
        }

        let (min, max, sum) = values.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, 0.0),
            |(lo, hi, s), &v| (lo.min(v), hi.max(v), s + v),
        );
        let mean = sum / count as f64;
        let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / count as f64;

        RasterStatistics {
            min: Some(min),
            max: Some(max),
            // Summation error can push the mean a hair outside [min, max]
            mean: Some(mean.clamp(min, max)),
            std_dev: Some(var.sqrt()),
            valid_count: count,
            nodata_count: self.len() - count,
        }
    }
}

/// Basic statistics for a raster.
///
/// The standard deviation is the population form (divides by N).
#[derive(Debug, Clone, PartialEq)]
pub struct RasterStatistics {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub valid_count: usize,
    pub nodata_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_raster_creation() {
        let raster: Raster<f32> = Raster::new(100, 200);
        assert_eq!(raster.rows(), 100);
        assert_eq!(raster.cols(), 200);
        assert_eq!(raster.shape(), (100, 200));
    }

    #[test]
    fn test_raster_access() {
        let mut raster: Raster<f64> = Raster::new(10, 10);
        raster.set(5, 5, 42.0).unwrap();
        assert_eq!(raster.get(5, 5).unwrap(), 42.0);
        assert!(raster.get(10, 0).is_err());
        assert!(raster.set(0, 10, 1.0).is_err());
    }

    #[test]
    fn test_from_vec_rejects_bad_length() {
        let err = Raster::from_vec(vec![1.0f64; 5], 2, 3).unwrap_err();
        assert!(matches!(err, Error::InvalidDimensions { width: 3, height: 2 }));
    }

    #[test]
    fn test_finite_values_skip_nodata() {
        let mut raster = Raster::from_vec(vec![1.0, f64::NAN, -9999.0, 4.0], 2, 2).unwrap();
        raster.set_nodata(Some(-9999.0));
        assert_eq!(raster.finite_values(), vec![1.0, 4.0]);
        assert!(raster.is_nodata_at(0, 1).unwrap());
        assert!(raster.is_nodata_at(1, 0).unwrap());
    }

    #[test]
    fn test_raster_statistics() {
        let mut raster: Raster<f64> = Raster::new(10, 10);
        for i in 0..10 {
            for j in 0..10 {
                raster.set(i, j, (i * 10 + j) as f64).unwrap();
            }
        }

        let stats = raster.statistics();
        assert_eq!(stats.min, Some(0.0));
        assert_eq!(stats.max, Some(99.0));
        assert_relative_eq!(stats.mean.unwrap(), 49.5);
        // population std of 0..99
        assert_relative_eq!(stats.std_dev.unwrap(), 28.866_070_047_722_12, epsilon = 1e-9);
        assert_eq!(stats.valid_count, 100);
        assert_eq!(stats.nodata_count, 0);
    }

    #[test]
    fn test_statistics_all_nodata() {
        let raster = Raster::filled(3, 3, f64::NAN);
        let stats = raster.statistics();
        assert_eq!(stats.min, None);
        assert_eq!(stats.valid_count, 0);
        assert_eq!(stats.nodata_count, 9);
    }

    #[test]
    fn test_integer_raster_to_f64() {
        let mut landuse: Raster<u8> = Raster::from_vec(vec![11, 41, 255, 42], 2, 2).unwrap();
        landuse.set_nodata(Some(255));
        let wide = landuse.to_f64();
        assert_eq!(wide.get(0, 1).unwrap(), 41.0);
        assert!(wide.get(1, 0).unwrap().is_nan());
        assert_eq!(wide.finite_values(), vec![11.0, 41.0, 42.0]);
    }
}
