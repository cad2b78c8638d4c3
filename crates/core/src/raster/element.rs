//! Cell value trait for rasters

use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// Types that can be stored in a raster cell.
///
/// Suitability layers are scored as `f64`, but source layers frequently
/// arrive as integer class codes (land use, soil type), so the grid stays
/// generic and every element knows how to widen itself to `f64`.
pub trait RasterElement:
    Copy + Clone + Debug + PartialOrd + PartialEq + NumCast + Zero + Send + Sync + 'static
{
    /// No-data sentinel used when a value cannot be represented
    fn default_nodata() -> Self;

    /// Whether this value is no-data, given the raster's explicit sentinel
    fn is_nodata(&self, nodata: Option<Self>) -> bool;

    /// Widen to `f64`
    fn to_f64(self) -> Option<f64> {
        NumCast::from(self)
    }

    /// Narrow from `f64`, `None` if the value does not fit
    fn from_f64(value: f64) -> Option<Self> {
        NumCast::from(value)
    }
}

macro_rules! impl_raster_element_int {
    ($($t:ty),*) => {$(
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                <$t>::MIN
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                nodata == Some(*self)
            }
        }
    )*};
}

macro_rules! impl_raster_element_float {
    ($($t:ty),*) => {$(
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                <$t>::NAN
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                if self.is_nan() {
                    return true;
                }
                match nodata {
                    Some(nd) if !nd.is_nan() => (self - nd).abs() < <$t>::EPSILON * 100.0,
                    _ => false,
                }
            }
        }
    )*};
}

impl_raster_element_int!(i16, i32, u8, u16, u32);
impl_raster_element_float!(f32, f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_nan_is_always_nodata() {
        assert!(f64::NAN.is_nodata(None));
        assert!(f32::NAN.is_nodata(Some(-9999.0)));
        assert!(!1.5f64.is_nodata(Some(f64::NAN)));
    }

    #[test]
    fn test_explicit_sentinel() {
        assert!((-9999.0f64).is_nodata(Some(-9999.0)));
        assert!(255u8.is_nodata(Some(255)));
        assert!(!254u8.is_nodata(Some(255)));
        assert!(!0i32.is_nodata(None));
    }

    #[test]
    fn test_widen_and_narrow() {
        assert_eq!(41u8.to_f64(), Some(41.0));
        assert_eq!(u8::from_f64(300.0), None);
        assert_eq!(i16::from_f64(-12.0), Some(-12));
    }
}
