//! Affine georeferencing carried alongside raster data

use serde::{Deserialize, Serialize};

/// North-up affine transform of a raster.
///
/// Suitability outputs inherit the transform of the layer they were derived
/// from, so a scored grid lines up with its source when written back to disk:
/// ```text
/// x = origin_x + col * pixel_width
/// y = origin_y + row * pixel_height
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    /// Cell size in X
    pub pixel_width: f64,
    /// Cell size in Y, negative for north-up rasters
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// Build from the GeoTIFF ModelPixelScale and ModelTiepoint tag values.
    ///
    /// Returns `None` when either tag is too short to describe a transform.
    pub fn from_tiff_tags(scale: &[f64], tiepoint: &[f64]) -> Option<Self> {
        if scale.len() < 2 || tiepoint.len() < 6 {
            return None;
        }
        // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
        Some(Self::new(
            tiepoint[3] - tiepoint[0] * scale[0],
            tiepoint[4] + tiepoint[1] * scale[1],
            scale[0],
            -scale[1],
        ))
    }

    /// ModelPixelScale and ModelTiepoint tag values for this transform
    pub fn to_tiff_tags(&self) -> ([f64; 3], [f64; 6]) {
        (
            [self.pixel_width, self.pixel_height.abs(), 0.0],
            [0.0, 0.0, 0.0, self.origin_x, self.origin_y, 0.0],
        )
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}
