//! Error types for SuitGis

use thiserror::Error;

/// Main error type for SuitGis operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// Two rasters that must line up cell-for-cell have different shapes
    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    /// The layer holds no finite cell at all
    #[error("Layer has no finite cells")]
    EmptyLayer,

    /// Unknown transformation kind or kernel, or a parameter that cannot be derived
    #[error("Configuration error: {0}")]
    Config(String),

    /// A denominator collapsed to zero (constant distribution, zero-width range)
    #[error("Degenerate range in {what}: {value}")]
    DegenerateRange { what: &'static str, value: f64 },

    #[error("Weight count mismatch: {criteria} criteria but {weights} weights")]
    WeightCountMismatch { criteria: usize, weights: usize },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for [`Error::Config`]
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }
}

/// Result type alias for SuitGis operations
pub type Result<T> = std::result::Result<T, Error>;
