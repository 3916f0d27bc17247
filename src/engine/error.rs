use thiserror::Error;

/// Range violations caught once at construction. A viewer never starts with
/// an invalid configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Empty frame sequence")]
    EmptySequence,

    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f64 },

    #[error("Max scale must be at least 1, got {0}")]
    MaxScale(f64),

    #[error("Start frame {index} out of range (total: {total})")]
    StartFrameOutOfRange { index: usize, total: usize },
}

/// A frame that could not be turned into a bitmap. Counted as loaded for
/// progress purposes, skipped when drawing.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Image format error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid bitmap dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Bitmap buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("Could not load {path}: {message}")]
    Source { path: String, message: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
