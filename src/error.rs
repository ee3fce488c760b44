use thiserror::Error;

/// Errors surfaced by the engine.
///
/// Out-of-range pixel access is deliberately absent: surfaces clamp or ignore
/// it instead of failing.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("minimum {min} is greater than maximum {max}")]
    InvalidRange { min: f64, max: f64 },

    #[error("invalid canvas dimensions {width}x{height} (allowed 1x1 to {max_width}x{max_height})")]
    InvalidDimensions {
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    },

    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid document: {0}")]
    Document(String),

    #[error("settings error: {0}")]
    Settings(#[from] serde_json::Error),

    #[error("unsupported image format '{0}'")]
    UnsupportedFormat(String),
}

impl From<Box<bincode::ErrorKind>> for EngineError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        EngineError::Document(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
