use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Grid mismatch for '{layer}': {reason}")]
    GridMismatch { layer: String, reason: String },
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Degenerate normalization for layer '{layer}': every value within the region equals {value}")]
    DegenerateNormalization { layer: String, value: f64 },
    #[error("Insufficient samples for validation: {valid} valid sample(s), at least {required} required")]
    InsufficientSamples { valid: usize, required: usize },
    #[error("Empty region: {0}")]
    EmptyRegion(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Geo(#[from] geo::Error),
}

impl Error {
    /// Attaches the name of the offending layer to grid errors of the raster library
    pub(crate) fn for_layer(err: geo::Error, layer: &str) -> Self {
        match err {
            geo::Error::GridMismatch(reason) => Error::GridMismatch {
                layer: layer.to_string(),
                reason,
            },
            other => Error::Geo(other),
        }
    }
}
