use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Grid mismatch: {0}")]
    GridMismatch(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
