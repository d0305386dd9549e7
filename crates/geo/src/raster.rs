//! Dense georeferenced rasters and the algorithms operating on them.

pub mod algo;
mod denseraster;

#[doc(inline)]
pub use denseraster::DenseRaster;
