//! Flood risk mapping from multiple raster criteria.
//!
//! [`geo`] provides the georeferenced raster primitives and the resampling, limits and quantile algorithms,
//! [`risk`] builds the composite risk index, its classification and the accuracy assessment on top of them.

pub use geo;
pub use risk;
