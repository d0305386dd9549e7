#![warn(clippy::unwrap_used)]

pub type Result<T = ()> = std::result::Result<T, Error>;

mod cell;
mod error;
mod georeference;
mod geotransform;
mod nodata;
pub mod raster;
mod rasternum;
mod rastersize;
pub mod rect;
#[cfg(test)]
mod testutils;

#[doc(inline)]
pub use cell::Cell;
#[doc(inline)]
pub use cell::CellIterator;
#[doc(inline)]
pub use error::Error;
#[doc(inline)]
pub use georeference::CellSize;
#[doc(inline)]
pub use georeference::GeoReference;
#[doc(inline)]
pub use geotransform::GeoTransform;
#[doc(inline)]
pub use nodata::Nodata;
#[doc(inline)]
pub use raster::DenseRaster;
#[doc(inline)]
pub use rasternum::RasterNum;
#[doc(inline)]
pub use rastersize::RasterSize;
#[doc(inline)]
pub use rect::Rect;

pub type Point<T = f64> = geo_types::Point<T>;
