use std::fmt;

use geo::{CellIterator, DenseRaster, GeoReference, Rect};

use crate::{Error, Result};

/// The area of interest: normalization statistics, breakpoints, sampling and area summaries
/// only consider the cells inside the region.
#[derive(Debug, Clone, Default)]
pub enum Region {
    /// Every cell of the analysis grid
    #[default]
    Full,
    /// The cells whose center lies within the rectangle (edges inclusive)
    Extent(Rect<f64>),
    /// The cells of an aligned mask raster that contain a non-zero value
    Mask(DenseRaster<u8>),
}

impl Region {
    pub fn extent(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Region::Extent(Rect::from_bounds(min_x, min_y, max_x, max_y))
    }

    /// Per cell membership flags for the given grid in row-major order
    pub fn cell_mask(&self, grid: &GeoReference) -> Result<Vec<bool>> {
        match self {
            Region::Full => Ok(vec![true; grid.raster_size().cell_count()]),
            Region::Extent(rect) => Ok(CellIterator::for_raster_with_size(grid.raster_size())
                .map(|cell| rect.contains_point(grid.cell_center(cell)))
                .collect()),
            Region::Mask(mask) => {
                mask.geo_reference()
                    .check_aligned(grid)
                    .map_err(|err| Error::for_layer(err, "region mask"))?;
                Ok(mask.iter_opt().map(|v| v.is_some_and(|v| v != 0)).collect())
            }
        }
    }

    /// The number of grid cells inside the region
    pub fn cell_count(&self, grid: &GeoReference) -> Result<usize> {
        Ok(self.cell_mask(grid)?.into_iter().filter(|&inside| inside).count())
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::Full => write!(f, "full grid"),
            Region::Extent(rect) => write!(
                f,
                "extent [{}, {}, {}, {}]",
                rect.top_left().x(),
                rect.bottom_right().y(),
                rect.bottom_right().x(),
                rect.top_left().y()
            ),
            Region::Mask(mask) => write!(f, "mask {}", mask.size()),
        }
    }
}
