//! Algorithms for raster data processing (limits, quantiles, resampling).

mod limits;
mod quantile;
mod resample;

pub use limits::{min_max, min_max_masked};
pub use quantile::{quantiles, quantiles_masked};
pub use resample::{ResampleAlgorithm, resample};

use crate::{Error, RasterNum, Result, raster::DenseRaster};

/// Verifies the cell mask covers every cell of the raster
pub(crate) fn check_mask<T: RasterNum>(ras: &DenseRaster<T>, mask: &[bool]) -> Result<()> {
    if mask.len() != ras.len() {
        return Err(Error::InvalidArgument(format!(
            "Mask length {} does not match the raster cell count {}",
            mask.len(),
            ras.len()
        )));
    }

    Ok(())
}

/// The values of the cells that contain data and are selected by the mask
pub(crate) fn masked_values<'a, T: RasterNum>(ras: &'a DenseRaster<T>, mask: &'a [bool]) -> impl Iterator<Item = T> + 'a {
    ras.iter()
        .zip(mask.iter())
        .filter(|&(v, &inside)| inside && !v.is_nodata())
        .map(|(&v, _)| v)
}
