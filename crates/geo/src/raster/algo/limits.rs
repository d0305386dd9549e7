use std::ops::RangeInclusive;

use itertools::Itertools;
use itertools::MinMaxResult::{MinMax, NoElements, OneElement};

use crate::{RasterNum, Result, raster::DenseRaster};

fn range_of<T: RasterNum>(values: impl Iterator<Item = T>) -> Option<RangeInclusive<T>> {
    match values.minmax() {
        NoElements => None,
        OneElement(x) => Some(x..=x),
        MinMax(x, y) => Some(x..=y),
    }
}

/// The value range of the raster, `None` if the raster contains no data
pub fn min_max<T: RasterNum>(ras: &DenseRaster<T>) -> Option<RangeInclusive<T>> {
    range_of(ras.iter_values())
}

/// The value range of the cells selected by the mask, `None` if none of the selected cells contain data
pub fn min_max_masked<T: RasterNum>(ras: &DenseRaster<T>, mask: &[bool]) -> Result<Option<RangeInclusive<T>>> {
    super::check_mask(ras, mask)?;
    Ok(range_of(super::masked_values(ras, mask)))
}
