//! Brings layers of arbitrary resolution onto the analysis grid.

use geo::{GeoReference, raster::algo};

use crate::{Error, RasterLayer, Result};

/// Resamples the layer onto the target grid using the aggregation rule of its measurement kind.
///
/// Continuous layers are averaged, categorical layers take the dominant class and extensive layers are summed,
/// every source cell contributing in proportion to the part of its footprint that falls inside the target cell.
/// Nodata source cells are ignored, target cells without any contributing data become nodata.
pub fn resample(layer: &RasterLayer, target: &GeoReference) -> Result<RasterLayer> {
    let algorithm = layer.kind().resample_algorithm();
    log::debug!(
        "Resample layer '{}' ({}) from {} to {} using {:?}",
        layer.name(),
        layer.kind(),
        layer.grid().raster_size(),
        target.raster_size(),
        algorithm
    );

    let raster = algo::resample(layer.raster(), target, algorithm).map_err(|err| Error::for_layer(err, layer.name()))?;
    Ok(layer.with_raster(raster))
}
