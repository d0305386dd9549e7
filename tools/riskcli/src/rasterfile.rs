//! Rasters stored as JSON documents, nodata cells are written as `null`.

use std::path::Path;

use anyhow::Context;
use geo::{CellSize, DenseRaster, GeoReference, Point, RasterNum, RasterSize};
use serde::{Deserialize, Serialize};

use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RasterFile<T> {
    pub projection: String,
    pub top_left: [f64; 2],
    /// `[x, y]`, the y size is negative for north-up rasters
    pub cell_size: [f64; 2],
    pub rows: usize,
    pub cols: usize,
    pub values: Vec<Option<T>>,
}

impl<T: RasterNum + Serialize> RasterFile<T> {
    pub fn from_raster(raster: &DenseRaster<T>) -> Self {
        let georef = raster.geo_reference();
        let top_left = georef.top_left();
        let cell_size = georef.cell_size();

        RasterFile {
            projection: georef.projection().to_string(),
            top_left: [top_left.x(), top_left.y()],
            cell_size: [cell_size.x(), cell_size.y()],
            rows: georef.rows(),
            cols: georef.columns(),
            values: raster.masked_data(),
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json).with_context(|| format!("Failed to write raster '{}'", path.display()))
    }
}

impl<T: RasterNum> RasterFile<T> {
    pub fn into_raster(self) -> Result<DenseRaster<T>> {
        let georef = GeoReference::with_top_left(
            self.projection,
            RasterSize::with_rows_cols(self.rows, self.cols),
            Point::new(self.top_left[0], self.top_left[1]),
            CellSize::new(self.cell_size[0], self.cell_size[1]),
        );

        Ok(DenseRaster::from_iter(georef, self.values.into_iter())?)
    }
}

pub fn read_raster(path: &Path) -> Result<DenseRaster<f64>> {
    let json = std::fs::read_to_string(path).with_context(|| format!("Failed to read raster '{}'", path.display()))?;
    let file: RasterFile<f64> = serde_json::from_str(&json).with_context(|| format!("Invalid raster file '{}'", path.display()))?;
    file.into_raster()
        .with_context(|| format!("Invalid raster file '{}'", path.display()))
}

pub fn write_raster<T: RasterNum + Serialize>(raster: &DenseRaster<T>, path: &Path) -> Result<()> {
    log::debug!("Writing raster {} to '{}'", raster.size(), path.display());
    RasterFile::from_raster(raster).write(path)
}
