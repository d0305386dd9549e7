use approx::relative_eq;
use geo::{CellSize, DenseRaster, GeoReference, Nodata, Point, RasterSize};

use crate::Result;

/// Placeholder used in the literal test grids for cells without data
pub const NOD: f64 = 255.0;

/// North-up grid with 100m cells and its lower left corner at the origin
pub fn grid(rows: usize, cols: usize) -> GeoReference {
    grid_with_cell_size(rows, cols, 100.0)
}

pub fn grid_with_cell_size(rows: usize, cols: usize, cell_size: f64) -> GeoReference {
    GeoReference::with_origin(
        "EPSG:3826",
        RasterSize::with_rows_cols(rows, cols),
        Point::new(0.0, 0.0),
        CellSize::square(cell_size),
    )
}

pub fn raster(rows: usize, cols: usize, data: &[f64]) -> Result<DenseRaster<f64>> {
    raster_on(grid(rows, cols), data)
}

pub fn raster_on(georef: GeoReference, data: &[f64]) -> Result<DenseRaster<f64>> {
    let data = data.iter().map(|&v| if relative_eq!(v, NOD) { f64::NODATA } else { v }).collect();
    Ok(DenseRaster::new(georef, data)?)
}

pub fn class_raster(rows: usize, cols: usize, data: &[u8]) -> Result<DenseRaster<u8>> {
    Ok(DenseRaster::new(grid(rows, cols), data.to_vec())?)
}
