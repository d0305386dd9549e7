use approx::relative_eq;

use crate::{CellSize, GeoReference, Point, RasterNum, RasterSize};

/// Placeholder used in the literal test grids for cells without data
pub const NOD: f64 = 255.0;

pub fn create_vec<T: RasterNum>(data: &[f64]) -> Vec<T> {
    data.iter()
        .map(|&v| {
            if relative_eq!(v, NOD) {
                T::NODATA
            } else {
                num::NumCast::from(v).expect("f64 could not be converted to the specified type")
            }
        })
        .collect()
}

/// North-up grid with 100m cells and its top left corner at (0, rows * 100)
pub fn test_georef(rows: usize, cols: usize) -> GeoReference {
    test_georef_with_cell_size(rows, cols, 100.0)
}

pub fn test_georef_with_cell_size(rows: usize, cols: usize, cell_size: f64) -> GeoReference {
    GeoReference::with_origin(
        "EPSG:3826",
        RasterSize::with_rows_cols(rows, cols),
        Point::new(0.0, 0.0),
        CellSize::square(cell_size),
    )
}
