use approx::{AbsDiffEq, RelativeEq, relative_eq};

use crate::{Cell, Error, GeoTransform, Point, RasterSize, Result};

/// Relative tolerance used when deciding whether two grids describe the same cells
const GRID_EPSILON: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellSize {
    x: f64,
    y: f64,
}

impl CellSize {
    pub const fn new(x: f64, y: f64) -> Self {
        CellSize { x, y }
    }

    /// Square cells for a north-up raster (negative y size)
    pub const fn square(size: f64) -> Self {
        CellSize::new(size, -size)
    }

    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.x != 0.0 && self.y != 0.0
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    /// Surface covered by a single cell in squared map units
    pub fn area(&self) -> f64 {
        (self.x * self.y).abs()
    }
}

impl AbsDiffEq for CellSize {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        f64::abs_diff_eq(&self.x, &other.x, epsilon) && f64::abs_diff_eq(&self.y, &other.y, epsilon)
    }
}

impl RelativeEq for CellSize {
    fn default_max_relative() -> f64 {
        f64::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: f64, max_relative: f64) -> bool {
        f64::relative_eq(&self.x, &other.x, epsilon, max_relative) && f64::relative_eq(&self.y, &other.y, epsilon, max_relative)
    }
}

/// Describes the grid a raster is defined on: coordinate reference system, cell size and extent.
///
/// All rasters that are combined cell by cell must share the same `GeoReference`,
/// use [`GeoReference::check_aligned`] to verify this before combining them.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoReference {
    /// The projection definition (e.g. `EPSG:4326`), empty when unknown
    projection: String,
    size: RasterSize,
    geo_transform: GeoTransform,
}

impl GeoReference {
    pub fn new<S: Into<String>>(projection: S, size: RasterSize, geo_transform: GeoTransform) -> Self {
        GeoReference {
            projection: projection.into(),
            size,
            geo_transform,
        }
    }

    pub fn with_top_left<S: Into<String>>(projection: S, size: RasterSize, top_left: Point, cell_size: CellSize) -> Self {
        Self::new(projection, size, GeoTransform::from_top_left_and_cell_size(top_left, cell_size))
    }

    pub fn with_origin<S: Into<String>>(projection: S, size: RasterSize, lower_left: Point, cell_size: CellSize) -> Self {
        let top_left = Point::new(lower_left.x(), lower_left.y() - (cell_size.y() * size.rows as f64));
        Self::with_top_left(projection, size, top_left, cell_size)
    }

    pub fn without_spatial_reference(size: RasterSize) -> Self {
        GeoReference {
            size,
            geo_transform: GeoTransform::from_top_left_and_cell_size(Point::new(0.0, size.rows as f64), CellSize::square(1.0)),
            ..Default::default()
        }
    }

    pub fn projection(&self) -> &str {
        &self.projection
    }

    pub fn has_spatial_reference(&self) -> bool {
        !self.projection.trim().is_empty()
    }

    pub fn raster_size(&self) -> RasterSize {
        self.size
    }

    pub fn rows(&self) -> usize {
        self.size.rows
    }

    pub fn columns(&self) -> usize {
        self.size.cols
    }

    pub fn geo_transform(&self) -> GeoTransform {
        self.geo_transform
    }

    pub fn cell_size(&self) -> CellSize {
        CellSize::new(self.geo_transform.cell_size_x(), self.geo_transform.cell_size_y())
    }

    pub fn cell_area(&self) -> f64 {
        self.cell_size().area()
    }

    pub fn top_left(&self) -> Point {
        self.geo_transform.top_left()
    }

    pub fn cell_center(&self, cell: Cell) -> Point {
        self.geo_transform.apply(cell.col as f64 + 0.5, cell.row as f64 + 0.5)
    }

    pub fn is_cell_on_map(&self, cell: Cell) -> bool {
        cell.is_within(self.size)
    }

    pub fn same_projection(&self, other: &GeoReference) -> bool {
        self.projection.trim().eq_ignore_ascii_case(other.projection.trim())
    }

    /// True if both grids describe exactly the same cells
    pub fn is_aligned_with(&self, other: &GeoReference) -> bool {
        self.check_aligned(other).is_ok()
    }

    /// Verifies both grids describe exactly the same cells, the error describes the first difference found.
    pub fn check_aligned(&self, other: &GeoReference) -> Result<()> {
        if !self.same_projection(other) {
            return Err(Error::GridMismatch(format!(
                "projection '{}' differs from '{}'",
                self.projection, other.projection
            )));
        }

        if self.size != other.size {
            return Err(Error::GridMismatch(format!("raster size {} differs from {}", self.size, other.size)));
        }

        if !relative_eq!(self.geo_transform, other.geo_transform, epsilon = GRID_EPSILON, max_relative = GRID_EPSILON) {
            return Err(Error::GridMismatch(format!(
                "geo transform {:?} differs from {:?}",
                self.geo_transform, other.geo_transform
            )));
        }

        Ok(())
    }
}

impl std::fmt::Display for GeoReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cell_size = self.cell_size();
        write!(
            f,
            "[{}] {} top left: ({}, {}) cell size: ({}, {})",
            self.projection,
            self.size,
            self.top_left().x(),
            self.top_left().y(),
            cell_size.x(),
            cell_size.y()
        )
    }
}
