use crate::{Cell, Error, GeoReference, RasterNum, RasterSize, Result};

/// Raster implementation using a dense data structure.
/// The nodata values are stored as the [`crate::Nodata::NODATA`] value for the type T in the same array data structure
/// So no additional data is allocated for tracking nodata cells.
#[derive(Debug, Clone)]
pub struct DenseRaster<T: RasterNum> {
    georef: GeoReference,
    data: Vec<T>,
}

impl<T: RasterNum> DenseRaster<T> {
    /// Create a new raster with the given grid and data buffer, the buffer must contain a value for every cell.
    /// The data is expected to use `T::NODATA` for cells without data.
    pub fn new(georef: GeoReference, data: Vec<T>) -> Result<Self> {
        let size = georef.raster_size();
        if data.len() != size.cell_count() {
            return Err(Error::InvalidArgument(format!(
                "Raster data length {} does not match the grid size {size}",
                data.len()
            )));
        }

        Ok(DenseRaster { georef, data })
    }

    /// Create a raster from an iterator where `None` represents a nodata cell.
    pub fn from_iter<Iter>(georef: GeoReference, iter: Iter) -> Result<Self>
    where
        Iter: Iterator<Item = Option<T>>,
    {
        let mut data = Vec::with_capacity(georef.raster_size().cell_count());
        data.extend(iter.map(|val| val.unwrap_or(T::NODATA)));
        Self::new(georef, data)
    }

    pub fn filled_with(georef: GeoReference, val: T) -> Self {
        let cell_count = georef.raster_size().cell_count();
        DenseRaster {
            georef,
            data: vec![val; cell_count],
        }
    }

    pub fn geo_reference(&self) -> &GeoReference {
        &self.georef
    }

    pub fn size(&self) -> RasterSize {
        self.georef.raster_size()
    }

    pub fn width(&self) -> usize {
        self.georef.columns()
    }

    pub fn height(&self) -> usize {
        self.georef.rows()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Iterator over the raw cell values, nodata cells contain `T::NODATA`
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Iterator over the cell values, nodata values are represented as `None`
    pub fn iter_opt(&self) -> impl Iterator<Item = Option<T>> + '_ {
        self.data.iter().map(|&v| if v.is_nodata() { None } else { Some(v) })
    }

    /// Iterator over the values of the cells that contain data
    pub fn iter_values(&self) -> impl Iterator<Item = T> + '_ {
        self.data.iter().copied().filter(|v| !v.is_nodata())
    }

    /// Return the value at the given index or None if the index contains nodata
    pub fn value(&self, index: usize) -> Option<T> {
        self.data.get(index).copied().filter(|v| !v.is_nodata())
    }

    /// Return the value at the given cell or None if the cell contains nodata or is outside of the raster
    pub fn cell_value(&self, cell: Cell) -> Option<T> {
        cell.index_in_raster(self.size()).and_then(|index| self.value(index))
    }

    pub fn masked_data(&self) -> Vec<Option<T>> {
        self.iter_opt().collect()
    }

    pub fn nodata_count(&self) -> usize {
        self.data.iter().filter(|v| v.is_nodata()).count()
    }

    /// Sum of all the data values
    pub fn sum(&self) -> f64 {
        self.iter_values().filter_map(|v| v.to_f64()).sum()
    }

    /// Applies the operation on every cell that contains data, nodata cells remain nodata
    pub fn unary<F: Fn(T) -> T>(&self, op: F) -> Self {
        self.map(|v| Some(op(v)))
    }

    /// Creates a new raster on the same grid, `op` is only called for cells that contain data,
    /// returning `None` turns the cell into nodata.
    pub fn map<U: RasterNum, F: Fn(T) -> Option<U>>(&self, op: F) -> DenseRaster<U> {
        DenseRaster {
            georef: self.georef.clone(),
            data: self
                .data
                .iter()
                .map(|&v| (if v.is_nodata() { None } else { op(v) }).unwrap_or(U::NODATA))
                .collect(),
        }
    }
}

/// Nodata aware equality: nodata cells compare equal to each other
impl<T: RasterNum> PartialEq for DenseRaster<T> {
    fn eq(&self, other: &Self) -> bool {
        self.georef == other.georef
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(&a, &b)| (a.is_nodata() && b.is_nodata()) || a == b)
    }
}

impl<T: RasterNum> std::ops::Index<Cell> for DenseRaster<T> {
    type Output = T;

    fn index(&self, cell: Cell) -> &Self::Output {
        &self.data[cell.row as usize * self.width() + cell.col as usize]
    }
}
