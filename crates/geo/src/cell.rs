use crate::RasterSize;

/// Represents a point in the raster using row, col coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell {
    pub row: i32,
    pub col: i32,
}

impl Cell {
    pub const fn from_row_col(row: i32, col: i32) -> Self {
        Cell { row, col }
    }

    pub const fn invalid() -> Self {
        Cell { row: -1, col: -1 }
    }

    pub const fn is_valid(&self) -> bool {
        self.row >= 0 && self.col >= 0
    }

    /// True if the cell lies within a raster of the given size
    pub const fn is_within(&self, size: RasterSize) -> bool {
        self.is_valid() && (self.row as usize) < size.rows && (self.col as usize) < size.cols
    }

    pub fn increment(&mut self, cols_in_grid: i32) {
        self.col += 1;
        if self.col >= cols_in_grid {
            self.col = 0;
            self.row += 1;
        }
    }

    /// Row-major index of the cell, `None` if the cell is not part of a raster of the given size
    pub fn index_in_raster(&self, size: RasterSize) -> Option<usize> {
        if !self.is_within(size) {
            return None;
        }

        Some(self.row as usize * size.cols + self.col as usize)
    }

    /// The cell at the given row-major index
    pub fn from_index(index: usize, size: RasterSize) -> Self {
        Cell::from_row_col((index / size.cols) as i32, (index % size.cols) as i32)
    }
}

impl PartialOrd for Cell {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cell {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.row.cmp(&other.row).then(self.col.cmp(&other.col))
    }
}

/// Iterator over the cells in a raster
/// Iteration will occur from the top-left cell to the bottom-right cell in row-major order.
pub struct CellIterator {
    rows: i32,
    cols: i32,
    current: Cell,
}

impl CellIterator {
    pub fn for_raster_with_size(size: RasterSize) -> Self {
        CellIterator {
            rows: size.rows as i32,
            cols: size.cols as i32,
            current: Cell::from_row_col(0, 0),
        }
    }
}

impl Iterator for CellIterator {
    type Item = Cell;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cols == 0 || self.current.row >= self.rows {
            return None;
        }

        let current = self.current;
        self.current.increment(self.cols);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_iteration_is_row_major() {
        let cells: Vec<Cell> = CellIterator::for_raster_with_size(RasterSize::with_rows_cols(2, 3)).collect();
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[0], Cell::from_row_col(0, 0));
        assert_eq!(cells[2], Cell::from_row_col(0, 2));
        assert_eq!(cells[3], Cell::from_row_col(1, 0));
        assert_eq!(cells[5], Cell::from_row_col(1, 2));
    }

    #[test]
    fn empty_raster_has_no_cells() {
        assert_eq!(CellIterator::for_raster_with_size(RasterSize::empty()).count(), 0);
    }

    #[test]
    fn cell_index() {
        let size = RasterSize::with_rows_cols(3, 4);
        assert_eq!(Cell::from_row_col(1, 2).index_in_raster(size), Some(6));
        assert_eq!(Cell::from_index(6, size), Cell::from_row_col(1, 2));
        assert_eq!(Cell::from_row_col(3, 0).index_in_raster(size), None);
        assert_eq!(Cell::invalid().index_in_raster(size), None);
    }
}
