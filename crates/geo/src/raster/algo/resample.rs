//! Resampling of rasters onto a different grid in the same coordinate reference system.
//!
//! Every target cell is computed from the source cells whose footprint overlaps the footprint of the target cell.
//! A contributing source cell is weighted by the fraction of its surface that lies inside the target cell,
//! so for grids where the source cells nest exactly inside the target cells every weight is 1.
//! Nodata source cells never contribute, a target cell without contributing cells is nodata.

use crate::{Error, GeoReference, Nodata, RasterNum, Result, raster::DenseRaster};

/// Overlaps smaller than this fraction of a source cell are floating point noise on shared cell edges
const MIN_OVERLAP_FRACTION: f64 = 1e-9;
/// Relative tolerance when comparing the accumulated weights of categories
const MODE_TIE_EPSILON: f64 = 1e-9;

/// The aggregation rule applied to the source cells that contribute to a target cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResampleAlgorithm {
    /// Overlap weighted arithmetic mean, for continuous quantities
    Mean,
    /// Most frequent value weighted by overlap, ties resolve to the lowest value. For categorical data.
    Mode,
    /// Overlap weighted sum, for extensive quantities so the total over the area is preserved
    Sum,
}

#[derive(Debug, Clone, Copy)]
struct AxisOverlap {
    index: usize,
    fraction: f64,
}

/// For every target cell along one axis: the source cells it overlaps and the covered fraction of each source cell.
fn axis_overlaps(src_origin: f64, src_cell_size: f64, src_count: usize, dst_origin: f64, dst_cell_size: f64, dst_count: usize) -> Vec<Vec<AxisOverlap>> {
    (0..dst_count)
        .map(|i| {
            let start = (dst_origin + i as f64 * dst_cell_size - src_origin) / src_cell_size;
            let end = (dst_origin + (i + 1) as f64 * dst_cell_size - src_origin) / src_cell_size;
            let (lo, hi) = if start <= end { (start, end) } else { (end, start) };

            let first = lo.floor().max(0.0) as usize;
            let last = (hi.ceil().max(0.0) as usize).min(src_count);

            (first..last)
                .filter_map(|index| {
                    let fraction = hi.min(index as f64 + 1.0) - lo.max(index as f64);
                    (fraction > MIN_OVERLAP_FRACTION).then_some(AxisOverlap { index, fraction })
                })
                .collect()
        })
        .collect()
}

fn check_compatible(source: &GeoReference, target: &GeoReference) -> Result<()> {
    if !source.has_spatial_reference() {
        return Err(Error::GridMismatch("the source grid has no coordinate reference system".to_string()));
    }

    if !target.has_spatial_reference() {
        return Err(Error::GridMismatch("the target grid has no coordinate reference system".to_string()));
    }

    if !source.same_projection(target) {
        return Err(Error::GridMismatch(format!(
            "source projection '{}' cannot be aligned to target projection '{}'",
            source.projection(),
            target.projection()
        )));
    }

    for (name, grid) in [("source", source), ("target", target)] {
        if !grid.cell_size().is_valid() || grid.geo_transform().is_rotated() {
            return Err(Error::GridMismatch(format!("the {name} grid has an unsupported cell size: {grid}")));
        }
    }

    Ok(())
}

/// Accumulates the contributions of the source cells for a single target cell
struct Accumulator {
    algorithm: ResampleAlgorithm,
    weighted_sum: f64,
    total_weight: f64,
    categories: Vec<(f64, f64)>,
}

impl Accumulator {
    fn new(algorithm: ResampleAlgorithm) -> Self {
        Accumulator {
            algorithm,
            weighted_sum: 0.0,
            total_weight: 0.0,
            categories: Vec::new(),
        }
    }

    fn reset(&mut self) {
        self.weighted_sum = 0.0;
        self.total_weight = 0.0;
        self.categories.clear();
    }

    fn add(&mut self, value: f64, weight: f64) {
        self.total_weight += weight;

        match self.algorithm {
            ResampleAlgorithm::Mean | ResampleAlgorithm::Sum => self.weighted_sum += value * weight,
            ResampleAlgorithm::Mode => match self.categories.iter_mut().find(|(category, _)| *category == value) {
                Some((_, category_weight)) => *category_weight += weight,
                None => self.categories.push((value, weight)),
            },
        }
    }

    fn result(&self) -> Option<f64> {
        if self.total_weight <= 0.0 {
            return None;
        }

        match self.algorithm {
            ResampleAlgorithm::Mean => Some(self.weighted_sum / self.total_weight),
            ResampleAlgorithm::Sum => Some(self.weighted_sum),
            ResampleAlgorithm::Mode => self
                .categories
                .iter()
                .fold(None, |best: Option<(f64, f64)>, &(value, weight)| match best {
                    None => Some((value, weight)),
                    Some((best_value, best_weight)) => {
                        let tolerance = MODE_TIE_EPSILON * best_weight.max(weight);
                        if weight > best_weight + tolerance || ((weight - best_weight).abs() <= tolerance && value < best_value) {
                            Some((value, weight))
                        } else {
                            best
                        }
                    }
                })
                .map(|(value, _)| value),
        }
    }
}

/// Resamples the raster onto the target grid, both grids must use the same coordinate reference system.
///
/// Resampling a raster that is already on the target grid returns its values unchanged.
pub fn resample<T: RasterNum>(ras: &DenseRaster<T>, target: &GeoReference, algorithm: ResampleAlgorithm) -> Result<DenseRaster<f64>> {
    let source = ras.geo_reference();
    check_compatible(source, target)?;

    if source.is_aligned_with(target) {
        log::debug!("Resample: raster is already on the target grid");
        return DenseRaster::from_iter(target.clone(), ras.iter_opt().map(|v| v.and_then(|v| v.to_f64())));
    }

    let src_trans = source.geo_transform();
    let dst_trans = target.geo_transform();

    let col_overlaps = axis_overlaps(
        src_trans.top_left().x(),
        src_trans.cell_size_x(),
        source.columns(),
        dst_trans.top_left().x(),
        dst_trans.cell_size_x(),
        target.columns(),
    );

    let row_overlaps = axis_overlaps(
        src_trans.top_left().y(),
        src_trans.cell_size_y(),
        source.rows(),
        dst_trans.top_left().y(),
        dst_trans.cell_size_y(),
        target.rows(),
    );

    log::debug!("Resample {algorithm:?}: {} -> {}", source.raster_size(), target.raster_size());

    let src_cols = source.columns();
    let src_data = ras.as_slice();

    let process_row = |(row, row_data): (usize, &mut [f64])| {
        let mut acc = Accumulator::new(algorithm);

        for (col, out) in row_data.iter_mut().enumerate() {
            acc.reset();

            for row_overlap in &row_overlaps[row] {
                for col_overlap in &col_overlaps[col] {
                    let src_val = src_data[row_overlap.index * src_cols + col_overlap.index];
                    if src_val.is_nodata() {
                        continue;
                    }

                    if let Some(value) = src_val.to_f64() {
                        acc.add(value, row_overlap.fraction * col_overlap.fraction);
                    }
                }
            }

            *out = acc.result().unwrap_or(f64::NODATA);
        }
    };

    let mut data = vec![f64::NODATA; target.raster_size().cell_count()];
    if target.columns() > 0 {
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            data.par_chunks_mut(target.columns()).enumerate().for_each(process_row);
        }

        #[cfg(not(feature = "rayon"))]
        data.chunks_mut(target.columns()).enumerate().for_each(process_row);
    }

    DenseRaster::new(target.clone(), data)
}
