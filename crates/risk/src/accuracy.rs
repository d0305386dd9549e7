//! Agreement between the predicted classification and an independently classified reference.
//!
//! The two class rasters are compared at a set of sample cells. The resulting confusion matrix
//! is indexed with the reference class as row and the predicted class as column.

use std::fmt;

use geo::{Cell, GeoReference};
use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{ClassRaster, Error, Region, Result};

/// Below this number of valid samples no meaningful statistics can be computed
pub const MIN_VALID_SAMPLES: usize = 2;
pub const DEFAULT_SAMPLE_COUNT: usize = 1_000_000;

/// Chance agreement this close to 1 makes kappa undefined
const KAPPA_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SamplingConfig {
    /// The maximum number of sample cells, all region cells are used when the region contains fewer cells
    pub count: usize,
    pub seed: u64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        SamplingConfig {
            count: DEFAULT_SAMPLE_COUNT,
            seed: 0,
        }
    }
}

/// Selects the cells of the region used for validation, returned in row-major order.
///
/// When the region contains no more cells than requested every region cell is used,
/// otherwise `count` distinct cells are drawn uniformly with a random generator seeded with `seed`
/// so repeated runs use the same samples.
pub fn sample_cells(grid: &GeoReference, region: &Region, sampling: &SamplingConfig) -> Result<Vec<Cell>> {
    let candidates: Vec<usize> = region
        .cell_mask(grid)?
        .into_iter()
        .enumerate()
        .filter_map(|(index, inside)| inside.then_some(index))
        .collect();

    if candidates.is_empty() {
        return Err(Error::EmptyRegion(format!("no cells of the grid lie within the {region}")));
    }

    let mut indices = if sampling.count >= candidates.len() {
        log::debug!("Sampling all {} cells of the {region}", candidates.len());
        candidates
    } else {
        log::debug!(
            "Sampling {} of {} cells of the {region} (seed {})",
            sampling.count,
            candidates.len(),
            sampling.seed
        );
        let mut rng = StdRng::seed_from_u64(sampling.seed);
        rand::seq::index::sample(&mut rng, candidates.len(), sampling.count)
            .into_iter()
            .map(|i| candidates[i])
            .collect()
    };

    indices.sort_unstable();
    let size = grid.raster_size();
    Ok(indices.into_iter().map(|index| Cell::from_index(index, size)).collect())
}

/// Square matrix of sample counts, rows are the reference classes and columns the predicted classes.
/// Classes are numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    counts: Vec<Vec<u64>>,
}

impl ConfusionMatrix {
    pub fn new(class_count: usize) -> Self {
        ConfusionMatrix {
            counts: vec![vec![0; class_count]; class_count],
        }
    }

    pub fn from_rows(rows: Vec<Vec<u64>>) -> Result<Self> {
        if rows.iter().any(|row| row.len() != rows.len()) {
            return Err(Error::InvalidArgument("a confusion matrix must be square".to_string()));
        }

        Ok(ConfusionMatrix { counts: rows })
    }

    pub fn class_count(&self) -> usize {
        self.counts.len()
    }

    fn index(&self, class: u8) -> Result<usize> {
        let index = usize::from(class).wrapping_sub(1);
        if index >= self.class_count() {
            return Err(Error::InvalidArgument(format!(
                "class {class} is outside of the range 1..={}",
                self.class_count()
            )));
        }

        Ok(index)
    }

    /// Records a sample with the given reference and predicted class
    pub fn add(&mut self, reference: u8, predicted: u8) -> Result<()> {
        let row = self.index(reference)?;
        let col = self.index(predicted)?;
        self.counts[row][col] += 1;
        Ok(())
    }

    pub fn count(&self, reference: u8, predicted: u8) -> u64 {
        match (self.index(reference), self.index(predicted)) {
            (Ok(row), Ok(col)) => self.counts[row][col],
            _ => 0,
        }
    }

    pub fn rows(&self) -> &[Vec<u64>] {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    /// The number of samples on the diagonal
    pub fn correct(&self) -> u64 {
        self.counts.iter().enumerate().map(|(i, row)| row[i]).sum()
    }

    fn row_total(&self, index: usize) -> u64 {
        self.counts[index].iter().sum()
    }

    fn col_total(&self, index: usize) -> u64 {
        self.counts.iter().map(|row| row[index]).sum()
    }

    /// Fraction of the samples where prediction and reference agree, `None` without samples
    pub fn accuracy(&self) -> Option<f64> {
        let total = self.total();
        (total > 0).then(|| self.correct() as f64 / total as f64)
    }

    /// Cohen's kappa: the agreement corrected for the agreement expected by chance.
    /// `None` without samples or when the expected agreement is 1.
    pub fn kappa(&self) -> Option<f64> {
        let observed = self.accuracy()?;
        let total = self.total() as f64;

        let expected = (0..self.class_count())
            .map(|i| self.row_total(i) as f64 * self.col_total(i) as f64)
            .sum::<f64>()
            / (total * total);

        if (1.0 - expected).abs() < KAPPA_EPSILON {
            return None;
        }

        Some((observed - expected) / (1.0 - expected))
    }

    /// Per class: the fraction of the reference samples of the class that were predicted correctly
    pub fn producers_accuracy(&self) -> Vec<Option<f64>> {
        (0..self.class_count())
            .map(|i| {
                let total = self.row_total(i);
                (total > 0).then(|| self.counts[i][i] as f64 / total as f64)
            })
            .collect()
    }

    /// Per class: the fraction of the samples predicted as the class that agree with the reference
    pub fn users_accuracy(&self) -> Vec<Option<f64>> {
        (0..self.class_count())
            .map(|i| {
                let total = self.col_total(i);
                (total > 0).then(|| self.counts[i][i] as f64 / total as f64)
            })
            .collect()
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.total().to_string().len().max(4);

        write!(f, "{:>6}", "ref")?;
        for class in 1..=self.class_count() {
            write!(f, " {:>width$}", format!("p{class}"))?;
        }
        writeln!(f)?;

        for (i, row) in self.counts.iter().enumerate() {
            write!(f, "{:>6}", format!("r{}", i + 1))?;
            for count in row {
                write!(f, " {count:>width$}")?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

/// Accuracy statistics of a predicted classification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracyReport {
    pub matrix: ConfusionMatrix,
    pub accuracy: f64,
    pub kappa: Option<f64>,
    pub producers_accuracy: Vec<Option<f64>>,
    pub users_accuracy: Vec<Option<f64>>,
    /// The number of samples where both rasters contain data
    pub samples: usize,
    /// The number of samples dropped because one of the rasters is nodata at the sample cell
    pub discarded: usize,
}

fn format_optional(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.4}"))
}

impl fmt::Display for AccuracyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Samples: {} ({} discarded)", self.samples, self.discarded)?;
        writeln!(f, "Overall accuracy: {:.4}", self.accuracy)?;
        writeln!(f, "Kappa: {}", format_optional(self.kappa))?;
        write!(f, "{}", self.matrix)?;

        for (i, (producers, users)) in self.producers_accuracy.iter().zip(&self.users_accuracy).enumerate() {
            writeln!(
                f,
                "Class {}: producer's accuracy {}, user's accuracy {}",
                i + 1,
                format_optional(*producers),
                format_optional(*users)
            )?;
        }

        Ok(())
    }
}

/// Compares the predicted and reference classes at the sample cells.
///
/// Samples where either raster is nodata are discarded. Both rasters must be on the same grid and
/// contain classes in the range `1..=class_count`.
pub fn validate(predicted: &ClassRaster, reference: &ClassRaster, sample_cells: &[Cell], class_count: usize) -> Result<AccuracyReport> {
    let grid = predicted.geo_reference();
    reference
        .geo_reference()
        .check_aligned(grid)
        .map_err(|err| Error::for_layer(err, "reference classification"))?;

    let mut matrix = ConfusionMatrix::new(class_count);
    let mut discarded = 0;
    for &cell in sample_cells {
        if !grid.is_cell_on_map(cell) {
            return Err(Error::InvalidArgument(format!(
                "sample cell ({}, {}) is outside of the grid",
                cell.row, cell.col
            )));
        }

        match (reference.cell_value(cell), predicted.cell_value(cell)) {
            (Some(reference), Some(predicted)) => matrix.add(reference, predicted)?,
            _ => discarded += 1,
        }
    }

    let samples = sample_cells.len() - discarded;
    if samples < MIN_VALID_SAMPLES {
        return Err(Error::InsufficientSamples {
            valid: samples,
            required: MIN_VALID_SAMPLES,
        });
    }

    let report = AccuracyReport {
        accuracy: matrix.accuracy().unwrap_or(f64::NAN),
        kappa: matrix.kappa(),
        producers_accuracy: matrix.producers_accuracy(),
        users_accuracy: matrix.users_accuracy(),
        matrix,
        samples,
        discarded,
    };

    log::info!(
        "Validation: accuracy {:.4}, kappa {} ({} samples, {} discarded)",
        report.accuracy,
        format_optional(report.kappa),
        samples,
        discarded
    );

    Ok(report)
}
