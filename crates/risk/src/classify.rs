//! Percentile based classification of the composite score into ordinal risk classes.

use geo::{DenseRaster, Nodata, raster::algo};
use serde::{Deserialize, Serialize};

use crate::{Error, Region, Result};

/// Quintile breakpoints, resulting in five classes
pub const DEFAULT_PERCENTILES: [f64; 4] = [20.0, 40.0, 60.0, 80.0];
pub const DEFAULT_CLASS_LABELS: [&str; 5] = ["Very Low", "Low", "Moderate", "High", "Very High"];
/// Class labels are stored as `u8` and `u8::MAX` is reserved for nodata
pub const MAX_CLASS_COUNT: usize = 254;

/// Raster of class labels in `1..=class_count`, `u8::MAX` marks nodata
pub type ClassRaster = DenseRaster<u8>;

/// Ascending class boundaries, a value equal to a breakpoint belongs to the higher class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct ClassBreakpoints {
    values: Vec<f64>,
}

impl ClassBreakpoints {
    pub fn new(values: Vec<f64>) -> Result<Self> {
        if values.len() >= MAX_CLASS_COUNT {
            return Err(Error::InvalidArgument(format!(
                "{} breakpoints exceed the maximum of {} classes",
                values.len(),
                MAX_CLASS_COUNT
            )));
        }

        if values.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidArgument(format!("breakpoints must be finite: {values:?}")));
        }

        if values.windows(2).any(|pair| pair[1] < pair[0]) {
            return Err(Error::InvalidArgument(format!("breakpoints must be non-decreasing: {values:?}")));
        }

        Ok(ClassBreakpoints { values })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn class_count(&self) -> usize {
        self.values.len() + 1
    }

    /// `1 + number of breakpoints <= value`
    pub fn class_of(&self, value: f64) -> u8 {
        // the breakpoint count is bounded by the constructor so the class always fits in a u8
        1 + self.values.iter().filter(|&&b| b <= value).count() as u8
    }
}

impl TryFrom<Vec<f64>> for ClassBreakpoints {
    type Error = Error;

    fn try_from(values: Vec<f64>) -> Result<Self> {
        Self::new(values)
    }
}

impl From<ClassBreakpoints> for Vec<f64> {
    fn from(breakpoints: ClassBreakpoints) -> Self {
        breakpoints.values
    }
}

/// Percentiles must be strictly ascending and lie within (0, 100)
pub fn check_percentiles(percentiles: &[f64]) -> Result<()> {
    if percentiles.is_empty() {
        return Err(Error::Configuration("at least one percentile is required".to_string()));
    }

    if percentiles.len() >= MAX_CLASS_COUNT {
        return Err(Error::Configuration(format!(
            "{} percentiles exceed the maximum of {MAX_CLASS_COUNT} classes",
            percentiles.len()
        )));
    }

    if let Some(p) = percentiles.iter().find(|p| !(**p > 0.0 && **p < 100.0)) {
        return Err(Error::Configuration(format!("percentile {p} is not within (0, 100)")));
    }

    if percentiles.windows(2).any(|pair| pair[1] <= pair[0]) {
        return Err(Error::Configuration(format!(
            "percentiles must be strictly ascending: {percentiles:?}"
        )));
    }

    Ok(())
}

/// The score values at the requested percentiles, computed over the data cells inside the region.
///
/// Percentiles use linear interpolation between the closest ranks.
pub fn breakpoints(score: &DenseRaster<f64>, region: &Region, percentiles: &[f64]) -> Result<ClassBreakpoints> {
    check_percentiles(percentiles)?;

    let mask = region.cell_mask(score.geo_reference())?;
    let quantile_vals: Vec<f64> = percentiles.iter().map(|p| p / 100.0).collect();
    let mut values = algo::quantiles_masked(score, &mask, &quantile_vals)?
        .ok_or_else(|| Error::EmptyRegion(format!("the score has no data within the {region}")))?;

    // interpolation rounding must not break the ordering
    for i in 1..values.len() {
        values[i] = values[i].max(values[i - 1]);
    }

    for pair in values.windows(2).filter(|pair| pair[0] == pair[1]) {
        log::warn!("Duplicate breakpoint {}, the class in between will be empty", pair[0]);
    }

    log::debug!("Breakpoints for percentiles {percentiles:?}: {values:?}");
    ClassBreakpoints::new(values)
}

/// Assigns the class of every data cell, nodata cells remain nodata
pub fn apply_breakpoints(score: &DenseRaster<f64>, breakpoints: &ClassBreakpoints) -> ClassRaster {
    score.map(|v| Some(breakpoints.class_of(v)))
}

/// Computes the breakpoints within the region and classifies the full score raster with them
pub fn classify(score: &DenseRaster<f64>, region: &Region, percentiles: &[f64]) -> Result<(ClassRaster, ClassBreakpoints)> {
    let breakpoints = breakpoints(score, region, percentiles)?;
    Ok((apply_breakpoints(score, &breakpoints), breakpoints))
}

/// Cell count and surface of a class within the region
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassArea {
    pub class: u8,
    pub cells: usize,
    /// In the squared units of the grid projection
    pub area: f64,
}

/// Summarizes the classified cells inside the region per class, classes without cells are reported with zero area
pub fn class_areas(classes: &ClassRaster, region: &Region, class_count: usize) -> Result<Vec<ClassArea>> {
    if class_count == 0 || class_count > MAX_CLASS_COUNT {
        return Err(Error::InvalidArgument(format!("invalid class count {class_count}")));
    }

    let mask = region.cell_mask(classes.geo_reference())?;
    let mut counts = vec![0usize; class_count];
    for (&class, _) in classes.iter().zip(mask.iter()).filter(|&(class, &inside)| inside && !class.is_nodata()) {
        match counts.get_mut(usize::from(class).wrapping_sub(1)) {
            Some(count) => *count += 1,
            None => {
                return Err(Error::InvalidArgument(format!(
                    "class {class} is outside of the range 1..={class_count}"
                )));
            }
        }
    }

    let cell_area = classes.geo_reference().cell_area();
    Ok(counts
        .into_iter()
        .enumerate()
        .map(|(index, cells)| ClassArea {
            class: (index + 1) as u8,
            cells,
            area: cells as f64 * cell_area,
        })
        .collect())
}

/// The descriptive labels for the classes, the default labels are used for five classes
pub fn default_class_labels(class_count: usize) -> Vec<String> {
    if class_count == DEFAULT_CLASS_LABELS.len() {
        DEFAULT_CLASS_LABELS.iter().map(|label| label.to_string()).collect()
    } else {
        (1..=class_count).map(|class| format!("Class {class}")).collect()
    }
}
