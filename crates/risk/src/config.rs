//! Declarative description of a risk pipeline run, read from JSON.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};

use geo::{CellSize, GeoReference, Point, RasterSize};
use serde::{Deserialize, Serialize};

use crate::{
    Error, MeasurementKind, Region, Result, WeightSet,
    accuracy::{MIN_VALID_SAMPLES, SamplingConfig},
    classify::{self, DEFAULT_PERCENTILES},
    normalize::DegeneratePolicy,
};

/// The analysis grid: a north-up grid with square cells
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridConfig {
    pub projection: String,
    /// Map coordinates `[x, y]` of the top left corner of the grid
    pub top_left: [f64; 2],
    pub cell_size: f64,
    pub rows: usize,
    pub cols: usize,
}

impl GridConfig {
    pub fn validate(&self) -> Result<()> {
        if self.projection.trim().is_empty() {
            return Err(Error::Configuration("the analysis grid has no projection".to_string()));
        }

        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(Error::Configuration(format!(
                "the analysis grid cell size must be positive, got {}",
                self.cell_size
            )));
        }

        if self.rows == 0 || self.cols == 0 {
            return Err(Error::Configuration("the analysis grid is empty".to_string()));
        }

        if self.top_left.iter().any(|v| !v.is_finite()) {
            return Err(Error::Configuration("the analysis grid origin is not a valid coordinate".to_string()));
        }

        Ok(())
    }

    pub fn geo_reference(&self) -> Result<GeoReference> {
        self.validate()?;
        Ok(GeoReference::with_top_left(
            self.projection.trim(),
            RasterSize::with_rows_cols(self.rows, self.cols),
            Point::new(self.top_left[0], self.top_left[1]),
            CellSize::square(self.cell_size),
        ))
    }
}

/// A rectangular area of interest in map coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegionConfig {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl RegionConfig {
    pub fn validate(&self) -> Result<()> {
        let coords = [self.min_x, self.min_y, self.max_x, self.max_y];
        if coords.iter().any(|v| !v.is_finite()) || self.min_x >= self.max_x || self.min_y >= self.max_y {
            return Err(Error::Configuration(format!("invalid region extent {coords:?}")));
        }

        Ok(())
    }

    pub fn region(&self) -> Region {
        Region::extent(self.min_x, self.min_y, self.max_x, self.max_y)
    }
}

/// How a resampled layer is turned into a [0, 1] risk factor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerTransform {
    /// Min-max normalization, `invert` flips the layer first for factors where a lower value means a higher risk
    Normalize {
        #[serde(default)]
        invert: bool,
    },
    /// 1 for cells of the given class, 0 for the other classes
    Indicator { class: f64 },
}

impl Default for LayerTransform {
    fn default() -> Self {
        LayerTransform::Normalize { invert: false }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerConfig {
    /// The name of the risk factor, weights refer to this name
    pub name: String,
    /// The input raster the factor is derived from, defaults to `name`.
    /// Multiple factors can share one input (e.g. land cover classes).
    #[serde(default)]
    pub source: Option<String>,
    pub kind: MeasurementKind,
    #[serde(default)]
    pub transform: LayerTransform,
    /// Location of the input raster, only used by file based front ends
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl LayerConfig {
    pub fn new<S: Into<String>>(name: S, kind: MeasurementKind) -> Self {
        LayerConfig {
            name: name.into(),
            source: None,
            kind,
            transform: LayerTransform::default(),
            path: None,
        }
    }

    pub fn source_name(&self) -> &str {
        self.source.as_deref().unwrap_or(&self.name)
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Configuration("layer without a name".to_string()));
        }

        if let LayerTransform::Indicator { class } = self.transform {
            if self.kind != MeasurementKind::Categorical {
                return Err(Error::Configuration(format!(
                    "indicator layer '{}' must be categorical, not {}",
                    self.name, self.kind
                )));
            }

            if !class.is_finite() {
                return Err(Error::Configuration(format!("invalid indicator class for layer '{}'", self.name)));
            }
        }

        Ok(())
    }
}

/// The independent risk estimate the prediction is validated against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReferenceConfig {
    pub name: String,
    pub kind: MeasurementKind,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_percentiles() -> Vec<f64> {
    DEFAULT_PERCENTILES.to_vec()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    pub grid: GridConfig,
    /// Area of interest, the full grid when absent
    #[serde(default)]
    pub region: Option<RegionConfig>,
    pub layers: Vec<LayerConfig>,
    pub weights: WeightSet,
    #[serde(default = "default_percentiles")]
    pub percentiles: Vec<f64>,
    #[serde(default)]
    pub degenerate: DegeneratePolicy,
    pub reference: ReferenceConfig,
    #[serde(default)]
    pub sampling: SamplingConfig,
    /// One label per class, defaults to the standard five class labels
    #[serde(default)]
    pub class_labels: Option<Vec<String>>,
}

impl PipelineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|err| Error::Configuration(format!("invalid pipeline configuration: {err}")))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn class_count(&self) -> usize {
        self.percentiles.len() + 1
    }

    pub fn class_labels(&self) -> Vec<String> {
        self.class_labels
            .clone()
            .unwrap_or_else(|| classify::default_class_labels(self.class_count()))
    }

    pub fn layer(&self, name: &str) -> Option<&LayerConfig> {
        self.layers.iter().find(|layer| layer.name == name)
    }

    /// The configured layers that contribute to the composite score
    pub fn weighted_layers(&self) -> impl Iterator<Item = &LayerConfig> {
        self.layers.iter().filter(|layer| self.weights.contains(&layer.name))
    }

    /// Checks the consistency of the configuration without touching any raster data
    pub fn validate(&self) -> Result<()> {
        self.grid.validate()?;
        if let Some(region) = &self.region {
            region.validate()?;
        }

        let mut names = BTreeSet::new();
        let mut sources: BTreeMap<&str, &LayerConfig> = BTreeMap::new();
        for layer in &self.layers {
            layer.validate()?;
            if !names.insert(layer.name.as_str()) {
                return Err(Error::Configuration(format!("duplicate layer '{}'", layer.name)));
            }

            // layers derived from the same input must agree on how that input is read
            let first = *sources.entry(layer.source_name()).or_insert(layer);
            if first.kind != layer.kind || first.path != layer.path {
                return Err(Error::Configuration(format!(
                    "layers '{}' and '{}' share the input '{}' but differ in kind or path",
                    first.name,
                    layer.name,
                    layer.source_name()
                )));
            }
        }

        if let Some(name) = self.weights.names().find(|name| !names.contains(name)) {
            return Err(Error::Configuration(format!("missing required layer '{name}'")));
        }

        for name in names.iter().filter(|name| !self.weights.contains(name)) {
            log::warn!("Layer '{name}' has no weight and will not be used");
        }

        if self.reference.name.trim().is_empty() {
            return Err(Error::Configuration("the reference layer has no name".to_string()));
        }

        classify::check_percentiles(&self.percentiles)?;
        self.degenerate.validate()?;

        if self.sampling.count < MIN_VALID_SAMPLES {
            return Err(Error::Configuration(format!(
                "at least {MIN_VALID_SAMPLES} samples are required for validation, got {}",
                self.sampling.count
            )));
        }

        if let Some(labels) = &self.class_labels {
            if labels.len() != self.class_count() {
                return Err(Error::Configuration(format!(
                    "{} class labels provided for {} classes",
                    labels.len(),
                    self.class_count()
                )));
            }
        }

        Ok(())
    }
}
