//! Weighted linear combination of normalized layers into a single risk score.

use std::collections::BTreeMap;

use geo::{DenseRaster, GeoReference, Nodata};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{Error, NormalizedLayer, Result};

/// Maximum allowed deviation of the sum of the weights from 1
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Validated mapping of layer name to weight: every weight is finite and non-negative and the weights sum to 1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct WeightSet {
    weights: BTreeMap<String, f64>,
}

impl WeightSet {
    pub fn new(weights: BTreeMap<String, f64>) -> Result<Self> {
        if weights.is_empty() {
            return Err(Error::Configuration("the weight set is empty".to_string()));
        }

        if let Some((name, weight)) = weights.iter().find(|(_, w)| !w.is_finite() || **w < 0.0) {
            return Err(Error::Configuration(format!(
                "the weight of layer '{name}' must be a non-negative number, got {weight}"
            )));
        }

        let total: f64 = weights.values().sum();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(Error::Configuration(format!("the layer weights must sum to 1, got {total}")));
        }

        Ok(WeightSet { weights })
    }

    pub fn from_pairs<S: Into<String>>(pairs: impl IntoIterator<Item = (S, f64)>) -> Result<Self> {
        let mut weights = BTreeMap::new();
        for (name, weight) in pairs {
            let name = name.into();
            if weights.insert(name.clone(), weight).is_some() {
                return Err(Error::Configuration(format!("duplicate weight for layer '{name}'")));
            }
        }

        Self::new(weights)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.weights.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.weights.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(name, &weight)| (name.as_str(), weight))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.weights.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }
}

impl TryFrom<BTreeMap<String, f64>> for WeightSet {
    type Error = Error;

    fn try_from(weights: BTreeMap<String, f64>) -> Result<Self> {
        Self::new(weights)
    }
}

impl From<WeightSet> for BTreeMap<String, f64> {
    fn from(set: WeightSet) -> Self {
        set.weights
    }
}

/// The composite risk index on the analysis grid, higher means more exposed
#[derive(Debug, Clone)]
pub struct CompositeScore {
    raster: DenseRaster<f64>,
}

impl CompositeScore {
    pub fn raster(&self) -> &DenseRaster<f64> {
        &self.raster
    }

    pub fn grid(&self) -> &GeoReference {
        self.raster.geo_reference()
    }

    pub fn into_raster(self) -> DenseRaster<f64> {
        self.raster
    }
}

/// Combines the layers as `sum(weight * value)` per cell.
///
/// Every weighted layer must be present and all of them must share the same grid.
/// A cell is nodata when any weighted layer is nodata at that cell.
/// Layers without a weight are ignored.
pub fn build(layers: &BTreeMap<String, NormalizedLayer>, weights: &WeightSet) -> Result<CompositeScore> {
    let weighted = weights
        .iter()
        .map(|(name, weight)| {
            layers
                .get(name)
                .map(|layer| (layer, weight))
                .ok_or_else(|| Error::Configuration(format!("missing required layer '{name}'")))
        })
        .collect::<Result<Vec<_>>>()?;

    for name in layers.keys().filter(|name| !weights.contains(name)) {
        log::warn!("Layer '{name}' has no weight and does not contribute to the composite score");
    }

    let (first, _) = weighted
        .first()
        .ok_or_else(|| Error::Configuration("the weight set is empty".to_string()))?;
    let grid = first.grid();
    for (layer, _) in &weighted {
        layer
            .grid()
            .check_aligned(grid)
            .map_err(|err| Error::for_layer(err, layer.name()))?;
    }

    log::debug!("Composite score from {} layers on {}", weighted.len(), grid.raster_size());

    let data = (0..grid.raster_size().cell_count())
        .into_par_iter()
        .map(|index| {
            weighted
                .iter()
                .try_fold(0.0, |score, (layer, weight)| layer.raster().value(index).map(|v| score + weight * v))
                .unwrap_or(f64::NODATA)
        })
        .collect();

    Ok(CompositeScore {
        raster: DenseRaster::new(grid.clone(), data)?,
    })
}
