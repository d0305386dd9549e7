use std::{fmt, str::FromStr};

use geo::{DenseRaster, GeoReference, raster::algo::ResampleAlgorithm};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Describes how the values of a layer behave when cells are aggregated to a coarser grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MeasurementKind {
    /// Intensive quantities (precipitation, elevation, slope, wetness), aggregated by mean
    Continuous,
    /// Class codes (land cover), aggregated by mode
    Categorical,
    /// Quantities that scale with area (population count), aggregated by sum
    Extensive,
}

impl MeasurementKind {
    pub fn resample_algorithm(self) -> ResampleAlgorithm {
        match self {
            MeasurementKind::Continuous => ResampleAlgorithm::Mean,
            MeasurementKind::Categorical => ResampleAlgorithm::Mode,
            MeasurementKind::Extensive => ResampleAlgorithm::Sum,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MeasurementKind::Continuous => "continuous",
            MeasurementKind::Categorical => "categorical",
            MeasurementKind::Extensive => "extensive",
        }
    }
}

impl fmt::Display for MeasurementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeasurementKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continuous" => Ok(MeasurementKind::Continuous),
            "categorical" => Ok(MeasurementKind::Categorical),
            "extensive" => Ok(MeasurementKind::Extensive),
            other => Err(Error::Configuration(format!(
                "unknown measurement kind '{other}' (expected continuous, categorical or extensive)"
            ))),
        }
    }
}

impl TryFrom<String> for MeasurementKind {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<MeasurementKind> for String {
    fn from(kind: MeasurementKind) -> Self {
        kind.as_str().to_string()
    }
}

/// A named raster together with the aggregation semantics of its values
#[derive(Debug, Clone)]
pub struct RasterLayer {
    name: String,
    kind: MeasurementKind,
    raster: DenseRaster<f64>,
}

impl RasterLayer {
    pub fn new<S: Into<String>>(name: S, kind: MeasurementKind, raster: DenseRaster<f64>) -> Self {
        RasterLayer {
            name: name.into(),
            kind,
            raster,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> MeasurementKind {
        self.kind
    }

    pub fn raster(&self) -> &DenseRaster<f64> {
        &self.raster
    }

    pub fn grid(&self) -> &GeoReference {
        self.raster.geo_reference()
    }

    pub fn into_raster(self) -> DenseRaster<f64> {
        self.raster
    }

    /// Same name and kind with different values
    pub fn with_raster(&self, raster: DenseRaster<f64>) -> Self {
        RasterLayer {
            name: self.name.clone(),
            kind: self.kind,
            raster,
        }
    }

    /// Flips the orientation of the layer (`1 - value`), for factors where a lower value means a higher risk
    pub fn inverted(&self) -> Self {
        self.with_raster(self.raster.unary(|v| 1.0 - v))
    }
}

/// A layer rescaled to the [0, 1] range, remembers the value range it was scaled from
#[derive(Debug, Clone)]
pub struct NormalizedLayer {
    name: String,
    raster: DenseRaster<f64>,
    min: f64,
    max: f64,
}

impl NormalizedLayer {
    pub(crate) fn new<S: Into<String>>(name: S, raster: DenseRaster<f64>, min: f64, max: f64) -> Self {
        NormalizedLayer {
            name: name.into(),
            raster,
            min,
            max,
        }
    }

    /// Wraps a raster whose values already lie in the [0, 1] range (e.g. a binary mask)
    pub fn from_unit_interval<S: Into<String>>(name: S, raster: DenseRaster<f64>) -> Result<Self> {
        let name = name.into();
        if let Some(value) = raster.iter_values().find(|v| !(0.0..=1.0).contains(v)) {
            return Err(Error::InvalidArgument(format!(
                "layer '{name}' contains value {value} outside of the [0, 1] range"
            )));
        }

        Ok(Self::new(name, raster, 0.0, 1.0))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn raster(&self) -> &DenseRaster<f64> {
        &self.raster
    }

    pub fn grid(&self) -> &GeoReference {
        self.raster.geo_reference()
    }

    /// The minimum of the source values the layer was scaled from
    pub fn min(&self) -> f64 {
        self.min
    }

    /// The maximum of the source values the layer was scaled from
    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn renamed<S: Into<String>>(self, name: S) -> Self {
        NormalizedLayer { name: name.into(), ..self }
    }

    pub fn into_raster(self) -> DenseRaster<f64> {
        self.raster
    }
}
