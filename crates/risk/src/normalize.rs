//! Rescaling of layers to the [0, 1] range so layers with different units can be combined.

use geo::raster::algo;
use serde::{Deserialize, Serialize};

use crate::{Error, MeasurementKind, NormalizedLayer, RasterLayer, Region, Result};

/// What to do with a layer that has the same value for every cell in the region
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegeneratePolicy {
    /// Fail with [`Error::DegenerateNormalization`]
    #[default]
    Reject,
    /// Every data cell of the layer gets the given value in the [0, 1] range
    Constant(f64),
}

impl DegeneratePolicy {
    pub fn validate(&self) -> Result<()> {
        match self {
            DegeneratePolicy::Reject => Ok(()),
            DegeneratePolicy::Constant(value) if (0.0..=1.0).contains(value) => Ok(()),
            DegeneratePolicy::Constant(value) => Err(Error::Configuration(format!(
                "the constant for degenerate layers must lie in the [0, 1] range, got {value}"
            ))),
        }
    }
}

/// Min-max normalization using the minimum and maximum of the layer within the region.
///
/// Every data cell of the grid is rescaled with `(v - min) / (max - min)` and clamped to [0, 1],
/// cells outside of the region can lie outside of the region's value range.
/// Nodata cells remain nodata.
pub fn normalize(layer: &RasterLayer, region: &Region) -> Result<NormalizedLayer> {
    normalize_with_policy(layer, region, DegeneratePolicy::Reject)
}

/// [`normalize`] with a configurable behavior for layers that are constant within the region
pub fn normalize_with_policy(layer: &RasterLayer, region: &Region, policy: DegeneratePolicy) -> Result<NormalizedLayer> {
    policy.validate()?;

    let mask = region.cell_mask(layer.grid())?;
    let range = algo::min_max_masked(layer.raster(), &mask)?
        .ok_or_else(|| Error::EmptyRegion(format!("layer '{}' has no data within the {region}", layer.name())))?;
    let (min, max) = (*range.start(), *range.end());

    if max <= min {
        return match policy {
            DegeneratePolicy::Reject => Err(Error::DegenerateNormalization {
                layer: layer.name().to_string(),
                value: min,
            }),
            DegeneratePolicy::Constant(value) => {
                log::warn!("Layer '{}' is constant ({min}) within the {region}, using {value}", layer.name());
                Ok(NormalizedLayer::new(layer.name(), layer.raster().unary(|_| value), min, max))
            }
        };
    }

    log::debug!("Normalize layer '{}': [{min}, {max}]", layer.name());
    let span = max - min;
    let raster = layer.raster().unary(|v| ((v - min) / span).clamp(0.0, 1.0));
    Ok(NormalizedLayer::new(layer.name(), raster, min, max))
}

/// Binary layer from a categorical layer: 1 where the cell holds `class`, 0 for every other class.
/// Nodata cells remain nodata.
pub fn indicator(layer: &RasterLayer, class: f64) -> Result<NormalizedLayer> {
    if layer.kind() != MeasurementKind::Categorical {
        return Err(Error::Configuration(format!(
            "an indicator requires a categorical layer, '{}' is {}",
            layer.name(),
            layer.kind()
        )));
    }

    let raster = layer.raster().unary(|v| if v == class { 1.0 } else { 0.0 });
    Ok(NormalizedLayer::new(layer.name(), raster, 0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{NOD, raster};

    fn continuous(name: &str, rows: usize, cols: usize, data: &[f64]) -> Result<RasterLayer> {
        Ok(RasterLayer::new(name, MeasurementKind::Continuous, raster(rows, cols, data)?))
    }

    #[test]
    fn min_max_rescaling() -> Result<()> {
        let layer = continuous("rainfall", 1, 4, &[0.0, 5.0, 10.0, NOD])?;
        let normalized = normalize(&layer, &Region::Full)?;

        assert_eq!(normalized.name(), "rainfall");
        assert_eq!(normalized.min(), 0.0);
        assert_eq!(normalized.max(), 10.0);
        assert_eq!(normalized.raster().masked_data(), vec![Some(0.0), Some(0.5), Some(1.0), None]);

        Ok(())
    }

    #[test]
    fn statistics_from_region_values_clamped() -> Result<()> {
        // region covers the first two cells (centers at x 50 and 150)
        let layer = continuous("elevation", 1, 4, &[10.0, 20.0, 0.0, 40.0])?;
        let region = Region::extent(0.0, 0.0, 200.0, 100.0);
        let normalized = normalize(&layer, &region)?;

        assert_eq!(normalized.min(), 10.0);
        assert_eq!(normalized.max(), 20.0);
        assert_eq!(normalized.raster().masked_data(), vec![Some(0.0), Some(1.0), Some(0.0), Some(1.0)]);

        Ok(())
    }

    #[test]
    fn constant_layer_is_rejected() -> Result<()> {
        let layer = continuous("wetness", 2, 2, &[3.0, 3.0, NOD, 3.0])?;
        match normalize(&layer, &Region::Full) {
            Err(Error::DegenerateNormalization { layer, value }) => {
                assert_eq!(layer, "wetness");
                assert_eq!(value, 3.0);
            }
            other => panic!("Expected a degenerate normalization, got {other:?}"),
        }

        Ok(())
    }

    #[test]
    fn constant_layer_with_fallback_value() -> Result<()> {
        let layer = continuous("wetness", 2, 2, &[3.0, 3.0, NOD, 3.0])?;
        let normalized = normalize_with_policy(&layer, &Region::Full, DegeneratePolicy::Constant(0.0))?;
        assert_eq!(normalized.raster().masked_data(), vec![Some(0.0), Some(0.0), None, Some(0.0)]);

        assert!(matches!(
            normalize_with_policy(&layer, &Region::Full, DegeneratePolicy::Constant(2.0)),
            Err(Error::Configuration(_))
        ));

        Ok(())
    }

    #[test]
    fn region_without_data() -> Result<()> {
        let layer = continuous("slope", 1, 2, &[NOD, NOD])?;
        assert!(matches!(normalize(&layer, &Region::Full), Err(Error::EmptyRegion(_))));

        let layer = continuous("slope", 1, 2, &[1.0, 2.0])?;
        let region = Region::extent(1000.0, 1000.0, 2000.0, 2000.0);
        assert!(matches!(normalize(&layer, &region), Err(Error::EmptyRegion(_))));

        Ok(())
    }

    #[test]
    fn indicator_layer() -> Result<()> {
        let landcover = RasterLayer::new("landcover", MeasurementKind::Categorical, raster(1, 4, &[50.0, 40.0, NOD, 50.0])?);
        let urban = indicator(&landcover, 50.0)?;
        assert_eq!(urban.raster().masked_data(), vec![Some(1.0), Some(0.0), None, Some(1.0)]);

        let rainfall = continuous("rainfall", 1, 1, &[50.0])?;
        assert!(matches!(indicator(&rainfall, 50.0), Err(Error::Configuration(_))));

        Ok(())
    }

    #[test]
    fn degenerate_policy_serde() {
        assert_eq!(serde_json::from_str::<DegeneratePolicy>("\"reject\"").ok(), Some(DegeneratePolicy::Reject));
        assert_eq!(
            serde_json::from_str::<DegeneratePolicy>("{\"constant\": 0.5}").ok(),
            Some(DegeneratePolicy::Constant(0.5))
        );
    }
}
