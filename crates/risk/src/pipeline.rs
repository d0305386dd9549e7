use std::collections::BTreeMap;

use geo::GeoReference;
use rayon::prelude::*;

use crate::{
    AccuracyReport, ClassBreakpoints, ClassRaster, CompositeScore, Error, NormalizedLayer, PipelineConfig, RasterLayer, Region,
    Result,
    accuracy::{self, MIN_VALID_SAMPLES},
    classify::{self, ClassArea},
    composite,
    config::{LayerConfig, LayerTransform},
    normalize, resample,
};

/// The input rasters of a run, keyed by input name
#[derive(Debug, Clone)]
pub struct PipelineInputs {
    pub layers: BTreeMap<String, RasterLayer>,
    pub reference: RasterLayer,
}

impl PipelineInputs {
    pub fn new(reference: RasterLayer) -> Self {
        PipelineInputs {
            layers: BTreeMap::new(),
            reference,
        }
    }

    pub fn with_layer(mut self, layer: RasterLayer) -> Self {
        self.layers.insert(layer.name().to_string(), layer);
        self
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub composite: CompositeScore,
    pub predicted: ClassRaster,
    pub predicted_breakpoints: ClassBreakpoints,
    pub reference: ClassRaster,
    pub reference_breakpoints: ClassBreakpoints,
    pub report: AccuracyReport,
    pub class_areas: Vec<ClassArea>,
    pub class_labels: Vec<String>,
}

/// Chains resampling, normalization, compositing, classification and validation for a configuration.
///
/// The per layer work runs in parallel, the first failing layer aborts the run.
#[derive(Debug, Clone)]
pub struct RiskPipeline {
    config: PipelineConfig,
    grid: GeoReference,
    region: Region,
}

impl RiskPipeline {
    /// Validates the configuration, no raster work is done for an invalid configuration
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let grid = config.grid.geo_reference()?;
        let region = config.region.map(|region| region.region()).unwrap_or_default();

        Ok(RiskPipeline { config, grid, region })
    }

    /// Restricts the statistics to a different region, e.g. an administrative boundary mask
    pub fn with_region(mut self, region: Region) -> Result<Self> {
        if region.cell_count(&self.grid)? == 0 {
            return Err(Error::EmptyRegion(format!("the {region} does not contain any cell of the analysis grid")));
        }

        self.region = region;
        Ok(self)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn grid(&self) -> &GeoReference {
        &self.grid
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Resamples the input onto the analysis grid and turns it into a [0, 1] risk factor
    pub fn prepare_layer(&self, layer_config: &LayerConfig, input: &RasterLayer) -> Result<NormalizedLayer> {
        check_kind(input, layer_config.kind)?;

        let resampled = resample::resample(input, &self.grid)?;
        let normalized = match layer_config.transform {
            LayerTransform::Normalize { invert } => {
                // inversion happens before normalizing so the degenerate policy sees the inverted values
                let oriented = if invert { resampled.inverted() } else { resampled };
                normalize::normalize_with_policy(&oriented, &self.region, self.config.degenerate)?
            }
            LayerTransform::Indicator { class } => normalize::indicator(&resampled, class)?,
        };

        Ok(normalized.renamed(layer_config.name.as_str()))
    }

    /// Prepares every weighted layer in parallel
    pub fn prepare_layers(&self, inputs: &PipelineInputs) -> Result<BTreeMap<String, NormalizedLayer>> {
        let jobs = self.layer_jobs(inputs)?;

        jobs.par_iter()
            .map(|(layer_config, input)| -> Result<(String, NormalizedLayer)> {
                Ok((layer_config.name.clone(), self.prepare_layer(layer_config, input)?))
            })
            .collect()
    }

    /// Resamples the reference onto the analysis grid and classifies it with its own percentile breakpoints
    pub fn classify_reference(&self, reference: &RasterLayer) -> Result<(ClassRaster, ClassBreakpoints)> {
        check_kind(reference, self.config.reference.kind)?;

        let resampled = resample::resample(reference, &self.grid)?;
        classify::classify(resampled.raster(), &self.region, &self.config.percentiles)
    }

    pub fn run(&self, inputs: &PipelineInputs) -> Result<PipelineOutput> {
        // missing inputs are reported before any raster is processed
        self.layer_jobs(inputs)?;

        log::info!(
            "Risk pipeline: {} layers, {} classes on {} ({})",
            self.config.weights.len(),
            self.config.class_count(),
            self.grid.raster_size(),
            self.region
        );

        let (prediction, reference) = rayon::join(|| self.predict(inputs), || self.classify_reference(&inputs.reference));
        let (composite, predicted, predicted_breakpoints) = prediction?;
        let (reference, reference_breakpoints) = reference?;

        let class_count = self.config.class_count();
        let samples = accuracy::sample_cells(&self.grid, &self.region, &self.config.sampling)?;
        if samples.len() < MIN_VALID_SAMPLES {
            log::warn!("The {} only contains {} cell(s)", self.region, samples.len());
        }

        let report = accuracy::validate(&predicted, &reference, &samples, class_count)?;
        let class_areas = classify::class_areas(&predicted, &self.region, class_count)?;

        for (label, area) in self.config.class_labels().iter().zip(&class_areas) {
            log::info!("{label}: {} cells ({:.1})", area.cells, area.area);
        }

        Ok(PipelineOutput {
            composite,
            predicted,
            predicted_breakpoints,
            reference,
            reference_breakpoints,
            report,
            class_areas,
            class_labels: self.config.class_labels(),
        })
    }

    fn predict(&self, inputs: &PipelineInputs) -> Result<(CompositeScore, ClassRaster, ClassBreakpoints)> {
        let layers = self.prepare_layers(inputs)?;
        let score = composite::build(&layers, &self.config.weights)?;
        let (classes, breakpoints) = classify::classify(score.raster(), &self.region, &self.config.percentiles)?;
        log::info!("Predicted breakpoints: {:?}", breakpoints.values());

        Ok((score, classes, breakpoints))
    }

    fn layer_jobs<'a>(&'a self, inputs: &'a PipelineInputs) -> Result<Vec<(&'a LayerConfig, &'a RasterLayer)>> {
        self.config
            .weighted_layers()
            .map(|layer_config| {
                inputs
                    .layers
                    .get(layer_config.source_name())
                    .map(|input| (layer_config, input))
                    .ok_or_else(|| Error::Configuration(format!("missing required layer '{}'", layer_config.source_name())))
            })
            .collect()
    }
}

fn check_kind(layer: &RasterLayer, expected: crate::MeasurementKind) -> Result<()> {
    if layer.kind() != expected {
        return Err(Error::Configuration(format!(
            "layer '{}' is {} but configured as {}",
            layer.name(),
            layer.kind(),
            expected
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::{
        MeasurementKind, WeightSet,
        config::{GridConfig, ReferenceConfig},
        normalize::DegeneratePolicy,
        testutils::{NOD, raster},
    };

    fn config() -> Result<PipelineConfig> {
        let mut elevation = LayerConfig::new("elevation", MeasurementKind::Continuous);
        elevation.transform = LayerTransform::Normalize { invert: true };

        Ok(PipelineConfig {
            grid: GridConfig {
                projection: "EPSG:3826".to_string(),
                top_left: [0.0, 100.0],
                cell_size: 100.0,
                rows: 1,
                cols: 4,
            },
            region: None,
            layers: vec![LayerConfig::new("rainfall", MeasurementKind::Continuous), elevation],
            weights: WeightSet::from_pairs([("rainfall", 0.5), ("elevation", 0.5)])?,
            percentiles: vec![50.0],
            degenerate: Default::default(),
            reference: ReferenceConfig {
                name: "reference".to_string(),
                kind: MeasurementKind::Continuous,
                path: None,
            },
            sampling: Default::default(),
            class_labels: None,
        })
    }

    fn inputs() -> Result<PipelineInputs> {
        Ok(
            PipelineInputs::new(RasterLayer::new("reference", MeasurementKind::Continuous, raster(1, 4, &[1.0, 2.0, 3.0, 4.0])?))
                .with_layer(RasterLayer::new("rainfall", MeasurementKind::Continuous, raster(1, 4, &[0.0, 10.0, 20.0, 30.0])?))
                .with_layer(RasterLayer::new("elevation", MeasurementKind::Continuous, raster(1, 4, &[30.0, 20.0, 10.0, 0.0])?)),
        )
    }

    #[test_log::test]
    fn run_on_small_grid() -> Result<()> {
        let pipeline = RiskPipeline::new(config()?)?;
        let output = pipeline.run(&inputs()?)?;

        let expected = [0.0, 1.0 / 3.0, 2.0 / 3.0, 1.0];
        assert_eq!(output.composite.raster().nodata_count(), 0);
        for (value, expected) in output.composite.raster().iter_values().zip(expected) {
            assert_relative_eq!(value, expected, epsilon = 1e-12);
        }

        assert_eq!(output.predicted.as_slice(), &[1, 1, 2, 2]);
        assert_eq!(output.reference.as_slice(), &[1, 1, 2, 2]);
        assert_eq!(output.report.accuracy, 1.0);
        assert_eq!(output.report.samples, 4);
        assert_eq!(output.class_labels, vec!["Class 1", "Class 2"]);
        assert_eq!(output.class_areas.iter().map(|area| area.cells).sum::<usize>(), 4);

        Ok(())
    }

    #[test]
    fn inverted_layer_is_normalized_after_inversion() -> Result<()> {
        let pipeline = RiskPipeline::new(config()?)?;
        let layers = pipeline.prepare_layers(&inputs()?)?;

        // 1 - elevation spans [-29, 1]
        let elevation = &layers["elevation"];
        assert_eq!(elevation.min(), -29.0);
        assert_eq!(elevation.max(), 1.0);
        assert_eq!(
            elevation.raster().masked_data(),
            vec![Some(0.0), Some(1.0 / 3.0), Some(2.0 / 3.0), Some(1.0)]
        );

        Ok(())
    }

    #[test]
    fn constant_inverted_layer_gets_the_degenerate_value() -> Result<()> {
        let mut config = config()?;
        config.degenerate = DegeneratePolicy::Constant(0.0);
        let pipeline = RiskPipeline::new(config)?;

        let elevation_config = self::config()?
            .layer("elevation")
            .cloned()
            .ok_or_else(|| Error::Configuration("no elevation layer".into()))?;
        let flat = RasterLayer::new("elevation", MeasurementKind::Continuous, raster(1, 4, &[7.0, 7.0, 7.0, 7.0])?);

        let prepared = pipeline.prepare_layer(&elevation_config, &flat)?;
        assert_eq!(prepared.raster().masked_data(), vec![Some(0.0); 4]);

        Ok(())
    }

    #[test]
    fn missing_input_fails_before_processing() -> Result<()> {
        let pipeline = RiskPipeline::new(config()?)?;
        let mut inputs = inputs()?;
        inputs.layers.remove("rainfall");

        match pipeline.run(&inputs) {
            Err(Error::Configuration(msg)) => assert!(msg.contains("rainfall")),
            other => panic!("Expected a configuration error, got {other:?}"),
        }

        Ok(())
    }

    #[test]
    fn failing_layer_aborts_the_run() -> Result<()> {
        let pipeline = RiskPipeline::new(config()?)?;
        let inputs = inputs()?.with_layer(RasterLayer::new(
            "rainfall",
            MeasurementKind::Continuous,
            raster(1, 4, &[5.0, 5.0, NOD, 5.0])?,
        ));

        match pipeline.run(&inputs) {
            Err(Error::DegenerateNormalization { layer, value }) => {
                assert_eq!(layer, "rainfall");
                assert_eq!(value, 5.0);
            }
            other => panic!("Expected a degenerate normalization, got {other:?}"),
        }

        Ok(())
    }

    #[test]
    fn input_kind_must_match_configuration() -> Result<()> {
        let pipeline = RiskPipeline::new(config()?)?;
        let inputs = inputs()?.with_layer(RasterLayer::new(
            "rainfall",
            MeasurementKind::Extensive,
            raster(1, 4, &[0.0, 1.0, 2.0, 3.0])?,
        ));

        assert!(matches!(pipeline.run(&inputs), Err(Error::Configuration(_))));

        Ok(())
    }

    #[test]
    fn invalid_configuration_is_rejected_up_front() -> Result<()> {
        let mut config = config()?;
        config.percentiles = vec![];
        assert!(matches!(RiskPipeline::new(config), Err(Error::Configuration(_))));

        Ok(())
    }

    #[test]
    fn region_outside_of_the_grid() -> Result<()> {
        let pipeline = RiskPipeline::new(config()?)?;
        assert!(matches!(
            pipeline.with_region(Region::extent(1000.0, 1000.0, 2000.0, 2000.0)),
            Err(Error::EmptyRegion(_))
        ));

        Ok(())
    }
}
