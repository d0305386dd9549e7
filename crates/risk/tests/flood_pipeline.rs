use geo::{CellIterator, CellSize, DenseRaster, GeoReference, Point, RasterSize};
use risk::{Error, MeasurementKind, PipelineConfig, PipelineInputs, RasterLayer, Region, Result, RiskPipeline};

const PROJECTION: &str = "EPSG:32648";
const EXTENT: f64 = 3000.0;

const CONFIG: &str = r#"{
    "grid": { "projection": "EPSG:32648", "top_left": [0.0, 3000.0], "cell_size": 150.0, "rows": 20, "cols": 20 },
    "layers": [
        { "name": "rainfall", "kind": "continuous" },
        { "name": "elevation", "kind": "continuous", "transform": { "type": "normalize", "invert": true } },
        { "name": "population", "kind": "extensive" },
        { "name": "urban", "source": "landcover", "kind": "categorical", "transform": { "type": "indicator", "class": 50 } },
        { "name": "cropland", "source": "landcover", "kind": "categorical", "transform": { "type": "indicator", "class": 40 } }
    ],
    "weights": { "rainfall": 0.35, "elevation": 0.35, "population": 0.2, "urban": 0.06, "cropland": 0.04 },
    "reference": { "name": "reference", "kind": "continuous" }
}"#;

/// Square grid covering the test extent with its top left corner at (0, EXTENT)
fn grid(cell_size: f64) -> GeoReference {
    let cells = (EXTENT / cell_size).round() as usize;
    GeoReference::with_top_left(
        PROJECTION,
        RasterSize::square(cells),
        Point::new(0.0, EXTENT),
        CellSize::square(cell_size),
    )
}

/// Raster with the value of every cell computed from the map coordinates of its center
fn raster_from_fn(georef: GeoReference, f: impl Fn(f64, f64) -> Option<f64>) -> Result<DenseRaster<f64>> {
    let values: Vec<Option<f64>> = CellIterator::for_raster_with_size(georef.raster_size())
        .map(|cell| {
            let center = georef.cell_center(cell);
            f(center.x(), center.y())
        })
        .collect();

    Ok(DenseRaster::from_iter(georef, values.into_iter())?)
}

fn inputs() -> Result<PipelineInputs> {
    let fine = grid(50.0);

    let rainfall = raster_from_fn(fine.clone(), |x, y| Some(800.0 + x / 10.0 + (y / 300.0).sin() * 20.0))?;
    let elevation = raster_from_fn(fine.clone(), |x, y| {
        // a lake without elevation data in the lower left corner
        (x > 400.0 || y > 400.0).then_some(y / 20.0 + (x / 500.0).cos() * 10.0)
    })?;
    let population = raster_from_fn(fine.clone(), |x, _| Some((x / 200.0).floor()))?;
    let landcover = raster_from_fn(fine, |x, y| {
        Some(if x < 1000.0 {
            50.0
        } else if y < 1500.0 {
            40.0
        } else {
            10.0
        })
    })?;

    let reference = raster_from_fn(grid(300.0), |x, y| Some(x / EXTENT + (EXTENT - y) / EXTENT))?;

    Ok(PipelineInputs::new(RasterLayer::new("reference", MeasurementKind::Continuous, reference))
        .with_layer(RasterLayer::new("rainfall", MeasurementKind::Continuous, rainfall))
        .with_layer(RasterLayer::new("elevation", MeasurementKind::Continuous, elevation))
        .with_layer(RasterLayer::new("population", MeasurementKind::Extensive, population))
        .with_layer(RasterLayer::new("landcover", MeasurementKind::Categorical, landcover)))
}

fn pipeline() -> Result<RiskPipeline> {
    RiskPipeline::new(PipelineConfig::from_json(CONFIG)?)
}

#[test_log::test]
fn flood_risk_classification() -> Result<()> {
    let output = pipeline()?.run(&inputs()?)?;

    let grid = output.composite.grid();
    assert_eq!(grid.raster_size(), RasterSize::square(20));
    assert!(output.composite.raster().iter_values().all(|v| (0.0..=1.0 + 1e-6).contains(&v)));

    // the lake cells have no elevation so they have no score
    let nodata = output.predicted.nodata_count();
    assert!(nodata > 0);
    assert_eq!(nodata, output.composite.raster().nodata_count());
    assert!(output.predicted.iter_values().all(|class| (1..=5).contains(&class)));
    assert!(output.reference.iter_values().all(|class| (1..=5).contains(&class)));

    assert_eq!(output.predicted_breakpoints.values().len(), 4);
    assert!(output.predicted_breakpoints.values().windows(2).all(|pair| pair[0] <= pair[1]));

    let report = &output.report;
    assert_eq!(report.samples + report.discarded, 400);
    assert_eq!(report.discarded, nodata);
    assert_eq!(report.matrix.total() as usize, report.samples);
    assert!((0.0..=1.0).contains(&report.accuracy));

    let classified_cells: usize = output.class_areas.iter().map(|area| area.cells).sum();
    assert_eq!(classified_cells, 400 - nodata);
    for area in &output.class_areas {
        assert_eq!(area.area, area.cells as f64 * 150.0 * 150.0);
    }

    assert_eq!(output.class_labels, vec!["Very Low", "Low", "Moderate", "High", "Very High"]);

    Ok(())
}

#[test]
fn runs_are_reproducible() -> Result<()> {
    let pipeline = pipeline()?;
    let first = pipeline.run(&inputs()?)?;
    let second = pipeline.run(&inputs()?)?;

    assert_eq!(first.composite.raster(), second.composite.raster());
    assert_eq!(first.predicted, second.predicted);
    assert_eq!(first.report, second.report);

    Ok(())
}

#[test]
fn prediction_validated_against_itself() -> Result<()> {
    let pipeline = pipeline()?;
    let first = pipeline.run(&inputs()?)?;

    let mut inputs = inputs()?;
    inputs.reference = RasterLayer::new("reference", MeasurementKind::Continuous, first.composite.into_raster());
    let output = pipeline.run(&inputs)?;

    assert_eq!(output.reference, output.predicted);
    assert_eq!(output.report.accuracy, 1.0);
    assert_eq!(output.report.kappa, Some(1.0));

    Ok(())
}

#[test]
fn sampled_validation_within_region() -> Result<()> {
    let mut config = PipelineConfig::from_json(CONFIG)?;
    config.sampling.count = 50;
    config.sampling.seed = 3;

    // the upper half of the grid, without the lake
    let pipeline = RiskPipeline::new(config)?.with_region(Region::extent(0.0, 1500.0, EXTENT, EXTENT))?;
    let output = pipeline.run(&inputs()?)?;

    assert_eq!(output.report.samples + output.report.discarded, 50);
    assert_eq!(output.report.discarded, 0);

    let classified_cells: usize = output.class_areas.iter().map(|area| area.cells).sum();
    assert_eq!(classified_cells, 200);

    Ok(())
}

#[test]
fn layer_on_other_projection() -> Result<()> {
    let mut inputs = inputs()?;
    let wgs84 = GeoReference::with_top_left(
        "EPSG:4326",
        RasterSize::square(10),
        Point::new(105.0, 21.0),
        CellSize::square(0.01),
    );
    inputs.layers.insert(
        "rainfall".to_string(),
        RasterLayer::new("rainfall", MeasurementKind::Continuous, DenseRaster::filled_with(wgs84, 1.0)),
    );

    match pipeline()?.run(&inputs) {
        Err(Error::GridMismatch { layer, .. }) => assert_eq!(layer, "rainfall"),
        other => panic!("Expected a grid mismatch, got {other:?}"),
    }

    Ok(())
}

#[test]
fn weights_not_summing_to_one() {
    let json = CONFIG.replace("\"cropland\": 0.04", "\"cropland\": 0.0");
    assert!(matches!(PipelineConfig::from_json(&json), Err(Error::Configuration(_))));
}
