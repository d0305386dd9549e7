use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use env_logger::{Env, TimestampPrecision};
use risk::{
    AccuracyReport, MeasurementKind, PipelineConfig, PipelineInputs, PipelineOutput, RasterLayer, RiskPipeline,
    classify::ClassArea,
};
use serde::Serialize;

mod rasterfile;

pub type Result<T = ()> = anyhow::Result<T>;

#[derive(Parser, Debug)]
#[command(name = "riskcli", about = "Multi-criteria raster risk classification")]
struct Cli {
    #[arg(short = 'v', long = "verbose", global = true, help = "Log progress information")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Run the pipeline and write the classification summary")]
    Run {
        #[arg(short = 'c', long = "config", help = "Pipeline configuration (JSON)")]
        config: PathBuf,
        #[arg(short = 'o', long = "output", help = "Summary output path (JSON)")]
        output: PathBuf,
        #[arg(long = "classes", help = "Write the predicted class raster to this path")]
        classes: Option<PathBuf>,
        #[arg(long = "composite", help = "Write the composite score raster to this path")]
        composite: Option<PathBuf>,
    },
    #[command(about = "Validate a pipeline configuration without processing any raster")]
    Check {
        #[arg(short = 'c', long = "config", help = "Pipeline configuration (JSON)")]
        config: PathBuf,
    },
}

#[derive(Serialize)]
struct RunSummary<'a> {
    class_labels: &'a [String],
    predicted_breakpoints: &'a [f64],
    reference_breakpoints: &'a [f64],
    class_areas: &'a [ClassArea],
    validation: &'a AccuracyReport,
}

impl<'a> RunSummary<'a> {
    fn new(output: &'a PipelineOutput) -> Self {
        RunSummary {
            class_labels: &output.class_labels,
            predicted_breakpoints: output.predicted_breakpoints.values(),
            reference_breakpoints: output.reference_breakpoints.values(),
            class_areas: &output.class_areas,
            validation: &output.report,
        }
    }
}

/// Input rasters are resolved relative to the configuration file, `<name>.json` when no path is configured
fn input_path(config_dir: &Path, name: &str, path: Option<&Path>) -> PathBuf {
    match path {
        Some(path) => config_dir.join(path),
        None => config_dir.join(format!("{name}.json")),
    }
}

fn load_layer(path: &Path, name: &str, kind: MeasurementKind) -> Result<RasterLayer> {
    log::info!("Loading {kind} layer '{name}' from '{}'", path.display());
    Ok(RasterLayer::new(name, kind, rasterfile::read_raster(path)?))
}

fn load_inputs(config: &PipelineConfig, config_dir: &Path) -> Result<PipelineInputs> {
    let reference = &config.reference;
    let mut inputs = PipelineInputs::new(load_layer(
        &input_path(config_dir, &reference.name, reference.path.as_deref()),
        &reference.name,
        reference.kind,
    )?);

    // validation guarantees layers sharing an input agree on its kind and path
    for layer in config.weighted_layers() {
        let source = layer.source_name();
        if inputs.layers.contains_key(source) {
            continue;
        }

        let path = input_path(config_dir, source, layer.path.as_deref());
        inputs = inputs.with_layer(load_layer(&path, source, layer.kind)?);
    }

    Ok(inputs)
}

fn run(config_path: &Path, output: &Path, classes: Option<&Path>, composite: Option<&Path>) -> Result<()> {
    let config = PipelineConfig::from_file(config_path)
        .with_context(|| format!("Failed to load configuration '{}'", config_path.display()))?;
    let pipeline = RiskPipeline::new(config)?;

    let config_dir = config_path.parent().unwrap_or(Path::new("."));
    let inputs = load_inputs(pipeline.config(), config_dir)?;
    let result = pipeline.run(&inputs)?;

    println!("{}", result.report);

    let summary = serde_json::to_string_pretty(&RunSummary::new(&result))?;
    std::fs::write(output, summary).with_context(|| format!("Failed to write summary '{}'", output.display()))?;

    if let Some(path) = classes {
        rasterfile::write_raster(&result.predicted, path)?;
    }

    if let Some(path) = composite {
        rasterfile::write_raster(result.composite.raster(), path)?;
    }

    Ok(())
}

fn check(config_path: &Path) -> Result<()> {
    let config = PipelineConfig::from_file(config_path)
        .with_context(|| format!("Failed to load configuration '{}'", config_path.display()))?;
    let pipeline = RiskPipeline::new(config)?;

    println!(
        "Configuration is valid: {} weighted layers, {} classes on {}",
        pipeline.config().weights.len(),
        pipeline.config().class_count(),
        pipeline.grid()
    );

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp(Some(TimestampPrecision::Millis))
        .init();

    match cli.command {
        Commands::Run {
            config,
            output,
            classes,
            composite,
        } => run(&config, &output, classes.as_deref(), composite.as_deref()),
        Commands::Check { config } => check(&config),
    }
}
