//! Multi-criteria raster risk classification.
//!
//! Raster layers of different meaning and resolution are resampled onto one analysis grid,
//! normalized, combined into a weighted composite index, classified with percentile breakpoints
//! and validated against an independently classified reference raster.
//!
//! The individual stages are exposed as free functions ([`resample::resample`], [`normalize::normalize`],
//! [`composite::build`], [`classify::classify`], [`accuracy::validate`]), [`RiskPipeline`] chains them
//! according to a [`config::PipelineConfig`].

#![warn(clippy::unwrap_used)]

pub type Result<T = ()> = std::result::Result<T, Error>;

pub mod accuracy;
pub mod classify;
pub mod composite;
pub mod config;
mod error;
mod layer;
pub mod normalize;
mod pipeline;
mod region;
pub mod resample;
#[cfg(test)]
mod testutils;

#[doc(inline)]
pub use accuracy::{AccuracyReport, ConfusionMatrix};
#[doc(inline)]
pub use classify::{ClassBreakpoints, ClassRaster};
#[doc(inline)]
pub use composite::{CompositeScore, WeightSet};
#[doc(inline)]
pub use config::PipelineConfig;
#[doc(inline)]
pub use error::Error;
#[doc(inline)]
pub use layer::{MeasurementKind, NormalizedLayer, RasterLayer};
#[doc(inline)]
pub use pipeline::{PipelineInputs, PipelineOutput, RiskPipeline};
#[doc(inline)]
pub use region::Region;
