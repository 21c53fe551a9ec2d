#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod analysis;
pub mod bands;
pub mod calibrate;
pub mod image;
pub mod lanes;
pub mod levels;
pub mod transform;

// Plumbing for the demo binaries and expert use.
pub mod config;
pub mod profile;

// --- High-level re-exports -------------------------------------------------

// Main entry point: the full pipeline plus its report types.
pub use crate::analysis::{analyze, AnalysisParams, GelAnalysis, LadderSpec};

// Stage-level building blocks.
pub use crate::bands::{detect_bands, Band, BandParams, IntensityProfile};
pub use crate::calibrate::{CalibrationCurve, ControlPoint, ExtrapolationPolicy, MwEstimate};
pub use crate::image::{GelImage, SampleDepth};
pub use crate::lanes::{detect_lanes, Lane, LaneParams, MigrationAxis};
pub use crate::levels::{apply_lut, auto_levels, Histogram, LevelParams, Lut};
pub use crate::transform::{flip, rotate, FlipAxis, RotateParams};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use gel_quant::prelude::*;
///
/// # fn main() {
/// let data = vec![0u16; 320 * 240];
/// let image = GelImage::new(320, 240, 1, SampleDepth::Eight, data).unwrap();
/// match analyze(&image, &AnalysisParams::default()) {
///     Ok(report) => println!("{} lanes in {:.2} ms", report.lanes.len(), report.latency_ms),
///     Err(err) => println!("nothing to quantify: {err}"),
/// }
/// # }
/// ```
pub mod prelude {
    pub use crate::analysis::{analyze, AnalysisParams, GelAnalysis, LadderSpec};
    pub use crate::image::{GelImage, SampleDepth};
    pub use crate::lanes::{Lane, LaneParams, MigrationAxis};
}
