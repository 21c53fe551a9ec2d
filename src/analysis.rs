//! Full image → quantified-band pipeline orchestration.
//!
//! `analyze` runs lane detection, per-lane band detection, and (when a ladder
//! is designated) calibration fitting plus molecular-weight assignment, and
//! returns one serializable [`GelAnalysis`] report. Detection ambiguities
//! surface as warnings; calibration failures are hard errors.

use crate::bands::{detect_bands, Band, BandParams};
use crate::calibrate::{
    CalibrationCurve, CalibrationError, ControlPoint, ExtrapolationPolicy,
};
use crate::image::GelImage;
use crate::lanes::{detect_lanes, DetectionWarning, Lane, LaneDetectError, LaneParams};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Ladder designation: which detected lane carries the marker mix, and the
/// marker weights (kDa) in descending order (heaviest first, as printed on
/// the vial).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LadderSpec {
    pub lane_index: usize,
    pub weights: Vec<f64>,
    #[serde(default)]
    pub policy: ExtrapolationPolicy,
}

/// Parameters for the whole pipeline.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisParams {
    pub lanes: LaneParams,
    pub bands: BandParams,
    pub ladder: Option<LadderSpec>,
}

/// Non-fatal pipeline events reported next to best-effort results.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum AnalysisWarning {
    Lane { warning: DetectionWarning },
    /// The ladder lane produced a different number of bands than the spec has
    /// weights; calibration was skipped rather than guessed.
    LadderBandCountMismatch { expected: usize, found: usize },
    /// The designated ladder lane index exceeds the detected lane count.
    LadderLaneMissing { index: usize, lane_count: usize },
    /// A band's position fell outside the calibrated span under the `Fail`
    /// extrapolation policy; its molecular weight stays unassigned.
    UncalibratedBand {
        lane: usize,
        band: usize,
        position: usize,
    },
}

/// One lane with its detected bands.
#[derive(Clone, Debug, Serialize)]
pub struct LaneAnalysis {
    pub lane: Lane,
    pub bands: Vec<Band>,
}

/// Complete pipeline report.
#[derive(Clone, Debug, Serialize)]
pub struct GelAnalysis {
    pub lanes: Vec<LaneAnalysis>,
    /// Index of the ladder lane the calibration was built from, if any.
    pub ladder_lane: Option<usize>,
    pub calibration: Option<CalibrationCurve>,
    pub confidence: f32,
    pub warnings: Vec<AnalysisWarning>,
    pub latency_ms: f64,
}

/// Pipeline failures. Lane-detection degeneracies are recoverable by retrying
/// with adjusted parameters; calibration errors mean the ladder itself is
/// unusable.
#[derive(Clone, Debug, PartialEq)]
pub enum AnalysisError {
    Lanes(LaneDetectError),
    Calibration(CalibrationError),
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisError::Lanes(e) => write!(f, "lane detection failed: {e}"),
            AnalysisError::Calibration(e) => write!(f, "calibration failed: {e}"),
        }
    }
}

impl std::error::Error for AnalysisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AnalysisError::Lanes(e) => Some(e),
            AnalysisError::Calibration(e) => Some(e),
        }
    }
}

impl From<LaneDetectError> for AnalysisError {
    fn from(e: LaneDetectError) -> Self {
        AnalysisError::Lanes(e)
    }
}

impl From<CalibrationError> for AnalysisError {
    fn from(e: CalibrationError) -> Self {
        AnalysisError::Calibration(e)
    }
}

/// Run the full pipeline over one image.
pub fn analyze(image: &GelImage, params: &AnalysisParams) -> Result<GelAnalysis, AnalysisError> {
    let started = Instant::now();
    let detection = detect_lanes(image, &params.lanes)?;
    let mut warnings: Vec<AnalysisWarning> = detection
        .warnings
        .iter()
        .map(|&warning| AnalysisWarning::Lane { warning })
        .collect();

    let lanes: Vec<LaneAnalysis> = detection
        .lanes
        .iter()
        .map(|lane| LaneAnalysis {
            lane: *lane,
            bands: detect_bands(image, lane, &params.bands),
        })
        .collect();

    let mut analysis = GelAnalysis {
        lanes,
        ladder_lane: None,
        calibration: None,
        confidence: detection.confidence,
        warnings: Vec::new(),
        latency_ms: 0.0,
    };

    if let Some(ladder) = &params.ladder {
        match ladder_control_points(&analysis.lanes, ladder) {
            Ok(points) => {
                let curve = CalibrationCurve::fit(&points, ladder.policy)?;
                analysis.ladder_lane = Some(ladder.lane_index);
                analysis.apply_calibration(curve);
            }
            Err(warning) => {
                warn!("calibration skipped: {warning:?}");
                warnings.push(warning);
            }
        }
    }
    analysis.warnings.extend(warnings);
    analysis.latency_ms = started.elapsed().as_secs_f64() * 1e3;
    debug!(
        "analyze: {} lanes, {} bands, calibrated={}, {:.2} ms",
        analysis.lanes.len(),
        analysis.lanes.iter().map(|l| l.bands.len()).sum::<usize>(),
        analysis.calibration.is_some(),
        analysis.latency_ms
    );
    Ok(analysis)
}

/// Pair the ladder lane's detected bands with the supplied marker weights.
///
/// Bands come back sorted by migration distance and marker weights are used
/// heaviest-first, so the pairing is positional.
fn ladder_control_points(
    lanes: &[LaneAnalysis],
    ladder: &LadderSpec,
) -> Result<Vec<ControlPoint>, AnalysisWarning> {
    let Some(lane) = lanes.get(ladder.lane_index) else {
        return Err(AnalysisWarning::LadderLaneMissing {
            index: ladder.lane_index,
            lane_count: lanes.len(),
        });
    };
    if lane.bands.len() != ladder.weights.len() {
        return Err(AnalysisWarning::LadderBandCountMismatch {
            expected: ladder.weights.len(),
            found: lane.bands.len(),
        });
    }
    let mut weights = ladder.weights.clone();
    weights.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    Ok(lane
        .bands
        .iter()
        .zip(weights)
        .map(|(band, weight)| ControlPoint {
            position: band.peak as f64,
            weight,
        })
        .collect())
}

impl GelAnalysis {
    /// Replace the calibration curve and recompute every band's molecular
    /// weight wholesale.
    ///
    /// Assignments from a previous curve are cleared first, so nothing stale
    /// survives a re-fit. Ladder-lane bands keep `None`: their weights are
    /// inputs, not estimates. Bands the curve refuses to evaluate (under the
    /// `Fail` policy) stay unassigned and are reported as warnings.
    pub fn apply_calibration(&mut self, curve: CalibrationCurve) {
        self.warnings
            .retain(|w| !matches!(w, AnalysisWarning::UncalibratedBand { .. }));
        let ladder_lane = self.ladder_lane;
        for (lane_idx, lane) in self.lanes.iter_mut().enumerate() {
            for (band_idx, band) in lane.bands.iter_mut().enumerate() {
                band.molecular_weight = None;
                if Some(lane_idx) == ladder_lane {
                    continue;
                }
                match curve.evaluate(band.peak as f64) {
                    Ok(estimate) => band.molecular_weight = Some(estimate),
                    Err(CalibrationError::OutOfCalibrationRange { .. }) => {
                        self.warnings.push(AnalysisWarning::UncalibratedBand {
                            lane: lane_idx,
                            band: band_idx,
                            position: band.peak,
                        });
                    }
                    Err(other) => {
                        // fit() validated the curve; evaluate cannot fail
                        // otherwise.
                        debug!("unexpected calibration error: {other}");
                    }
                }
            }
        }
        self.calibration = Some(curve);
    }
}
