use super::*;
use crate::image::{GelImage, SampleDepth};

/// Bright vertical stripes of `lane_width` pixels centered at `centers`,
/// on a dark background.
fn striped_image(width: usize, height: usize, centers: &[usize], lane_width: usize) -> GelImage {
    let mut data = vec![20u16; width * height];
    for y in 0..height {
        for &c in centers {
            let lo = c.saturating_sub(lane_width / 2);
            let hi = (c + lane_width / 2 + 1).min(width);
            for x in lo..hi {
                data[y * width + x] = 220;
            }
        }
    }
    GelImage::new(width, height, 1, SampleDepth::Eight, data).unwrap()
}

#[test]
fn evenly_spaced_stripes_detect_as_lanes() {
    let centers = [20usize, 60, 100, 140, 180];
    let img = striped_image(200, 120, &centers, 12);
    let det = detect_lanes(&img, &LaneParams::default()).unwrap();
    assert_eq!(det.lanes.len(), centers.len());
    for (lane, &expected) in det.lanes.iter().zip(centers.iter()) {
        assert!(
            lane.center.abs_diff(expected) <= 2,
            "lane {} center {} vs expected {expected}",
            lane.index,
            lane.center
        );
        assert!(lane.lo <= lane.center && lane.center < lane.hi);
    }
    assert_eq!(det.lanes.first().unwrap().lo, 0);
    assert_eq!(det.lanes.last().unwrap().hi, 200);
    assert!(det.warnings.is_empty());
    assert!(det.confidence > 0.5);
}

#[test]
fn lanes_tile_the_profile_without_overlap() {
    let centers = [30usize, 70, 110];
    let img = striped_image(140, 80, &centers, 14);
    let det = detect_lanes(&img, &LaneParams::default()).unwrap();
    for pair in det.lanes.windows(2) {
        assert_eq!(pair[0].hi, pair[1].lo);
    }
}

#[test]
fn flat_image_yields_no_lanes_found() {
    let img = GelImage::new(64, 64, 1, SampleDepth::Eight, vec![17; 64 * 64]).unwrap();
    let err = detect_lanes(&img, &LaneParams::default()).unwrap_err();
    assert!(matches!(err, LaneDetectError::NoLanesFound { .. }));
}

#[test]
fn count_hint_mismatch_warns_but_returns_lanes() {
    let centers = [25usize, 75, 125];
    let img = striped_image(150, 60, &centers, 10);
    let params = LaneParams {
        count_hint: Some(5),
        ..Default::default()
    };
    let det = detect_lanes(&img, &params).unwrap();
    assert_eq!(det.lanes.len(), 3);
    assert_eq!(
        det.warnings,
        vec![DetectionWarning::LaneCountMismatch {
            expected: 5,
            found: 3
        }]
    );
}

#[test]
fn inverted_profile_finds_dark_lanes() {
    // Dark stripes on a light background, as stained gels photograph.
    let centers = [40usize, 100];
    let mut data = vec![230u16; 140 * 60];
    for y in 0..60 {
        for &c in &centers {
            for x in c - 6..=c + 6 {
                data[y * 140 + x] = 30;
            }
        }
    }
    let img = GelImage::new(140, 60, 1, SampleDepth::Eight, data).unwrap();
    let params = LaneParams {
        invert: true,
        ..Default::default()
    };
    let det = detect_lanes(&img, &params).unwrap();
    assert_eq!(det.lanes.len(), 2);
}

#[test]
fn horizontal_migration_detects_row_lanes() {
    // Bright horizontal stripes: lanes are row intervals, samples run along x.
    let (w, h) = (200usize, 160usize);
    let centers = [30usize, 80, 130];
    let mut data = vec![20u16; w * h];
    for &c in &centers {
        for y in c - 6..=c + 6 {
            for x in 0..w {
                data[y * w + x] = 220;
            }
        }
    }
    let img = GelImage::new(w, h, 1, SampleDepth::Eight, data).unwrap();
    let params = LaneParams {
        axis: MigrationAxis::Horizontal,
        ..Default::default()
    };
    let det = detect_lanes(&img, &params).unwrap();
    assert_eq!(det.lanes.len(), centers.len());
    for (lane, &expected) in det.lanes.iter().zip(centers.iter()) {
        assert!(
            lane.center.abs_diff(expected) <= 2,
            "row lane {} center {} vs expected {expected}",
            lane.index,
            lane.center
        );
        assert_eq!(lane.axis, MigrationAxis::Horizontal);
    }
    assert_eq!(det.lanes.first().unwrap().lo, 0);
    assert_eq!(det.lanes.last().unwrap().hi, h);
}

#[test]
fn lane_bounds_stay_mutable() {
    let mut lane = Lane {
        index: 0,
        lo: 10,
        hi: 30,
        center: 20,
        axis: MigrationAxis::Vertical,
    };
    lane.set_bounds(25, 40);
    assert_eq!((lane.lo, lane.hi), (25, 40));
    assert_eq!(lane.center, 25, "center clamped into the new interval");
}
