use super::*;
use crate::image::{GelImage, SampleDepth};
use crate::lanes::{Lane, MigrationAxis};

fn gaussian_profile(len: usize, center: f32, sigma: f32, amp: f32, offset: f32) -> IntensityProfile {
    let values = (0..len)
        .map(|i| {
            let d = i as f32 - center;
            offset + amp * (-d * d / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    IntensityProfile { values }
}

#[test]
fn flat_profile_yields_no_bands() {
    let profile = IntensityProfile {
        values: vec![0.2; 150],
    };
    let bands = detect_bands_in_profile(&profile, &BandParams::default());
    assert!(bands.is_empty());
}

#[test]
fn single_gaussian_band_is_quantified() {
    let (sigma, amp) = (4.0f32, 0.5f32);
    let profile = gaussian_profile(200, 100.0, sigma, amp, 0.1);
    let bands = detect_bands_in_profile(&profile, &BandParams::default());
    assert_eq!(bands.len(), 1);
    let band = bands[0];
    assert!(band.peak.abs_diff(100) <= 1, "peak at {}", band.peak);
    assert!(band.start < band.peak && band.peak < band.end);

    // The analytic Gaussian integral; the 5% extent cutoff and box smoothing
    // keep the measured area within a few percent of it.
    let analytic = amp * sigma * (2.0 * std::f32::consts::PI).sqrt();
    let rel_err = (band.area - analytic).abs() / analytic;
    assert!(
        rel_err < 0.05,
        "area {} vs analytic {analytic} (rel err {rel_err})",
        band.area
    );
}

#[test]
fn overlapping_bands_split_at_the_valley() {
    let a = gaussian_profile(200, 90.0, 5.0, 0.5, 0.05);
    let b = gaussian_profile(200, 112.0, 5.0, 0.4, 0.0);
    let profile = IntensityProfile {
        values: a
            .values
            .iter()
            .zip(&b.values)
            .map(|(x, y)| x + y)
            .collect(),
    };
    let bands = detect_bands_in_profile(&profile, &BandParams::default());
    assert_eq!(bands.len(), 2, "both peaks must survive the overlap");
    assert!(bands[0].end < bands[1].start, "extents must not overlap");
    let gap = bands[1].start - bands[0].end;
    assert!(gap <= 2, "split must happen at the shared valley, gap {gap}");
}

#[test]
fn sub_threshold_ripple_is_ignored() {
    let values: Vec<f32> = (0..300)
        .map(|i| 0.3 + 0.001 * ((i as f32) * 0.7).sin())
        .collect();
    let profile = IntensityProfile { values };
    let params = BandParams {
        abs_threshold: 0.02,
        ..Default::default()
    };
    assert!(detect_bands_in_profile(&profile, &params).is_empty());
}

#[test]
fn bands_detected_from_image_and_lane() {
    // One bright vertical lane with two horizontal bands crossing it.
    let (w, h) = (60usize, 160usize);
    let mut data = vec![10u16; w * h];
    for y in 0..h {
        for x in 20..40 {
            let mut v = 40.0f32;
            for &(cy, amp) in &[(50.0f32, 180.0f32), (110.0, 140.0)] {
                let d = y as f32 - cy;
                v += amp * (-d * d / (2.0 * 16.0)).exp();
            }
            data[y * w + x] = v.min(255.0) as u16;
        }
    }
    let img = GelImage::new(w, h, 1, SampleDepth::Eight, data).unwrap();
    let lane = Lane {
        index: 0,
        lo: 20,
        hi: 40,
        center: 30,
        axis: MigrationAxis::Vertical,
    };
    let bands = detect_bands(&img, &lane, &BandParams::default());
    assert_eq!(bands.len(), 2, "bands: {bands:?}");
    assert!(bands[0].peak.abs_diff(50) <= 2);
    assert!(bands[1].peak.abs_diff(110) <= 2);
    assert!(bands[0].area > bands[1].area);
}

#[test]
fn horizontal_lane_profiles_run_along_x() {
    // One bright row lane with two Gaussian bands along x.
    let (w, h) = (200usize, 60usize);
    let mut data = vec![10u16; w * h];
    for y in 20..40 {
        for x in 0..w {
            let mut v = 40.0f32;
            for &(cx, amp) in &[(60.0f32, 180.0f32), (140.0, 140.0)] {
                let d = x as f32 - cx;
                v += amp * (-d * d / (2.0 * 16.0)).exp();
            }
            data[y * w + x] = v.min(255.0) as u16;
        }
    }
    let img = GelImage::new(w, h, 1, SampleDepth::Eight, data).unwrap();
    let lane = Lane {
        index: 0,
        lo: 20,
        hi: 40,
        center: 30,
        axis: MigrationAxis::Horizontal,
    };

    let profile = IntensityProfile::extract(&img, &lane);
    assert_eq!(profile.len(), w, "positions run along x for a row lane");

    let bands = detect_bands(&img, &lane, &BandParams::default());
    assert_eq!(bands.len(), 2, "bands: {bands:?}");
    assert!(bands[0].peak.abs_diff(60) <= 2);
    assert!(bands[1].peak.abs_diff(140) <= 2);
    assert!(bands[0].area > bands[1].area);
}

#[test]
fn dark_bands_need_the_invert_flag() {
    let (w, h) = (40usize, 120usize);
    let mut data = vec![230u16; w * h];
    for y in 55..66 {
        for x in 0..w {
            data[y * w + x] = 40;
        }
    }
    let img = GelImage::new(w, h, 1, SampleDepth::Eight, data).unwrap();
    let lane = Lane {
        index: 0,
        lo: 0,
        hi: w,
        center: w / 2,
        axis: MigrationAxis::Vertical,
    };
    let params = BandParams {
        invert: true,
        ..Default::default()
    };
    let bands = detect_bands(&img, &lane, &params);
    assert_eq!(bands.len(), 1);
    assert!(bands[0].peak.abs_diff(60) <= 2);
}
