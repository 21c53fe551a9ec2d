use gel_quant::image::{GelImage, SampleDepth};

/// Per-lane recipe for [`synthetic_gel`]: center column plus the Gaussian
/// bands running down the lane as `(row, amplitude, sigma)`.
pub struct LaneRecipe {
    pub center: usize,
    pub bands: Vec<(f32, f32, f32)>,
}

/// Render bright lanes with Gaussian bands on a dark background, the
/// orientation the pipeline defaults expect (vertical migration).
pub fn synthetic_gel(
    width: usize,
    height: usize,
    lane_width: usize,
    recipes: &[LaneRecipe],
) -> GelImage {
    let mut data = vec![12u16; width * height];
    for recipe in recipes {
        let lo = recipe.center.saturating_sub(lane_width / 2);
        let hi = (recipe.center + lane_width / 2 + 1).min(width);
        for y in 0..height {
            let mut v = 50.0f32;
            for &(row, amp, sigma) in &recipe.bands {
                let d = y as f32 - row;
                v += amp * (-d * d / (2.0 * sigma * sigma)).exp();
            }
            let v = v.min(255.0) as u16;
            for x in lo..hi {
                data[y * width + x] = v;
            }
        }
    }
    GelImage::new(width, height, 1, SampleDepth::Eight, data)
        .expect("synthetic gel dimensions are valid")
}

/// Evenly spaced plain stripes with no bands.
pub fn striped_gel(width: usize, height: usize, count: usize, lane_width: usize) -> GelImage {
    let spacing = width / (count + 1);
    let recipes: Vec<LaneRecipe> = (1..=count)
        .map(|i| LaneRecipe {
            center: i * spacing,
            bands: Vec::new(),
        })
        .collect();
    synthetic_gel(width, height, lane_width, &recipes)
}
