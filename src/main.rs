use gel_quant::prelude::*;

fn main() {
    // Demo stub: builds a synthetic three-lane gel and runs the pipeline.
    let (w, h) = (240usize, 160usize);
    let mut data = vec![15u16; w * h];
    for (i, &cx) in [40usize, 120, 200].iter().enumerate() {
        for y in 0..h {
            for x in cx - 10..=cx + 10 {
                let dy = y as f32 - (40.0 + 30.0 * i as f32);
                let band = 180.0 * (-dy * dy / 50.0).exp();
                data[y * w + x] = (40.0 + band).min(255.0) as u16;
            }
        }
    }
    let image = GelImage::new(w, h, 1, SampleDepth::Eight, data).expect("valid synthetic image");

    match analyze(&image, &AnalysisParams::default()) {
        Ok(report) => {
            println!(
                "lanes={} confidence={:.3} latency_ms={:.3}",
                report.lanes.len(),
                report.confidence,
                report.latency_ms
            );
            for lane in &report.lanes {
                println!(
                    "  lane {} [{}, {}): {} bands",
                    lane.lane.index,
                    lane.lane.lo,
                    lane.lane.hi,
                    lane.bands.len()
                );
            }
        }
        Err(err) => eprintln!("analysis failed: {err}"),
    }
}
