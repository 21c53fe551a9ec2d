use gel_quant::analysis::GelAnalysis;
use gel_quant::config::{self, RuntimeConfig};
use gel_quant::image::io::{load_gel_image, write_json_file};
use std::env;
use std::path::Path;

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config = load_config_from_args()?;
    let image = load_gel_image(&config.input_path)?;
    let report = gel_quant::analyze(&image, &config.params)
        .map_err(|e| format!("Analysis of {} failed: {e}", config.input_path.display()))?;

    print_text_summary(&report);
    if let Some(path) = &config.output.json_out {
        write_json_file(path, &report)?;
        println!("JSON report written to {}", path.display());
    }
    Ok(())
}

fn load_config_from_args() -> Result<RuntimeConfig, String> {
    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| "gel_demo".to_string());
    let path = args
        .next()
        .ok_or_else(|| format!("Usage: {program} <config.json>"))?;
    config::load_config(Path::new(&path))
}

fn print_text_summary(report: &GelAnalysis) {
    println!(
        "lanes={} confidence={:.3} latency_ms={:.3}",
        report.lanes.len(),
        report.confidence,
        report.latency_ms
    );
    if let Some(curve) = &report.calibration {
        let (lo, hi) = curve.span();
        println!(
            "calibration: span [{lo:.1}, {hi:.1}] px, R²={:.4}",
            curve.r_squared()
        );
    }
    for lane in &report.lanes {
        println!(
            "lane {} [{}, {}): {} bands",
            lane.lane.index,
            lane.lane.lo,
            lane.lane.hi,
            lane.bands.len()
        );
        for band in &lane.bands {
            let mw = band
                .molecular_weight
                .map(|est| {
                    let marker = if est.extrapolated { "~" } else { "" };
                    format!("{marker}{:.1} kDa", est.weight)
                })
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  band @{} [{}, {}] area={:.3} mw={mw}",
                band.peak, band.start, band.end, band.area
            );
        }
    }
    for warning in &report.warnings {
        println!("warning: {warning:?}");
    }
}
