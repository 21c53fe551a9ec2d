//! I/O helpers bridging decoded files and analysis reports.
//!
//! - `load_gel_image`: read a PNG/TIFF/etc. into a [`GelImage`], preserving
//!   8- vs 16-bit depth and gray vs RGB layout where the container has one.
//! - `write_json_file`: pretty-print a serializable report to disk.
//!
//! Format parsing itself lives in the `image` crate; the core never touches
//! file bytes.
use super::{GelImage, SampleDepth};
use image::DynamicImage;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Load an image from disk into a [`GelImage`].
///
/// Gray and RGB layouts at 8 and 16 bits map directly; anything else (alpha,
/// float) is converted to 16-bit RGB first.
pub fn load_gel_image(path: &Path) -> Result<GelImage, String> {
    let img = image::open(path).map_err(|e| format!("Failed to open {}: {e}", path.display()))?;
    let gel = match img {
        DynamicImage::ImageLuma8(buf) => {
            let (w, h) = (buf.width() as usize, buf.height() as usize);
            let data = buf.into_raw().into_iter().map(u16::from).collect();
            GelImage::new(w, h, 1, SampleDepth::Eight, data)
        }
        DynamicImage::ImageRgb8(buf) => {
            let (w, h) = (buf.width() as usize, buf.height() as usize);
            let data = buf.into_raw().into_iter().map(u16::from).collect();
            GelImage::new(w, h, 3, SampleDepth::Eight, data)
        }
        DynamicImage::ImageLuma16(buf) => {
            let (w, h) = (buf.width() as usize, buf.height() as usize);
            GelImage::new(w, h, 1, SampleDepth::Sixteen, buf.into_raw())
        }
        DynamicImage::ImageRgb16(buf) => {
            let (w, h) = (buf.width() as usize, buf.height() as usize);
            GelImage::new(w, h, 3, SampleDepth::Sixteen, buf.into_raw())
        }
        other => {
            let buf = other.into_rgb16();
            let (w, h) = (buf.width() as usize, buf.height() as usize);
            GelImage::new(w, h, 3, SampleDepth::Sixteen, buf.into_raw())
        }
    };
    gel.map_err(|e| format!("Rejected {}: {e}", path.display()))
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON for {}: {e}", path.display()))?;
    fs::write(path, json).map_err(|e| format!("Failed to write JSON {}: {e}", path.display()))
}

fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}
