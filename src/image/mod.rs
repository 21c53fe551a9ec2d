//! Image value types shared by every pipeline stage.
//!
//! [`GelImage`] is the immutable sample grid handed in by the decoding layer:
//! row-major, channel-interleaved `u16` samples with an explicit
//! [`SampleDepth`]. Construction validates shape and depth so downstream
//! stages never re-check invariants.

pub mod io;
mod plane;

pub use plane::FloatPlane;

use serde::{Deserialize, Serialize};

/// Bit depth of image samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleDepth {
    Eight,
    Sixteen,
}

impl SampleDepth {
    /// Number of bits per sample.
    #[inline]
    pub fn bits(self) -> u32 {
        match self {
            SampleDepth::Eight => 8,
            SampleDepth::Sixteen => 16,
        }
    }

    /// Largest representable sample value.
    #[inline]
    pub fn max_value(self) -> u16 {
        match self {
            SampleDepth::Eight => u8::MAX as u16,
            SampleDepth::Sixteen => u16::MAX,
        }
    }

    /// Number of representable sample values (histogram bins, LUT entries).
    #[inline]
    pub fn bin_count(self) -> usize {
        1usize << self.bits()
    }
}

/// Reasons an image buffer is rejected at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeError {
    /// Zero-sized grid or a channel count other than 1 or 3.
    UnsupportedImageShape {
        width: usize,
        height: usize,
        channels: usize,
    },
    /// Buffer length does not match `width × height × channels`.
    BufferSizeMismatch { expected: usize, found: usize },
    /// A sample exceeds the declared bit depth.
    SampleOutOfDepth { value: u16, max: u16 },
}

impl std::fmt::Display for ShapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShapeError::UnsupportedImageShape {
                width,
                height,
                channels,
            } => write!(
                f,
                "unsupported image shape {width}×{height}×{channels} (need non-empty, 1 or 3 channels)"
            ),
            ShapeError::BufferSizeMismatch { expected, found } => {
                write!(f, "buffer size mismatch (expected {expected}, found {found})")
            }
            ShapeError::SampleOutOfDepth { value, max } => {
                write!(f, "sample {value} exceeds declared depth (max {max})")
            }
        }
    }
}

impl std::error::Error for ShapeError {}

/// Immutable gel image: row-major, channel-interleaved `u16` samples.
///
/// Every pipeline operation preserves channel count and depth unless its
/// documentation says otherwise.
#[derive(Clone, Debug)]
pub struct GelImage {
    width: usize,
    height: usize,
    channels: usize,
    depth: SampleDepth,
    data: Vec<u16>,
}

impl GelImage {
    /// Construct from a raw interleaved buffer, validating all invariants.
    pub fn new(
        width: usize,
        height: usize,
        channels: usize,
        depth: SampleDepth,
        data: Vec<u16>,
    ) -> Result<Self, ShapeError> {
        if width == 0 || height == 0 || !(channels == 1 || channels == 3) {
            return Err(ShapeError::UnsupportedImageShape {
                width,
                height,
                channels,
            });
        }
        let expected = width * height * channels;
        if data.len() != expected {
            return Err(ShapeError::BufferSizeMismatch {
                expected,
                found: data.len(),
            });
        }
        let max = depth.max_value();
        if let Some(&value) = data.iter().find(|&&v| v > max) {
            return Err(ShapeError::SampleOutOfDepth { value, max });
        }
        Ok(Self {
            width,
            height,
            channels,
            depth,
            data,
        })
    }

    /// Construct from a buffer already known to satisfy the invariants
    /// (samples produced by a clamped LUT or resampler).
    pub(crate) fn from_validated(
        width: usize,
        height: usize,
        channels: usize,
        depth: SampleDepth,
        data: Vec<u16>,
    ) -> Self {
        debug_assert_eq!(data.len(), width * height * channels);
        Self {
            width,
            height,
            channels,
            depth,
            data,
        }
    }

    /// Image width in pixels
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of channels (1 or 3)
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Sample depth
    #[inline]
    pub fn depth(&self) -> SampleDepth {
        self.depth
    }

    /// Largest representable sample value for this image
    #[inline]
    pub fn max_value(&self) -> u16 {
        self.depth.max_value()
    }

    /// Raw interleaved samples in row-major order
    #[inline]
    pub fn data(&self) -> &[u16] {
        &self.data
    }

    /// Sample at `(x, y)` in channel `c`.
    #[inline]
    pub fn sample(&self, x: usize, y: usize, c: usize) -> u16 {
        self.data[(y * self.width + x) * self.channels + c]
    }

    /// Channel-averaged luma plane normalized to `[0, 1]`.
    ///
    /// This is the working representation for lane and band detection.
    pub fn luma_plane(&self) -> FloatPlane {
        let mut plane = FloatPlane::new(self.width, self.height);
        let scale = 1.0 / (self.max_value() as f32 * self.channels as f32);
        for y in 0..self.height {
            let row = &self.data[y * self.width * self.channels..(y + 1) * self.width * self.channels];
            let out = plane.row_mut(y);
            for (x, px) in out.iter_mut().enumerate() {
                let base = x * self.channels;
                let sum: u32 = row[base..base + self.channels]
                    .iter()
                    .map(|&v| v as u32)
                    .sum();
                *px = sum as f32 * scale;
            }
        }
        plane
    }
}

impl PartialEq for GelImage {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.channels == other.channels
            && self.depth == other.depth
            && self.data == other.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_rejects_bad_shapes() {
        assert!(matches!(
            GelImage::new(0, 4, 1, SampleDepth::Eight, vec![]),
            Err(ShapeError::UnsupportedImageShape { .. })
        ));
        assert!(matches!(
            GelImage::new(4, 4, 2, SampleDepth::Eight, vec![0; 32]),
            Err(ShapeError::UnsupportedImageShape { .. })
        ));
        assert!(matches!(
            GelImage::new(4, 4, 1, SampleDepth::Eight, vec![0; 15]),
            Err(ShapeError::BufferSizeMismatch {
                expected: 16,
                found: 15
            })
        ));
    }

    #[test]
    fn constructor_rejects_samples_beyond_depth() {
        let mut data = vec![0u16; 16];
        data[7] = 300;
        assert_eq!(
            GelImage::new(4, 4, 1, SampleDepth::Eight, data),
            Err(ShapeError::SampleOutOfDepth { value: 300, max: 255 })
        );
    }

    #[test]
    fn luma_plane_averages_channels() {
        let data = vec![30u16, 60, 90, 120, 150, 180];
        let img = GelImage::new(2, 1, 3, SampleDepth::Eight, data).unwrap();
        let plane = img.luma_plane();
        let expected = (30.0 + 60.0 + 90.0) / (3.0 * 255.0);
        assert!((plane.get(0, 0) - expected).abs() < 1e-6);
    }
}
