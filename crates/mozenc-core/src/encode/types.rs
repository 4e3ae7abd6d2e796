//! Core types for JPEG encoding.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error types for encoder context operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// The compressor state could not be constructed.
    #[error("Encoder initialization failed: {message}")]
    InitializationFailed { message: String },

    /// `encode` was called on a destroyed or never-initialized context.
    #[error("Encoder not initialized")]
    NotInitialized,

    /// Color space code outside the supported set (0 = RGB, 1 = grayscale).
    #[error("Unsupported color space: {0}")]
    UnsupportedColorSpace(i32),

    /// Subsampling code outside the supported set (0..=3).
    #[error("Unsupported chroma subsampling: {0}")]
    UnsupportedSubsampling(i32),

    /// Subsampling name that doesn't parse.
    #[error("Unknown subsampling: {0}")]
    UnknownSubsampling(String),

    /// Pixel buffer is too small for the declared dimensions.
    #[error("Input buffer too small for image dimensions: expected at least {expected} bytes, got {actual}")]
    InvalidInput { expected: usize, actual: usize },

    /// Dimensions that cannot be represented (negative at the adapter boundary).
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: i64, height: i64 },

    /// Quality outside 0..=100.
    #[error("Quality must be between 0 and 100, got {0}")]
    InvalidQuality(i32),

    /// The compressor raised a fatal error mid-cycle.
    #[error("JPEG compression failed: {message}")]
    CompressionFailed { message: String },
}

/// Input color space of the raw samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpace {
    /// Interleaved 8-bit RGB, 3 bytes per pixel.
    #[default]
    Rgb,
    /// Single-channel 8-bit luma, 1 byte per pixel.
    Grayscale,
}

impl ColorSpace {
    /// Number of interleaved samples per pixel.
    #[inline]
    pub fn components(self) -> usize {
        match self {
            ColorSpace::Rgb => 3,
            ColorSpace::Grayscale => 1,
        }
    }

    /// Wire code used by the bindings (0 = RGB, 1 = grayscale).
    pub fn code(self) -> i32 {
        match self {
            ColorSpace::Rgb => 0,
            ColorSpace::Grayscale => 1,
        }
    }
}

impl TryFrom<i32> for ColorSpace {
    type Error = EncodeError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ColorSpace::Rgb),
            1 => Ok(ColorSpace::Grayscale),
            other => Err(EncodeError::UnsupportedColorSpace(other)),
        }
    }
}

/// Chroma subsampling mode.
///
/// Only meaningful for RGB input. `ForceGray` switches the compressor's
/// output color space to grayscale after defaults are applied; the samples
/// themselves are still supplied as RGB and converted by the compressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Subsampling {
    /// No chroma subsampling.
    #[serde(rename = "4:4:4")]
    S444,
    /// Half horizontal chroma resolution.
    #[serde(rename = "4:2:2")]
    S422,
    /// Quarter chroma resolution.
    #[default]
    #[serde(rename = "4:2:0")]
    S420,
    /// Single-component grayscale output.
    #[serde(rename = "gray")]
    ForceGray,
}

impl Subsampling {
    /// Luma sampling factors `(h, v)`, or `None` for grayscale output.
    pub fn luma_factors(self) -> Option<(i32, i32)> {
        match self {
            Subsampling::S444 => Some((1, 1)),
            Subsampling::S422 => Some((2, 1)),
            Subsampling::S420 => Some((2, 2)),
            Subsampling::ForceGray => None,
        }
    }

    /// Wire code used by the bindings.
    pub fn code(self) -> i32 {
        match self {
            Subsampling::S444 => 0,
            Subsampling::S422 => 1,
            Subsampling::S420 => 2,
            Subsampling::ForceGray => 3,
        }
    }
}

impl TryFrom<i32> for Subsampling {
    type Error = EncodeError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Subsampling::S444),
            1 => Ok(Subsampling::S422),
            2 => Ok(Subsampling::S420),
            3 => Ok(Subsampling::ForceGray),
            other => Err(EncodeError::UnsupportedSubsampling(other)),
        }
    }
}

impl FromStr for Subsampling {
    type Err = EncodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "4:4:4" => Ok(Subsampling::S444),
            "4:2:2" => Ok(Subsampling::S422),
            "4:2:0" => Ok(Subsampling::S420),
            "Gray" | "gray" => Ok(Subsampling::ForceGray),
            other => Err(EncodeError::UnknownSubsampling(other.to_string())),
        }
    }
}

impl fmt::Display for Subsampling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Subsampling::S444 => "4:4:4",
            Subsampling::S422 => "4:2:2",
            Subsampling::S420 => "4:2:0",
            Subsampling::ForceGray => "Gray",
        };
        f.write_str(name)
    }
}

/// Per-call compression parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeParams {
    /// Color space of the input samples.
    pub color_space: ColorSpace,
    /// Quality (0-100); mapped to quantization tables by the compressor.
    pub quality: u8,
    /// Emit a multi-scan progressive stream instead of a single baseline scan.
    pub progressive: bool,
    /// Compute optimal Huffman tables instead of using the standard ones.
    pub optimize_huffman: bool,
    /// Trellis quantization (mozjpeg extension).
    pub trellis: bool,
    /// Overshoot deringing (mozjpeg extension).
    pub dering: bool,
    /// Chroma subsampling mode.
    pub subsampling: Subsampling,
}

impl Default for EncodeParams {
    fn default() -> Self {
        Self {
            color_space: ColorSpace::Rgb,
            quality: 75,
            progressive: true,
            optimize_huffman: true,
            trellis: false,
            dering: false,
            subsampling: Subsampling::S420,
        }
    }
}

/// A validated encode request borrowing the caller's samples.
///
/// Construction checks that `pixels` holds at least
/// `width * height * components` bytes, so the scanline loop never reads
/// past the end of the slice.
#[derive(Debug, Clone, Copy)]
pub struct EncodeRequest<'a> {
    pixels: &'a [u8],
    width: u32,
    height: u32,
    params: EncodeParams,
}

impl<'a> EncodeRequest<'a> {
    /// Validate and build a request.
    ///
    /// Trailing bytes beyond the required length are ignored. Zero
    /// dimensions pass validation; the compressor rejects them.
    pub fn new(
        pixels: &'a [u8],
        width: u32,
        height: u32,
        params: EncodeParams,
    ) -> Result<Self, EncodeError> {
        if params.quality > 100 {
            return Err(EncodeError::InvalidQuality(params.quality as i32));
        }

        let expected = required_len(width, height, params.color_space).ok_or(
            EncodeError::InvalidInput {
                expected: usize::MAX,
                actual: pixels.len(),
            },
        )?;

        if pixels.len() < expected {
            return Err(EncodeError::InvalidInput {
                expected,
                actual: pixels.len(),
            });
        }

        Ok(Self {
            pixels,
            width,
            height,
            params,
        })
    }

    pub fn pixels(&self) -> &'a [u8] {
        self.pixels
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn params(&self) -> &EncodeParams {
        &self.params
    }

    /// Bytes per scanline of input.
    pub fn row_stride(&self) -> usize {
        self.width as usize * self.params.color_space.components()
    }
}

/// Minimum buffer length for an image, or `None` on overflow.
pub fn required_len(width: u32, height: u32, color_space: ColorSpace) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|wh| wh.checked_mul(color_space.components()))
}
