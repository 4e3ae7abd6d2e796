//! Preset compression profiles for common inputs.

use crate::encode::{ColorSpace, EncodeParams, Subsampling};
use serde::{Deserialize, Serialize};

/// Named parameter presets. All expect RGB input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JpegProfile {
    /// Scanned documents: aggressive compression, still readable.
    ScanDocument,
    /// Text pages stored as grayscale.
    GrayscaleText,
    /// Color photographs without chroma loss.
    ColorPhoto,
    /// Archival, near-lossless baseline output.
    LosslessNear,
}

impl JpegProfile {
    pub const ALL: [JpegProfile; 4] = [
        JpegProfile::ScanDocument,
        JpegProfile::GrayscaleText,
        JpegProfile::ColorPhoto,
        JpegProfile::LosslessNear,
    ];

    /// Full parameter set for this profile.
    pub fn params(self) -> EncodeParams {
        let (quality, progressive, optimize_huffman, trellis, dering, subsampling) = match self {
            JpegProfile::ScanDocument => (60, true, true, true, true, Subsampling::S420),
            JpegProfile::GrayscaleText => (70, true, true, true, true, Subsampling::ForceGray),
            JpegProfile::ColorPhoto => (85, true, true, true, true, Subsampling::S444),
            JpegProfile::LosslessNear => (95, false, true, false, false, Subsampling::S444),
        };
        EncodeParams {
            color_space: ColorSpace::Rgb,
            quality,
            progressive,
            optimize_huffman,
            trellis,
            dering,
            subsampling,
        }
    }
}
