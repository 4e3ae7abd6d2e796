//! High-level encoder with persistent settings.
//!
//! [`Encoder`] pairs an [`EncoderContext`] with a set of [`EncoderSettings`]
//! so callers configure once and then encode many images with a single call.

use crate::encode::{ColorSpace, EncodeError, EncodeParams, EncodeRequest, EncoderContext, Subsampling};
use crate::profile::JpegProfile;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Settings applied to every encode that doesn't override them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderSettings {
    pub quality: u8,
    pub progressive: bool,
    pub optimize_huffman: bool,
    pub trellis: bool,
    pub dering: bool,
    pub subsampling: Subsampling,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        let params = EncodeParams::default();
        Self {
            quality: params.quality,
            progressive: params.progressive,
            optimize_huffman: params.optimize_huffman,
            trellis: params.trellis,
            dering: params.dering,
            subsampling: params.subsampling,
        }
    }
}

impl EncoderSettings {
    fn params(&self, color_space: ColorSpace) -> EncodeParams {
        EncodeParams {
            color_space,
            quality: self.quality,
            progressive: self.progressive,
            optimize_huffman: self.optimize_huffman,
            trellis: self.trellis,
            dering: self.dering,
            subsampling: self.subsampling,
        }
    }
}

/// JPEG encoder owning a reusable compressor context.
///
/// Not for concurrent use; create one encoder per thread.
///
/// # Example
///
/// ```ignore
/// use mozenc_core::{Encoder, JpegProfile};
///
/// let mut encoder = Encoder::new()?;
/// encoder.set_quality(90)?;
/// encoder.set_chroma_subsampling("4:4:4")?;
/// let jpeg = encoder.encode_rgb(&pixels, 1024, 768)?;
/// let doc = encoder.encode_with_profile(&pixels, 1024, 768, JpegProfile::ScanDocument)?;
/// ```
#[derive(Debug)]
pub struct Encoder {
    context: EncoderContext,
    settings: EncoderSettings,
}

impl Encoder {
    /// Create an encoder with default settings.
    pub fn new() -> Result<Self, EncodeError> {
        Self::with_settings(EncoderSettings::default())
    }

    pub fn with_settings(settings: EncoderSettings) -> Result<Self, EncodeError> {
        if settings.quality > 100 {
            return Err(EncodeError::InvalidQuality(settings.quality as i32));
        }
        Ok(Self {
            context: EncoderContext::create()?,
            settings,
        })
    }

    pub fn settings(&self) -> &EncoderSettings {
        &self.settings
    }

    /// Set quality (0-100).
    pub fn set_quality(&mut self, quality: u8) -> Result<(), EncodeError> {
        if quality > 100 {
            return Err(EncodeError::InvalidQuality(quality as i32));
        }
        self.settings.quality = quality;
        Ok(())
    }

    pub fn set_progressive(&mut self, progressive: bool) {
        self.settings.progressive = progressive;
    }

    pub fn set_optimize_huffman(&mut self, optimize_huffman: bool) {
        self.settings.optimize_huffman = optimize_huffman;
    }

    pub fn set_trellis_quant(&mut self, trellis: bool) {
        self.settings.trellis = trellis;
    }

    pub fn set_overshoot_deringing(&mut self, dering: bool) {
        self.settings.dering = dering;
    }

    pub fn set_subsampling(&mut self, subsampling: Subsampling) {
        self.settings.subsampling = subsampling;
    }

    /// Set subsampling by name: "4:4:4", "4:2:2", "4:2:0" or "Gray".
    pub fn set_chroma_subsampling(&mut self, name: &str) -> Result<(), EncodeError> {
        self.settings.subsampling = name.parse()?;
        Ok(())
    }

    /// Encode RGB samples (3 bytes per pixel) with the current settings.
    pub fn encode_rgb(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>, EncodeError> {
        let params = self.settings.params(ColorSpace::Rgb);
        self.encode_params(pixels, width, height, params)
    }

    /// Encode RGB samples with a profile's settings, for this call only.
    pub fn encode_with_profile(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        profile: JpegProfile,
    ) -> Result<Vec<u8>, EncodeError> {
        self.encode_params(pixels, width, height, profile.params())
    }

    /// Encode grayscale samples (1 byte per pixel).
    pub fn encode_grayscale(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>, EncodeError> {
        let params = EncodeParams {
            subsampling: Subsampling::ForceGray,
            ..self.settings.params(ColorSpace::Grayscale)
        };
        self.encode_params(pixels, width, height, params)
    }

    /// Encode an `image` buffer. RGB8 and Luma8 are used as-is; anything
    /// else is converted to RGB8 first.
    pub fn encode_image(&mut self, image: &DynamicImage) -> Result<Vec<u8>, EncodeError> {
        let (width, height) = (image.width(), image.height());
        match image {
            DynamicImage::ImageRgb8(rgb) => self.encode_rgb(rgb.as_raw(), width, height),
            DynamicImage::ImageLuma8(gray) => self.encode_grayscale(gray.as_raw(), width, height),
            other => {
                let rgb = other.to_rgb8();
                self.encode_rgb(rgb.as_raw(), width, height)
            }
        }
    }

    /// Encode with an explicit parameter set.
    pub fn encode_params(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        params: EncodeParams,
    ) -> Result<Vec<u8>, EncodeError> {
        let request = EncodeRequest::new(pixels, width, height, params)?;
        self.context.encode(&request)
    }

    /// Release the compressor. Idempotent; later encodes fail with
    /// [`EncodeError::NotInitialized`].
    pub fn close(&mut self) {
        self.context.destroy();
    }

    pub fn is_closed(&self) -> bool {
        !self.context.is_initialized()
    }

    pub fn context(&self) -> &EncoderContext {
        &self.context
    }
}
