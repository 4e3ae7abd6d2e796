//! Request/response bridge over [`EncoderContext`].
//!
//! Host bindings pass loosely typed arguments (signed dimensions, integer
//! codes). This module validates them, builds an [`EncodeRequest`] and
//! collapses every failure into a single [`BridgeError`] carrying the
//! human-readable diagnostic.

use mozenc_core::{ColorSpace, EncodeError, EncodeParams, EncodeRequest, EncoderContext, Subsampling};
use thiserror::Error;
use tracing::debug;

/// The only error kind visible across the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BridgeError {
    pub message: String,
}

impl From<EncodeError> for BridgeError {
    fn from(err: EncodeError) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

/// Opaque owner of one encoder context.
#[derive(Debug)]
pub struct ContextHandle {
    context: EncoderContext,
}

impl ContextHandle {
    pub fn context(&self) -> &EncoderContext {
        &self.context
    }
}

/// Construct a new context.
pub fn create_context() -> Result<ContextHandle, BridgeError> {
    let context = EncoderContext::create()?;
    Ok(ContextHandle { context })
}

/// Release a context's compressor state. Safe to repeat; `None` is ignored.
pub fn destroy_context(handle: Option<&mut ContextHandle>) {
    if let Some(handle) = handle {
        handle.context.destroy();
    }
}

/// Encode raw samples through `handle`.
///
/// Codes follow the wire encoding: color space 0 = RGB, 1 = grayscale;
/// subsampling 0 = 4:4:4, 1 = 4:2:2, 2 = 4:2:0, 3 = forced gray.
///
/// # Errors
///
/// Fails before touching the compressor when a dimension is negative, a
/// code or the quality is out of range, or `bytes` is shorter than
/// width x height x components. Compressor faults are reported with their
/// diagnostic text; the context stays usable.
#[allow(clippy::too_many_arguments)]
pub fn encode(
    handle: &mut ContextHandle,
    bytes: &[u8],
    width: i32,
    height: i32,
    color_space: i32,
    quality: i32,
    progressive: bool,
    optimize_huffman: bool,
    trellis: bool,
    dering: bool,
    subsampling: i32,
) -> Result<Vec<u8>, BridgeError> {
    let (width, height) = match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) => (w, h),
        _ => {
            return Err(EncodeError::InvalidDimensions {
                width: i64::from(width),
                height: i64::from(height),
            }
            .into())
        }
    };
    let quality = u8::try_from(quality)
        .ok()
        .filter(|q| *q <= 100)
        .ok_or(EncodeError::InvalidQuality(quality))?;

    let params = EncodeParams {
        color_space: ColorSpace::try_from(color_space)?,
        quality,
        progressive,
        optimize_huffman,
        trellis,
        dering,
        subsampling: Subsampling::try_from(subsampling)?,
    };
    let request = EncodeRequest::new(bytes, width, height, params)?;

    debug!(width, height, ?params, "bridge encode");
    Ok(handle.context.encode(&request)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_rgb(handle: &mut ContextHandle, bytes: &[u8], w: i32, h: i32) -> Result<Vec<u8>, BridgeError> {
        encode(handle, bytes, w, h, 0, 80, false, true, false, false, 2)
    }

    #[test]
    fn test_create_encode_destroy() {
        let mut handle = create_context().unwrap();
        let jpeg = encode_rgb(&mut handle, &[200u8; 16 * 16 * 3], 16, 16).unwrap();
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
        assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9]);

        destroy_context(Some(&mut handle));
        assert!(!handle.context().is_initialized());
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let mut handle = create_context().unwrap();
        destroy_context(Some(&mut handle));
        destroy_context(Some(&mut handle));
        destroy_context(None);

        let err = encode_rgb(&mut handle, &[0u8; 3], 1, 1).unwrap_err();
        assert_eq!(err.message, EncodeError::NotInitialized.to_string());
    }

    #[test]
    fn test_short_buffer_rejected() {
        let mut handle = create_context().unwrap();
        let err = encode_rgb(&mut handle, &[0u8; 10], 2, 2).unwrap_err();
        assert!(err.message.contains("expected at least 12 bytes, got 10"));
    }

    #[test]
    fn test_grayscale_buffer_length_uses_one_component() {
        let mut handle = create_context().unwrap();
        let jpeg = encode(&mut handle, &[0u8; 4], 2, 2, 1, 80, false, true, false, false, 0).unwrap();
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_negative_dimensions_rejected() {
        let mut handle = create_context().unwrap();
        let err = encode_rgb(&mut handle, &[0u8; 12], -2, 2).unwrap_err();
        assert_eq!(err.message, "Invalid dimensions: -2x2");
    }

    #[test]
    fn test_bad_codes_rejected() {
        let mut handle = create_context().unwrap();
        let pixels = [0u8; 12];

        let err = encode(&mut handle, &pixels, 2, 2, 7, 80, false, true, false, false, 0).unwrap_err();
        assert_eq!(err.message, "Unsupported color space: 7");

        let err = encode(&mut handle, &pixels, 2, 2, 0, 80, false, true, false, false, 4).unwrap_err();
        assert_eq!(err.message, "Unsupported chroma subsampling: 4");
    }

    #[test]
    fn test_quality_out_of_range() {
        let mut handle = create_context().unwrap();
        let pixels = [0u8; 12];
        for quality in [-1, 101, 1000] {
            let err = encode(&mut handle, &pixels, 2, 2, 0, quality, false, true, false, false, 0).unwrap_err();
            assert_eq!(err, BridgeError::from(EncodeError::InvalidQuality(quality)));
        }
    }

    #[test]
    fn test_compressor_fault_keeps_context_usable() {
        let mut handle = create_context().unwrap();
        let err = encode_rgb(&mut handle, &[], 0, 4).unwrap_err();
        assert!(!err.message.is_empty());

        assert!(encode_rgb(&mut handle, &[90u8; 4 * 4 * 3], 4, 4).is_ok());
    }

    #[test]
    fn test_output_decodes() {
        let mut handle = create_context().unwrap();
        let jpeg = encode(&mut handle, &[30u8; 8 * 8 * 3], 8, 8, 0, 90, true, true, true, true, 0).unwrap();
        let decoded = image::load_from_memory_with_format(&jpeg, image::ImageFormat::Jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 8));
    }
}
