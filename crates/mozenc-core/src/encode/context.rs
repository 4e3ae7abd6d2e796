//! Reusable encoder context.
//!
//! An [`EncoderContext`] owns one compressor state, constructed once and
//! reconfigured from scratch on every [`EncoderContext::encode`]. A fault
//! raised by the compressor aborts only the current cycle; the context stays
//! usable afterwards.
//!
//! # Threading
//!
//! The compressor state is mutated in place, so a context serves one encode
//! at a time (`encode` takes `&mut self`). Separate contexts share nothing
//! and can run on separate threads in parallel.

use super::binder::{self, Capabilities, StandardHuffman};
use super::destination::OutputBuffer;
use super::trampoline;
use super::types::{EncodeError, EncodeRequest};
use mozjpeg_sys::{
    jpeg_abort_compress, jpeg_compress_struct, jpeg_create_compress, jpeg_destroy_compress,
    jpeg_error_mgr, jpeg_finish_compress, jpeg_start_compress, jpeg_write_scanlines,
};
use std::fmt;
use std::ptr;
use tracing::{debug, trace, warn};

/// The compressor struct, the error manager it points at, and the standard
/// Huffman tables captured when it was created.
///
/// Always boxed: `cinfo.common.err` holds the address of `err`.
pub(crate) struct CompressorState {
    pub(crate) cinfo: jpeg_compress_struct,
    err: jpeg_error_mgr,
    pub(crate) huffman: StandardHuffman,
}

impl CompressorState {
    /// Allocate and construct the compressor.
    ///
    /// Defaults are installed once here so the standard Huffman tables can
    /// be captured; every encode binds its own settings over them.
    ///
    /// On a fault the partially constructed state is torn down before the
    /// diagnostic is returned; `jpeg_destroy_compress` only frees pools
    /// that exist.
    pub(crate) fn create() -> Result<Box<Self>, String> {
        let mut state = Box::new(Self {
            cinfo: unsafe { std::mem::zeroed() },
            err: unsafe { std::mem::zeroed() },
            huffman: StandardHuffman::default(),
        });
        trampoline::install(&mut state.err);
        state.cinfo.common.err = &mut state.err;

        // On Err, dropping `state` destroys whatever was allocated so far
        let huffman = trampoline::recover(|| unsafe {
            jpeg_create_compress(&mut state.cinfo);
            StandardHuffman::capture(&mut state.cinfo)
        })?;
        state.huffman = huffman;
        Ok(state)
    }
}

impl Drop for CompressorState {
    fn drop(&mut self) {
        unsafe { jpeg_destroy_compress(&mut self.cinfo) };
    }
}

/// Reusable JPEG encoder context.
///
/// # Example
///
/// ```ignore
/// use mozenc_core::encode::{EncodeParams, EncodeRequest, EncoderContext};
///
/// let mut ctx = EncoderContext::create()?;
/// let pixels = vec![128u8; 64 * 64 * 3];
/// let request = EncodeRequest::new(&pixels, 64, 64, EncodeParams::default())?;
/// let jpeg = ctx.encode(&request)?;
/// assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
/// ctx.destroy();
/// ```
pub struct EncoderContext {
    /// `Some` exactly while the context is initialized.
    state: Option<Box<CompressorState>>,
    capabilities: Capabilities,
    last_error: Option<String>,
}

// SAFETY: the compressor state is exclusively owned by the context and the
// library keeps no global mutable state, so moving a context to another
// thread is sound. It is not Sync; encode needs `&mut self`.
unsafe impl Send for EncoderContext {}

impl EncoderContext {
    /// Construct a context and probe the compressor's optional extensions.
    pub fn create() -> Result<Self, EncodeError> {
        let mut state = CompressorState::create().map_err(|message| {
            warn!(%message, "compressor construction failed");
            EncodeError::InitializationFailed { message }
        })?;

        let capabilities = unsafe { Capabilities::detect(&mut state.cinfo) };
        debug!(?capabilities, "encoder context created");

        Ok(Self {
            state: Some(state),
            capabilities,
            last_error: None,
        })
    }

    /// Release the compressor state. Further encodes fail with
    /// [`EncodeError::NotInitialized`]. Safe to call repeatedly.
    pub fn destroy(&mut self) {
        if self.state.take().is_some() {
            debug!("encoder context destroyed");
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    /// Extensions detected when the context was created.
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Diagnostic text of the most recent compressor fault, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Compress one image.
    ///
    /// Returns a fresh byte vector owned by the caller. On a compressor
    /// fault the cycle is aborted, no partial output is returned, and the
    /// context remains usable.
    pub fn encode(&mut self, request: &EncodeRequest<'_>) -> Result<Vec<u8>, EncodeError> {
        let capabilities = self.capabilities;
        let state = self.state.as_mut().ok_or(EncodeError::NotInitialized)?;

        let params = request.params();
        debug!(
            width = request.width(),
            height = request.height(),
            color_space = ?params.color_space,
            subsampling = %params.subsampling,
            quality = params.quality,
            progressive = params.progressive,
            "encoding image"
        );

        let mut output = OutputBuffer::new();
        let cycle = trampoline::recover(|| unsafe {
            run_cycle(&mut state.cinfo, request, capabilities, &state.huffman, &mut output)
        })
        .and_then(|written| written);

        // The destination dies with this call
        state.cinfo.dest = ptr::null_mut();

        match cycle {
            Ok(()) => {
                let bytes = output.into_bytes();
                debug!(bytes = bytes.len(), "image encoded");
                Ok(bytes)
            }
            Err(message) => {
                // Back to the idle state; tables and allocations survive
                unsafe { jpeg_abort_compress(&mut state.cinfo) };
                warn!(%message, "compression cycle aborted");
                self.last_error = Some(message.clone());
                Err(EncodeError::CompressionFailed { message })
            }
        }
    }
}

impl fmt::Debug for EncoderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncoderContext")
            .field("initialized", &self.is_initialized())
            .field("capabilities", &self.capabilities)
            .field("last_error", &self.last_error)
            .finish()
    }
}

/// One full compression cycle: configure, start, write rows, finish.
///
/// Faults unwind out of here; run inside [`trampoline::recover`].
unsafe fn run_cycle(
    cinfo: &mut jpeg_compress_struct,
    request: &EncodeRequest<'_>,
    capabilities: Capabilities,
    standard: &StandardHuffman,
    output: &mut OutputBuffer,
) -> Result<(), String> {
    output.attach(cinfo);
    binder::bind(cinfo, request, capabilities, standard);

    jpeg_start_compress(cinfo, 1);

    // One row per call, strictly in order
    let pixels = request.pixels();
    let stride = request.row_stride();
    let mut row_pointer: [*const u8; 1] = [ptr::null()];
    for row in 0..request.height() as usize {
        debug_assert_eq!(cinfo.next_scanline as usize, row);
        row_pointer[0] = pixels[row * stride..].as_ptr();
        let written = jpeg_write_scanlines(cinfo, row_pointer.as_ptr() as *mut _, 1);
        if written != 1 {
            return Err(format!("compressor accepted {written} rows at scanline {row}"));
        }
    }
    trace!(rows = request.height(), "scanlines written");

    jpeg_finish_compress(cinfo);
    Ok(())
}


// ============================================================================
// Decode Round-Trip Tests
// ============================================================================


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::encode::types::{ColorSpace, EncodeParams, Subsampling};
    use proptest::prelude::*;

    fn subsampling_strategy() -> impl Strategy<Value = Subsampling> {
        (0i32..=3).prop_map(|code| Subsampling::try_from(code).unwrap())
    }

    fn params_strategy() -> impl Strategy<Value = EncodeParams> {
        (
            any::<bool>(),
            0u8..=100,
            any::<bool>(),
            any::<bool>(),
            any::<bool>(),
            any::<bool>(),
            subsampling_strategy(),
        )
            .prop_map(
                |(gray, quality, progressive, optimize_huffman, trellis, dering, subsampling)| {
                    EncodeParams {
                        color_space: if gray { ColorSpace::Grayscale } else { ColorSpace::Rgb },
                        quality,
                        progressive,
                        optimize_huffman,
                        trellis,
                        dering,
                        subsampling,
                    }
                },
            )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Property: Valid input always yields a complete stream.
        #[test]
        fn prop_valid_input_has_soi_and_eoi(
            (width, height) in (1u32..=24, 1u32..=24),
            params in params_strategy(),
            seed in any::<u8>(),
        ) {
            let len = (width * height) as usize * params.color_space.components();
            let pixels: Vec<u8> = (0..len).map(|i| (i as u8).wrapping_mul(seed | 1)).collect();

            let mut ctx = EncoderContext::create().unwrap();
            let request = EncodeRequest::new(&pixels, width, height, params).unwrap();
            let jpeg = ctx.encode(&request).unwrap();

            prop_assert!(jpeg.len() >= 4);
            prop_assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
            prop_assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9]);
        }

        /// Property: Same request, same bytes, on the same or a fresh context,
        /// whatever the context encoded before.
        #[test]
        fn prop_deterministic_output(
            (width, height) in (1u32..=16, 1u32..=16),
            params in params_strategy(),
            (prior_width, prior_height) in (1u32..=16, 1u32..=16),
            prior_params in params_strategy(),
            prior_seed in any::<u8>(),
        ) {
            let len = (width * height) as usize * params.color_space.components();
            let pixels: Vec<u8> = (0..len).map(|i| (i * 7 % 256) as u8).collect();
            let request = EncodeRequest::new(&pixels, width, height, params).unwrap();

            let prior_len = (prior_width * prior_height) as usize * prior_params.color_space.components();
            let prior_pixels: Vec<u8> = (0..prior_len)
                .map(|i| (i as u8).wrapping_mul(prior_seed | 1).wrapping_add(prior_seed))
                .collect();
            let prior = EncodeRequest::new(&prior_pixels, prior_width, prior_height, prior_params).unwrap();

            let mut ctx = EncoderContext::create().unwrap();
            ctx.encode(&prior).unwrap();
            let first = ctx.encode(&request).unwrap();
            let second = ctx.encode(&request).unwrap();
            let fresh = EncoderContext::create().unwrap().encode(&request).unwrap();

            prop_assert_eq!(&first, &second);
            prop_assert_eq!(&first, &fresh);
        }

        /// Property: A short buffer is rejected before the compressor runs.
        #[test]
        fn prop_short_buffer_is_invalid_input(
            (width, height) in (1u32..=32, 1u32..=32),
            gray in any::<bool>(),
            missing in 1usize..=16,
        ) {
            let params = EncodeParams {
                color_space: if gray { ColorSpace::Grayscale } else { ColorSpace::Rgb },
                ..EncodeParams::default()
            };
            let expected = (width * height) as usize * params.color_space.components();
            let pixels = vec![0u8; expected.saturating_sub(missing)];

            let result = EncodeRequest::new(&pixels, width, height, params);
            prop_assert!(
                matches!(result, Err(EncodeError::InvalidInput { .. })),
                "short buffer should be InvalidInput"
            );
        }
    }
}
