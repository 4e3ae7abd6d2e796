//! JPEG encoding through a reusable mozjpeg compressor.
//!
//! This module provides:
//! - [`EncoderContext`]: owns one compressor state across many encodes
//! - Parameter binding from [`EncodeParams`] onto the compressor
//! - Structured recovery from compressor faults
//!
//! # Architecture
//!
//! Each encode runs one synchronous compression cycle. Faults raised deep
//! inside the C library are caught at a single boundary, turned into
//! [`EncodeError::CompressionFailed`], and the cycle is aborted without
//! tearing down the context.
//!
//! # Examples
//!
//! ```ignore
//! use mozenc_core::encode::{EncodeParams, EncodeRequest, EncoderContext, Subsampling};
//!
//! let mut ctx = EncoderContext::create()?;
//! let pixels = vec![128u8; 100 * 100 * 3];
//! let params = EncodeParams { quality: 85, subsampling: Subsampling::S444, ..Default::default() };
//! let jpeg = ctx.encode(&EncodeRequest::new(&pixels, 100, 100, params)?)?;
//! println!("Encoded {} bytes", jpeg.len());
//! ```

mod binder;
mod context;
mod destination;
mod trampoline;
mod types;

pub use binder::Capabilities;
pub use context::EncoderContext;
pub use types::{required_len, ColorSpace, EncodeError, EncodeParams, EncodeRequest, Subsampling};
