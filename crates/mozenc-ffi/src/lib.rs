//! Mozenc FFI - host bindings for mozenc-core
//!
//! This crate adapts the encoder context to callers that speak in integer
//! codes and raw buffers.
//!
//! # Module Structure
//!
//! - `bridge` - Validating request/response layer with a single error kind
//! - `capi` - `extern "C"` surface with opaque handles and thread-local errors
//!
//! # Usage
//!
//! ```ignore
//! use mozenc_ffi::{create_context, destroy_context, encode};
//!
//! let mut ctx = create_context()?;
//! let jpeg = encode(&mut ctx, &rgb, 640, 480, 0, 85, true, true, false, false, 2)?;
//! destroy_context(Some(&mut ctx));
//! ```

mod bridge;
pub mod capi;

pub use bridge::{create_context, destroy_context, encode, BridgeError, ContextHandle};

/// Get the version of the bindings
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
