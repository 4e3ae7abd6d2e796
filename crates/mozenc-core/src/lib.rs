//! Mozenc Core - reusable mozjpeg encoder context
//!
//! This crate turns raw RGB or grayscale samples into JPEG streams through a
//! long-lived compressor state, reconfigured for every image. Compressor
//! faults are recovered at a single boundary and reported as errors; the
//! context survives them.
//!
//! # Module Structure
//!
//! - `encode` - Encoder context, parameter binding, error recovery
//! - `profile` - Preset parameter sets
//! - `encoder` - High-level encoder with persistent settings
//!
//! # Logging
//!
//! Events are emitted through `tracing`; install a subscriber in the host
//! to see them.

pub mod encode;
pub mod encoder;
pub mod profile;

pub use encode::{
    Capabilities, ColorSpace, EncodeError, EncodeParams, EncodeRequest, EncoderContext, Subsampling,
};
pub use encoder::{Encoder, EncoderSettings};
pub use profile::JpegProfile;

/// Result alias for encoder operations.
pub type Result<T> = std::result::Result<T, EncodeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::EnvFilter;

    #[test]
    fn test_encode_with_subscriber_installed() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("mozenc_core=trace"))
            .with_test_writer()
            .try_init();

        let mut ctx = EncoderContext::create().unwrap();
        let pixels = vec![64u8; 4 * 4 * 3];
        let request = EncodeRequest::new(&pixels, 4, 4, EncodeParams::default()).unwrap();
        assert!(ctx.encode(&request).is_ok());

        let bad = EncodeRequest::new(&[], 0, 0, EncodeParams::default()).unwrap();
        assert!(matches!(ctx.encode(&bad), Err(EncodeError::CompressionFailed { .. })));
    }

    #[test]
    fn test_result_alias() {
        fn quality_of(profile: JpegProfile) -> Result<u8> {
            Ok(profile.params().quality)
        }
        assert_eq!(quality_of(JpegProfile::ColorPhoto), Ok(85));
    }
}
