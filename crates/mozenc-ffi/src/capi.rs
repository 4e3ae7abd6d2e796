//! C ABI for the encoder context.
//!
//! Handles are opaque. Functions that can fail return `0` on success and
//! `-1` on failure, with the diagnostic available from
//! [`mozenc_last_error`] on the same thread until the next failure.
//!
//! ```c
//! MozencContext *ctx = mozenc_context_new();
//! uint8_t *jpeg; size_t jpeg_len;
//! if (mozenc_encode(ctx, rgb, rgb_len, w, h, 0, 85, 1, 1, 0, 0, 2, &jpeg, &jpeg_len) != 0) {
//!     fprintf(stderr, "%s\n", mozenc_last_error());
//! }
//! mozenc_buffer_free(jpeg, jpeg_len);
//! mozenc_context_free(ctx);
//! ```

use crate::bridge::{self, BridgeError, ContextHandle};
use std::cell::RefCell;
use std::ffi::{c_char, CString};
use std::os::raw::{c_int, c_uchar};
use std::ptr;

/// Opaque encoder context handle.
#[repr(C)]
pub struct MozencContext {
    _private: [u8; 0],
}

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(err: &BridgeError) {
    let message = CString::new(err.message.replace('\0', " ")).unwrap_or_default();
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(message));
}

static VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");

/// Library version as a NUL-terminated string with static lifetime.
#[no_mangle]
pub extern "C" fn mozenc_version() -> *const c_char {
    VERSION.as_ptr().cast()
}

/// Message of the most recent failure on this thread, or null.
///
/// The pointer stays valid until the next failing call on this thread.
#[no_mangle]
pub extern "C" fn mozenc_last_error() -> *const c_char {
    LAST_ERROR.with(|slot| slot.borrow().as_ref().map_or(ptr::null(), |msg| msg.as_ptr()))
}

/// Create a context. Returns null on failure.
#[no_mangle]
pub extern "C" fn mozenc_context_new() -> *mut MozencContext {
    match bridge::create_context() {
        Ok(handle) => Box::into_raw(Box::new(handle)).cast(),
        Err(err) => {
            set_last_error(&err);
            ptr::null_mut()
        }
    }
}

/// Free a context. Null is ignored.
///
/// # Safety
/// `ctx` must be null or a handle from [`mozenc_context_new`] not yet freed.
#[no_mangle]
pub unsafe extern "C" fn mozenc_context_free(ctx: *mut MozencContext) {
    if !ctx.is_null() {
        let mut handle = unsafe { Box::from_raw(ctx.cast::<ContextHandle>()) };
        bridge::destroy_context(Some(&mut handle));
    }
}

/// Encode `len` bytes of samples at `data`.
///
/// On success `*out_data`/`*out_len` receive a buffer that must be released
/// with [`mozenc_buffer_free`]. On failure they are set to null/0.
///
/// # Safety
/// `ctx` must be a live handle used by one thread at a time. `data` must
/// point to `len` readable bytes (it may be null when `len` is 0).
/// `out_data` and `out_len` must be valid for writes.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn mozenc_encode(
    ctx: *mut MozencContext,
    data: *const c_uchar,
    len: usize,
    width: c_int,
    height: c_int,
    color_space: c_int,
    quality: c_int,
    progressive: c_int,
    optimize_huffman: c_int,
    trellis: c_int,
    dering: c_int,
    subsampling: c_int,
    out_data: *mut *mut c_uchar,
    out_len: *mut usize,
) -> c_int {
    if out_data.is_null() || out_len.is_null() {
        set_last_error(&BridgeError {
            message: "Output pointers must not be null".into(),
        });
        return -1;
    }
    unsafe {
        *out_data = ptr::null_mut();
        *out_len = 0;
    }

    let Some(handle) = (unsafe { ctx.cast::<ContextHandle>().as_mut() }) else {
        set_last_error(&BridgeError {
            message: "Context handle is null".into(),
        });
        return -1;
    };
    let bytes: &[u8] = if len == 0 {
        &[]
    } else if data.is_null() {
        set_last_error(&BridgeError {
            message: "Input data is null".into(),
        });
        return -1;
    } else {
        unsafe { std::slice::from_raw_parts(data, len) }
    };

    let result = bridge::encode(
        handle,
        bytes,
        width,
        height,
        color_space,
        quality,
        progressive != 0,
        optimize_huffman != 0,
        trellis != 0,
        dering != 0,
        subsampling,
    );
    match result {
        Ok(jpeg) => {
            let jpeg = jpeg.into_boxed_slice();
            let jpeg_len = jpeg.len();
            unsafe {
                *out_data = Box::into_raw(jpeg).cast();
                *out_len = jpeg_len;
            }
            0
        }
        Err(err) => {
            set_last_error(&err);
            -1
        }
    }
}

/// Release a buffer returned by [`mozenc_encode`]. Null is ignored.
///
/// # Safety
/// `data`/`len` must be exactly a pair produced by [`mozenc_encode`], freed once.
#[no_mangle]
pub unsafe extern "C" fn mozenc_buffer_free(data: *mut c_uchar, len: usize) {
    if !data.is_null() {
        drop(unsafe { Box::from_raw(ptr::slice_from_raw_parts_mut(data, len)) });
    }
}
