//! Error trampoline between the compressor and `Result`.
//!
//! libjpeg reports fatal errors through `error_exit`, which must never
//! return to the library. The handler installed here formats the diagnostic
//! and unwinds with a [`CompressorFault`] payload. [`recover`] is the
//! recovery point: it catches exactly that payload and hands back the
//! message, so no fault escapes the component that owns the compressor.
//!
//! Unwinding through the C frames relies on the `C-unwind` ABI, which means
//! the crate must be built with `panic = "unwind"`.

use mozjpeg_sys::{jpeg_common_struct, jpeg_error_mgr, jpeg_std_error};
use std::os::raw::c_int;
use std::panic::{self, AssertUnwindSafe};

/// Unwind payload carrying the compressor's formatted diagnostic.
pub(crate) struct CompressorFault(pub(crate) String);

/// Reset `err` to the library defaults, then route fatal errors and
/// warnings through this module.
pub(crate) fn install(err: &mut jpeg_error_mgr) {
    unsafe {
        jpeg_std_error(err);
    }
    err.error_exit = Some(unwind_error_exit);
    err.emit_message = Some(emit_message);
}

/// Run `f`, converting a compressor fault raised inside it into `Err`.
///
/// Panics that did not originate from the compressor keep unwinding.
pub(crate) fn recover<T>(f: impl FnOnce() -> T) -> Result<T, String> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Ok(value),
        Err(payload) => match payload.downcast::<CompressorFault>() {
            Ok(fault) => Err(fault.0),
            Err(other) => panic::resume_unwind(other),
        },
    }
}

#[cold]
extern "C-unwind" fn unwind_error_exit(cinfo: &mut jpeg_common_struct) {
    let message = format_message(cinfo);
    // Never returns. resume_unwind skips the panic hook; this is an
    // expected error path
    panic::resume_unwind(Box::new(CompressorFault(message)))
}

extern "C-unwind" fn emit_message(cinfo: &mut jpeg_common_struct, msg_level: c_int) {
    // Non-negative levels are trace output
    if msg_level >= 0 {
        return;
    }
    if let Some(err) = unsafe { cinfo.err.as_mut() } {
        err.num_warnings += 1;
    }
    let message = format_message(cinfo);
    tracing::warn!(%message, "compressor warning");
}

fn format_message(cinfo: &mut jpeg_common_struct) -> String {
    let format = unsafe { cinfo.err.as_ref() }.and_then(|err| err.format_message);
    match format {
        Some(format) => {
            let buffer = unsafe { std::mem::zeroed() };
            unsafe { format(cinfo, &buffer) };
            let len = buffer.iter().position(|&b| b == 0).unwrap_or(buffer.len());
            String::from_utf8_lossy(&buffer[..len]).into_owned()
        }
        None => String::from("unknown compressor error"),
    }
}
