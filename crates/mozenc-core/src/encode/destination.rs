//! Growable in-memory destination for the compressor.
//!
//! The compressor writes through a `jpeg_destination_mgr`. This one backs it
//! with a `Vec<u8>` that doubles whenever the library fills it, so the final
//! size doesn't need to be known up front. The buffer is acquired fresh for
//! every encode and owned by the caller's stack frame: it is moved out on
//! success and dropped on any failure.

use mozjpeg_sys::{jpeg_compress_struct, jpeg_destination_mgr};
use std::os::raw::c_int;
use std::ptr;

const INITIAL_CAPACITY: usize = 4096;

/// Destination manager plus the bytes it has produced.
///
/// `iface` must stay the first field: the callbacks recover `Self` by
/// casting the `cinfo.dest` pointer.
#[repr(C)]
pub(crate) struct OutputBuffer {
    iface: jpeg_destination_mgr,
    data: Vec<u8>,
}

impl OutputBuffer {
    /// Boxed so the address handed to the compressor stays put.
    pub(crate) fn new() -> Box<Self> {
        Box::new(Self {
            iface: jpeg_destination_mgr {
                next_output_byte: ptr::null_mut(),
                free_in_buffer: 0,
                init_destination: Some(init_destination),
                empty_output_buffer: Some(empty_output_buffer),
                term_destination: Some(term_destination),
            },
            data: Vec::new(),
        })
    }

    /// Point the compressor at this buffer.
    ///
    /// The caller must clear `cinfo.dest` before the buffer is dropped.
    pub(crate) fn attach(&mut self, cinfo: &mut jpeg_compress_struct) {
        cinfo.dest = &mut self.iface;
    }

    /// Take the compressed stream. Only complete after `jpeg_finish_compress`.
    pub(crate) fn into_bytes(mut self: Box<Self>) -> Vec<u8> {
        std::mem::take(&mut self.data)
    }
}

unsafe fn buffer_of(cinfo: &mut jpeg_compress_struct) -> &mut OutputBuffer {
    &mut *(cinfo.dest as *mut OutputBuffer)
}

extern "C-unwind" fn init_destination(cinfo: &mut jpeg_compress_struct) {
    let out = unsafe { buffer_of(cinfo) };
    out.data.clear();
    out.data.resize(INITIAL_CAPACITY, 0);
    out.iface.next_output_byte = out.data.as_mut_ptr();
    out.iface.free_in_buffer = out.data.len();
}

/// Called when the whole buffer is full; the library ignores
/// `free_in_buffer` and treats every byte as written.
extern "C-unwind" fn empty_output_buffer(cinfo: &mut jpeg_compress_struct) -> c_int {
    let out = unsafe { buffer_of(cinfo) };
    let filled = out.data.len();
    out.data.resize(filled.max(INITIAL_CAPACITY) * 2, 0);
    out.iface.next_output_byte = unsafe { out.data.as_mut_ptr().add(filled) };
    out.iface.free_in_buffer = out.data.len() - filled;
    1
}

extern "C-unwind" fn term_destination(cinfo: &mut jpeg_compress_struct) {
    let out = unsafe { buffer_of(cinfo) };
    let written = out.data.len() - out.iface.free_in_buffer;
    out.data.truncate(written);
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Write `bytes` through the manager the way the library does.
    fn write(cinfo: &mut jpeg_compress_struct, bytes: &[u8]) {
        for &byte in bytes {
            let dest = unsafe { &mut *cinfo.dest };
            if dest.free_in_buffer == 0 {
                let empty = dest.empty_output_buffer.unwrap();
                assert_eq!(unsafe { empty(cinfo) }, 1);
            }
            let dest = unsafe { &mut *cinfo.dest };
            unsafe {
                *dest.next_output_byte = byte;
                dest.next_output_byte = dest.next_output_byte.add(1);
            }
            dest.free_in_buffer -= 1;
        }
    }

    fn run(bytes: &[u8]) -> Vec<u8> {
        let mut cinfo: jpeg_compress_struct = unsafe { std::mem::zeroed() };
        let mut out = OutputBuffer::new();
        out.attach(&mut cinfo);

        let init = out.iface.init_destination.unwrap();
        unsafe { init(&mut cinfo) };
        write(&mut cinfo, bytes);
        let term = out.iface.term_destination.unwrap();
        unsafe { term(&mut cinfo) };

        cinfo.dest = ptr::null_mut();
        out.into_bytes()
    }

    #[test]
    fn test_small_output() {
        assert_eq!(run(&[0xFF, 0xD8, 0xFF, 0xD9]), vec![0xFF, 0xD8, 0xFF, 0xD9]);
    }

    #[test]
    fn test_empty_output() {
        assert!(run(&[]).is_empty());
    }

    #[test]
    fn test_output_grows_past_initial_capacity() {
        let bytes: Vec<u8> = (0..INITIAL_CAPACITY * 3 + 17).map(|i| (i % 251) as u8).collect();
        assert_eq!(run(&bytes), bytes);
    }

    #[test]
    fn test_exactly_full_buffer() {
        let bytes = vec![7u8; INITIAL_CAPACITY];
        assert_eq!(run(&bytes), bytes);
    }

    #[test]
    fn test_init_resets_previous_contents() {
        let mut cinfo: jpeg_compress_struct = unsafe { std::mem::zeroed() };
        let mut out = OutputBuffer::new();
        out.attach(&mut cinfo);
        let init = out.iface.init_destination.unwrap();
        let term = out.iface.term_destination.unwrap();

        unsafe { init(&mut cinfo) };
        write(&mut cinfo, &[1, 2, 3]);
        unsafe { term(&mut cinfo) };

        unsafe { init(&mut cinfo) };
        write(&mut cinfo, &[9]);
        unsafe { term(&mut cinfo) };

        cinfo.dest = ptr::null_mut();
        assert_eq!(out.into_bytes(), vec![9]);
    }
}
