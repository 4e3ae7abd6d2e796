//! Parameter binding: [`EncodeParams`] onto compressor state.
//!
//! Every field is written on every call. mozjpeg's defaults turn on
//! progressive scans, trellis quantization and deringing, so a setting left
//! alone would not mean "off", and a setting from the previous encode would
//! otherwise leak into the next one.
//!
//! The same holds for Huffman tables: `jpeg_set_defaults` fills only empty
//! table slots, and optimized coding rewrites the filled ones in place. The
//! standard tables are captured once per context ([`StandardHuffman`]) and
//! copied back before every bind.
//!
//! # Order
//!
//! 0. Standard Huffman tables restored
//! 1. Dimensions and input color space
//! 2. `jpeg_set_defaults` (allocates the per-component info used below)
//! 3. Quality, entropy coding
//! 4. Subsampling or the grayscale override
//! 5. Vendor extensions, when the library exposes them
//! 6. Scan layout, last, since the progressive script depends on the
//!    final component count

use super::types::{ColorSpace, EncodeRequest, Subsampling};
use mozjpeg_sys::{
    jpeg_c_bool_param_supported, jpeg_c_set_bool_param, jpeg_compress_struct, jpeg_set_colorspace,
    jpeg_set_defaults, jpeg_set_quality, jpeg_simple_progression, JHUFF_TBL, J_BOOLEAN_PARAM,
    J_COLOR_SPACE,
};
use serde::Serialize;
use std::os::raw::c_int;
use std::ptr;

/// Optional compressor extensions, probed once per context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Capabilities {
    /// Trellis quantization can be toggled.
    pub trellis_quant: bool,
    /// Overshoot deringing can be toggled.
    pub overshoot_deringing: bool,
    /// Progressive scan optimization can be toggled.
    pub scan_optimization: bool,
}

impl Capabilities {
    /// Ask the compressor which boolean extension parameters it supports.
    ///
    /// # Safety
    ///
    /// `cinfo` must have been constructed with `jpeg_create_compress`.
    pub(crate) unsafe fn detect(cinfo: &mut jpeg_compress_struct) -> Self {
        Self {
            trellis_quant: jpeg_c_bool_param_supported(cinfo, J_BOOLEAN_PARAM::JBOOLEAN_TRELLIS_QUANT)
                != 0,
            overshoot_deringing: jpeg_c_bool_param_supported(
                cinfo,
                J_BOOLEAN_PARAM::JBOOLEAN_OVERSHOOT_DERINGING,
            ) != 0,
            scan_optimization: jpeg_c_bool_param_supported(
                cinfo,
                J_BOOLEAN_PARAM::JBOOLEAN_OPTIMIZE_SCANS,
            ) != 0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct HuffmanTable {
    bits: [u8; 17],
    huffval: [u8; 256],
}

impl HuffmanTable {
    unsafe fn read(table: *mut JHUFF_TBL) -> Option<Self> {
        table.as_ref().map(|table| Self {
            bits: table.bits,
            huffval: table.huffval,
        })
    }
}

/// The library's standard DC and AC Huffman tables, per slot.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct StandardHuffman {
    dc: [Option<HuffmanTable>; 4],
    ac: [Option<HuffmanTable>; 4],
}

impl StandardHuffman {
    /// Install the defaults on a freshly created compressor and capture
    /// the tables they allocate.
    ///
    /// May raise a compressor fault; call inside [`super::trampoline::recover`].
    ///
    /// # Safety
    ///
    /// `cinfo` must be constructed, idle, and have the trampoline installed.
    pub(crate) unsafe fn capture(cinfo: &mut jpeg_compress_struct) -> Self {
        cinfo.input_components = 3;
        cinfo.in_color_space = J_COLOR_SPACE::JCS_RGB;
        jpeg_set_defaults(cinfo);

        Self {
            dc: cinfo.dc_huff_tbl_ptrs.map(|table| HuffmanTable::read(table)),
            ac: cinfo.ac_huff_tbl_ptrs.map(|table| HuffmanTable::read(table)),
        }
    }

    /// Overwrite every allocated table slot that has a captured counterpart.
    ///
    /// Table pointers stay as they are; they live in the permanent pool.
    /// `sent_table` is reset by `jpeg_start_compress(cinfo, TRUE)`.
    unsafe fn restore(&self, cinfo: &mut jpeg_compress_struct) {
        let slots = self
            .dc
            .iter()
            .zip(cinfo.dc_huff_tbl_ptrs)
            .chain(self.ac.iter().zip(cinfo.ac_huff_tbl_ptrs));
        for (saved, table) in slots {
            if let (Some(saved), Some(table)) = (saved, table.as_mut()) {
                table.bits = saved.bits;
                table.huffval = saved.huffval;
            }
        }
    }
}

/// Configure `cinfo` for `request`.
///
/// May raise a compressor fault; call inside [`super::trampoline::recover`].
///
/// # Safety
///
/// `cinfo` must be constructed, idle, and have the trampoline installed.
pub(crate) unsafe fn bind(
    cinfo: &mut jpeg_compress_struct,
    request: &EncodeRequest<'_>,
    capabilities: Capabilities,
    standard: &StandardHuffman,
) {
    let params = request.params();

    standard.restore(cinfo);

    cinfo.image_width = request.width();
    cinfo.image_height = request.height();
    match params.color_space {
        ColorSpace::Rgb => {
            cinfo.input_components = 3;
            cinfo.in_color_space = J_COLOR_SPACE::JCS_RGB;
        }
        ColorSpace::Grayscale => {
            cinfo.input_components = 1;
            cinfo.in_color_space = J_COLOR_SPACE::JCS_GRAYSCALE;
        }
    }

    jpeg_set_defaults(cinfo);

    // Baseline-compatible quantization tables
    jpeg_set_quality(cinfo, c_int::from(params.quality), 1);
    cinfo.optimize_coding = c_int::from(params.optimize_huffman);

    match params.color_space {
        ColorSpace::Rgb => {
            apply_subsampling(cinfo, params.subsampling);
            set_extension(
                cinfo,
                capabilities.trellis_quant,
                J_BOOLEAN_PARAM::JBOOLEAN_TRELLIS_QUANT,
                params.trellis,
            );
            set_extension(
                cinfo,
                capabilities.overshoot_deringing,
                J_BOOLEAN_PARAM::JBOOLEAN_OVERSHOOT_DERINGING,
                params.dering,
            );
        }
        // No chroma planes: subsampling, trellis and dering flags don't apply
        ColorSpace::Grayscale => {
            set_extension(
                cinfo,
                capabilities.trellis_quant,
                J_BOOLEAN_PARAM::JBOOLEAN_TRELLIS_QUANT,
                false,
            );
            set_extension(
                cinfo,
                capabilities.overshoot_deringing,
                J_BOOLEAN_PARAM::JBOOLEAN_OVERSHOOT_DERINGING,
                false,
            );
        }
    }

    if params.progressive {
        jpeg_simple_progression(cinfo);
    } else {
        set_extension(
            cinfo,
            capabilities.scan_optimization,
            J_BOOLEAN_PARAM::JBOOLEAN_OPTIMIZE_SCANS,
            false,
        );
        cinfo.num_scans = 0;
        cinfo.scan_info = ptr::null();
    }
}

unsafe fn apply_subsampling(cinfo: &mut jpeg_compress_struct, subsampling: Subsampling) {
    let Some((h, v)) = subsampling.luma_factors() else {
        jpeg_set_colorspace(cinfo, J_COLOR_SPACE::JCS_GRAYSCALE);
        return;
    };

    if cinfo.comp_info.is_null() || cinfo.num_components < 1 {
        return;
    }
    let components =
        std::slice::from_raw_parts_mut(cinfo.comp_info, cinfo.num_components as usize);
    components[0].h_samp_factor = h;
    components[0].v_samp_factor = v;
    for chroma in &mut components[1..] {
        chroma.h_samp_factor = 1;
        chroma.v_samp_factor = 1;
    }
}

/// Missing extensions are skipped without error.
unsafe fn set_extension(
    cinfo: &mut jpeg_compress_struct,
    supported: bool,
    param: J_BOOLEAN_PARAM,
    enabled: bool,
) {
    if supported {
        jpeg_c_set_bool_param(cinfo, param, c_int::from(enabled));
    }
}
