//! C entry points of the waifu2x engine.
//!
//! Defined by `csrc/waifu2x_capi.cpp`, which `build.rs` compiles and links
//! against the prebuilt `Waifu2x` class when the `native` feature is enabled.
//! `W2xImage` is wrapped into an `ncnn::Mat` on the C++ side without copying.

use crate::model::NativeChar;
use std::ffi::c_int;

/// Opaque engine handle.
#[repr(C)]
pub struct W2xHandle {
    _private: [u8; 0],
}

/// Borrowed interleaved pixel buffer.
#[repr(C)]
pub struct W2xImage {
    pub data: *mut u8,
    pub w: c_int,
    pub h: c_int,
    /// Channel count.
    pub elempack: c_int,
}

unsafe extern "C" {
    pub fn waifu2x_create(gpuid: c_int, tta_mode: bool, num_threads: c_int) -> *mut W2xHandle;
    pub fn waifu2x_destroy(handle: *mut W2xHandle);
    pub fn waifu2x_set_params(
        handle: *mut W2xHandle,
        scale: c_int,
        noise: c_int,
        tilesize: c_int,
        prepadding: c_int,
    );
    #[cfg(not(windows))]
    pub fn waifu2x_load(
        handle: *mut W2xHandle,
        parampath: *const NativeChar,
        modelpath: *const NativeChar,
    ) -> c_int;
    #[cfg(windows)]
    pub fn waifu2x_load_w(
        handle: *mut W2xHandle,
        parampath: *const NativeChar,
        modelpath: *const NativeChar,
    ) -> c_int;
    pub fn waifu2x_process(
        handle: *const W2xHandle,
        inimage: *const W2xImage,
        outimage: *mut W2xImage,
    ) -> c_int;
    pub fn waifu2x_process_cpu(
        handle: *const W2xHandle,
        inimage: *const W2xImage,
        outimage: *mut W2xImage,
    ) -> c_int;
    pub fn waifu2x_get_heap_budget(handle: *const W2xHandle) -> u32;
    pub fn waifu2x_get_gpu_count() -> c_int;
    pub fn waifu2x_destroy_gpu_instance();
}
