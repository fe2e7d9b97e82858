//! FFI-backed engine handle.

use super::sys::{self, W2xHandle, W2xImage};
use super::{Engine, EngineError, EngineParams, EngineSettings};
use crate::imaging::RawImage;
use crate::model::ModelPaths;
use std::ffi::c_int;
use std::ptr::NonNull;
use tracing::debug;

/// Owned handle to a native `Waifu2x` instance. Destroyed on drop.
pub struct NativeEngine {
    handle: NonNull<W2xHandle>,
    settings: EngineSettings,
}

// SAFETY: the handle is exclusively owned; the native object has no thread
// affinity, only a requirement that calls are not concurrent, which `&mut`
// ownership through the facade guarantees.
unsafe impl Send for NativeEngine {}

impl NativeEngine {
    pub fn create(settings: &EngineSettings) -> Result<Self, EngineError> {
        // SAFETY: plain scalar arguments; a null return signals failure.
        let raw = unsafe {
            sys::waifu2x_create(
                settings.device.selector(),
                settings.tta_mode,
                settings.num_threads as c_int,
            )
        };
        let handle = NonNull::new(raw).ok_or_else(|| {
            EngineError::Unavailable(format!(
                "waifu2x_create returned null for device {:?}",
                settings.device
            ))
        })?;
        debug!(device = ?settings.device, tta = settings.tta_mode, threads = settings.num_threads, "native engine created");
        Ok(Self {
            handle,
            settings: *settings,
        })
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }
}

fn image_arg(image: &RawImage) -> W2xImage {
    W2xImage {
        data: image.as_bytes().as_ptr() as *mut u8,
        w: image.width() as c_int,
        h: image.height() as c_int,
        elempack: image.channels() as c_int,
    }
}

fn image_arg_mut(image: &mut RawImage) -> W2xImage {
    let (w, h, c) = (image.width(), image.height(), image.channels());
    W2xImage {
        data: image.as_bytes_mut().as_mut_ptr(),
        w: w as c_int,
        h: h as c_int,
        elempack: c as c_int,
    }
}

fn check(op: &'static str, code: c_int) -> Result<(), EngineError> {
    if code == 0 {
        Ok(())
    } else {
        Err(EngineError::Status { op, code })
    }
}

impl Engine for NativeEngine {
    fn heap_budget(&self) -> Result<u32, EngineError> {
        if self.settings.device == super::Device::Cpu {
            return Err(EngineError::Unavailable(
                "heap budget is only reported for GPU devices".into(),
            ));
        }
        // SAFETY: handle is live for the lifetime of self.
        Ok(unsafe { sys::waifu2x_get_heap_budget(self.handle.as_ptr()) })
    }

    fn set_params(&mut self, params: EngineParams) {
        // SAFETY: handle is live and exclusively borrowed.
        unsafe {
            sys::waifu2x_set_params(
                self.handle.as_ptr(),
                params.scale as c_int,
                params.noise as c_int,
                params.tile_size as c_int,
                params.prepadding as c_int,
            )
        }
    }

    fn load(&mut self, paths: &ModelPaths) -> Result<(), EngineError> {
        let (param, bin) = paths.to_native()?;
        // SAFETY: both paths are NUL-terminated and outlive the call.
        #[cfg(not(windows))]
        let code =
            unsafe { sys::waifu2x_load(self.handle.as_ptr(), param.as_ptr(), bin.as_ptr()) };
        #[cfg(windows)]
        let code =
            unsafe { sys::waifu2x_load_w(self.handle.as_ptr(), param.as_ptr(), bin.as_ptr()) };
        check("load", code)
    }

    fn process(&self, input: &RawImage, output: &mut RawImage) -> Result<(), EngineError> {
        let inimage = image_arg(input);
        let mut outimage = image_arg_mut(output);
        // SAFETY: both buffers are sized per their dimensions and outlive the
        // call; the engine only reads `inimage`.
        let code =
            unsafe { sys::waifu2x_process(self.handle.as_ptr(), &inimage, &mut outimage) };
        check("process", code)
    }

    fn process_cpu(&self, input: &RawImage, output: &mut RawImage) -> Result<(), EngineError> {
        let inimage = image_arg(input);
        let mut outimage = image_arg_mut(output);
        // SAFETY: as in `process`.
        let code =
            unsafe { sys::waifu2x_process_cpu(self.handle.as_ptr(), &inimage, &mut outimage) };
        check("process_cpu", code)
    }
}

impl Drop for NativeEngine {
    fn drop(&mut self) {
        // SAFETY: handle came from waifu2x_create and is destroyed exactly once.
        unsafe { sys::waifu2x_destroy(self.handle.as_ptr()) }
    }
}

/// Number of Vulkan devices visible to ncnn.
pub fn gpu_count() -> u32 {
    // SAFETY: no arguments; initializes the ncnn GPU instance on first use.
    let count = unsafe { sys::waifu2x_get_gpu_count() };
    count.max(0) as u32
}

/// Tear down the process-wide ncnn GPU instance.
///
/// Call once, after every engine has been dropped.
pub fn destroy_gpu_instance() {
    // SAFETY: callers drop all engines first.
    unsafe { sys::waifu2x_destroy_gpu_instance() }
}
