//! Native engine seam.
//!
//! The [`Engine`] trait is the call surface of the waifu2x ncnn engine:
//! scalar parameters, `load`, `process`, `process_cpu` and the heap budget
//! query. The rest of the crate only talks to this trait.
//!
//! The production implementation is [`NativeEngine`]. With the `native`
//! feature it owns an FFI handle into the linked C API; without it the same
//! type is a stub whose constructor fails with [`EngineError::Unavailable`].

#[cfg(feature = "native")]
mod native;
#[cfg(not(feature = "native"))]
#[path = "native_stub.rs"]
mod native;
#[cfg(feature = "native")]
mod sys;

pub use native::{NativeEngine, destroy_gpu_instance, gpu_count};

use crate::imaging::RawImage;
use crate::model::ModelPaths;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Engine unavailable: {0}")]
    Unavailable(String),
    #[error("{op} failed with status {code}")]
    Status { op: &'static str, code: i32 },
    #[error("Path cannot be passed to the native loader: {0}")]
    InvalidPath(String),
}

/// Execution device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    /// Vulkan GPU by ordinal.
    Gpu(u32),
    /// ncnn CPU path; tiling is effectively disabled.
    Cpu,
}

impl Device {
    /// Map the integer selector (`-1` = CPU, `>= 0` = GPU ordinal).
    pub fn from_selector(selector: i32) -> Option<Self> {
        match selector {
            -1 => Some(Device::Cpu),
            n if n >= 0 => Some(Device::Gpu(n as u32)),
            _ => None,
        }
    }

    pub fn selector(self) -> i32 {
        match self {
            Device::Gpu(n) => n as i32,
            Device::Cpu => -1,
        }
    }
}

/// Construction-time engine settings. Fixed for the handle's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub device: Device,
    pub tta_mode: bool,
    pub num_threads: u32,
}

/// Mutable scalar fields of the engine handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineParams {
    pub scale: u32,
    pub noise: i32,
    pub tile_size: u32,
    pub prepadding: u32,
}

/// Tears down the process-wide GPU instance when dropped.
///
/// Create it before the first engine so it drops after the last one; the
/// teardown then runs on every exit path, early returns included.
pub struct GpuInstance {
    teardown: fn(),
}

impl GpuInstance {
    pub fn new() -> Self {
        Self::with_teardown(destroy_gpu_instance)
    }

    pub fn with_teardown(teardown: fn()) -> Self {
        Self { teardown }
    }
}

impl Default for GpuInstance {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for GpuInstance {
    fn drop(&mut self) {
        tracing::debug!("destroying GPU instance");
        (self.teardown)();
    }
}

/// Call surface of the native super-resolution engine.
///
/// Handles are exclusively owned and released on drop.
pub trait Engine {
    /// Coarse estimate of free GPU memory (MB) on the engine's device.
    fn heap_budget(&self) -> Result<u32, EngineError>;

    fn set_params(&mut self, params: EngineParams);

    fn load(&mut self, paths: &ModelPaths) -> Result<(), EngineError>;

    /// Upscale on the GPU. `output` is pre-allocated and written in place.
    fn process(&self, input: &RawImage, output: &mut RawImage) -> Result<(), EngineError>;

    /// Upscale on the CPU path.
    fn process_cpu(&self, input: &RawImage, output: &mut RawImage) -> Result<(), EngineError>;
}
