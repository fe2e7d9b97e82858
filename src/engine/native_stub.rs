//! Stub engine for builds without the native library.

use super::{Engine, EngineError, EngineParams, EngineSettings};
use crate::imaging::RawImage;
use crate::model::ModelPaths;

const UNAVAILABLE: &str =
    "built without the `native` feature; rebuild with --features native to link waifu2x-ncnn-vulkan";

/// Placeholder for the FFI handle. Construction always fails, so the trait
/// methods are unreachable in practice.
pub struct NativeEngine {
    settings: EngineSettings,
}

impl NativeEngine {
    pub fn create(settings: &EngineSettings) -> Result<Self, EngineError> {
        tracing::warn!(device = ?settings.device, "{UNAVAILABLE}");
        Err(EngineError::Unavailable(UNAVAILABLE.into()))
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }
}

impl Engine for NativeEngine {
    fn heap_budget(&self) -> Result<u32, EngineError> {
        Err(EngineError::Unavailable(UNAVAILABLE.into()))
    }

    fn set_params(&mut self, _params: EngineParams) {}

    fn load(&mut self, _paths: &ModelPaths) -> Result<(), EngineError> {
        Err(EngineError::Unavailable(UNAVAILABLE.into()))
    }

    fn process(&self, _input: &RawImage, _output: &mut RawImage) -> Result<(), EngineError> {
        Err(EngineError::Unavailable(UNAVAILABLE.into()))
    }

    fn process_cpu(&self, _input: &RawImage, _output: &mut RawImage) -> Result<(), EngineError> {
        Err(EngineError::Unavailable(UNAVAILABLE.into()))
    }
}

pub fn gpu_count() -> u32 {
    0
}

pub fn destroy_gpu_instance() {}
