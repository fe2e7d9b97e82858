//! Shared test utilities: model directory fixtures and mock engine factories.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let root = models_root();
//! let mut upscaler = Waifu2x::with_engine(&options_for(&root), gpu_mock(3000)).unwrap();
//! ```

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::config::Options;
use crate::engine::EngineError;
use crate::engine::EngineSettings;
use crate::engine::tests::MockEngine;

// =========================================================================
// Fixture setup
// =========================================================================

/// Write a placeholder `.param`/`.bin` pair named `stem` into `dir`.
pub fn write_pair(dir: &Path, stem: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(format!("{stem}.param")), "7767517").unwrap();
    fs::write(dir.join(format!("{stem}.bin")), [0u8; 4]).unwrap();
}

/// Models root with a handful of cunet and upconv_7_photo pairs.
pub fn models_root() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("models-cunet");
    for stem in ["noise0_scale2.0x_model", "noise1_model", "scale2.0x_model"] {
        write_pair(&dir, stem);
    }
    write_pair(&tmp.path().join("models-upconv_7_photo"), "noise2_scale2.0x_model");
    tmp
}

/// Default options pointed at `root`.
pub fn options_for(root: &TempDir) -> Options {
    Options {
        models_dir: Some(root.path().to_path_buf()),
        ..Options::default()
    }
}

// =========================================================================
// Engine factories
// =========================================================================

/// Factory for a GPU mock reporting `budget` MB of heap.
pub fn gpu_mock(
    budget: u32,
) -> impl FnOnce(&EngineSettings) -> Result<MockEngine, EngineError> {
    move |settings| Ok(MockEngine::new(settings).with_heap_budget(budget))
}
