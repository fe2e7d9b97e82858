//! # waifu2x-ncnn-vulkan
//!
//! Rust binding for the [waifu2x ncnn Vulkan](https://github.com/nihui/waifu2x-ncnn-vulkan)
//! super-resolution engine. The network, tiling and GPU dispatch all live in
//! the native library; this crate marshals images and configuration across
//! the FFI boundary, finds the model files, and turns native failures into
//! typed errors.
//!
//! ```no_run
//! use waifu2x_ncnn_vulkan::{Options, Waifu2x};
//!
//! let mut upscaler = Waifu2x::new(&Options {
//!     noise: 1,
//!     ..Options::default()
//! })?;
//! let image = image::open("input.png")?;
//! upscaler.process(&image)?.save("output.png")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`upscaler`] | [`Waifu2x`] facade: validate, resolve, locate, load, process |
//! | [`config`] | [`Options`], TOML loading and the stock config file |
//! | [`resolver`] | Tile size and pre-padding resolution |
//! | [`model`] | Model family descriptors and model file location |
//! | [`imaging`] | `DynamicImage` ⇄ engine buffer marshalling, file codecs |
//! | [`engine`] | [`Engine`](engine::Engine) trait and the native FFI handle |
//! | [`batch`] | File and directory upscaling jobs |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## One Descriptor Per Model Family
//!
//! Pre-padding and the heap-budget → tile-size thresholds are constant data on
//! a single [`ModelFamily`](model::ModelFamily) record. Adding a family means
//! adding one constant; the two tables cannot fall out of sync.
//!
//! ## Engine Behind a Trait
//!
//! The facade is generic over [`Engine`](engine::Engine). Production code uses
//! [`NativeEngine`](engine::NativeEngine); tests drive the whole construction
//! and processing flow with a recording mock, no GPU required.
//!
//! ## Stub Without the `native` Feature
//!
//! The crate builds and tests without the native library. Without the
//! `native` feature, [`NativeEngine`](engine::NativeEngine) fails at
//! construction with [`EngineError::Unavailable`](engine::EngineError).
//!
//! ## Noise -1 Forces 2×
//!
//! Only a 2× model exists for the denoise-off setting, so `noise = -1` always
//! upscales 2×, even with `scale = 1`. This is kept as-is; read
//! [`Waifu2x::scale`] for the effective value.

pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod imaging;
pub mod model;
pub mod output;
pub mod resolver;
pub mod upscaler;

pub use config::Options;
pub use error::{Result, Waifu2xError};
pub use upscaler::Waifu2x;

#[cfg(test)]
pub(crate) mod test_helpers;
