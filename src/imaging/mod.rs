//! Image marshalling between `image` crate types and engine buffers.
//!
//! - **Raw**: [`RawImage`] and the [`to_native`] / [`from_native`] conversions
//! - **Codec**: file decode/encode used by the CLI and batch runner

pub mod codec;
mod raw;

pub use codec::{CodecError, load_image, output_format, save_image, supported_input_extensions};
pub use raw::{ColorMode, RawImage, from_native, to_native};
