//! Error taxonomy for the binding layer.
//!
//! Every failure surfaces synchronously from [`Waifu2x::new`](crate::Waifu2x)
//! or [`Waifu2x::process`](crate::Waifu2x::process). Nothing is retried: a
//! missing model file or a malformed buffer fails the same way on every
//! attempt.

use crate::engine::EngineError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Waifu2xError {
    /// A construction option is outside its contract. Raised before the
    /// native engine is touched.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// The model family has no pre-padding / tile-size descriptor.
    #[error("Model \"{0}\" is not supported")]
    UnsupportedModel(String),
    #[error("Model files not found: {} or {}", param.display(), bin.display())]
    ModelFilesNotFound { param: PathBuf, bin: PathBuf },
    #[error("Malformed image: {0}")]
    MalformedImage(String),
    #[error("Native engine error: {0}")]
    NativeEngine(#[from] EngineError),
}

pub type Result<T> = std::result::Result<T, Waifu2xError>;
