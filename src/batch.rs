//! File and directory upscaling.
//!
//! [`plan_jobs`] maps an input file or directory onto output paths;
//! [`run`] feeds each job through one [`Waifu2x`] in order. Jobs run
//! sequentially because an upscaler is a single-caller handle; the engine
//! parallelises internally.
//!
//! ```text
//! input/                    output/
//! ├── cover.jpg       →     ├── cover.png
//! └── ch01/                 └── ch01/
//!     └── 001.webp    →         └── 001.png
//! ```

use crate::engine::Engine;
use crate::imaging::{CodecError, codec, load_image, save_image};
use crate::upscaler::Waifu2x;
use image::ImageFormat;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Input not found: {}", .0.display())]
    InputNotFound(PathBuf),
    #[error("Output {} must be a directory when the input is a directory", .0.display())]
    OutputNotDirectory(PathBuf),
    #[error(
        "{} and {} would both be written to {}",
        first.display(),
        second.display(),
        output.display()
    )]
    OutputCollision {
        first: PathBuf,
        second: PathBuf,
        output: PathBuf,
    },
}

/// One input image and where its result goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub input: PathBuf,
    pub output: PathBuf,
}

fn extension(format: ImageFormat) -> &'static str {
    format.extensions_str().first().copied().unwrap_or("png")
}

/// Plan the jobs for `input` (a file or a directory tree).
///
/// - file → `output`, or `output/<stem>.<ext>` when `output` is an existing
///   directory
/// - directory → every supported image below it, mirrored under `output`
///   with the extension of `format`, in path order
///
/// Two inputs that differ only by extension (`a.png`, `a.jpg`) would map to
/// the same output and fail with [`BatchError::OutputCollision`].
pub fn plan_jobs(input: &Path, output: &Path, format: ImageFormat) -> Result<Vec<Job>, BatchError> {
    let ext = extension(format);
    if input.is_file() {
        let output = if output.is_dir() {
            let stem = input.file_stem().unwrap_or(input.as_os_str());
            output.join(stem).with_extension(ext)
        } else {
            output.to_path_buf()
        };
        return Ok(vec![Job {
            input: input.to_path_buf(),
            output,
        }]);
    }
    if !input.is_dir() {
        return Err(BatchError::InputNotFound(input.to_path_buf()));
    }
    if output.is_file() {
        return Err(BatchError::OutputNotDirectory(output.to_path_buf()));
    }

    let mut jobs: Vec<Job> = Vec::new();
    let mut planned: HashMap<PathBuf, PathBuf> = HashMap::new();
    for entry in WalkDir::new(input).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || !codec::is_supported_input(path) {
            continue;
        }
        let relative = path.strip_prefix(input).unwrap_or(path);
        let target = output.join(relative).with_extension(ext);
        if let Some(first) = planned.insert(target.clone(), path.to_path_buf()) {
            return Err(BatchError::OutputCollision {
                first,
                second: path.to_path_buf(),
                output: target,
            });
        }
        jobs.push(Job {
            input: path.to_path_buf(),
            output: target,
        });
    }
    Ok(jobs)
}

/// Progress notifications emitted by [`run`].
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    Started {
        index: usize,
        total: usize,
        input: PathBuf,
    },
    Finished {
        input: PathBuf,
        output: PathBuf,
        width: u32,
        height: u32,
        elapsed: Duration,
    },
    Failed {
        input: PathBuf,
        error: String,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Error, Debug)]
enum JobError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Upscale(#[from] crate::Waifu2xError),
}

/// An explicit output extension wins over the batch format.
fn output_format_for(path: &Path, fallback: ImageFormat) -> ImageFormat {
    ImageFormat::from_path(path)
        .ok()
        .filter(|f| f.writing_enabled())
        .unwrap_or(fallback)
}

fn run_job<E: Engine>(
    upscaler: &mut Waifu2x<E>,
    job: &Job,
    format: ImageFormat,
) -> Result<(u32, u32), JobError> {
    let image = load_image(&job.input)?;
    let result = upscaler.process(&image)?;
    save_image(&result, &job.output, output_format_for(&job.output, format))?;
    Ok((result.width(), result.height()))
}

/// Upscale every job in order. A failing job is reported through
/// `on_event` and the batch continues.
pub fn run<E: Engine>(
    upscaler: &mut Waifu2x<E>,
    jobs: &[Job],
    format: ImageFormat,
    mut on_event: impl FnMut(BatchEvent),
) -> BatchSummary {
    let mut summary = BatchSummary::default();
    for (index, job) in jobs.iter().enumerate() {
        on_event(BatchEvent::Started {
            index,
            total: jobs.len(),
            input: job.input.clone(),
        });
        let start = Instant::now();
        match run_job(upscaler, job, format) {
            Ok((width, height)) => {
                summary.succeeded += 1;
                on_event(BatchEvent::Finished {
                    input: job.input.clone(),
                    output: job.output.clone(),
                    width,
                    height,
                    elapsed: start.elapsed(),
                });
            }
            Err(e) => {
                tracing::warn!(input = %job.input.display(), error = %e, "upscale failed");
                summary.failed += 1;
                on_event(BatchEvent::Failed {
                    input: job.input.clone(),
                    error: e.to_string(),
                });
            }
        }
    }
    summary
}
