//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Upscale
//!
//! ```text
//! Model
//!     models-cunet (noise 0, 2x, tile 400, prepadding 18)
//!     Source: models/models-cunet/noise0_scale2.0x_model.param
//!
//! 001/003 cover.jpg
//!     → out/cover.png (1600x2400, 1.84s)
//! 002/003 broken.jpg
//!     Failed: Failed to decode broken.jpg: ...
//!
//! Upscaled 2 images, 1 failed
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions do no I/O.

use crate::batch::{BatchEvent, BatchSummary};
use crate::engine::Engine;
use crate::upscaler::Waifu2x;
use std::path::Path;

/// Format a 1-based position as `NNN/TTT`, zero-padded to the total's width
/// (at least three digits).
fn format_position(pos: usize, total: usize) -> String {
    let width = total.to_string().len().max(3);
    format!("{:0>width$}/{:0>width$}", pos, total, width = width)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn format_model<E: Engine>(upscaler: &Waifu2x<E>) -> Vec<String> {
    vec![
        "Model".to_string(),
        format!(
            "    {} (noise {}, {}x, tile {}, prepadding {})",
            upscaler.model().family().name,
            upscaler.noise(),
            upscaler.scale(),
            upscaler.tile_size(),
            upscaler.prepadding()
        ),
        format!("    Source: {}", upscaler.model_paths().param().display()),
    ]
}

pub fn print_model<E: Engine>(upscaler: &Waifu2x<E>) {
    for line in format_model(upscaler) {
        println!("{}", line);
    }
}

pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::Started {
            index,
            total,
            input,
        } => vec![format!(
            "{} {}",
            format_position(index + 1, *total),
            file_name(input)
        )],
        BatchEvent::Finished {
            output,
            width,
            height,
            elapsed,
            ..
        } => vec![format!(
            "    → {} ({}x{}, {:.2}s)",
            output.display(),
            width,
            height,
            elapsed.as_secs_f64()
        )],
        BatchEvent::Failed { error, .. } => vec![format!("    Failed: {}", error)],
    }
}

pub fn format_summary(summary: &BatchSummary) -> String {
    let noun = if summary.succeeded == 1 {
        "image"
    } else {
        "images"
    };
    if summary.failed == 0 {
        format!("Upscaled {} {}", summary.succeeded, noun)
    } else {
        format!(
            "Upscaled {} {}, {} failed",
            summary.succeeded, noun, summary.failed
        )
    }
}

pub fn format_devices(count: u32) -> Vec<String> {
    if count == 0 {
        return vec!["No Vulkan devices found (use --gpu-id -1 for CPU mode)".to_string()];
    }
    (0..count).map(|id| format!("GPU {}", id)).collect()
}
