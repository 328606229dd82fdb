// THEORY:
// This file is the entry point for the `daltonizer` library crate. It exposes a
// small, high-level API for recoloring a tree of PNG files so they remain
// distinguishable for viewers with protanopia, deuteranopia or tritanopia.
//
// Layers, leaves first:
// - `core_modules::color_space`: sRGB transfer function and the RGB<->LMS basis.
// - `core_modules::deficiency`: strength-interpolated simulation and compensation
//   matrices, built once per run from a `DaltonizeConfig`.
// - `core_modules::pixel`: the per-pixel correction pipeline.
// - `core_modules::image_job`: one file, decoded, corrected and overwritten.
// - `scheduler`: partitions the file list and runs the groups concurrently.
//
// `discovery` and the progress sinks are thin collaborators around that core.

pub mod config;
pub mod core_modules;
pub mod discovery;
pub mod error;
pub mod scheduler;

pub use config::{BatchConfig, DaltonizeConfig, Deficiency, Strength};
pub use core_modules::image_job::{ImageCodec, PngCodec};
pub use core_modules::pixel::pixel::{Pixel, transform};
pub use core_modules::progress::{ConsoleProgress, ProgressCounter, ProgressSink, SilentProgress};
pub use error::{DaltonizeError, Result};
pub use scheduler::{BatchReport, BatchScheduler, FileOutcome, SchedulerState};

use std::path::Path;

/// Discovers every file under `root` and runs one batch over them.
///
/// Discovery errors are returned before any worker starts; per-file errors end
/// up in the returned `BatchReport`.
pub async fn daltonize_directory<S: ProgressSink>(
    root: impl AsRef<Path>,
    config: DaltonizeConfig,
    batch: BatchConfig,
    sink: S,
) -> Result<BatchReport> {
    let files = discovery::discover(root)?;
    let mut scheduler = BatchScheduler::new(files, config, batch);
    Ok(scheduler.run(sink).await)
}
