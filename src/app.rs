use crate::codec;
use crate::compositor::{self, CompositionRequest, WatermarkParams};
use crate::config::Config;
use crate::params::{stored_watermark_path, Job};
use crate::prompt::Prompter;
use crate::store::DefaultStore;
use crate::util::{output_path, resolve_path};
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use log::{debug, info};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

/// Command line request, as parsed from the arguments.
#[derive(Debug, Default)]
pub struct Request {
    pub original: Option<String>,
    pub interactive: bool,
}

/// Decides what to watermark. With a remembered watermark and an original
/// on the command line everything else comes from the store; otherwise the
/// user is asked for all of it.
pub fn plan<S, R, W>(
    request: &Request,
    cfg: &Config,
    base_dir: &Path,
    store: &mut S,
    prompter: &mut Prompter<R, W>,
) -> Result<Option<Job>>
where
    S: DefaultStore + ?Sized,
    R: BufRead,
    W: Write,
{
    let defaults = cfg.defaults()?;
    let watermark = if request.interactive {
        None
    } else {
        stored_watermark_path(&*store).context("Failed to read the stored watermark")?
    };

    match (watermark, request.original.as_deref()) {
        (Some(watermark), Some(original)) => {
            debug!("Using stored watermark {}", watermark.display());
            let original = match existing(original, base_dir) {
                Some(path) => path,
                None => match prompter.image_path("original image", base_dir)? {
                    Some(path) => path,
                    None => return Ok(None),
                },
            };
            let params = WatermarkParams::from_store(&*store, &defaults)
                .context("Failed to read stored watermark parameters")?;
            Ok(Some(Job {
                original,
                watermark,
                params,
            }))
        }
        _ => prompter
            .collect(base_dir, &defaults, store)
            .context("Failed to collect watermark parameters"),
    }
}

fn existing(input: &str, base_dir: &Path) -> Option<PathBuf> {
    let path = resolve_path(input.trim(), base_dir);
    if path.is_file() {
        Some(path)
    } else {
        debug!("{} from the command line does not exist", path.display());
        None
    }
}

/// Watermarks `job.original` and writes the result next to it, named after
/// `now`.
pub fn execute(job: &Job, now: &DateTime<Local>) -> Result<PathBuf> {
    let original = codec::load(&job.original)?;
    let watermark = codec::load(&job.watermark)?;

    let composited = compositor::composite(&CompositionRequest {
        original: &original.image,
        original_format: original.format,
        watermark: &watermark.image,
        params: job.params,
    })?;

    let output = output_path(&job.original, now);
    codec::save(&composited.image, &output, composited.format)?;
    info!(
        "Watermarked {} with {} into {}",
        job.original.display(),
        job.watermark.display(),
        output.display()
    );
    Ok(output)
}

pub fn run<S, R, W>(
    request: &Request,
    cfg: &Config,
    base_dir: &Path,
    store: &mut S,
    prompter: &mut Prompter<R, W>,
    now: &DateTime<Local>,
) -> Result<Option<PathBuf>>
where
    S: DefaultStore + ?Sized,
    R: BufRead,
    W: Write,
{
    match plan(request, cfg, base_dir, store, prompter)? {
        Some(job) => execute(&job, now).map(Some),
        None => {
            info!("Quit requested, nothing written");
            Ok(None)
        }
    }
}
