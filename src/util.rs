use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use std::path::{Path, PathBuf};

/// Bare file names are looked up in `base_dir`, anything with a directory
/// component is taken as given.
pub fn resolve_path(input: &str, base_dir: &Path) -> PathBuf {
    let path = Path::new(input);
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => path.to_path_buf(),
        _ => base_dir.join(path),
    }
}

pub fn executable_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Failed to locate the running executable")?;
    exe.parent()
        .map(Path::to_path_buf)
        .with_context(|| format!("{} has no parent directory", exe.display()))
}

/// `<stem>_wm_<YYYYMMDDHHMMSS><.ext>` next to the original.
pub fn output_path<Tz>(original: &Path, timestamp: &DateTime<Tz>) -> PathBuf
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    let mut name = format!("{}_wm_{}", stem, timestamp.format("%Y%m%d%H%M%S"));
    if let Some(extension) = original.extension() {
        name.push('.');
        name.push_str(&extension.to_string_lossy());
    }
    original.with_file_name(name)
}
