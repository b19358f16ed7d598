use crate::app::Request;
use crate::config::Config;
use crate::prompt::Prompter;
use crate::store::JsonFileStore;
use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use flexi_logger::Logger;
use log::{debug, info};
use std::io;
use try_traits::default::TryDefault;

mod app;
mod codec;
mod compositor;
mod config;
mod error;
mod params;
mod prompt;
mod store;
mod util;

#[derive(Debug, Parser)]
#[clap(version, about)]
struct Opt {
    /// Image to watermark with the remembered watermark and settings
    original: Option<String>,
    /// Ask for everything even if a watermark is remembered
    #[clap(short, long)]
    interactive: bool,
}

fn main() -> Result<()> {
    let level = if cfg!(debug_assertions) { "debug" } else { "info" };
    let _logger = Logger::try_with_env_or_str(level)?.start()?;
    let opt = Opt::parse();
    info!("Starting wmark");
    debug!("Creating config");
    let cfg = Config::try_default()?;
    let base_dir = cfg.base_dir()?;
    let store_path = base_dir.join(&cfg.store_path);
    let mut store = JsonFileStore::open(&store_path).context("Failed to open default store")?;
    debug!("Using default store {}", store.path().display());

    let request = Request {
        original: opt.original,
        interactive: opt.interactive,
    };
    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), io::stdout());
    if let Some(output) = app::run(&request, &cfg, &base_dir, &mut store, &mut prompter, &Local::now())? {
        println!("Watermark added successfully in {}", output.display());
    }

    Ok(())
}
