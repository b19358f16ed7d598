use crate::compositor::{Position, WatermarkParams};
use crate::params;
use crate::util::executable_dir;
use anyhow::{Context, Result};
use dotenv::dotenv;
use figment::providers::{Env, Format, Json, Toml, Yaml};
use figment::Figment;
use serde_derive::Deserialize;
use std::path::PathBuf;
use try_traits::default::TryDefault;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// JSON file remembering the last watermark and its parameters.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    /// Where bare file names are looked up. Defaults to the executable's
    /// directory.
    #[serde(default)]
    pub base_dir: Option<PathBuf>,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default = "default_position")]
    pub position: Position,
    #[serde(default = "default_scale_percentage")]
    pub scale_percentage: f64,
    #[serde(default = "default_border_percentage")]
    pub border_percentage: f64,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("wmark_defaults.json")
}

fn default_opacity() -> f64 {
    params::DEFAULT_OPACITY
}

fn default_position() -> Position {
    params::DEFAULT_POSITION
}

fn default_scale_percentage() -> f64 {
    params::DEFAULT_SCALE_PERCENTAGE
}

fn default_border_percentage() -> f64 {
    params::DEFAULT_BORDER_PERCENTAGE
}

impl Config {
    /// Configuration with every key at its built-in value, as if no file or
    /// environment variable were present. Loading goes through
    /// [`TryDefault::try_default`].
    #[cfg(test)]
    pub fn builtin() -> Self {
        Self {
            store_path: default_store_path(),
            base_dir: None,
            opacity: default_opacity(),
            position: default_position(),
            scale_percentage: default_scale_percentage(),
            border_percentage: default_border_percentage(),
        }
    }

    /// Parameters used whenever nothing has been stored yet.
    pub fn defaults(&self) -> Result<WatermarkParams> {
        WatermarkParams {
            opacity: self.opacity,
            position: self.position,
            scale_percentage: self.scale_percentage,
            border_percentage: self.border_percentage,
        }
        .validate()
        .context("Invalid default watermark parameters in configuration")
    }

    pub fn base_dir(&self) -> Result<PathBuf> {
        match &self.base_dir {
            Some(dir) => Ok(dir.clone()),
            None => executable_dir(),
        }
    }
}

impl TryDefault for Config {
    type Error = anyhow::Error;

    fn try_default() -> Result<Self> {
        dotenv().ok();

        Figment::new()
            .merge(Toml::file("wmark.toml"))
            .merge(Env::prefixed("WMARK_"))
            .merge(Json::file("wmark.json"))
            .merge(Yaml::file("wmark.yaml"))
            .merge(Yaml::file("wmark.yml"))
            .extract()
            .context("Failed to load configuration")
    }
}
