use crate::compositor::{Position, WatermarkParams};
use crate::error::{Result, WmError};
use crate::store::DefaultStore;
use log::{debug, warn};
use std::path::PathBuf;
use std::str::FromStr;

pub const CATEGORY: &str = "main";

pub const KEY_WATERMARK_PATH: &str = "watermark_image_path";
pub const KEY_OPACITY: &str = "watermark_opacity";
pub const KEY_POSITION: &str = "watermark_position";
pub const KEY_SCALE: &str = "watermark_scaling_percentage";
pub const KEY_BORDER: &str = "watermark_border_percentage";

pub const DEFAULT_OPACITY: f64 = 1.0;
pub const DEFAULT_POSITION: Position = Position::BottomRight;
pub const DEFAULT_SCALE_PERCENTAGE: f64 = 5.0;
pub const DEFAULT_BORDER_PERCENTAGE: f64 = 2.0;

/// Everything needed to watermark one image.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub original: PathBuf,
    pub watermark: PathBuf,
    pub params: WatermarkParams,
}

impl Default for WatermarkParams {
    fn default() -> Self {
        Self {
            opacity: DEFAULT_OPACITY,
            position: DEFAULT_POSITION,
            scale_percentage: DEFAULT_SCALE_PERCENTAGE,
            border_percentage: DEFAULT_BORDER_PERCENTAGE,
        }
    }
}

pub fn validate_opacity(opacity: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&opacity) {
        Ok(opacity)
    } else {
        Err(WmError::InvalidParameter {
            name: "opacity",
            reason: format!("{} is not a number between 0 and 1", opacity),
        })
    }
}

pub fn validate_scale(scale_percentage: f64) -> Result<f64> {
    if scale_percentage.is_finite() && scale_percentage > 0.0 {
        Ok(scale_percentage)
    } else {
        Err(WmError::InvalidParameter {
            name: "scaling percentage",
            reason: format!("{} is not a positive number", scale_percentage),
        })
    }
}

pub fn validate_border(border_percentage: f64) -> Result<f64> {
    if border_percentage.is_finite() && border_percentage >= 0.0 {
        Ok(border_percentage)
    } else {
        Err(WmError::InvalidParameter {
            name: "border percentage",
            reason: format!("{} is not a non-negative number", border_percentage),
        })
    }
}

fn stored_number<S>(store: &S, key: &'static str, default: f64, validate: fn(f64) -> Result<f64>) -> Result<f64>
where
    S: DefaultStore + ?Sized,
{
    match store.get(CATEGORY, key)? {
        Some(value) => {
            let number = f64::from_str(value.trim()).map_err(|_| WmError::InvalidParameter {
                name: key,
                reason: format!("stored value {:?} is not a number", value),
            })?;
            validate(number)
        }
        None => Ok(default),
    }
}

impl WatermarkParams {
    pub fn validate(self) -> Result<Self> {
        validate_opacity(self.opacity)?;
        validate_scale(self.scale_percentage)?;
        validate_border(self.border_percentage)?;
        Ok(self)
    }

    /// Reads the stored parameters, taking `defaults` for anything never
    /// stored. A stored value that does not parse is an error.
    pub fn from_store<S: DefaultStore + ?Sized>(store: &S, defaults: &WatermarkParams) -> Result<Self> {
        let position = match store.get(CATEGORY, KEY_POSITION)? {
            Some(value) => value.parse()?,
            None => defaults.position,
        };
        let params = Self {
            opacity: stored_number(store, KEY_OPACITY, defaults.opacity, validate_opacity)?,
            position,
            scale_percentage: stored_number(store, KEY_SCALE, defaults.scale_percentage, validate_scale)?,
            border_percentage: stored_number(store, KEY_BORDER, defaults.border_percentage, validate_border)?,
        };
        debug!("Resolved watermark parameters {:?}", params);
        Ok(params)
    }
}

/// The remembered watermark, as long as it is still a file on disk.
pub fn stored_watermark_path<S: DefaultStore + ?Sized>(store: &S) -> Result<Option<PathBuf>> {
    let path = match store.get(CATEGORY, KEY_WATERMARK_PATH)? {
        Some(p) if !p.is_empty() => PathBuf::from(p),
        _ => return Ok(None),
    };
    if path.is_file() {
        Ok(Some(path))
    } else {
        warn!("Stored watermark {} no longer exists, ignoring it", path.display());
        Ok(None)
    }
}
