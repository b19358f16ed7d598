use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WmError {
    #[error("Invalid watermark position {0:?}")]
    InvalidPosition(String),

    #[error("Invalid {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Watermark scaled to {width}x{height} pixels is too large to render")]
    WatermarkTooLarge { width: f64, height: f64 },

    #[error("Failed to load image {}", path.display())]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image {}", path.display())]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to decode WebP image {}", path.display())]
    WebPDecode { path: PathBuf },

    #[error("Failed to save image {}", path.display())]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to access default store {}", path.display())]
    Store {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Default store {} is not valid JSON", path.display())]
    StoreFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WmError>;
