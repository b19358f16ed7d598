//! Watermark placement and alpha compositing.
//!
//! Everything here works on in-memory rasters. Loading and saving files is
//! left to [`crate::codec`].

mod position;

pub use position::Position;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, RgbaImage};
use log::debug;

use crate::error::{Result, WmError};

/// Filter used when scaling the watermark to its target size.
pub const RESAMPLE_FILTER: FilterType = FilterType::CatmullRom;

/// Largest scaled watermark, in pixels, that gets resampled. 2^28 pixels is
/// 1 GiB of RGBA.
pub const MAX_WATERMARK_PIXELS: u64 = 1 << 28;

/// The four tunables of a watermark run.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WatermarkParams {
    /// 0 hides the watermark, 1 keeps its own alpha.
    pub opacity: f64,
    pub position: Position,
    /// Watermark height as a percentage of the original's height.
    pub scale_percentage: f64,
    /// Distance from the anchored edges as a percentage of the original's
    /// shorter side.
    pub border_percentage: f64,
}

#[derive(Debug)]
pub struct CompositionRequest<'a> {
    pub original: &'a DynamicImage,
    pub original_format: Option<ImageFormat>,
    pub watermark: &'a DynamicImage,
    pub params: WatermarkParams,
}

#[derive(Debug, Clone)]
pub struct CompositedImage {
    pub image: RgbaImage,
    /// Format the original was decoded from, reused when encoding.
    pub format: Option<ImageFormat>,
}

/// Size the watermark is scaled to so that its height is `scale_percentage`
/// of the canvas height, keeping its aspect ratio.
///
/// Either side may come out as 0 for tiny percentages, in which case nothing
/// gets drawn. A size over [`MAX_WATERMARK_PIXELS`] is refused with
/// [`WmError::WatermarkTooLarge`] instead of being allocated.
pub fn watermark_size(canvas: (u32, u32), watermark: (u32, u32), scale_percentage: f64) -> Result<(u32, u32)> {
    if watermark.0 == 0 || watermark.1 == 0 {
        return Ok((0, 0));
    }
    let height = (f64::from(canvas.1) * (scale_percentage / 100.0)).floor();
    let aspect_ratio = f64::from(watermark.0) / f64::from(watermark.1);
    let width = (height * aspect_ratio).floor();

    let too_large = WmError::WatermarkTooLarge { width, height };
    let side_limit = f64::from(u32::MAX);
    if !(width.is_finite() && height.is_finite()) || width > side_limit || height > side_limit {
        return Err(too_large);
    }
    let (width, height) = (width as u32, height as u32);
    match u64::from(width).checked_mul(u64::from(height)) {
        Some(pixels) if pixels <= MAX_WATERMARK_PIXELS => Ok((width, height)),
        _ => Err(too_large),
    }
}

/// Border in pixels, measured against the canvas' shorter side.
pub fn border_distance(canvas: (u32, u32), border_percentage: f64) -> u32 {
    let min_dimension = canvas.0.min(canvas.1);
    (f64::from(min_dimension) * (border_percentage / 100.0)).floor() as u32
}

/// Blends every channel towards a fully transparent pixel. Results are
/// truncated, so 255 at opacity 0.5 becomes 127.
pub fn apply_opacity(watermark: &mut RgbaImage, opacity: f64) {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity >= 1.0 {
        return;
    }
    for pixel in watermark.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            *channel = (f64::from(*channel) * opacity) as u8;
        }
    }
}

/// Pastes `top` onto `canvas` at `(x, y)`, using `top`'s alpha channel as the
/// mask. Every channel, alpha included, moves towards `top` by `mask / 255`.
/// Parts of `top` outside the canvas are dropped.
pub fn paste_masked(canvas: &mut RgbaImage, top: &RgbaImage, x: i64, y: i64) {
    let (width, height) = canvas.dimensions();
    let x_start = x.max(0);
    let y_start = y.max(0);
    let x_end = (x + i64::from(top.width())).min(i64::from(width));
    let y_end = (y + i64::from(top.height())).min(i64::from(height));

    for cy in y_start..y_end {
        for cx in x_start..x_end {
            let src = top.get_pixel((cx - x) as u32, (cy - y) as u32);
            let mask = u32::from(src.0[3]);
            if mask == 0 {
                continue;
            }
            let dst = canvas.get_pixel_mut(cx as u32, cy as u32);
            for (d, s) in dst.0.iter_mut().zip(src.0.iter()) {
                *d = ((u32::from(*s) * mask + u32::from(*d) * (255 - mask) + 127) / 255) as u8;
            }
        }
    }
}

/// Overlays the watermark described by `request` onto a copy of the original.
pub fn composite(request: &CompositionRequest<'_>) -> Result<CompositedImage> {
    let WatermarkParams {
        opacity,
        position,
        scale_percentage,
        border_percentage,
    } = request.params;

    let mut canvas = request.original.to_rgba8();
    let canvas_size = canvas.dimensions();
    let watermark = request.watermark.to_rgba8();

    let size = watermark_size(canvas_size, watermark.dimensions(), scale_percentage)?;
    let border = border_distance(canvas_size, border_percentage);
    let (x, y) = position.offset(canvas_size, size, border);
    debug!(
        "Placing {}x{} watermark at ({}, {}) on {}x{} canvas ({}, border {}px, opacity {})",
        size.0, size.1, x, y, canvas_size.0, canvas_size.1, position, border, opacity
    );

    if size.0 == 0 || size.1 == 0 {
        debug!("Watermark scaled down to nothing, leaving the original untouched");
    } else {
        let mut resized = imageops::resize(&watermark, size.0, size.1, RESAMPLE_FILTER);
        apply_opacity(&mut resized, opacity);
        paste_masked(&mut canvas, &resized, x, y);
    }

    Ok(CompositedImage {
        image: canvas,
        format: request.original_format,
    })
}
