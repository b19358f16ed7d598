use crate::error::{Result, WmError};
use image::buffer::ConvertBuffer;
use image::io::Reader;
use image::{DynamicImage, ImageError, ImageFormat, ImageResult, RgbaImage};
use log::{debug, warn};
use std::fs;
use std::io::{BufWriter, Seek, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug)]
pub struct LoadedImage {
    pub image: DynamicImage,
    pub format: Option<ImageFormat>,
}

/// Decodes the image at `path`. The format is sniffed from the file contents,
/// falling back to the extension.
pub fn load(path: &Path) -> Result<LoadedImage> {
    let load_error = |source: std::io::Error| WmError::ImageLoad {
        path: path.to_path_buf(),
        source,
    };
    let reader = Reader::open(path)
        .map_err(load_error)?
        .with_guessed_format()
        .map_err(load_error)?;
    let format = reader.format();

    let image = if format == Some(ImageFormat::WebP) {
        let bytes = fs::read(path).map_err(load_error)?;
        webp::Decoder::new(&bytes)
            .decode()
            .ok_or_else(|| WmError::WebPDecode {
                path: path.to_path_buf(),
            })?
            .to_image()
    } else {
        reader.decode().map_err(|source| WmError::ImageDecode {
            path: path.to_path_buf(),
            source,
        })?
    };
    debug!(
        "Loaded {} ({}x{}, {:?})",
        path.display(),
        image.width(),
        image.height(),
        format
    );
    Ok(LoadedImage { image, format })
}

fn keeps_alpha(format: ImageFormat) -> bool {
    use ImageFormat::*;
    matches!(format, Png | Tiff | Tga | Bmp | Ico | Gif | WebP)
}

fn encode<W: Write + Seek>(image: &RgbaImage, format: ImageFormat, writer: &mut W) -> ImageResult<()> {
    match format {
        ImageFormat::WebP => {
            let memory = webp::Encoder::from_rgba(image.as_raw(), image.width(), image.height()).encode_lossless();
            writer.write_all(&memory)?;
            Ok(())
        }
        f if keeps_alpha(f) => DynamicImage::ImageRgba8(image.clone()).write_to(writer, f),
        f => DynamicImage::ImageRgb8(image.convert()).write_to(writer, f),
    }
}

/// Settles on the format to write: the requested one if it can be written,
/// otherwise whatever the extension says, otherwise PNG.
fn output_format(path: &Path, format: Option<ImageFormat>) -> ImageFormat {
    let writable = |f: &ImageFormat| *f == ImageFormat::WebP || f.can_write();
    match format {
        Some(f) if writable(&f) => f,
        Some(f) => {
            warn!("{:?} images cannot be written, saving {} as PNG", f, path.display());
            ImageFormat::Png
        }
        None => ImageFormat::from_path(path)
            .ok()
            .filter(writable)
            .unwrap_or(ImageFormat::Png),
    }
}

/// Encodes `image` to `path` and returns the format actually written.
///
/// The data goes to a temporary file next to `path` first, so a failed save
/// never leaves a truncated image behind.
pub fn save(image: &RgbaImage, path: &Path, format: Option<ImageFormat>) -> Result<ImageFormat> {
    let save_error = |source: ImageError| WmError::ImageSave {
        path: path.to_path_buf(),
        source,
    };
    let format = output_format(path, format);
    let dir: PathBuf = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut file = NamedTempFile::new_in(&dir).map_err(|e| save_error(ImageError::IoError(e)))?;
    {
        let mut writer = BufWriter::new(file.as_file_mut());
        encode(image, format, &mut writer).map_err(save_error)?;
        writer.flush().map_err(|e| save_error(ImageError::IoError(e)))?;
    }
    file.persist(path)
        .map_err(|e| save_error(ImageError::IoError(e.error)))?;
    debug!("Saved {} as {:?}", path.display(), format);
    Ok(format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ColorType, Rgba};
    use tempfile::tempdir;

    fn sample() -> RgbaImage {
        RgbaImage::from_fn(16, 12, |x, y| Rgba([(x * 16) as u8, (y * 20) as u8, 128, if x < 8 { 255 } else { 100 }]))
    }

    #[test]
    fn png_keeps_pixels_and_alpha() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.png");
        assert_eq!(save(&sample(), &path, Some(ImageFormat::Png)).unwrap(), ImageFormat::Png);

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.format, Some(ImageFormat::Png));
        assert_eq!(loaded.image.to_rgba8(), sample());
    }

    #[test]
    fn jpeg_is_flattened_to_rgb() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.jpg");
        save(&sample(), &path, Some(ImageFormat::Jpeg)).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.format, Some(ImageFormat::Jpeg));
        assert_eq!(loaded.image.color(), ColorType::Rgb8);
        assert_eq!((loaded.image.width(), loaded.image.height()), (16, 12));
    }

    #[test]
    fn webp_goes_through_libwebp() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.webp");
        let opaque = RgbaImage::from_fn(8, 8, |x, y| Rgba([(x * 30) as u8, (y * 30) as u8, 7, 255]));
        assert_eq!(save(&opaque, &path, Some(ImageFormat::WebP)).unwrap(), ImageFormat::WebP);

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.format, Some(ImageFormat::WebP));
        assert_eq!(loaded.image.to_rgba8(), opaque);
    }

    #[test]
    fn missing_format_follows_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.bmp");
        assert_eq!(save(&sample(), &path, None).unwrap(), ImageFormat::Bmp);
        assert_eq!(load(&path).unwrap().format, Some(ImageFormat::Bmp));
    }

    #[test]
    fn unwritable_format_falls_back_to_png() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.dds");
        assert_eq!(save(&sample(), &path, Some(ImageFormat::Dds)).unwrap(), ImageFormat::Png);
        assert_eq!(load(&path).unwrap().format, Some(ImageFormat::Png));
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(load(&dir.path().join("nope.png")), Err(WmError::ImageLoad { .. })));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.png");
        fs::write(&path, b"definitely not a png").unwrap();
        assert!(matches!(load(&path), Err(WmError::ImageDecode { .. })));
    }

    #[test]
    fn failed_save_leaves_nothing_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("out.png");
        assert!(matches!(save(&sample(), &path, Some(ImageFormat::Png)), Err(WmError::ImageSave { .. })));
        assert!(!path.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
