// Read and write image files as pixel buffers
//
// Images keep their own channel count where it fits in 8 bits per sample,
// anything wider is squashed down to RGB or RGBA.

use std::fs::create_dir_all;
use std::io::ErrorKind;
use std::path::Path;

use image::{ColorType, DynamicImage, GenericImageView, ImageError};

use crate::error::ImageIoError;
use crate::pixels::PixelBuffer;

pub fn make_directory_for_image(path : &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => create_dir_all(dir),
        _ => Ok(())
    }
}

pub fn load(path : &Path) -> Result<PixelBuffer, ImageIoError> {
    let image = image::open(path).map_err(|err| match err {
        ImageError::IoError(io) if io.kind() == ErrorKind::NotFound =>
            ImageIoError::NotFound(path.to_path_buf()),
        ImageError::Unsupported(reason) => ImageIoError::Unsupported {
            path : path.to_path_buf(),
            reason : reason.to_string()
        },
        other => ImageIoError::Decode { path : path.to_path_buf(), reason : other.to_string() }
    })?;
    let (width, height) = image.dimensions();
    let (channels, data) = match image {
        DynamicImage::ImageLuma8(buf) => (1, buf.into_raw()),
        DynamicImage::ImageLumaA8(buf) => (2, buf.into_raw()),
        DynamicImage::ImageRgb8(buf) => (3, buf.into_raw()),
        DynamicImage::ImageRgba8(buf) => (4, buf.into_raw()),
        other if other.color().has_alpha() => (4, other.to_rgba8().into_raw()),
        other => (3, other.to_rgb8().into_raw())
    };
    PixelBuffer::from_raw(width, height, channels, data).map_err(
        |err| ImageIoError::Decode { path : path.to_path_buf(), reason : err.to_string() }
    )
}

pub fn save(path : &Path, buffer : &PixelBuffer) -> Result<(), ImageIoError> {
    let write_error = |reason : String| ImageIoError::Write { path : path.to_path_buf(), reason };
    make_directory_for_image(path).map_err(|err| write_error(err.to_string()))?;
    let colour_type = match buffer.channels() {
        1 => ColorType::L8,
        2 => ColorType::La8,
        3 => ColorType::Rgb8,
        _ => ColorType::Rgba8
    };
    image::save_buffer(path, buffer.as_bytes(), buffer.width(), buffer.height(), colour_type).map_err(
        |err| match err {
            ImageError::Unsupported(reason) => ImageIoError::Unsupported {
                path : path.to_path_buf(),
                reason : reason.to_string()
            },
            other => write_error(other.to_string())
        }
    )
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use crate::remap::tests::noise_image;

    use super::*;

    fn scratch(name : &str) -> PathBuf {
        std::env::temp_dir().join(format!("complex-warp-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_png_round_trip_keeps_channels() {
        for channels in 1..=4u8 {
            let path = scratch(&format!("round-trip-{}.png", channels));
            let image = noise_image(7, 5, channels, channels as u64);
            save(&path, &image).unwrap();
            let loaded = load(&path).unwrap();
            fs::remove_file(&path).unwrap();
            assert_eq!(loaded, image);
        }
    }

    #[test]
    fn test_save_makes_directories() {
        let dir = scratch("nested");
        let path = dir.join("a").join("0.png");
        save(&path, &noise_image(2, 2, 3, 0)).unwrap();
        assert!(path.exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_file() {
        let err = load(&scratch("does-not-exist.png")).unwrap_err();
        assert!(matches!(err, ImageIoError::NotFound(_)));
    }

    #[test]
    fn test_unsupported_format() {
        let path = scratch("image.xyz");
        let err = save(&path, &noise_image(2, 2, 3, 0)).unwrap_err();
        assert!(matches!(err, ImageIoError::Unsupported { .. }));
        fs::write(&path, b"not an image").unwrap();
        let err = load(&path).unwrap_err();
        fs::remove_file(&path).unwrap();
        assert!(matches!(err, ImageIoError::Unsupported { .. }));
    }

    #[test]
    fn test_corrupt_file() {
        let path = scratch("corrupt.png");
        fs::write(&path, b"definitely not a png").unwrap();
        let err = load(&path).unwrap_err();
        fs::remove_file(&path).unwrap();
        assert!(matches!(err, ImageIoError::Decode { .. }));
    }
}
