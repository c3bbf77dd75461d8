//! Shrinks images to fit a bounding box.

use crate::error::ProcessError;
use image::io::Reader;
use image::{GenericImageView, ImageFormat};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::instrument;

/// The box a thumbnail must fit in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxSize {
    pub width: u32,
    pub height: u32,
}

impl Default for BoxSize {
    fn default() -> Self {
        BoxSize {
            width: 128,
            height: 128,
        }
    }
}

impl fmt::Display for BoxSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A box size that doesn't follow the accepted format.
#[derive(Debug, Error)]
#[error("invalid thumbnail size {0:?}: expected two positive integers such as \"128x128\" or \"(128, 128)\"")]
pub struct InvalidBoxSize(String);

impl FromStr for BoxSize {
    type Err = InvalidBoxSize;

    /// Accepts `WxH` or `W,H`, optionally wrapped in parentheses.
    /// Whitespace around each number is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidBoxSize(s.to_string());
        let trimmed = s.trim();
        let inner = match (trimmed.strip_prefix('('), trimmed.ends_with(')')) {
            (Some(rest), true) => &rest[..rest.len() - 1],
            (None, false) => trimmed,
            _ => return Err(invalid()),
        };
        let mut parts = inner.split(|c| c == ',' || c == 'x' || c == 'X');
        let (width, height) = match (parts.next(), parts.next(), parts.next()) {
            (Some(width), Some(height), None) => (width, height),
            _ => return Err(invalid()),
        };
        let positive = |part: &str| part.trim().parse::<u32>().ok().filter(|n| *n > 0);
        match (positive(width), positive(height)) {
            (Some(width), Some(height)) => Ok(BoxSize { width, height }),
            _ => Err(invalid()),
        }
    }
}

/// Compute the dimensions of an image of `width` by `height` once
/// shrunk to fit `size`, keeping its aspect ratio. Images already
/// inside the box keep their dimensions.
pub fn fit_within(width: u32, height: u32, size: BoxSize) -> (u32, u32) {
    if width <= size.width && height <= size.height {
        return (width, height);
    }
    let ratio = f64::min(
        f64::from(size.width) / f64::from(width),
        f64::from(size.height) / f64::from(height),
    );
    let scale = |side: u32, bound: u32| ((f64::from(side) * ratio).round() as u32).clamp(1, bound);
    (scale(width, size.width), scale(height, size.height))
}

/// What came out of a thumbnail generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generated {
    pub format: ImageFormat,
    pub original: (u32, u32),
    pub thumbnail: (u32, u32),
}

/// Decode the image at `source`, shrink it to fit `size` and write it
/// to `dest` in the same format it was read in.
#[instrument(level = "debug")]
pub fn generate(source: &Path, dest: &Path, size: BoxSize) -> Result<Generated, ProcessError> {
    let reader = Reader::open(source)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(ProcessError::WorkingArea)?;
    let format = reader.format().ok_or(ProcessError::UnrecognizedFormat)?;
    let image = reader.decode().map_err(ProcessError::Decode)?;

    let original = image.dimensions();
    let (width, height) = fit_within(original.0, original.1, size);
    let thumbnail = if (width, height) == original {
        image
    } else {
        image.thumbnail_exact(width, height)
    };
    thumbnail
        .save_with_format(dest, format)
        .map_err(ProcessError::Encode)?;

    Ok(Generated {
        format,
        original,
        thumbnail: (width, height),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};

    fn write_image(path: &Path, width: u32, height: u32, format: ImageFormat) {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 40, 10])))
            .save_with_format(path, format)
            .unwrap();
    }

    fn read_back(path: &Path) -> DynamicImage {
        Reader::open(path)
            .unwrap()
            .with_guessed_format()
            .unwrap()
            .decode()
            .unwrap()
    }

    #[test]
    fn parses_accepted_box_formats() {
        let expected = BoxSize {
            width: 64,
            height: 32,
        };
        for input in ["64x32", "64X32", "64,32", "(64, 32)", " ( 64 ,32 ) ", "64 x 32"] {
            assert_eq!(input.parse::<BoxSize>().unwrap(), expected, "{input:?}");
        }
    }

    #[test]
    fn rejects_malformed_boxes() {
        for input in [
            "", "64", "64x", "x32", "0x32", "64x0", "-1x32", "64x32x16", "(64, 32", "64, 32)",
            "1.5x2", "[64, 32]", "64*32",
        ] {
            assert!(input.parse::<BoxSize>().is_err(), "{input:?}");
        }
    }

    #[test]
    fn default_box_is_128_square() {
        assert_eq!(BoxSize::default(), "(128, 128)".parse::<BoxSize>().unwrap());
        assert_eq!(BoxSize::default().to_string(), "128x128");
    }

    #[test]
    fn shrinks_keeping_aspect_ratio() {
        let size = BoxSize::default();
        assert_eq!(fit_within(1000, 500, size), (128, 64));
        assert_eq!(fit_within(500, 1000, size), (64, 128));
        assert_eq!(fit_within(256, 256, size), (128, 128));
        assert_eq!(fit_within(3000, 10, size), (128, 1));
    }

    #[test]
    fn never_upscales() {
        let size = BoxSize::default();
        assert_eq!(fit_within(100, 50, size), (100, 50));
        assert_eq!(fit_within(128, 128, size), (128, 128));
        assert_eq!(fit_within(1, 1, size), (1, 1));
    }

    #[test]
    fn generates_png_thumbnail() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source");
        let dest = dir.path().join("thumbnail");
        write_image(&source, 1000, 500, ImageFormat::Png);

        let generated = generate(&source, &dest, BoxSize::default()).unwrap();
        assert_eq!(generated.format, ImageFormat::Png);
        assert_eq!(generated.original, (1000, 500));
        assert_eq!(generated.thumbnail, (128, 64));

        assert_eq!(read_back(&dest).dimensions(), (128, 64));
        assert_eq!(
            image::guess_format(&std::fs::read(&dest).unwrap()).unwrap(),
            ImageFormat::Png
        );
    }

    #[test]
    fn keeps_jpeg_format_and_small_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source");
        let dest = dir.path().join("thumbnail");
        write_image(&source, 40, 30, ImageFormat::Jpeg);

        let generated = generate(&source, &dest, BoxSize::default()).unwrap();
        assert_eq!(generated.format, ImageFormat::Jpeg);
        assert_eq!(generated.thumbnail, (40, 30));
        assert_eq!(read_back(&dest).dimensions(), (40, 30));
    }

    #[test]
    fn rejects_non_image_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source");
        std::fs::write(&source, b"%PDF-1.4 definitely not an image").unwrap();

        let result = generate(&source, &dir.path().join("thumbnail"), BoxSize::default());
        assert!(matches!(result, Err(ProcessError::UnrecognizedFormat)));
    }

    #[test]
    fn rejects_truncated_image() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source");
        write_image(&source, 64, 64, ImageFormat::Png);
        let bytes = std::fs::read(&source).unwrap();
        std::fs::write(&source, &bytes[..bytes.len() / 2]).unwrap();

        let result = generate(&source, &dir.path().join("thumbnail"), BoxSize::default());
        assert!(matches!(result, Err(ProcessError::Decode(_))));
    }
}
