//! Source images: decoded, turned upright, and shrunk to preview size.

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageDecoder, ImageError, ImageReader, RgbaImage};
use log::debug;
use thiserror::Error;

use crate::layout::Size;
use crate::orientation::Orientation;
use crate::preview::{PreviewBounds, fit_preview};

/// Resampling filter for preview resizes and for fitting the secondary image.
pub(crate) const RESAMPLE: FilterType = FilterType::Triangle;

/// Which of the two inputs an image fills.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    /// The "before" image; required for any output.
    Primary,
    /// The "after" image; its presence selects dual-image mode.
    Secondary,
}

impl core::fmt::Display for Slot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Primary => f.write_str("primary"),
            Self::Secondary => f.write_str("secondary"),
        }
    }
}

/// Source bytes that could not be rasterized.
#[derive(Debug, Error)]
#[error("{slot} image could not be decoded")]
pub struct DecodeError {
    pub slot: Slot,
    #[source]
    pub source: ImageError,
}

/// A decoded RGBA source, ready to compose.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceImage {
    pixels: RgbaImage,
}

impl SourceImage {
    /// Wrap already-decoded pixels.
    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    /// Decode `bytes` (format sniffed from content) and apply its EXIF orientation.
    pub fn decode(bytes: &[u8], slot: Slot) -> Result<Self, DecodeError> {
        let fail = |source| DecodeError { slot, source };
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| fail(ImageError::IoError(e)))?;
        let mut decoder = reader.into_decoder().map_err(fail)?;
        let orientation = decoder
            .orientation()
            .map(Orientation::from)
            .unwrap_or(Orientation::IDENTITY);
        let decoded = DynamicImage::from_decoder(decoder).map_err(fail)?;
        let pixels = orientation.apply(decoded.into_rgba8());
        debug!(
            "decoded {slot} image {}x{} ({orientation:?})",
            pixels.width(),
            pixels.height()
        );
        Ok(Self { pixels })
    }

    /// Decode and apply the preview resize: what a file selection produces.
    pub fn load(bytes: &[u8], slot: Slot, bounds: PreviewBounds) -> Result<Self, DecodeError> {
        Ok(Self::decode(bytes, slot)?.fit_preview(bounds))
    }

    /// Shrink to preview size when over `bounds`; untouched otherwise.
    pub fn fit_preview(self, bounds: PreviewBounds) -> Self {
        let size = self.size();
        if size.is_empty() {
            return self;
        }
        let target = fit_preview(size, bounds).to_pixels();
        if target == size {
            return self;
        }
        debug!(
            "preview resize {}x{} -> {}x{}",
            size.width, size.height, target.width, target.height
        );
        Self {
            pixels: imageops::resize(&self.pixels, target.width, target.height, RESAMPLE),
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.pixels.width(), self.pixels.height())
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}
