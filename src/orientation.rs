//! EXIF orientation as an element of the D4 dihedral group.
//!
//! Camera photos are often stored sideways with an EXIF tag saying how to
//! display them. Decoded pixels are turned upright before the preview resize,
//! so compositions are laid out from the dimensions the user actually sees.
//!
//! ```text
//!     1: Identity    2: FlipH       3: Rotate180   4: FlipV
//!     ┌───┐          ┌───┐          ┌───┐          ┌───┐
//!     │ F │          │ Ꟊ │          │   │          │   │
//!     │   │          │   │          │ Ꟊ │          │ F │
//!     └───┘          └───┘          └───┘          └───┘
//!
//!     5: Transpose   6: Rotate90    7: Transverse  8: Rotate270
//!     ┌────┐         ┌────┐         ┌────┐         ┌────┐
//!     │ F  │         │  F │         │  Ꟊ │         │ Ꟊ  │
//!     └────┘         └────┘         └────┘         └────┘
//! ```

use crate::layout::Size;

/// Rotation (quarter turns clockwise) followed by an optional horizontal flip.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Orientation {
    /// Quarter turns clockwise, 0-3.
    pub rotation: u8,
    /// Horizontal flip applied after rotation.
    pub flip: bool,
}

impl Orientation {
    /// EXIF 1.
    pub const IDENTITY: Self = Self::new(0, false);
    /// EXIF 2.
    pub const FLIP_H: Self = Self::new(0, true);
    /// EXIF 3.
    pub const ROTATE_180: Self = Self::new(2, false);
    /// EXIF 4.
    pub const FLIP_V: Self = Self::new(2, true);
    /// EXIF 5, reflection over the main diagonal.
    pub const TRANSPOSE: Self = Self::new(1, true);
    /// EXIF 6.
    pub const ROTATE_90: Self = Self::new(1, false);
    /// EXIF 7, reflection over the anti-diagonal.
    pub const TRANSVERSE: Self = Self::new(3, true);
    /// EXIF 8.
    pub const ROTATE_270: Self = Self::new(3, false);

    /// Indexed by EXIF value - 1.
    const BY_EXIF: [Self; 8] = [
        Self::IDENTITY,
        Self::FLIP_H,
        Self::ROTATE_180,
        Self::FLIP_V,
        Self::TRANSPOSE,
        Self::ROTATE_90,
        Self::TRANSVERSE,
        Self::ROTATE_270,
    ];

    const fn new(rotation: u8, flip: bool) -> Self {
        Self { rotation, flip }
    }

    /// From the EXIF orientation tag (1-8). `None` for anything else.
    pub fn from_exif(value: u8) -> Option<Self> {
        if (1..=8).contains(&value) {
            Some(Self::BY_EXIF[(value - 1) as usize])
        } else {
            None
        }
    }

    pub fn is_identity(self) -> bool {
        self.rotation == 0 && !self.flip
    }

    /// Whether width and height trade places.
    pub fn swaps_axes(self) -> bool {
        self.rotation % 2 == 1
    }

    /// Upright dimensions of a `w`×`h` stored image.
    pub fn transform_dimensions(self, w: u32, h: u32) -> Size {
        if self.swaps_axes() {
            Size::new(h, w)
        } else {
            Size::new(w, h)
        }
    }

    /// Where stored pixel `(x, y)` of a `w`×`h` image lands once upright.
    pub fn map_point(self, x: u32, y: u32, w: u32, h: u32) -> (u32, u32) {
        match (self.rotation & 3, self.flip) {
            (0, false) => (x, y),
            (0, true) => (w - 1 - x, y),
            (1, false) => (h - 1 - y, x),
            (1, true) => (y, x),
            (2, false) => (w - 1 - x, h - 1 - y),
            (2, true) => (x, h - 1 - y),
            (_, false) => (y, w - 1 - x),
            (_, true) => (h - 1 - y, w - 1 - x),
        }
    }
}

#[cfg(feature = "raster")]
mod raster {
    use super::Orientation;
    use image::RgbaImage;
    use image::imageops;
    use image::metadata::Orientation as ExifOrientation;

    impl From<ExifOrientation> for Orientation {
        fn from(value: ExifOrientation) -> Self {
            match value {
                ExifOrientation::NoTransforms => Self::IDENTITY,
                ExifOrientation::FlipHorizontal => Self::FLIP_H,
                ExifOrientation::Rotate180 => Self::ROTATE_180,
                ExifOrientation::FlipVertical => Self::FLIP_V,
                ExifOrientation::Rotate90FlipH => Self::TRANSPOSE,
                ExifOrientation::Rotate90 => Self::ROTATE_90,
                ExifOrientation::Rotate270FlipH => Self::TRANSVERSE,
                ExifOrientation::Rotate270 => Self::ROTATE_270,
            }
        }
    }

    impl Orientation {
        /// Turn stored pixels upright.
        pub fn apply(self, image: RgbaImage) -> RgbaImage {
            if self.is_identity() {
                return image;
            }
            let turned = match self.rotation & 3 {
                0 => image,
                1 => imageops::rotate90(&image),
                2 => imageops::rotate180(&image),
                _ => imageops::rotate270(&image),
            };
            if self.flip {
                imageops::flip_horizontal(&turned)
            } else {
                turned
            }
        }
    }
}
