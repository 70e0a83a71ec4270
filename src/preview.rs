//! Preview resize: shrink a freshly loaded photo before it is ever composed.
//!
//! The rule keys off the aspect ratio alone. Landscape sources (aspect > 1)
//! take the full bound width; everything else takes the full bound height.
//! A landscape source that is only slightly wider than tall can therefore
//! still exceed the height bound after the resize, exactly as the rule says.

use crate::layout::Size;

/// Upper bound for preview-sized sources.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PreviewBounds {
    pub max_width: u32,
    pub max_height: u32,
}

impl PreviewBounds {
    pub const fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
        }
    }
}

impl Default for PreviewBounds {
    /// 400×300.
    fn default() -> Self {
        Self::new(400, 300)
    }
}

/// Preview dimensions as the rule computes them, before pixel truncation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PreviewSize {
    pub width: f64,
    pub height: f64,
}

impl PreviewSize {
    /// Whole-pixel raster size: fractions truncated, never below 1.
    ///
    /// ```
    /// use eagleframe::preview::{fit_preview, PreviewBounds};
    /// use eagleframe::layout::Size;
    ///
    /// let p = fit_preview(Size::new(900, 1600), PreviewBounds::default());
    /// assert_eq!((p.width, p.height), (168.75, 300.0));
    /// assert_eq!(p.to_pixels(), Size::new(168, 300));
    /// ```
    pub fn to_pixels(&self) -> Size {
        Size::new(truncate(self.width), truncate(self.height))
    }
}

/// Apply the preview rule to a source of `source` dimensions.
///
/// Sources within both bounds are returned unchanged.
pub fn fit_preview(source: Size, bounds: PreviewBounds) -> PreviewSize {
    let width = source.width as f64;
    let height = source.height as f64;
    if source.width <= bounds.max_width && source.height <= bounds.max_height {
        return PreviewSize { width, height };
    }
    if source.height == 0 {
        // No aspect ratio to preserve.
        return PreviewSize {
            width: bounds.max_width as f64,
            height: 0.0,
        };
    }

    // max / aspect and max * aspect, arranged to keep exact ratios exact.
    if width / height > 1.0 {
        PreviewSize {
            width: bounds.max_width as f64,
            height: bounds.max_width as f64 * height / width,
        }
    } else {
        PreviewSize {
            width: bounds.max_height as f64 * width / height,
            height: bounds.max_height as f64,
        }
    }
}

fn truncate(v: f64) -> u32 {
    if v >= 1.0 { v as u32 } else { 1 }
}
