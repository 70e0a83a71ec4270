//! Composition layout: canvas size and the placement of every element.
//!
//! Pure geometry, no pixel operations. The one external capability is a
//! [`TextMeasure`], used for label plate widths and brand caption offsets,
//! so layouts are testable without fonts or a drawing surface.
//!
//! # Example
//!
//! ```
//! use eagleframe::layout::{FixedAdvance, Frame, LayoutOptions, Size};
//!
//! let composition = Frame::new(Size::new(200, 200))
//!     .secondary(Size::new(200, 200))
//!     .options(LayoutOptions { vertical_layout: true, show_labels: true })
//!     .compute(&FixedAdvance::default())
//!     .unwrap();
//!
//! // Side by side with a 14px gap.
//! assert_eq!(composition.canvas, Size::new(414, 200));
//! assert_eq!(composition.labels.len(), 2);
//! ```

#[cfg(not(feature = "std"))]
use alloc::string::String;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// White margin framing a single image, and the gap between two images.
pub const BORDER: u32 = 14;

/// Box the logo is stretched into, in canvas pixels.
pub const LOGO_BOX: BoxSize = BoxSize {
    width: 85.0,
    height: 60.25,
};

/// Distance from an image's top edge to the vertical center of its label plate.
pub const LABEL_ANCHOR_Y: f64 = 40.0;
/// Label plate height.
pub const LABEL_PLATE_HEIGHT: f64 = 25.0;
/// Horizontal padding on each side of the label text.
pub const LABEL_PADDING: f64 = 10.0;
/// Gap between the logo box and each brand caption.
pub const CAPTION_PADDING: f64 = 10.0;
/// Label baseline sits this far below the plate's center line.
const LABEL_BASELINE_DROP: f64 = 5.0;

/// Font used for label plates and brand captions.
pub const BOLD_15: FontSpec = FontSpec {
    size_px: 15.0,
    bold: true,
};

/// Width × height dimensions in pixels.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Size {
    /// Create a new size.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether either axis is zero.
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Fractional box size (the logo box is not pixel-aligned).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoxSize {
    pub width: f64,
    pub height: f64,
}

/// Axis-aligned rectangle in whole pixels.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    /// Create a new rect.
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Axis-aligned rectangle in canvas coordinates, not snapped to pixels.
///
/// May extend past the canvas edges (a tall logo near the top of a small
/// single-image canvas does); drawing clips.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RectF {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl RectF {
    /// Create a new rect.
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rect of `size` centered on `(cx, cy)`.
    pub fn centered(cx: f64, cy: f64, size: BoxSize) -> Self {
        Self::new(
            cx - size.width / 2.0,
            cy - size.height / 2.0,
            size.width,
            size.height,
        )
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Center point `(x, y)`.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// 8-bit sRGB color with alpha.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// White, fully opaque.
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Black, fully opaque.
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    /// Opaque color from its channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Font request passed to a [`TextMeasure`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FontSpec {
    /// Pixel size (em height).
    pub size_px: f32,
    pub bold: bool,
}

/// Font-metrics capability: the advance width of a run of text.
pub trait TextMeasure {
    /// Width in pixels of `text` set in `font`, including the final advance.
    fn measure(&self, text: &str, font: &FontSpec) -> f64;
}

/// Approximate metrics: every character advances by a fixed fraction of the em.
///
/// Used where no font is available, and in tests where exact glyph metrics
/// would tie expectations to a particular font file.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FixedAdvance {
    /// Advance per character as a fraction of the font size.
    pub em_ratio: f64,
}

impl FixedAdvance {
    /// Create with the given advance-to-em ratio.
    pub const fn new(em_ratio: f64) -> Self {
        Self { em_ratio }
    }
}

impl Default for FixedAdvance {
    /// Average advance of a bold sans-serif face, roughly.
    fn default() -> Self {
        Self::new(0.62)
    }
}

impl TextMeasure for FixedAdvance {
    fn measure(&self, text: &str, font: &FontSpec) -> f64 {
        text.chars().count() as f64 * font.size_px as f64 * self.em_ratio
    }
}

/// User-selected layout flags, immutable for one render.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LayoutOptions {
    /// Two images side by side (left/right) when true, stacked (top/bottom) when false.
    pub vertical_layout: bool,
    /// Draw "BEFORE"/"AFTER" plates in dual-image mode.
    pub show_labels: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            vertical_layout: true,
            show_labels: true,
        }
    }
}

/// Two-part brand name set on either side of the logo.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Brand {
    /// Drawn left of the logo, right-aligned against it.
    pub left: String,
    /// Drawn right of the logo, left-aligned against it.
    pub right: String,
}

impl Default for Brand {
    fn default() -> Self {
        Self {
            left: String::from("Eagle Eye"),
            right: String::from("Contracting"),
        }
    }
}

/// Words printed on the label plates.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LabelWords {
    pub before: String,
    pub after: String,
}

impl Default for LabelWords {
    fn default() -> Self {
        Self {
            before: String::from("BEFORE"),
            after: String::from("AFTER"),
        }
    }
}

/// How the source images sit on the canvas.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Arrangement {
    /// One image framed by a border on all sides.
    Single,
    /// Two images left/right, gap between them.
    SideBySide,
    /// Two images top/bottom, gap between them.
    Stacked,
}

/// A run of text positioned by its left edge and alphabetic baseline.
#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: f64,
    pub baseline: f64,
    pub font: FontSpec,
    pub color: Color,
}

/// A white plate with a word on it, marking one image.
#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub plate: RectF,
    pub run: TextRun,
}

/// Where the logo goes, and the captions that belong to it.
#[derive(Clone, Debug, PartialEq)]
pub struct LogoPlacement {
    pub region: RectF,
    /// Brand captions; empty in side-by-side layouts.
    pub captions: Vec<TextRun>,
}

/// Computed composition: everything needed to draw the canvas.
///
/// Elements are listed in paint order: background, primary, gap, secondary,
/// labels, logo with captions.
#[derive(Clone, Debug, PartialEq)]
pub struct Composition {
    pub arrangement: Arrangement,
    /// Final canvas dimensions.
    pub canvas: Size,
    /// Whole-canvas fill, painted before anything else.
    pub background: Option<Color>,
    /// Destination of the primary image.
    pub primary: Rect,
    /// Destination of the secondary image, always the primary's size.
    pub secondary: Option<Rect>,
    /// White strip between the two images.
    pub gap: Option<Rect>,
    pub labels: Vec<Label>,
    pub logo: LogoPlacement,
}

impl Composition {
    /// Whether the canvas pixel belongs to a label plate, as a drawing of
    /// the plate would cover it (pixel centers inside the plate).
    pub fn in_label_plate(&self, px: u32, py: u32) -> bool {
        let (cx, cy) = (px as f64 + 0.5, py as f64 + 0.5);
        self.labels.iter().any(|l| {
            cx >= l.plate.x && cx < l.plate.right() && cy >= l.plate.y && cy < l.plate.bottom()
        })
    }
}

/// Layout request: source sizes plus options.
///
/// # Example
///
/// ```
/// use eagleframe::layout::{FixedAdvance, Frame, Size, BORDER};
///
/// let c = Frame::new(Size::new(400, 225)).compute(&FixedAdvance::default()).unwrap();
/// assert_eq!(c.canvas, Size::new(400 + 2 * BORDER, 225 + 2 * BORDER));
/// assert_eq!(c.primary.x, BORDER);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub primary: Size,
    pub secondary: Option<Size>,
    pub options: LayoutOptions,
    pub brand: Brand,
    pub words: LabelWords,
}

impl Frame {
    /// Single-image frame around `primary`.
    pub fn new(primary: Size) -> Self {
        Self {
            primary,
            secondary: None,
            options: LayoutOptions::default(),
            brand: Brand::default(),
            words: LabelWords::default(),
        }
    }

    /// Add a secondary image, switching to dual-image mode.
    pub fn secondary(mut self, size: Size) -> Self {
        self.secondary = Some(size);
        self
    }

    /// Set layout flags.
    pub fn options(mut self, options: LayoutOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the brand caption words.
    pub fn brand(mut self, brand: Brand) -> Self {
        self.brand = brand;
        self
    }

    /// Set the label plate words.
    pub fn label_words(mut self, words: LabelWords) -> Self {
        self.words = words;
        self
    }

    /// Compute the composition.
    pub fn compute(&self, measure: &dyn TextMeasure) -> Result<Composition, LayoutError> {
        if self.primary.is_empty() || self.secondary.is_some_and(|s| s.is_empty()) {
            return Err(LayoutError::ZeroSourceDimension);
        }
        match self.secondary {
            None => self.single(measure),
            Some(_) => self.dual(measure),
        }
    }

    fn single(&self, measure: &dyn TextMeasure) -> Result<Composition, LayoutError> {
        let Size { width, height } = self.primary;
        let canvas = Size::new(
            grow(width, 2 * BORDER)?,
            grow(height, 2 * BORDER)?,
        );

        // Logo sits inside the top of the image, not on the border.
        let cx = canvas.width as f64 / 2.0;
        let cy = BORDER as f64 + height as f64 / 18.0;

        Ok(Composition {
            arrangement: Arrangement::Single,
            canvas,
            background: Some(Color::WHITE),
            primary: Rect::new(BORDER, BORDER, width, height),
            secondary: None,
            gap: None,
            labels: Vec::new(),
            logo: self.logo_at(cx, cy, measure),
        })
    }

    fn dual(&self, measure: &dyn TextMeasure) -> Result<Composition, LayoutError> {
        let Size { width, height } = self.primary;
        let side_by_side = self.options.vertical_layout;

        let (arrangement, canvas, gap, secondary) = if side_by_side {
            let canvas = Size::new(grow(grow(width, width)?, BORDER)?, height);
            (
                Arrangement::SideBySide,
                canvas,
                Rect::new(width, 0, BORDER, height),
                Rect::new(width + BORDER, 0, width, height),
            )
        } else {
            let canvas = Size::new(width, grow(grow(height, height)?, BORDER)?);
            (
                Arrangement::Stacked,
                canvas,
                Rect::new(0, height, width, BORDER),
                Rect::new(0, height + BORDER, width, height),
            )
        };

        let mut labels = Vec::new();
        if self.options.show_labels {
            labels.push(label(&self.words.before, 0.0, LABEL_ANCHOR_Y, measure));
            labels.push(label(
                &self.words.after,
                secondary.x as f64,
                secondary.y as f64 + LABEL_ANCHOR_Y,
                measure,
            ));
        }

        let cx = canvas.width as f64 / 2.0;
        let cy = canvas.height as f64 / 2.0;

        Ok(Composition {
            arrangement,
            canvas,
            background: None,
            primary: Rect::new(0, 0, width, height),
            secondary: Some(secondary),
            gap: Some(gap),
            labels,
            logo: self.logo_at(cx, cy, measure),
        })
    }

    /// Logo box centered on `(cx, cy)`; brand captions unless side by side.
    fn logo_at(&self, cx: f64, cy: f64, measure: &dyn TextMeasure) -> LogoPlacement {
        let region = RectF::centered(cx, cy, LOGO_BOX);
        let mut captions = Vec::new();
        if !self.options.vertical_layout {
            let baseline = cy + LOGO_BOX.height / 10.0;
            let left_w = measure.measure(&self.brand.left, &BOLD_15);
            captions.push(TextRun {
                text: self.brand.left.clone(),
                x: region.x - left_w - CAPTION_PADDING,
                baseline,
                font: BOLD_15,
                color: Color::BLACK,
            });
            captions.push(TextRun {
                text: self.brand.right.clone(),
                x: region.right() + CAPTION_PADDING,
                baseline,
                font: BOLD_15,
                color: Color::BLACK,
            });
        }
        LogoPlacement { region, captions }
    }
}

/// Plate anchored at `(x, anchor_y)`: left edge at `x`, vertically centered on `anchor_y`.
fn label(text: &str, x: f64, anchor_y: f64, measure: &dyn TextMeasure) -> Label {
    let text_w = measure.measure(text, &BOLD_15);
    Label {
        plate: RectF::new(
            x,
            anchor_y - LABEL_PLATE_HEIGHT / 2.0,
            text_w + LABEL_PADDING * 2.0,
            LABEL_PLATE_HEIGHT,
        ),
        run: TextRun {
            text: String::from(text),
            x: x + LABEL_PADDING,
            baseline: anchor_y + LABEL_BASELINE_DROP,
            font: BOLD_15,
            color: Color::BLACK,
        },
    }
}

fn grow(a: u32, b: u32) -> Result<u32, LayoutError> {
    a.checked_add(b).ok_or(LayoutError::CanvasTooLarge)
}

/// Layout computation error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LayoutError {
    /// A source image has zero width or height.
    ZeroSourceDimension,
    /// Canvas dimensions overflow `u32`.
    CanvasTooLarge,
}

impl core::fmt::Display for LayoutError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ZeroSourceDimension => f.write_str("source image has zero width or height"),
            Self::CanvasTooLarge => f.write_str("canvas dimensions overflow"),
        }
    }
}

impl core::error::Error for LayoutError {}
