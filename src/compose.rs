//! Painting a [`Composition`] onto a fresh canvas, and PNG export.
//!
//! Every call paints into a canvas it allocates itself, so a re-render can
//! never show traces of an earlier one.

use std::borrow::Cow;
use std::io::Cursor;
use std::ops::Range;
use std::sync::Arc;

use image::{ImageError, ImageFormat, Rgba, RgbaImage, imageops};
use log::{debug, warn};
use thiserror::Error;

use crate::layout::{
    BoxSize, Brand, Color, Composition, Frame, LabelWords, LayoutError, LayoutOptions,
    LogoPlacement, Rect, RectF, Size,
};
use crate::logo::Logo;
use crate::source::{RESAMPLE, SourceImage};
use crate::text::{TextRenderer, source_over};

/// File name offered for the exported PNG.
pub const DEFAULT_EXPORT_NAME: &str = "eagle-eye-generated.png";

#[derive(Debug, Error)]
pub enum ExportError {
    /// Nothing has been rendered: no primary image, or a pass still in flight.
    #[error("no rendered content to export")]
    NoContent,
    #[error("PNG encoding failed")]
    Encode(#[from] ImageError),
}

/// The output surface of one render pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Canvas {
    pixels: RgbaImage,
}

impl Canvas {
    /// The zero-area canvas: nothing to show yet.
    pub fn cleared() -> Self {
        Self {
            pixels: RgbaImage::new(0, 0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.width() == 0 || self.pixels.height() == 0
    }

    pub fn size(&self) -> Size {
        Size::new(self.pixels.width(), self.pixels.height())
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Encode exactly what is on the canvas as PNG.
    pub fn export_png(&self) -> Result<Vec<u8>, ExportError> {
        if self.is_empty() {
            return Err(ExportError::NoContent);
        }
        let mut out = Cursor::new(Vec::new());
        self.pixels.write_to(&mut out, ImageFormat::Png)?;
        Ok(out.into_inner())
    }
}

/// Lays out and paints compositions with a fixed set of assets.
pub struct Compositor {
    text: Arc<dyn TextRenderer>,
    logo: Option<Arc<Logo>>,
    brand: Brand,
    words: LabelWords,
}

impl core::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Compositor")
            .field("logo", &self.logo)
            .field("brand", &self.brand)
            .field("words", &self.words)
            .finish_non_exhaustive()
    }
}

impl Compositor {
    /// Compositor with the given text renderer and no logo.
    pub fn new(text: Arc<dyn TextRenderer>) -> Self {
        Self {
            text,
            logo: None,
            brand: Brand::default(),
            words: LabelWords::default(),
        }
    }

    /// Set the logo; `None` composes without one.
    pub fn logo(mut self, logo: Option<Arc<Logo>>) -> Self {
        self.logo = logo;
        self
    }

    /// Use the bundled logo, or go without it if it fails to load.
    pub fn bundled_logo(self) -> Self {
        match Logo::bundled() {
            Ok(logo) => self.logo(Some(logo)),
            Err(e) => {
                warn!("logo unavailable, composing without it: {e}");
                self.logo(None)
            }
        }
    }

    pub fn brand(mut self, brand: Brand) -> Self {
        self.brand = brand;
        self
    }

    pub fn label_words(mut self, words: LabelWords) -> Self {
        self.words = words;
        self
    }

    /// Layout for the given inputs, without painting.
    pub fn layout(
        &self,
        primary: Size,
        secondary: Option<Size>,
        options: LayoutOptions,
    ) -> Result<Composition, LayoutError> {
        let mut frame = Frame::new(primary)
            .options(options)
            .brand(self.brand.clone())
            .label_words(self.words.clone());
        if let Some(size) = secondary {
            frame = frame.secondary(size);
        }
        frame.compute(self.text.as_ref())
    }

    /// Compose one canvas.
    ///
    /// With no primary image the result is [`Canvas::cleared`]: nothing to
    /// render yet, not an error. A secondary image selects dual-image mode.
    pub fn compose(
        &self,
        primary: Option<&SourceImage>,
        secondary: Option<&SourceImage>,
        options: LayoutOptions,
    ) -> Result<Canvas, LayoutError> {
        let Some(primary) = primary else {
            debug!("no primary image, canvas cleared");
            return Ok(Canvas::cleared());
        };
        let plan = self.layout(primary.size(), secondary.map(SourceImage::size), options)?;
        debug!(
            "composing {:?} canvas {}x{}",
            plan.arrangement, plan.canvas.width, plan.canvas.height
        );
        Ok(self.paint(&plan, primary, secondary))
    }

    /// Paint a computed layout. The secondary is drawn only if both the plan
    /// and the caller provide one.
    pub fn paint(
        &self,
        plan: &Composition,
        primary: &SourceImage,
        secondary: Option<&SourceImage>,
    ) -> Canvas {
        let mut pixels = RgbaImage::new(plan.canvas.width, plan.canvas.height);

        if let Some(color) = plan.background {
            fill_rect(&mut pixels, Rect::new(0, 0, plan.canvas.width, plan.canvas.height), color);
        }
        draw_image(&mut pixels, primary.pixels(), plan.primary);
        if let Some(gap) = plan.gap {
            fill_rect(&mut pixels, gap, Color::WHITE);
        }
        if let (Some(dest), Some(image)) = (plan.secondary, secondary) {
            draw_image(&mut pixels, image.pixels(), dest);
        }
        for label in &plan.labels {
            fill_rect_f(&mut pixels, label.plate, Color::WHITE);
            self.text.draw(&mut pixels, &label.run);
        }
        self.paint_logo(&mut pixels, &plan.logo);

        Canvas { pixels }
    }

    /// Logo, then its captions. A logo that fails to rasterize takes its
    /// captions with it; everything else on the canvas stays.
    fn paint_logo(&self, pixels: &mut RgbaImage, placement: &LogoPlacement) {
        let Some(logo) = &self.logo else {
            return;
        };
        let region = placement.region;
        let raster = match logo.raster(BoxSize {
            width: region.width,
            height: region.height,
        }) {
            Ok(raster) => raster,
            Err(e) => {
                warn!("logo omitted: {e}");
                return;
            }
        };
        blit_over(
            pixels,
            raster.as_ref(),
            region.x.round() as i64,
            region.y.round() as i64,
        );
        for caption in &placement.captions {
            self.text.draw(pixels, caption);
        }
    }
}

/// Draw `image` into `dest`, scaling it when sizes differ. Alpha blends over
/// whatever is already there.
fn draw_image(canvas: &mut RgbaImage, image: &RgbaImage, dest: Rect) {
    let scaled = if image.dimensions() == (dest.width, dest.height) {
        Cow::Borrowed(image)
    } else {
        Cow::Owned(imageops::resize(image, dest.width, dest.height, RESAMPLE))
    };
    blit_over(canvas, scaled.as_ref(), dest.x as i64, dest.y as i64);
}

/// Source-over `image` with its top-left corner at `(x, y)`, clipped to the canvas.
fn blit_over(canvas: &mut RgbaImage, image: &RgbaImage, x: i64, y: i64) {
    let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);
    for (sx, sy, src) in image.enumerate_pixels() {
        let (dx, dy) = (x + sx as i64, y + sy as i64);
        if dx < 0 || dy < 0 || dx >= cw || dy >= ch {
            continue;
        }
        let dst = canvas.get_pixel_mut(dx as u32, dy as u32);
        *dst = source_over(*dst, *src);
    }
}

fn fill_rect(canvas: &mut RgbaImage, rect: Rect, color: Color) {
    let x_end = rect.x.saturating_add(rect.width).min(canvas.width());
    let y_end = rect.y.saturating_add(rect.height).min(canvas.height());
    let px = Rgba(color.to_array());
    for y in rect.y..y_end {
        for x in rect.x..x_end {
            canvas.put_pixel(x, y, px);
        }
    }
}

/// Fill the pixels whose centers fall inside `rect`.
fn fill_rect_f(canvas: &mut RgbaImage, rect: RectF, color: Color) {
    let xs = center_span(rect.x, rect.right(), canvas.width());
    let ys = center_span(rect.y, rect.bottom(), canvas.height());
    let px = Rgba(color.to_array());
    for y in ys {
        for x in xs.clone() {
            canvas.put_pixel(x, y, px);
        }
    }
}

/// Pixel indices `i` with `start <= i + 0.5 < end`, clipped to `0..limit`.
fn center_span(start: f64, end: f64, limit: u32) -> Range<u32> {
    let clip = |v: f64| (v - 0.5).ceil().clamp(0.0, limit as f64) as u32;
    let (lo, hi) = (clip(start), clip(end));
    lo..hi.max(lo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{FixedAdvance, FontSpec, TextMeasure, TextRun};

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];
    const WHITE: [u8; 4] = [255, 255, 255, 255];
    const BLACK: [u8; 4] = [0, 0, 0, 255];

    /// 7.5px advance at 15px; paints one solid black cell per character,
    /// 7px wide, spanning 10px above the baseline.
    struct BlockText;

    impl TextMeasure for BlockText {
        fn measure(&self, text: &str, font: &FontSpec) -> f64 {
            FixedAdvance::new(0.5).measure(text, font)
        }
    }

    impl TextRenderer for BlockText {
        fn draw(&self, canvas: &mut RgbaImage, run: &TextRun) {
            let baseline = run.baseline.round() as u32;
            for (i, _) in run.text.chars().enumerate() {
                let left = (run.x + i as f64 * 7.5).round() as u32;
                fill_rect(canvas, Rect::new(left, baseline - 10, 7, 10), run.color);
            }
        }
    }

    fn solid(w: u32, h: u32, color: [u8; 4]) -> SourceImage {
        SourceImage::from_rgba(RgbaImage::from_pixel(w, h, Rgba(color)))
    }

    fn compositor() -> Compositor {
        Compositor::new(Arc::new(BlockText))
    }

    fn options(vertical: bool, labels: bool) -> LayoutOptions {
        LayoutOptions {
            vertical_layout: vertical,
            show_labels: labels,
        }
    }

    fn px(canvas: &Canvas, x: u32, y: u32) -> [u8; 4] {
        canvas.pixels().get_pixel(x, y).0
    }

    // ── single image ────────────────────────────────────────────────────

    #[test]
    fn single_image_framed_in_white() {
        let c = compositor()
            .compose(Some(&solid(100, 60, RED)), None, options(true, true))
            .unwrap();
        assert_eq!(c.size(), Size::new(128, 88));
        for (x, y) in [(0, 0), (13, 40), (127, 87), (114, 50), (60, 74)] {
            assert_eq!(px(&c, x, y), WHITE, "border at ({x},{y})");
        }
        for (x, y) in [(14, 14), (113, 73), (60, 40)] {
            assert_eq!(px(&c, x, y), RED, "image at ({x},{y})");
        }
    }

    #[test]
    fn no_primary_gives_cleared_canvas() {
        let c = compositor()
            .compose(None, Some(&solid(10, 10, RED)), LayoutOptions::default())
            .unwrap();
        assert!(c.is_empty());
        assert!(matches!(c.export_png(), Err(ExportError::NoContent)));
    }

    // ── dual image ──────────────────────────────────────────────────────

    #[test]
    fn before_after_side_by_side() {
        let c = compositor()
            .compose(
                Some(&solid(200, 200, RED)),
                Some(&solid(200, 200, BLUE)),
                options(true, true),
            )
            .unwrap();
        assert_eq!(c.size(), Size::new(414, 200));
        assert_eq!(px(&c, 100, 150), RED);
        assert_eq!(px(&c, 199, 0), RED);
        for x in 200..214 {
            assert_eq!(px(&c, x, 5), WHITE, "gap column {x}");
            assert_eq!(px(&c, x, 195), WHITE, "gap column {x}");
        }
        assert_eq!(px(&c, 214, 150), BLUE);
        assert_eq!(px(&c, 413, 199), BLUE);

        // BEFORE plate: x 0..65, rows 27..52.
        assert_eq!(px(&c, 64, 27), WHITE);
        assert_eq!(px(&c, 2, 51), WHITE);
        assert_eq!(px(&c, 2, 26), RED);
        assert_eq!(px(&c, 2, 52), RED);
        assert_eq!(px(&c, 65, 40), RED);
        // First glyph cell starts at x = 10, baseline 45.
        assert_eq!(px(&c, 12, 40), BLACK);

        // AFTER plate from x = 214.
        assert_eq!(px(&c, 215, 30), WHITE);
        assert_eq!(px(&c, 215, 26), BLUE);
        assert_eq!(px(&c, 226, 40), BLACK);
    }

    #[test]
    fn stacked_layout() {
        let c = compositor()
            .compose(
                Some(&solid(120, 80, RED)),
                Some(&solid(120, 80, BLUE)),
                options(false, true),
            )
            .unwrap();
        assert_eq!(c.size(), Size::new(120, 174));
        assert_eq!(px(&c, 100, 10), RED);
        for y in 80..94 {
            assert_eq!(px(&c, 100, y), WHITE, "gap row {y}");
        }
        assert_eq!(px(&c, 100, 170), BLUE);
        // AFTER plate centered on y = 80 + 14 + 40: rows 121..146.
        assert_eq!(px(&c, 2, 121), WHITE);
        assert_eq!(px(&c, 2, 145), WHITE);
        assert_eq!(px(&c, 2, 120), BLUE);
        assert_eq!(px(&c, 2, 146), BLUE);
    }

    #[test]
    fn secondary_scaled_to_primary() {
        let c = compositor()
            .compose(
                Some(&solid(100, 50, RED)),
                Some(&solid(30, 90, BLUE)),
                options(true, false),
            )
            .unwrap();
        assert_eq!(c.size(), Size::new(214, 50));
        assert_eq!(px(&c, 120, 10), BLUE);
        assert_eq!(px(&c, 213, 49), BLUE);
    }

    #[test]
    fn labels_touch_only_plate_pixels() {
        let primary = solid(200, 200, RED);
        let secondary = solid(200, 200, BLUE);
        let compositor = compositor();
        let plain = compositor
            .compose(Some(&primary), Some(&secondary), options(true, false))
            .unwrap();
        let labelled = compositor
            .compose(Some(&primary), Some(&secondary), options(true, true))
            .unwrap();
        let plan = compositor
            .layout(primary.size(), Some(secondary.size()), options(true, true))
            .unwrap();

        let mut changed = 0;
        for (x, y, p) in labelled.pixels().enumerate_pixels() {
            if p != plain.pixels().get_pixel(x, y) {
                assert!(plan.in_label_plate(x, y), "({x},{y}) changed outside plates");
                changed += 1;
            }
        }
        assert!(changed > 0);
    }

    #[test]
    fn rerender_starts_clean() {
        let compositor = compositor();
        let p = solid(50, 50, RED);
        let s = solid(50, 50, BLUE);
        let first = compositor.compose(Some(&p), Some(&s), options(true, true)).unwrap();
        let _other = compositor.compose(Some(&s), None, options(false, false)).unwrap();
        let again = compositor.compose(Some(&p), Some(&s), options(true, true)).unwrap();
        assert_eq!(first, again);
    }

    // ── logo ────────────────────────────────────────────────────────────

    #[test]
    fn logo_drawn_at_center() {
        let c = compositor()
            .bundled_logo()
            .compose(
                Some(&solid(200, 200, RED)),
                Some(&solid(200, 200, BLUE)),
                options(true, false),
            )
            .unwrap();
        // Pupil at the canvas center.
        let [r, _, b, a] = px(&c, 207, 100);
        assert_eq!(a, 255);
        assert!(b > r, "center {:?}", px(&c, 207, 100));
        // Far corners untouched.
        assert_eq!(px(&c, 5, 190), RED);
        assert_eq!(px(&c, 410, 190), BLUE);
    }

    #[test]
    fn stacked_captions_need_the_logo() {
        let primary = solid(300, 100, RED);
        let secondary = solid(300, 100, BLUE);
        let without = compositor()
            .compose(Some(&primary), Some(&secondary), options(false, false))
            .unwrap();
        // No logo: no captions either, so the gap row is pure white.
        assert!((0..300).all(|x| px(&without, x, 107) == WHITE));

        let with = compositor()
            .bundled_logo()
            .compose(Some(&primary), Some(&secondary), options(false, false))
            .unwrap();
        // "Eagle Eye" ends 10px left of the logo box (x = 107.5).
        let caption_baseline = (107.0 + 6.025f64).round() as u32;
        assert_eq!(px(&with, 90, caption_baseline - 2), BLACK);
        // "Contracting" starts 10px right of it (x = 202.5).
        assert_eq!(px(&with, 205, caption_baseline - 2), BLACK);
    }

    #[test]
    fn broken_logo_keeps_base_composition() {
        let broken = Logo::from_svg(b"<svg").ok().map(Arc::new);
        assert!(broken.is_none());
        let c = compositor()
            .logo(broken)
            .compose(
                Some(&solid(200, 200, RED)),
                Some(&solid(200, 200, BLUE)),
                options(true, true),
            )
            .unwrap();
        assert_eq!(c.size(), Size::new(414, 200));
        assert_eq!(px(&c, 207, 100), WHITE);
        assert_eq!(px(&c, 100, 100), RED);
        assert_eq!(px(&c, 5, 30), WHITE);
    }

    #[test]
    fn unrasterizable_logo_drops_captions_only() {
        let primary = solid(300, 100, RED);
        let secondary = solid(300, 100, BLUE);
        let compositor = compositor().bundled_logo();
        let mut plan = compositor
            .layout(primary.size(), Some(secondary.size()), options(false, false))
            .unwrap();
        assert_eq!(plan.logo.captions.len(), 2);
        plan.logo.region.width = 0.0;

        let c = compositor.paint(&plan, &primary, Some(&secondary));
        assert_eq!(c.size(), Size::new(300, 214));
        // Neither logo nor captions: the gap row is pure white.
        assert!((0..300).all(|x| px(&c, x, 107) == WHITE));
        assert_eq!(px(&c, 150, 50), RED);
        assert_eq!(px(&c, 150, 160), BLUE);
    }

    #[test]
    fn opaque_inputs_give_an_opaque_canvas() {
        for vertical in [true, false] {
            let c = compositor()
                .bundled_logo()
                .compose(
                    Some(&solid(200, 200, RED)),
                    Some(&solid(200, 200, BLUE)),
                    options(vertical, true),
                )
                .unwrap();
            let translucent: Vec<_> = c
                .pixels()
                .enumerate_pixels()
                .filter(|(_, _, p)| p.0[3] != 255)
                .map(|(x, y, p)| (x, y, p.0))
                .take(5)
                .collect();
            assert!(translucent.is_empty(), "translucent pixels: {translucent:?}");
        }
        let single = compositor()
            .bundled_logo()
            .compose(Some(&solid(90, 90, RED)), None, LayoutOptions::default())
            .unwrap();
        assert!(single.pixels().pixels().all(|p| p.0[3] == 255));
    }

    #[test]
    fn blit_clips_to_canvas() {
        let mut canvas = RgbaImage::from_pixel(4, 4, Rgba(WHITE));
        let patch = RgbaImage::from_pixel(3, 3, Rgba(RED));
        blit_over(&mut canvas, &patch, -2, 2);
        assert_eq!(canvas.get_pixel(0, 2).0, RED);
        assert_eq!(canvas.get_pixel(0, 3).0, RED);
        assert_eq!(canvas.get_pixel(1, 2).0, WHITE);
        assert_eq!(canvas.get_pixel(0, 1).0, WHITE);
    }

    // ── export ──────────────────────────────────────────────────────────

    #[test]
    fn export_is_deterministic() {
        let render = || {
            compositor()
                .bundled_logo()
                .compose(
                    Some(&solid(120, 90, RED)),
                    Some(&solid(120, 90, BLUE)),
                    options(false, true),
                )
                .unwrap()
                .export_png()
                .unwrap()
        };
        let a = render();
        let b = render();
        assert_eq!(a, b);
        assert_eq!(&a[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn export_reflects_canvas() {
        let c = compositor()
            .compose(Some(&solid(10, 10, RED)), None, LayoutOptions::default())
            .unwrap();
        let bytes = c.export_png().unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().into_rgba8();
        assert_eq!(&decoded, c.pixels());
    }

    // ── helpers ─────────────────────────────────────────────────────────

    #[test]
    fn center_span_rounds_by_pixel_center() {
        assert_eq!(center_span(27.5, 52.5, 200), 27..52);
        assert_eq!(center_span(0.0, 65.0, 200), 0..65);
        assert_eq!(center_span(-5.0, 3.2, 10), 0..3);
        assert_eq!(center_span(8.0, 30.0, 10), 8..10);
        assert_eq!(center_span(12.0, 30.0, 10), 10..10);
    }
}
