//! Text metrics and glyph drawing for label plates and brand captions.
//!
//! Layout only needs widths ([`TextMeasure`]); painting also needs glyphs
//! ([`TextRenderer`]). Both are injected into the
//! [`Compositor`](crate::compose::Compositor), so tests can swap in a
//! deterministic renderer and machines without fonts still get sensible
//! plate widths.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{Rgba, RgbaImage};
use log::{debug, warn};
use thiserror::Error;

use crate::layout::{Color, FixedAdvance, FontSpec, TextMeasure, TextRun};

/// Bold sans-serif faces found on common desktop installs, tried in order.
pub const SYSTEM_BOLD_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

/// Measures and paints text onto a canvas.
pub trait TextRenderer: TextMeasure + Send + Sync {
    /// Paint `run` with its left edge at `run.x` and baseline at `run.baseline`.
    /// Glyphs outside the canvas are clipped.
    fn draw(&self, canvas: &mut RgbaImage, run: &TextRun);
}

#[derive(Debug, Error)]
pub enum FontError {
    #[error("failed to read font {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse font: {0}")]
    Parse(&'static str),
}

/// Glyph renderer backed by a TrueType/OpenType face.
///
/// The face is used as-is: bold text needs a bold face file.
pub struct GlyphText {
    font: fontdue::Font,
}

impl GlyphText {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FontError> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(FontError::Parse)?;
        Ok(Self { font })
    }

    /// Load a font file from disk.
    pub fn load(path: &Path) -> Result<Self, FontError> {
        let bytes = std::fs::read(path).map_err(|source| FontError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(&bytes)
    }
}

impl TextMeasure for GlyphText {
    fn measure(&self, text: &str, font: &FontSpec) -> f64 {
        let mut width = 0.0f32;
        let mut prev = None;
        for ch in text.chars() {
            if let Some(p) = prev {
                width += self.font.horizontal_kern(p, ch, font.size_px).unwrap_or(0.0);
            }
            width += self.font.metrics(ch, font.size_px).advance_width;
            prev = Some(ch);
        }
        width as f64
    }
}

impl TextRenderer for GlyphText {
    fn draw(&self, canvas: &mut RgbaImage, run: &TextRun) {
        let px = run.font.size_px;
        let baseline = run.baseline.round() as i64;
        let mut pen = run.x as f32;
        let mut prev = None;
        for ch in run.text.chars() {
            if let Some(p) = prev {
                pen += self.font.horizontal_kern(p, ch, px).unwrap_or(0.0);
            }
            let (metrics, coverage) = self.font.rasterize(ch, px);
            // ymin is the bitmap's bottom edge relative to the baseline, y up.
            let left = (pen + metrics.xmin as f32).round() as i64;
            let top = baseline - metrics.height as i64 - metrics.ymin as i64;
            for row in 0..metrics.height {
                for col in 0..metrics.width {
                    let c = coverage[row * metrics.width + col];
                    blend_coverage(canvas, left + col as i64, top + row as i64, run.color, c);
                }
            }
            pen += metrics.advance_width;
            prev = Some(ch);
        }
    }
}

/// Metrics without glyphs, for hosts with no usable font.
///
/// Plates and caption offsets still come out the right size; the words
/// themselves are not painted.
#[derive(Copy, Clone, Debug, Default)]
pub struct ApproxText {
    metrics: FixedAdvance,
}

impl ApproxText {
    pub fn new(metrics: FixedAdvance) -> Self {
        Self { metrics }
    }
}

impl TextMeasure for ApproxText {
    fn measure(&self, text: &str, font: &FontSpec) -> f64 {
        self.metrics.measure(text, font)
    }
}

impl TextRenderer for ApproxText {
    fn draw(&self, _canvas: &mut RgbaImage, run: &TextRun) {
        debug!("no font loaded, skipping glyphs for {:?}", run.text);
    }
}

/// Pick a text renderer: the configured font, else a known system face,
/// else [`ApproxText`].
pub fn load_renderer(configured: Option<&Path>) -> Arc<dyn TextRenderer> {
    if let Some(path) = configured {
        match GlyphText::load(path) {
            Ok(text) => {
                debug!("using configured font {}", path.display());
                return Arc::new(text);
            }
            Err(e) => warn!("configured font unusable: {e}"),
        }
    }
    for candidate in SYSTEM_BOLD_FONTS {
        let path = Path::new(candidate);
        if !path.is_file() {
            continue;
        }
        match GlyphText::load(path) {
            Ok(text) => {
                debug!("using system font {candidate}");
                return Arc::new(text);
            }
            Err(e) => debug!("skipping {candidate}: {e}"),
        }
    }
    warn!("no bold font found; labels and captions will be drawn without glyphs");
    Arc::new(ApproxText::default())
}

/// Blend `color` into the pixel at `(x, y)` with the given 8-bit coverage.
pub(crate) fn blend_coverage(canvas: &mut RgbaImage, x: i64, y: i64, color: Color, coverage: u8) {
    if coverage == 0 || x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64
    {
        return;
    }
    let alpha = div_round(color.a as u32 * coverage as u32, 255) as u8;
    let dst = canvas.get_pixel_mut(x as u32, y as u32);
    *dst = source_over(*dst, Rgba([color.r, color.g, color.b, alpha]));
}

/// Straight-alpha source-over. An opaque destination stays opaque.
pub(crate) fn source_over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let [sr, sg, sb, sa] = src.0.map(u32::from);
    let [dr, dg, db, da] = dst.0.map(u32::from);
    if sa == 255 {
        return src;
    }
    if sa == 0 {
        return dst;
    }
    let inv = 255 - sa;
    let out_a = sa + div_round(da * inv, 255);
    if out_a == 0 {
        return Rgba([0, 0, 0, 0]);
    }
    let mix = |s: u32, d: u32| div_round(s * sa * 255 + d * da * inv, out_a * 255) as u8;
    Rgba([mix(sr, dr), mix(sg, dg), mix(sb, db), out_a as u8])
}

fn div_round(n: u32, d: u32) -> u32 {
    (n + d / 2) / d
}
