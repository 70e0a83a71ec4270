//! The brand logo: a bundled SVG, rasterized per pixel box and cached.
//!
//! The vector tree is parsed once per process ([`Logo::bundled`]); each
//! distinct box size is rasterized once and shared read-only after that.

use std::collections::HashMap;
use std::sync::Arc;

use image::{Rgba, RgbaImage};
use log::debug;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use resvg::{tiny_skia, usvg};
use thiserror::Error;

use crate::layout::BoxSize;

/// The logo shipped with the crate.
pub const BUNDLED_SVG: &[u8] = include_bytes!("../assets/eagle-eye-logo.svg");

static BUNDLED: OnceCell<Arc<Logo>> = OnceCell::new();

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("logo SVG could not be parsed")]
    Parse(#[from] usvg::Error),
    #[error("logo box {width}x{height} has no area")]
    EmptyBox { width: f64, height: f64 },
}

/// Box sizes are compared bit-for-bit; the layout only ever asks for one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct RasterKey {
    width: u64,
    height: u64,
}

impl From<BoxSize> for RasterKey {
    fn from(size: BoxSize) -> Self {
        Self {
            width: size.width.to_bits(),
            height: size.height.to_bits(),
        }
    }
}

/// A parsed vector logo.
pub struct Logo {
    tree: usvg::Tree,
    rasters: Mutex<HashMap<RasterKey, Arc<RgbaImage>>>,
}

impl core::fmt::Debug for Logo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let size = self.tree.size();
        f.debug_struct("Logo")
            .field("width", &size.width())
            .field("height", &size.height())
            .field("cached_rasters", &self.rasters.lock().len())
            .finish()
    }
}

impl Logo {
    /// Parse SVG source.
    pub fn from_svg(data: &[u8]) -> Result<Self, AssetError> {
        let tree = usvg::Tree::from_data(data, &usvg::Options::default())?;
        Ok(Self {
            tree,
            rasters: Mutex::new(HashMap::new()),
        })
    }

    /// The bundled logo, parsed on first use and shared for the process lifetime.
    ///
    /// A failed parse is not cached; the next call tries again.
    pub fn bundled() -> Result<Arc<Logo>, AssetError> {
        BUNDLED
            .get_or_try_init(|| Logo::from_svg(BUNDLED_SVG).map(Arc::new))
            .cloned()
    }

    /// The logo stretched to fill `size`, in straight (non-premultiplied) RGBA.
    ///
    /// The raster covers `ceil(width)` × `ceil(height)` pixels; a fractional
    /// edge is left partially covered.
    pub fn raster(&self, size: BoxSize) -> Result<Arc<RgbaImage>, AssetError> {
        let key = RasterKey::from(size);
        if let Some(hit) = self.rasters.lock().get(&key) {
            return Ok(Arc::clone(hit));
        }
        let raster = Arc::new(self.rasterize(size)?);
        Ok(Arc::clone(self.rasters.lock().entry(key).or_insert(raster)))
    }

    fn rasterize(&self, size: BoxSize) -> Result<RgbaImage, AssetError> {
        let empty = || AssetError::EmptyBox {
            width: size.width,
            height: size.height,
        };
        if !(size.width > 0.0 && size.height > 0.0) {
            return Err(empty());
        }
        let (w, h) = (size.width.ceil() as u32, size.height.ceil() as u32);
        let mut pixmap = tiny_skia::Pixmap::new(w, h).ok_or_else(empty)?;

        let natural = self.tree.size();
        let transform = tiny_skia::Transform::from_scale(
            size.width as f32 / natural.width(),
            size.height as f32 / natural.height(),
        );
        resvg::render(&self.tree, transform, &mut pixmap.as_mut());
        debug!("rasterized logo at {}x{} into {w}x{h}", size.width, size.height);

        let mut out = RgbaImage::new(w, h);
        for (dst, src) in out.pixels_mut().zip(pixmap.pixels()) {
            let c = src.demultiply();
            *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
        }
        Ok(out)
    }
}
