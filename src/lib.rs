//! Before/after photo compositing.
//!
//! One or two photos are framed on a white canvas, optionally tagged with
//! "BEFORE"/"AFTER" plates, stamped with a brand logo, and exported as PNG.
//! The geometry is pure and `no_std` compatible (it needs `alloc` for text);
//! pixel work sits behind the `raster` feature.
//!
//! # Modules
//!
//! - [`layout`]: Canvas size, image slots, label plates, logo and caption placement
//! - [`preview`]: Aspect-preserving shrink of sources to preview bounds
//! - [`orientation`]: EXIF orientation, D4 dihedral group, coordinate transforms
//! - `source`: Decoding and preview resize (`raster`)
//! - `text`: Glyph measurement and drawing (`raster`)
//! - `logo`: Bundled vector logo, rasterized and cached (`raster`)
//! - `compose`: Painting a layout into pixels, PNG export (`raster`)
//! - `config`: JSON studio configuration (`raster`)
//! - `session`: Render passes with stale-result suppression (`session`)
//! - `svg`: Wireframe of a layout as SVG (`svg`)

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

pub mod layout;
pub mod orientation;
pub mod preview;

#[cfg(feature = "raster")]
pub mod compose;
#[cfg(feature = "raster")]
pub mod config;
#[cfg(feature = "raster")]
pub mod logo;
#[cfg(feature = "session")]
pub mod session;
#[cfg(feature = "raster")]
pub mod source;
#[cfg(feature = "svg")]
pub mod svg;
#[cfg(feature = "raster")]
pub mod text;

pub use layout::{
    Arrangement, BORDER, Brand, Color, Composition, FixedAdvance, FontSpec, Frame, LabelWords,
    LayoutError, LayoutOptions, Rect, RectF, Size, TextMeasure,
};
pub use orientation::Orientation;
pub use preview::{PreviewBounds, PreviewSize, fit_preview};

#[cfg(feature = "raster")]
pub use compose::{Canvas, Compositor, ExportError};
#[cfg(feature = "raster")]
pub use config::{ConfigError, StudioConfig};
#[cfg(feature = "raster")]
pub use source::{DecodeError, Slot, SourceImage};
#[cfg(feature = "session")]
pub use session::{RenderOutcome, RenderStatus, Studio, StudioError};
