//! Render passes driven by input changes.
//!
//! A [`Studio`] holds the current inputs and the last published canvas.
//! Every change starts a new pass: decodes run on the blocking pool and are
//! joined, the composition runs, and the canvas is published only if no newer
//! change arrived meanwhile. Two counters guard publication:
//!
//! - the *input* generation, bumped by [`Studio::on_images_changed`]; a decode
//!   finishing for older inputs is dropped;
//! - the *pass* number, bumped by every change; a canvas from an older pass is
//!   never published.
//!
//! While a pass is in flight the status is [`RenderStatus::Pending`] and
//! export reports [`ExportError::NoContent`], so a half-finished or stale
//! canvas is never exported.

use std::sync::Arc;

use log::{debug, warn};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::task;

use crate::compose::{Canvas, Compositor, DEFAULT_EXPORT_NAME, ExportError};
use crate::config::StudioConfig;
use crate::layout::{Composition, LayoutError, LayoutOptions, Size};
use crate::preview::PreviewBounds;
use crate::source::{DecodeError, Slot, SourceImage};

#[derive(Debug, Error)]
pub enum StudioError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("layout failed")]
    Layout(#[from] LayoutError),
    #[error("render task failed")]
    Join(#[from] task::JoinError),
}

/// Why the last pass produced nothing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Failure {
    Decode(Slot),
    Layout(LayoutError),
    /// A decode or compose task panicked.
    Task,
}

/// What the studio currently shows.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderStatus {
    /// No primary image selected.
    Empty,
    /// A pass is in flight.
    Pending,
    Ready(Arc<Canvas>),
    Failed(Failure),
}

/// How a single change request ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RenderOutcome {
    /// No primary image; the canvas is cleared.
    Empty,
    /// A canvas of this size was published.
    Rendered(Size),
    /// A newer change took over; this pass published nothing.
    Superseded,
    /// Images are still decoding; that pass will render with these options.
    Deferred,
}

#[derive(Clone)]
struct Inputs {
    primary: Arc<SourceImage>,
    secondary: Option<Arc<SourceImage>>,
}

struct State {
    input_generation: u64,
    pass: u64,
    decoding: bool,
    options: LayoutOptions,
    inputs: Option<Inputs>,
    status: RenderStatus,
}

/// Holds inputs and options, runs render passes, serves exports.
pub struct Studio {
    compositor: Arc<Compositor>,
    bounds: PreviewBounds,
    export_name: String,
    state: Mutex<State>,
}

impl Studio {
    pub fn new(compositor: Compositor, bounds: PreviewBounds) -> Self {
        Self {
            compositor: Arc::new(compositor),
            bounds,
            export_name: DEFAULT_EXPORT_NAME.to_string(),
            state: Mutex::new(State {
                input_generation: 0,
                pass: 0,
                decoding: false,
                options: LayoutOptions::default(),
                inputs: None,
                status: RenderStatus::Empty,
            }),
        }
    }

    /// Studio with the config's fonts, words, preview bounds and export name.
    pub fn from_config(config: &StudioConfig) -> Self {
        let mut studio = Self::new(config.compositor(), config.preview_bounds());
        studio.export_name = config.output_name.clone();
        studio
    }

    /// Suggested file name for [`request_export`](Self::request_export) output.
    pub fn export_name(&self) -> &str {
        &self.export_name
    }

    pub fn options(&self) -> LayoutOptions {
        self.state.lock().options
    }

    pub fn status(&self) -> RenderStatus {
        self.state.lock().status.clone()
    }

    /// The published canvas, if the last pass completed.
    pub fn canvas(&self) -> Option<Arc<Canvas>> {
        match &self.state.lock().status {
            RenderStatus::Ready(canvas) => Some(Arc::clone(canvas)),
            _ => None,
        }
    }

    /// Layout of the current inputs under the current options, without painting.
    pub fn layout(&self) -> Option<Result<Composition, LayoutError>> {
        let (inputs, options) = {
            let state = self.state.lock();
            (state.inputs.clone()?, state.options)
        };
        Some(self.compositor.layout(
            inputs.primary.size(),
            inputs.secondary.as_ref().map(|s| s.size()),
            options,
        ))
    }

    /// New file selections. `None` primary clears the canvas; `None`
    /// secondary selects single-image mode.
    ///
    /// Both sources decode concurrently; nothing is drawn unless both succeed.
    pub async fn on_images_changed(
        &self,
        primary: Option<Vec<u8>>,
        secondary: Option<Vec<u8>>,
    ) -> Result<RenderOutcome, StudioError> {
        let generation = {
            let mut state = self.state.lock();
            state.input_generation += 1;
            state.pass += 1;
            state.inputs = None;
            state.decoding = primary.is_some();
            state.status = if primary.is_some() {
                RenderStatus::Pending
            } else {
                RenderStatus::Empty
            };
            state.input_generation
        };
        let Some(primary) = primary else {
            debug!("inputs {generation}: no primary image");
            return Ok(RenderOutcome::Empty);
        };

        let bounds = self.bounds;
        let primary_task =
            task::spawn_blocking(move || SourceImage::load(&primary, Slot::Primary, bounds));
        let secondary_task = secondary.map(|bytes| {
            task::spawn_blocking(move || SourceImage::load(&bytes, Slot::Secondary, bounds))
        });
        let primary = primary_task.await;
        let secondary = match secondary_task {
            Some(handle) => Some(handle.await),
            None => None,
        };

        let (pass, inputs, options) = {
            let mut state = self.state.lock();
            if state.input_generation != generation {
                debug!("inputs {generation}: superseded while decoding");
                return Ok(RenderOutcome::Superseded);
            }
            state.decoding = false;
            let joined = primary.and_then(|p| Ok((p, secondary.transpose()?)));
            let (primary, secondary) = match joined {
                Ok(joined) => joined,
                Err(e) => {
                    warn!("inputs {generation}: decode task failed: {e}");
                    state.status = RenderStatus::Failed(Failure::Task);
                    return Err(e.into());
                }
            };
            let decoded = primary.and_then(|p| Ok((p, secondary.transpose()?)));
            let (primary, secondary) = match decoded {
                Ok(decoded) => decoded,
                Err(e) => {
                    warn!("inputs {generation}: {e}");
                    state.status = RenderStatus::Failed(Failure::Decode(e.slot));
                    return Err(e.into());
                }
            };
            let inputs = Inputs {
                primary: Arc::new(primary),
                secondary: secondary.map(Arc::new),
            };
            state.inputs = Some(inputs.clone());
            // Options may have changed while decoding; render with the latest.
            state.pass += 1;
            (state.pass, inputs, state.options)
        };
        self.render(pass, inputs, options).await
    }

    /// New layout flags; re-renders the current inputs.
    pub async fn on_options_changed(
        &self,
        options: LayoutOptions,
    ) -> Result<RenderOutcome, StudioError> {
        let (pass, inputs) = {
            let mut state = self.state.lock();
            state.options = options;
            state.pass += 1;
            match state.inputs.clone() {
                Some(inputs) => {
                    state.status = RenderStatus::Pending;
                    (state.pass, inputs)
                }
                None if state.decoding => return Ok(RenderOutcome::Deferred),
                None => {
                    state.status = RenderStatus::Empty;
                    return Ok(RenderOutcome::Empty);
                }
            }
        };
        self.render(pass, inputs, options).await
    }

    /// PNG bytes of the published canvas. Never renders.
    pub fn request_export(&self) -> Result<Vec<u8>, ExportError> {
        let canvas = self.canvas().ok_or(ExportError::NoContent)?;
        canvas.export_png()
    }

    async fn render(
        &self,
        pass: u64,
        inputs: Inputs,
        options: LayoutOptions,
    ) -> Result<RenderOutcome, StudioError> {
        let compositor = Arc::clone(&self.compositor);
        let composed = task::spawn_blocking(move || {
            compositor.compose(
                Some(inputs.primary.as_ref()),
                inputs.secondary.as_deref(),
                options,
            )
        })
        .await;

        let mut state = self.state.lock();
        if state.pass != pass {
            debug!("pass {pass}: superseded by pass {}", state.pass);
            return Ok(RenderOutcome::Superseded);
        }
        let composed = match composed {
            Ok(composed) => composed,
            Err(e) => {
                warn!("pass {pass}: compose task failed: {e}");
                state.status = RenderStatus::Failed(Failure::Task);
                return Err(e.into());
            }
        };
        match composed {
            Ok(canvas) => {
                let size = canvas.size();
                debug!("pass {pass}: published {}x{}", size.width, size.height);
                state.status = RenderStatus::Ready(Arc::new(canvas));
                Ok(RenderOutcome::Rendered(size))
            }
            Err(e) => {
                warn!("pass {pass}: {e}");
                state.status = RenderStatus::Failed(Failure::Layout(e));
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{FixedAdvance, FontSpec, TextMeasure, TextRun};
    use crate::text::TextRenderer;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    struct NoGlyphs;

    impl TextMeasure for NoGlyphs {
        fn measure(&self, text: &str, font: &FontSpec) -> f64 {
            FixedAdvance::default().measure(text, font)
        }
    }

    impl TextRenderer for NoGlyphs {
        fn draw(&self, _canvas: &mut RgbaImage, _run: &TextRun) {}
    }

    /// Panics whenever text is measured, so every compose task dies.
    struct Exploding;

    impl TextMeasure for Exploding {
        fn measure(&self, _text: &str, _font: &FontSpec) -> f64 {
            panic!("measure failed");
        }
    }

    impl TextRenderer for Exploding {
        fn draw(&self, _canvas: &mut RgbaImage, _run: &TextRun) {}
    }

    fn studio() -> Studio {
        Studio::new(Compositor::new(Arc::new(NoGlyphs)), PreviewBounds::default())
    }

    fn png(w: u32, h: u32, color: [u8; 4]) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        RgbaImage::from_pixel(w, h, Rgba(color))
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    fn stacked() -> LayoutOptions {
        LayoutOptions {
            vertical_layout: false,
            show_labels: true,
        }
    }

    #[tokio::test]
    async fn no_primary_is_empty_not_an_error() {
        let studio = studio();
        let outcome = studio
            .on_images_changed(None, Some(png(10, 10, [0, 0, 255, 255])))
            .await
            .unwrap();
        assert_eq!(outcome, RenderOutcome::Empty);
        assert_eq!(studio.status(), RenderStatus::Empty);
        assert!(matches!(studio.request_export(), Err(ExportError::NoContent)));
    }

    #[tokio::test]
    async fn single_image_renders_and_exports() {
        let studio = studio();
        let outcome = studio
            .on_images_changed(Some(png(100, 60, [255, 0, 0, 255])), None)
            .await
            .unwrap();
        assert_eq!(outcome, RenderOutcome::Rendered(Size::new(128, 88)));

        let bytes = studio.request_export().unwrap();
        let exported = image::load_from_memory(&bytes).unwrap();
        assert_eq!((exported.width(), exported.height()), (128, 88));
        assert_eq!(studio.export_name(), "eagle-eye-generated.png");
    }

    #[tokio::test]
    async fn preview_resize_happens_on_load() {
        let studio = studio();
        let outcome = studio
            .on_images_changed(Some(png(1600, 900, [255, 0, 0, 255])), None)
            .await
            .unwrap();
        assert_eq!(outcome, RenderOutcome::Rendered(Size::new(428, 253)));
    }

    #[tokio::test]
    async fn options_change_rerenders_current_images() {
        let studio = studio();
        studio
            .on_images_changed(
                Some(png(200, 200, [255, 0, 0, 255])),
                Some(png(200, 200, [0, 0, 255, 255])),
            )
            .await
            .unwrap();
        assert_eq!(studio.canvas().unwrap().size(), Size::new(414, 200));

        let outcome = studio.on_options_changed(stacked()).await.unwrap();
        assert_eq!(outcome, RenderOutcome::Rendered(Size::new(200, 414)));
        assert_eq!(studio.options(), stacked());
    }

    #[tokio::test]
    async fn options_without_images_is_empty() {
        let studio = studio();
        let outcome = studio.on_options_changed(stacked()).await.unwrap();
        assert_eq!(outcome, RenderOutcome::Empty);
        assert_eq!(studio.options(), stacked());
    }

    #[tokio::test]
    async fn decode_failure_aborts_pass() {
        let studio = studio();
        let err = studio
            .on_images_changed(
                Some(png(20, 20, [255, 0, 0, 255])),
                Some(b"not an image".to_vec()),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StudioError::Decode(DecodeError {
                slot: Slot::Secondary,
                ..
            })
        ));
        assert_eq!(
            studio.status(),
            RenderStatus::Failed(Failure::Decode(Slot::Secondary))
        );
        assert!(matches!(studio.request_export(), Err(ExportError::NoContent)));

        // Re-selecting recovers.
        let outcome = studio
            .on_images_changed(Some(png(20, 20, [255, 0, 0, 255])), None)
            .await
            .unwrap();
        assert_eq!(outcome, RenderOutcome::Rendered(Size::new(48, 48)));
    }

    #[tokio::test]
    async fn failed_decode_keeps_previous_images_out() {
        let studio = studio();
        studio
            .on_images_changed(Some(png(20, 20, [255, 0, 0, 255])), None)
            .await
            .unwrap();
        studio
            .on_images_changed(Some(b"garbage".to_vec()), None)
            .await
            .unwrap_err();
        assert_eq!(
            studio.status(),
            RenderStatus::Failed(Failure::Decode(Slot::Primary))
        );
        // Options change must not resurrect the earlier image.
        let outcome = studio.on_options_changed(stacked()).await.unwrap();
        assert_eq!(outcome, RenderOutcome::Empty);
        assert_eq!(studio.status(), RenderStatus::Empty);
        assert!(studio.canvas().is_none());
    }

    #[tokio::test]
    async fn panicking_compose_is_recorded() {
        let studio = Studio::new(
            Compositor::new(Arc::new(Exploding)),
            PreviewBounds::default(),
        );
        // Two images, so the label plates need measuring.
        let err = studio
            .on_images_changed(
                Some(png(20, 20, [255, 0, 0, 255])),
                Some(png(20, 20, [0, 0, 255, 255])),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::Join(_)));
        assert_eq!(studio.status(), RenderStatus::Failed(Failure::Task));
        assert!(matches!(studio.request_export(), Err(ExportError::NoContent)));

        // Inputs decoded fine, so an options change retries instead of deferring.
        let err = studio.on_options_changed(stacked()).await.unwrap_err();
        assert!(matches!(err, StudioError::Join(_)));
        assert_eq!(studio.status(), RenderStatus::Failed(Failure::Task));
    }

    #[tokio::test]
    async fn failed_pass_clears_decoding_flag() {
        let studio = Studio::new(
            Compositor::new(Arc::new(Exploding)),
            PreviewBounds::default(),
        );
        studio
            .on_images_changed(Some(b"garbage".to_vec()), None)
            .await
            .unwrap_err();
        assert!(!studio.state.lock().decoding);
        let outcome = studio.on_options_changed(stacked()).await.unwrap();
        assert_eq!(outcome, RenderOutcome::Empty);
    }

    #[tokio::test]
    async fn newer_inputs_win() {
        let studio = studio();
        let (first, second) = tokio::join!(
            studio.on_images_changed(Some(png(1600, 1200, [255, 0, 0, 255])), None),
            studio.on_images_changed(Some(png(30, 20, [0, 0, 255, 255])), None),
        );
        assert!(matches!(
            first.unwrap(),
            RenderOutcome::Superseded | RenderOutcome::Rendered(_)
        ));
        assert_eq!(second.unwrap(), RenderOutcome::Rendered(Size::new(58, 48)));
        assert_eq!(studio.canvas().unwrap().size(), Size::new(58, 48));
    }

    #[tokio::test]
    async fn options_during_decode_are_picked_up() {
        let studio = studio();
        let (images, options) = tokio::join!(
            studio.on_images_changed(
                Some(png(200, 200, [255, 0, 0, 255])),
                Some(png(200, 200, [0, 0, 255, 255])),
            ),
            studio.on_options_changed(stacked()),
        );
        let options = options.unwrap();
        assert!(matches!(
            options,
            RenderOutcome::Deferred | RenderOutcome::Rendered(_)
        ));
        assert!(images.is_ok());
        assert_eq!(studio.canvas().unwrap().size(), Size::new(200, 414));
    }

    #[tokio::test]
    async fn stale_pass_never_publishes() {
        let studio = studio();
        studio
            .on_images_changed(
                Some(png(50, 50, [255, 0, 0, 255])),
                Some(png(50, 50, [0, 0, 255, 255])),
            )
            .await
            .unwrap();
        let (stale_pass, inputs) = {
            let state = studio.state.lock();
            (state.pass, state.inputs.clone().unwrap())
        };
        studio.on_options_changed(stacked()).await.unwrap();
        let published = studio.canvas().unwrap();

        let outcome = studio
            .render(stale_pass, inputs, LayoutOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome, RenderOutcome::Superseded);
        assert!(Arc::ptr_eq(&studio.canvas().unwrap(), &published));
        assert_eq!(published.size(), Size::new(50, 114));
    }

    #[tokio::test]
    async fn export_matches_published_canvas() {
        let studio = studio();
        studio
            .on_images_changed(
                Some(png(40, 40, [255, 0, 0, 255])),
                Some(png(40, 40, [0, 0, 255, 255])),
            )
            .await
            .unwrap();
        let a = studio.request_export().unwrap();
        let b = studio.request_export().unwrap();
        assert_eq!(a, b);
        assert_eq!(a, studio.canvas().unwrap().export_png().unwrap());
    }
}
