use std::sync::Arc;

use crate::animation::clock::FrameClock;
use crate::animation::driver::{AnimationDriver, BlendFrame, Completion, FrameStep};
use crate::config::{BlurParameters, LabelOptions, duration_from_secs, validate_radius};
use crate::foundation::core::{Bitmap, Rgba8, Size};
use crate::foundation::error::TextBlurResult;
use crate::label::layers::LayerStack;
use crate::label::request::{DeferredRequest, RequestQueue};
use crate::stages::cache::{GenerationToken, StageCache};
use crate::stages::generator::StageGenerator;
use crate::stages::set::StageSet;
use crate::text::rasterizer::{
    Font, LineBreakMode, StyledText, TextAlignment, TextRasterizer, TextStyle, validate_bounds,
};

/// A text label that animates between sharp and blurred.
///
/// Every rendering-affecting change (text, style, bounds, background) throws away the stage set
/// and starts a new one. Blur requests that arrive before the stages are ready are parked in a
/// single-slot queue and replayed by [`TextBlurController::poll`] or
/// [`TextBlurController::finish_generation`].
///
/// All methods run on the owning (foreground) thread. Only stage generation runs elsewhere.
pub struct TextBlurController<R: TextRasterizer, C: FrameClock> {
    rasterizer: R,
    clock: C,
    text: String,
    style: TextStyle,
    bounds: Size,
    params: BlurParameters,
    options: LabelOptions,
    generator: StageGenerator,
    source: Option<Bitmap>,
    cache: StageCache,
    driver: AnimationDriver,
    queue: RequestQueue,
    layers: LayerStack,
    settled: bool,
}

impl<R: TextRasterizer, C: FrameClock> std::fmt::Debug for TextBlurController<R, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextBlurController")
            .field("text", &self.text)
            .field("bounds", &self.bounds)
            .field("params", &self.params)
            .field("settled", &self.settled)
            .field("ready", &self.cache.is_ready())
            .field("driver", &self.driver)
            .field("pending", &self.queue.is_pending())
            .finish_non_exhaustive()
    }
}

impl<R: TextRasterizer, C: FrameClock> TextBlurController<R, C> {
    /// Create an empty, unblurred label.
    pub fn new(
        rasterizer: R,
        mut clock: C,
        font: Font,
        params: BlurParameters,
        options: LabelOptions,
    ) -> TextBlurResult<Self> {
        params.validate()?;
        options.validate()?;
        let cache = StageCache::new(options.worker_threads)?;
        clock.pause();
        Ok(Self {
            rasterizer,
            clock,
            text: String::new(),
            style: TextStyle::new(font),
            bounds: options.bounds,
            params,
            generator: StageGenerator::new(options.background.to_premul()),
            options,
            source: None,
            cache,
            driver: AnimationDriver::new(),
            queue: RequestQueue::new(),
            layers: LayerStack::default(),
            settled: false,
        })
    }

    /// Replace the text, keeping the current style.
    pub fn set_text(&mut self, text: impl Into<String>) -> TextBlurResult<()> {
        let text = text.into();
        if text == self.text {
            return Ok(());
        }
        self.text = text;
        self.content_changed()
    }

    /// Replace text and style together. The run's style becomes the label's style.
    pub fn set_styled_text(&mut self, styled: StyledText) -> TextBlurResult<()> {
        self.text = styled.text;
        self.style = styled.style;
        self.content_changed()
    }

    /// Replace the font.
    pub fn set_font(&mut self, font: Font) -> TextBlurResult<()> {
        self.style.font = font;
        self.content_changed()
    }

    /// Replace the text color.
    pub fn set_text_color(&mut self, color: Rgba8) -> TextBlurResult<()> {
        if color == self.style.color {
            return Ok(());
        }
        self.style.color = color;
        self.content_changed()
    }

    /// Replace the line alignment.
    pub fn set_alignment(&mut self, alignment: TextAlignment) -> TextBlurResult<()> {
        if alignment == self.style.alignment {
            return Ok(());
        }
        self.style.alignment = alignment;
        self.content_changed()
    }

    /// Replace the overflow handling.
    pub fn set_line_break_mode(&mut self, mode: LineBreakMode) -> TextBlurResult<()> {
        if mode == self.style.line_break {
            return Ok(());
        }
        self.style.line_break = mode;
        self.content_changed()
    }

    /// Replace the layout bounds.
    pub fn set_bounds(&mut self, bounds: Size) -> TextBlurResult<()> {
        validate_bounds(bounds)?;
        if bounds == self.bounds {
            return Ok(());
        }
        self.bounds = bounds;
        self.content_changed()
    }

    /// Replace the backdrop color.
    pub fn set_background(&mut self, background: Rgba8) -> TextBlurResult<()> {
        if background == self.options.background {
            return Ok(());
        }
        self.options.background = background;
        self.generator = StageGenerator::new(background.to_premul());
        self.content_changed()
    }

    /// Duration of the next animated transition, in seconds.
    pub fn set_animation_duration(&mut self, secs: f64) -> TextBlurResult<()> {
        duration_from_secs(secs)?;
        self.params.animation_duration = secs;
        Ok(())
    }

    /// Maximum blur radius used by the next regeneration.
    pub fn set_blur_radius(&mut self, radius: f32) -> TextBlurResult<()> {
        validate_radius(radius)?;
        self.params.blur_radius = radius;
        Ok(())
    }

    /// Stage count used by the next regeneration.
    pub fn set_number_of_stages(&mut self, number_of_stages: usize) -> TextBlurResult<()> {
        let next = BlurParameters {
            number_of_stages,
            ..self.params.clone()
        };
        next.validate()?;
        self.params = next;
        Ok(())
    }

    /// Replace all blur parameters at once.
    pub fn set_blur_parameters(&mut self, params: BlurParameters) -> TextBlurResult<()> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    /// Move the label to the blurred or unblurred state.
    ///
    /// `completion` fires exactly once: `true` when the label reached the requested state,
    /// `false` when the request was superseded, cancelled, or could not run. Requests made
    /// before the stages are ready are deferred; only the latest deferred request survives.
    pub fn set_blurred(&mut self, blurred: bool, animated: bool, completion: Option<Completion>) {
        let request = DeferredRequest {
            blurred,
            animated,
            completion,
        };
        if self.text.is_empty() {
            // An empty label is trivially unblurred and can never show blur.
            request.finish(!blurred);
            return;
        }
        if self.queue.can_run(self.cache.is_ready()) {
            self.run(request);
            return;
        }

        tracing::debug!(blurred, animated, "deferring blur request until stages are ready");
        if let Some(superseded) = self.queue.defer(request) {
            superseded.finish(false);
        }
        if !self.cache.is_generating()
            && let Err(e) = self.start_generation()
        {
            tracing::error!(error = %e, "could not start stage generation");
            if let Some(r) = self.queue.take() {
                r.finish(false);
            }
        }
    }

    /// `true` when the displayed image is not the unblurred rendering.
    ///
    /// This follows the layers, so it turns `true` on the first animation frame that shows any
    /// blur and `false` once an unblur animation is back on the sharp stage.
    pub fn is_blurred(&self) -> bool {
        let Some(stage0) = self.cache.unblurred() else {
            return false;
        };
        // Pixel comparison: lazy generation recomputes stage 0 into fresh storage.
        let shows_blur = |b: &Bitmap| b != stage0;
        let lower = &self.layers.lower;
        let upper = &self.layers.upper;
        lower.contents.as_ref().is_some_and(shows_blur)
            || (upper.opacity > 0.0 && upper.contents.as_ref().is_some_and(shows_blur))
    }

    /// `true` while an animated transition is running.
    pub fn is_animating(&self) -> bool {
        self.driver.is_running()
    }

    /// `true` once the stage set for the current content is available.
    pub fn is_ready(&self) -> bool {
        self.cache.is_ready()
    }

    /// Accept finished stage generation without blocking and replay any deferred request.
    ///
    /// Returns `Ok(true)` when this call made the label ready.
    pub fn poll(&mut self) -> TextBlurResult<bool> {
        let accepted = self.cache.poll();
        self.after_handoff(accepted)
    }

    /// Block until the running stage generation finishes, then behave like
    /// [`TextBlurController::poll`].
    pub fn finish_generation(&mut self) -> TextBlurResult<bool> {
        let accepted = self.cache.wait();
        self.after_handoff(accepted)
    }

    /// Advance the running animation by one display frame.
    pub fn on_frame(&mut self) {
        let now = self.clock.now();
        match self.driver.tick(now) {
            FrameStep::Idle => self.clock.pause(),
            FrameStep::Blend(frame) => self.show_frame(frame),
            FrameStep::Finished { blurred } => {
                self.snap(blurred);
                self.settled = blurred;
                self.clock.pause();
                tracing::debug!(blurred, "blur animation finished");
                if let Some(c) = self.driver.complete() {
                    c(true);
                }
            }
        }
    }

    /// Displayed layers.
    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    /// The current stage set, once ready.
    pub fn stages(&self) -> Option<&Arc<StageSet>> {
        self.cache.stages()
    }

    /// The unblurred composite, available as soon as generation began.
    pub fn rendered_image(&self) -> Option<&Bitmap> {
        self.cache.unblurred()
    }

    /// The maximally blurred composite, once ready.
    pub fn blurred_image(&self) -> Option<&Bitmap> {
        self.cache.stages().map(|s| s.max_blurred())
    }

    /// The frame clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// The frame clock, mutably. Hosts with a manual clock advance time through this.
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Current text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Current style.
    pub fn style(&self) -> &TextStyle {
        &self.style
    }

    /// Current layout bounds.
    pub fn bounds(&self) -> Size {
        self.bounds
    }

    /// Current blur parameters.
    pub fn params(&self) -> &BlurParameters {
        &self.params
    }

    fn content_changed(&mut self) -> TextBlurResult<()> {
        let reblur = self.driver.target_blurred().unwrap_or(self.settled);
        if let Some(c) = self.driver.cancel() {
            c(false);
        }
        self.clock.pause();
        self.cache.invalidate();
        self.layers.clear();
        self.source = None;
        self.settled = false;

        if self.text.is_empty() {
            if let Some(r) = self.queue.take() {
                let finished = !r.blurred;
                r.finish(finished);
            }
            tracing::debug!("label cleared");
            return Ok(());
        }

        if reblur && !self.queue.is_pending() {
            self.queue.defer(DeferredRequest::new(true, false));
        }

        if self.options.eager_generation || self.queue.is_pending() {
            self.start_generation()
        } else {
            self.prepare_unblurred()
        }
    }

    fn rasterize(&mut self) -> TextBlurResult<Bitmap> {
        if let Some(source) = self.source.as_ref() {
            return Ok(source.clone());
        }
        let styled = StyledText::new(self.text.clone(), self.style.clone());
        let source = self.rasterizer.render(&styled, self.bounds)?.bitmap;
        self.source = Some(source.clone());
        Ok(source)
    }

    fn prepare_unblurred(&mut self) -> TextBlurResult<()> {
        let source = self.rasterize()?;
        self.cache.prepare(&source, &self.generator)?;
        self.show_unblurred_preview();
        Ok(())
    }

    fn start_generation(&mut self) -> TextBlurResult<()> {
        let source = self.rasterize()?;
        self.cache
            .begin_generation(source, self.params.clone(), self.generator.clone())?;
        self.show_unblurred_preview();
        Ok(())
    }

    fn show_unblurred_preview(&mut self) {
        if let Some(stage0) = self.cache.unblurred() {
            self.layers.show_still(stage0);
        }
    }

    fn after_handoff(
        &mut self,
        accepted: TextBlurResult<Option<GenerationToken>>,
    ) -> TextBlurResult<bool> {
        match accepted {
            Ok(Some(_)) => {
                self.snap(self.settled);
                if let Some(request) = self.queue.take() {
                    tracing::debug!(
                        blurred = request.blurred,
                        animated = request.animated,
                        "replaying deferred blur request"
                    );
                    self.run(request);
                }
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(e) => {
                if let Some(request) = self.queue.take() {
                    request.finish(false);
                }
                Err(e)
            }
        }
    }

    fn run(&mut self, request: DeferredRequest) {
        let DeferredRequest {
            blurred,
            animated,
            completion,
        } = request;

        if !animated {
            if let Some(c) = self.driver.cancel() {
                c(false);
            }
            self.clock.pause();
            self.snap(blurred);
            self.settled = blurred;
            finish(completion, true);
            return;
        }

        if let Some(target) = self.driver.target_blurred() {
            let superseded = if target == blurred {
                self.driver.replace_completion(completion)
            } else {
                tracing::debug!(blurred, "reversing blur animation");
                self.driver.reverse_direction(completion)
            };
            finish(superseded, false);
            return;
        }

        if self.settled == blurred {
            finish(completion, true);
            return;
        }

        let (duration, number_of_stages) = match (self.params.duration(), self.stages()) {
            (Ok(d), Some(s)) => (d, s.number_of_stages()),
            _ => {
                finish(completion, false);
                return;
            }
        };
        tracing::debug!(blurred, ?duration, number_of_stages, "starting blur animation");
        let superseded = self.driver.start(
            blurred,
            self.clock.now(),
            duration,
            number_of_stages,
            completion,
        );
        finish(superseded, false);
        self.show_frame(self.driver.blend());
        self.clock.resume();
    }

    fn show_frame(&mut self, frame: BlendFrame) {
        let Some(stages) = self.cache.stages().cloned() else {
            return;
        };
        let lower = stages.get_directional(frame.lower, frame.reverse);
        let upper = stages.get_directional(frame.upper, frame.reverse);
        if let (Some(lower), Some(upper)) = (lower, upper) {
            self.layers.show_blend(lower, upper, frame.fraction);
        }
    }

    fn snap(&mut self, blurred: bool) {
        let Some(stages) = self.cache.stages().cloned() else {
            return;
        };
        let still = if blurred {
            stages.max_blurred()
        } else {
            stages.unblurred()
        };
        self.layers.show_still(still);
    }
}

impl<R: TextRasterizer, C: FrameClock> Drop for TextBlurController<R, C> {
    fn drop(&mut self) {
        if let Some(c) = self.driver.cancel() {
            c(false);
        }
        if let Some(r) = self.queue.take() {
            r.finish(false);
        }
        self.clock.cancel();
    }
}

fn finish(completion: Option<Completion>, finished: bool) {
    if let Some(c) = completion {
        c(finished);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/label/controller.rs"]
mod tests;
