use std::sync::Arc;

use rayon::prelude::*;

use crate::config::BlurParameters;
use crate::effects::blur::{BlurPrimitive, GaussianBlur};
use crate::effects::composite::composite_atop;
use crate::foundation::core::{Bitmap, Rgba8Premul};
use crate::foundation::error::{TextBlurError, TextBlurResult};
use crate::stages::set::StageSet;

/// Blur-then-composite pipeline producing [`StageSet`]s.
///
/// The generator is a pure function of `(source, params)` plus the background color captured at
/// construction. It is cheap to clone and safe to move to a worker thread.
#[derive(Clone)]
pub struct StageGenerator {
    blur: Arc<dyn BlurPrimitive>,
    background: Rgba8Premul,
}

impl std::fmt::Debug for StageGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageGenerator")
            .field("background", &self.background)
            .finish_non_exhaustive()
    }
}

impl StageGenerator {
    /// Generator using [`GaussianBlur`].
    pub fn new(background: Rgba8Premul) -> Self {
        Self::with_blur(Arc::new(GaussianBlur), background)
    }

    /// Generator using a custom blur primitive.
    pub fn with_blur(blur: Arc<dyn BlurPrimitive>, background: Rgba8Premul) -> Self {
        Self { blur, background }
    }

    /// Backdrop color composited under every stage.
    pub fn background(&self) -> Rgba8Premul {
        self.background
    }

    /// Stage 0: the source composited onto the backdrop, no blur.
    pub fn unblurred(&self, source: &Bitmap) -> TextBlurResult<Bitmap> {
        let backdrop = Bitmap::solid(source.width(), source.height(), self.background)?;
        composite_atop(source, &backdrop)
    }

    /// One stage at `radius`. A radius `<= 0` never reaches the blur primitive.
    pub fn stage(&self, source: &Bitmap, radius: f32) -> TextBlurResult<Bitmap> {
        if radius <= 0.0 {
            return self.unblurred(source);
        }
        let blurred = self.blur.blur(source, radius)?;
        if blurred.width() != source.width() || blurred.height() != source.height() {
            return Err(TextBlurError::blur(format!(
                "blur primitive changed bitmap size from {}x{} to {}x{}",
                source.width(),
                source.height(),
                blurred.width(),
                blurred.height()
            )));
        }
        let backdrop = Bitmap::solid(source.width(), source.height(), self.background)?;
        composite_atop(&blurred, &backdrop)
    }

    /// Full stage set for `source`.
    pub fn generate(&self, source: &Bitmap, params: &BlurParameters) -> TextBlurResult<StageSet> {
        let unblurred = self.unblurred(source)?;
        self.generate_from(source, params, unblurred)
    }

    /// Full stage set reusing an already-computed stage 0.
    ///
    /// Slot 1 repeats stage 0; slots `2..=N` are independent and are computed in parallel on the
    /// current rayon pool.
    #[tracing::instrument(skip(self, source, unblurred), fields(w = source.width(), h = source.height()))]
    pub fn generate_from(
        &self,
        source: &Bitmap,
        params: &BlurParameters,
        unblurred: Bitmap,
    ) -> TextBlurResult<StageSet> {
        params.validate()?;
        let blurred = (2..=params.number_of_stages)
            .into_par_iter()
            .map(|i| self.stage(source, params.radius_for_stage(i)))
            .collect::<TextBlurResult<Vec<_>>>()?;
        StageSet::from_parts(unblurred, blurred)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/stages/generator.rs"]
mod tests;
