use std::time::Duration;

use crate::foundation::core::{Rgba8, Size};
use crate::foundation::error::{TextBlurError, TextBlurResult};
use crate::text::rasterizer::validate_bounds;

/// Blur stage and animation parameters.
///
/// Changing stage count or radius does not touch stages that already exist; the new values are
/// used by the next regeneration. Duration changes apply to the next animation start.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlurParameters {
    /// Number of distinct blur levels from sharp to maximally blurred, both included.
    pub number_of_stages: usize,
    /// Maximum blur radius in pixels.
    pub blur_radius: f32,
    /// Duration of an animated transition in seconds.
    pub animation_duration: f64,
}

impl Default for BlurParameters {
    fn default() -> Self {
        Self {
            number_of_stages: 10,
            blur_radius: 30.0,
            animation_duration: 1.0,
        }
    }
}

impl BlurParameters {
    /// Parse and validate parameters from JSON. Missing fields take their defaults.
    pub fn from_json_str(s: &str) -> TextBlurResult<Self> {
        let params: Self =
            serde_json::from_str(s).map_err(|e| TextBlurError::serde(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    /// Check the documented value ranges.
    pub fn validate(&self) -> TextBlurResult<()> {
        if self.number_of_stages < 2 {
            return Err(TextBlurError::validation("number_of_stages must be >= 2"));
        }
        validate_radius(self.blur_radius)?;
        self.duration()?;
        Ok(())
    }

    /// Animation duration as a [`Duration`].
    pub fn duration(&self) -> TextBlurResult<Duration> {
        duration_from_secs(self.animation_duration)
    }

    /// Blur radius of stage slot `i` in `0..=number_of_stages + 1`.
    ///
    /// Slots 0 and 1 are unblurred, slots `N` and `N + 1` use the full radius, and the radius
    /// grows linearly over slots `1..=N`.
    pub fn radius_for_stage(&self, i: usize) -> f32 {
        let n = self.number_of_stages.max(2);
        let level = i.clamp(1, n) - 1;
        (level as f32) * self.blur_radius / ((n - 1) as f32)
    }
}

pub(crate) fn validate_radius(radius: f32) -> TextBlurResult<()> {
    if !radius.is_finite() || radius < 0.0 {
        return Err(TextBlurError::validation(
            "blur_radius must be finite and >= 0",
        ));
    }
    Ok(())
}

pub(crate) fn duration_from_secs(secs: f64) -> TextBlurResult<Duration> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(TextBlurError::validation(
            "animation_duration must be finite and > 0",
        ));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| TextBlurError::validation(e.to_string()))
}

/// Label-level options that are fixed for a controller's lifetime, except `background` and
/// `bounds`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LabelOptions {
    /// Opaque backdrop the stages are composited onto.
    pub background: Rgba8,
    /// Initial layout bounds in pixels.
    pub bounds: Size,
    /// Start stage generation on every content change instead of on the first blur request.
    pub eager_generation: bool,
    /// Worker threads for stage generation. `None` uses rayon defaults.
    pub worker_threads: Option<usize>,
}

impl Default for LabelOptions {
    fn default() -> Self {
        Self {
            background: Rgba8::WHITE,
            bounds: Size::new(320.0, 64.0),
            eager_generation: true,
            worker_threads: None,
        }
    }
}

impl LabelOptions {
    /// Parse and validate options from JSON. Missing fields take their defaults.
    pub fn from_json_str(s: &str) -> TextBlurResult<Self> {
        let opts: Self =
            serde_json::from_str(s).map_err(|e| TextBlurError::serde(e.to_string()))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Check the documented value ranges.
    pub fn validate(&self) -> TextBlurResult<()> {
        validate_bounds(self.bounds)?;
        if self.worker_threads == Some(0) {
            return Err(TextBlurError::validation(
                "worker_threads must be >= 1 when set",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
