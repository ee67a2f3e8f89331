use crate::effects::composite::crossfade_bitmaps;
use crate::foundation::core::Bitmap;
use crate::foundation::error::TextBlurResult;

/// One displayed image with an opacity.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageLayer {
    /// Bitmap shown by the layer, if any.
    pub contents: Option<Bitmap>,
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
}

impl ImageLayer {
    fn empty(opacity: f32) -> Self {
        Self {
            contents: None,
            opacity,
        }
    }
}

/// Two stacked layers that cross-dissolve between adjacent stages.
///
/// The lower layer is always fully opaque; the upper layer carries the blend fraction.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerStack {
    /// Base layer.
    pub lower: ImageLayer,
    /// Layer drawn over `lower`.
    pub upper: ImageLayer,
}

impl Default for LayerStack {
    fn default() -> Self {
        Self {
            lower: ImageLayer::empty(1.0),
            upper: ImageLayer::empty(0.0),
        }
    }
}

impl LayerStack {
    /// Remove all contents.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// `true` when nothing is displayed.
    pub fn is_empty(&self) -> bool {
        self.lower.contents.is_none()
    }

    /// Show a single still image.
    pub fn show_still(&mut self, bitmap: &Bitmap) {
        self.show_blend(bitmap, bitmap, 0.0);
    }

    /// Show `lower` with `upper` on top at `fraction` opacity.
    pub fn show_blend(&mut self, lower: &Bitmap, upper: &Bitmap, fraction: f32) {
        self.lower.contents = Some(lower.clone());
        self.lower.opacity = 1.0;
        self.upper.contents = Some(upper.clone());
        self.upper.opacity = fraction.clamp(0.0, 1.0);
    }

    /// Compose both layers into the single image a host would present.
    pub fn flatten(&self) -> TextBlurResult<Option<Bitmap>> {
        let Some(lower) = self.lower.contents.as_ref() else {
            return Ok(None);
        };
        match self.upper.contents.as_ref() {
            Some(upper) if self.upper.opacity > 0.0 && !upper.ptr_eq(lower) => {
                crossfade_bitmaps(lower, upper, self.upper.opacity).map(Some)
            }
            _ => Ok(Some(lower.clone())),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/label/layers.rs"]
mod tests;
