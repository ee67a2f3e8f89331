use std::sync::Arc;

use crate::foundation::core::{Bitmap, Rgba8, Size};
use crate::foundation::error::{TextBlurError, TextBlurResult};

/// Horizontal placement of each line within the measured text box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlignment {
    /// Lines start at the leading edge.
    Start,
    /// Lines are centered.
    #[default]
    Center,
    /// Lines end at the trailing edge.
    End,
}

impl TextAlignment {
    /// Fraction of the free line space placed before the line.
    pub fn offset_factor(self) -> f32 {
        match self {
            Self::Start => 0.0,
            Self::Center => 0.5,
            Self::End => 1.0,
        }
    }
}

/// How text that exceeds the available width is handled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineBreakMode {
    /// Wrap at word boundaries within the bounds width.
    #[default]
    WordWrap,
    /// Lay out on explicit line breaks only and clip to the bounds.
    Clip,
}

/// Font face bytes plus a pixel size.
///
/// The face bytes are shared, so changing the size of a font does not copy the face.
#[derive(Clone)]
pub struct Font {
    data: Arc<Vec<u8>>,
    size_px: f32,
}

impl Font {
    /// Create a font from raw TrueType/OpenType bytes.
    pub fn new(data: impl Into<Vec<u8>>, size_px: f32) -> TextBlurResult<Self> {
        validate_size(size_px)?;
        Ok(Self {
            data: Arc::new(data.into()),
            size_px,
        })
    }

    /// The same face at another size.
    pub fn with_size(&self, size_px: f32) -> TextBlurResult<Self> {
        validate_size(size_px)?;
        Ok(Self {
            data: Arc::clone(&self.data),
            size_px,
        })
    }

    /// Raw face bytes.
    pub fn data(&self) -> &Arc<Vec<u8>> {
        &self.data
    }

    /// Font size in pixels.
    pub fn size_px(&self) -> f32 {
        self.size_px
    }
}

impl std::fmt::Debug for Font {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Font")
            .field("bytes", &self.data.len())
            .field("size_px", &self.size_px)
            .finish()
    }
}

fn validate_size(size_px: f32) -> TextBlurResult<()> {
    if !size_px.is_finite() || size_px <= 0.0 {
        return Err(TextBlurError::validation(
            "font size_px must be finite and > 0",
        ));
    }
    Ok(())
}

/// Attributes applied to a whole text run.
#[derive(Clone, Debug)]
pub struct TextStyle {
    /// Face and size.
    pub font: Font,
    /// Straight-alpha text color.
    pub color: Rgba8,
    /// Line alignment.
    pub alignment: TextAlignment,
    /// Overflow handling.
    pub line_break: LineBreakMode,
}

impl TextStyle {
    /// Black, centered, word-wrapped text in `font`.
    pub fn new(font: Font) -> Self {
        Self {
            font,
            color: Rgba8::BLACK,
            alignment: TextAlignment::default(),
            line_break: LineBreakMode::default(),
        }
    }
}

/// A string with its style.
#[derive(Clone, Debug)]
pub struct StyledText {
    /// Text content.
    pub text: String,
    /// Style applied to the whole run.
    pub style: TextStyle,
}

impl StyledText {
    /// Pair `text` with `style`.
    pub fn new(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    /// `true` when there is nothing to render.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Output of a [`TextRasterizer`].
#[derive(Clone, Debug)]
pub struct RasterizedText {
    /// Glyph coverage on a transparent background, sized to `measured` (rounded up).
    pub bitmap: Bitmap,
    /// Measured extent of the laid-out text, bounded by the requested maximum size.
    pub measured: Size,
}

/// Renders a styled text run into a bitmap no larger than `max_size`.
///
/// Shaping and measurement are entirely the implementation's concern; the blur pipeline only
/// sees the resulting bitmap.
pub trait TextRasterizer {
    /// Lay out and rasterize `text` within `max_size`. `text` is never empty.
    fn render(&mut self, text: &StyledText, max_size: Size) -> TextBlurResult<RasterizedText>;
}

/// Validate layout bounds passed to a rasterizer.
pub(crate) fn validate_bounds(max_size: Size) -> TextBlurResult<()> {
    if !max_size.width.is_finite()
        || !max_size.height.is_finite()
        || max_size.width <= 0.0
        || max_size.height <= 0.0
    {
        return Err(TextBlurError::validation(
            "layout bounds must be finite and > 0",
        ));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/text/rasterizer.rs"]
mod tests;
