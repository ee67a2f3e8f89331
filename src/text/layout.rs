use std::sync::Arc;

use crate::foundation::core::{Bitmap, Size};
use crate::foundation::error::{TextBlurError, TextBlurResult};
use crate::text::rasterizer::{
    LineBreakMode, RasterizedText, StyledText, TextRasterizer, validate_bounds,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub(crate) struct TextBrushRgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

struct RegisteredFont {
    source: Arc<Vec<u8>>,
    family: String,
    data: vello_cpu::peniko::FontData,
}

/// [`TextRasterizer`] backed by Parley shaping and `vello_cpu` glyph rasterization.
///
/// The most recently used face stays registered, so re-rendering with the same [`crate::Font`]
/// does not re-parse the face.
pub struct ParleyRasterizer {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    registered: Option<RegisteredFont>,
}

impl Default for ParleyRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ParleyRasterizer {
    /// Construct a rasterizer with fresh Parley contexts.
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            registered: None,
        }
    }

    /// Family name of the most recently registered face.
    pub fn family_name(&self) -> Option<&str> {
        self.registered.as_ref().map(|f| f.family.as_str())
    }

    fn register(&mut self, source: &Arc<Vec<u8>>) -> TextBlurResult<&RegisteredFont> {
        let cached = self
            .registered
            .as_ref()
            .is_some_and(|f| Arc::ptr_eq(&f.source, source));
        if !cached {
            let families = self
                .font_ctx
                .collection
                .register_fonts(parley::fontique::Blob::from(source.as_ref().clone()), None);
            let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
                TextBlurError::raster("no font families registered from font bytes")
            })?;
            let family = self
                .font_ctx
                .collection
                .family_name(family_id)
                .ok_or_else(|| TextBlurError::raster("registered font family has no name"))?
                .to_string();
            let data = vello_cpu::peniko::FontData::new(
                vello_cpu::peniko::Blob::from(source.as_ref().clone()),
                0,
            );
            self.registered = Some(RegisteredFont {
                source: Arc::clone(source),
                family,
                data,
            });
        }
        self.registered
            .as_ref()
            .ok_or_else(|| TextBlurError::raster("font registration failed"))
    }

    fn layout(
        &mut self,
        text: &StyledText,
        family: String,
        max_width_px: f32,
    ) -> parley::Layout<TextBrushRgba8> {
        let style = &text.style;
        let brush = TextBrushRgba8 {
            r: style.color.r,
            g: style.color.g,
            b: style.color.b,
            a: style.color.a,
        };

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, &text.text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(style.font.size_px()));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(&text.text);
        match style.line_break {
            LineBreakMode::WordWrap => layout.break_all_lines(Some(max_width_px)),
            LineBreakMode::Clip => layout.break_all_lines(None),
        }
        // Lines are placed explicitly at raster time from each line's advance.
        layout.align(
            None,
            parley::Alignment::Start,
            parley::AlignmentOptions::default(),
        );
        layout
    }
}

impl TextRasterizer for ParleyRasterizer {
    #[tracing::instrument(skip(self, text), fields(len = text.text.len()))]
    fn render(&mut self, text: &StyledText, max_size: Size) -> TextBlurResult<RasterizedText> {
        if text.is_empty() {
            return Err(TextBlurError::validation("cannot rasterize empty text"));
        }
        validate_bounds(max_size)?;

        let family = self.register(text.style.font.data())?.family.clone();
        let layout = self.layout(text, family, max_size.width as f32);

        let measured = Size::new(
            f64::from(layout.width()).min(max_size.width),
            f64::from(layout.height()).min(max_size.height),
        );
        let w = pixel_extent(measured.width, "width")?;
        let h = pixel_extent(measured.height, "height")?;

        let font = self
            .registered
            .as_ref()
            .map(|f| f.data.clone())
            .ok_or_else(|| TextBlurError::raster("font registration failed"))?;
        let factor = text.style.alignment.offset_factor();
        let box_width = measured.width as f32;

        let mut ctx = vello_cpu::RenderContext::new(w, h);
        for line in layout.lines() {
            let free = (box_width - line.metrics().advance).max(0.0);
            ctx.set_transform(vello_cpu::kurbo::Affine::translate((
                f64::from(free * factor),
                0.0,
            )));
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));
                // Positioned glyphs carry the run offset and the line baseline.
                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        ctx.flush();

        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        ctx.render_to_pixmap(&mut pixmap);
        let bitmap = Bitmap::from_premul_rgba8(
            u32::from(w),
            u32::from(h),
            pixmap.data_as_u8_slice().to_vec(),
        )?;

        Ok(RasterizedText { bitmap, measured })
    }
}

fn pixel_extent(v: f64, axis: &str) -> TextBlurResult<u16> {
    let px = v.ceil().max(1.0);
    if px > f64::from(u16::MAX) {
        return Err(TextBlurError::raster(format!(
            "text {axis} exceeds u16 pixels: {px}"
        )));
    }
    Ok(px as u16)
}

#[cfg(test)]
#[path = "../../tests/unit/text/layout.rs"]
mod tests;
