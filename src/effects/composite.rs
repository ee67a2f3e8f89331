use crate::foundation::core::Bitmap;
use crate::foundation::error::{TextBlurError, TextBlurResult};
use crate::foundation::math::{mul_div255_u8, unit_to_u8};

pub(crate) type PremulRgba8 = [u8; 4];

/// Source-atop: `src` is drawn only where `dst` has coverage; the result keeps `dst` alpha.
pub(crate) fn atop(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    let da = u16::from(dst[3]);
    let inv_sa = 255u16 - u16::from(src[3]);

    let mut out = [0u8; 4];
    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), da);
        let dc = mul_div255_u8(u16::from(dst[i]), inv_sa);
        out[i] = sc.saturating_add(dc).min(dst[3]);
    }
    out[3] = dst[3];
    out
}

/// Blend premultiplied `a` toward `b` by `t` in `[0, 1]`.
pub(crate) fn crossfade(a: PremulRgba8, b: PremulRgba8, t: f32) -> PremulRgba8 {
    let tt = unit_to_u8(t);
    let it = 255u16 - tt;

    let mut out = [0u8; 4];
    for i in 0..4 {
        let av = mul_div255_u8(u16::from(a[i]), it);
        let bv = mul_div255_u8(u16::from(b[i]), tt);
        out[i] = av.saturating_add(bv);
    }
    out
}

/// Composite `foreground` onto `background` with source-atop semantics.
///
/// Over an opaque backdrop this tints the foreground's coverage onto the backdrop color, so a
/// partially transparent (blurred) edge never reveals transparency.
pub fn composite_atop(foreground: &Bitmap, background: &Bitmap) -> TextBlurResult<Bitmap> {
    ensure_same_size(foreground, background, "composite_atop")?;
    let mut out = background.data().to_vec();
    for (d, s) in out.chunks_exact_mut(4).zip(foreground.data().chunks_exact(4)) {
        let px = atop([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&px);
    }
    Bitmap::from_premul_rgba8(background.width(), background.height(), out)
}

/// Blend `a` toward `b` by `t` in `[0, 1]`.
pub fn crossfade_bitmaps(a: &Bitmap, b: &Bitmap, t: f32) -> TextBlurResult<Bitmap> {
    ensure_same_size(a, b, "crossfade_bitmaps")?;
    let mut out = Vec::with_capacity(a.data().len());
    for (pa, pb) in a.data().chunks_exact(4).zip(b.data().chunks_exact(4)) {
        out.extend_from_slice(&crossfade(
            [pa[0], pa[1], pa[2], pa[3]],
            [pb[0], pb[1], pb[2], pb[3]],
            t,
        ));
    }
    Bitmap::from_premul_rgba8(a.width(), a.height(), out)
}

fn ensure_same_size(a: &Bitmap, b: &Bitmap, op: &str) -> TextBlurResult<()> {
    if a.width() != b.width() || a.height() != b.height() {
        return Err(TextBlurError::blur(format!(
            "{op} expects equal-size bitmaps ({}x{} vs {}x{})",
            a.width(),
            a.height(),
            b.width(),
            b.height()
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/effects/composite.rs"]
mod tests;
