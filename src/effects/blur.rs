use crate::foundation::core::Bitmap;
use crate::foundation::error::{TextBlurError, TextBlurResult};

/// Single-image blur primitive consumed by the stage generator.
///
/// Implementations must extend the source's border pixels outward before filtering so that the
/// output never fades toward transparent at the edges, and must return a bitmap of the same size.
pub trait BlurPrimitive: Send + Sync {
    /// Blur `src` with the given radius in pixels. Callers never pass a radius `<= 0`.
    fn blur(&self, src: &Bitmap, radius: f32) -> TextBlurResult<Bitmap>;
}

/// Separable Gaussian blur with Q16 fixed-point weights and edge-clamped sampling.
///
/// `radius` is the kernel's standard deviation; taps extend to `ceil(3 * radius)` on each side.
#[derive(Clone, Copy, Debug, Default)]
pub struct GaussianBlur;

impl BlurPrimitive for GaussianBlur {
    fn blur(&self, src: &Bitmap, radius: f32) -> TextBlurResult<Bitmap> {
        let kernel = Kernel::gaussian(radius)?;
        let rows = convolve(src, &kernel, Axis::Horizontal)?;
        convolve(&rows, &kernel, Axis::Vertical)
    }
}

/// Symmetric 1D kernel whose Q16 weights sum to exactly `1 << 16`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Kernel {
    weights: Vec<u32>,
}

impl Kernel {
    pub(crate) fn gaussian(sigma: f32) -> TextBlurResult<Self> {
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(TextBlurError::blur("blur radius must be finite and > 0"));
        }
        let half = (sigma * 3.0).ceil().max(1.0) as i64;
        let two_sigma_sq = 2.0 * f64::from(sigma) * f64::from(sigma);
        let raw: Vec<f64> = (-half..=half)
            .map(|i| (-((i * i) as f64) / two_sigma_sq).exp())
            .collect();
        // The center tap is exp(0) = 1, so the total is never zero.
        let total: f64 = raw.iter().sum();

        let mut weights: Vec<u32> = raw
            .iter()
            .map(|w| ((w / total) * 65536.0).round() as u32)
            .collect();
        let sum: i64 = weights.iter().map(|&w| i64::from(w)).sum();
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + 65536 - sum).clamp(0, 65536) as u32;
        Ok(Self { weights })
    }

    pub(crate) fn half_width(&self) -> usize {
        self.weights.len() / 2
    }

    pub(crate) fn weights(&self) -> &[u32] {
        &self.weights
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Axis {
    Horizontal,
    Vertical,
}

/// One blur pass along `axis`. Samples past either end repeat the border pixel.
pub(crate) fn convolve(src: &Bitmap, kernel: &Kernel, axis: Axis) -> TextBlurResult<Bitmap> {
    let (w, h) = (src.width() as usize, src.height() as usize);
    let (span, lines) = match axis {
        Axis::Horizontal => (w, h),
        Axis::Vertical => (h, w),
    };
    let offset = |line: usize, pos: usize| match axis {
        Axis::Horizontal => (line * w + pos) * 4,
        Axis::Vertical => (pos * w + line) * 4,
    };

    let data = src.data();
    let mut out = vec![0u8; data.len()];
    let half = kernel.half_width() as isize;
    let last = span as isize - 1;
    for line in 0..lines {
        for pos in 0..span {
            let mut acc = [0u64; 4];
            for (k, &weight) in kernel.weights().iter().enumerate() {
                let sample = (pos as isize + k as isize - half).clamp(0, last) as usize;
                let i = offset(line, sample);
                for (a, &v) in acc.iter_mut().zip(&data[i..i + 4]) {
                    *a += u64::from(weight) * u64::from(v);
                }
            }
            let o = offset(line, pos);
            for (dst, a) in out[o..o + 4].iter_mut().zip(acc) {
                *dst = ((a + 32768) >> 16).min(255) as u8;
            }
        }
    }
    Bitmap::from_premul_rgba8(src.width(), src.height(), out)
}

#[cfg(test)]
#[path = "../../tests/unit/effects/blur.rs"]
mod tests;
