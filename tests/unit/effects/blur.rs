use super::*;
use crate::foundation::core::{Rgba8, Rgba8Premul};

fn dot(size: u32) -> Bitmap {
    let mut data = vec![0u8; (size * size * 4) as usize];
    let c = (((size / 2) * size + size / 2) * 4) as usize;
    data[c..c + 4].copy_from_slice(&[255, 255, 255, 255]);
    Bitmap::from_premul_rgba8(size, size, data).unwrap()
}

#[test]
fn kernel_is_normalized_symmetric_and_three_sigma_wide() {
    for (sigma, half) in [(0.1, 1), (1.0, 3), (2.5, 8), (30.0, 90)] {
        let k = Kernel::gaussian(sigma).unwrap();
        assert_eq!(k.half_width(), half, "sigma {sigma}");
        assert_eq!(k.weights().iter().map(|&w| u64::from(w)).sum::<u64>(), 65536);
        let rev: Vec<u32> = k.weights().iter().rev().copied().collect();
        assert_eq!(rev, k.weights());
        assert!(k.weights()[half] >= k.weights()[half - 1]);
    }
}

#[test]
fn degenerate_radius_is_rejected() {
    assert!(Kernel::gaussian(0.0).is_err());
    assert!(Kernel::gaussian(f32::NAN).is_err());
    let src = Bitmap::solid(2, 2, Rgba8Premul::transparent()).unwrap();
    let err = GaussianBlur.blur(&src, -1.0).unwrap_err();
    assert!(err.to_string().contains("blur error:"));
}

#[test]
fn flat_color_is_unchanged() {
    let src = Bitmap::solid(5, 3, Rgba8::rgba(40, 80, 120, 200).to_premul()).unwrap();
    assert_eq!(GaussianBlur.blur(&src, 2.0).unwrap(), src);
}

#[test]
fn edge_clamp_keeps_opaque_border_opaque() {
    let opaque = Bitmap::solid(6, 4, Rgba8::BLACK.to_premul()).unwrap();
    let out = GaussianBlur.blur(&opaque, 4.0).unwrap();
    assert_eq!(out, opaque);
    assert_eq!(out.pixel(0, 0), Some([0, 0, 0, 255]));
}

#[test]
fn a_single_dot_spreads_but_keeps_its_coverage() {
    let out = GaussianBlur.blur(&dot(9), 1.0).unwrap();
    let covered = out.data().chunks_exact(4).filter(|px| px[3] > 0).count();
    assert!(covered > 9, "{covered}");
    let total: i64 = out.data().chunks_exact(4).map(|px| i64::from(px[3])).sum();
    assert!((total - 255).abs() <= 8, "{total}");
    assert_eq!(out.pixel(4, 3), out.pixel(4, 5));
    assert_eq!(out.pixel(3, 4), out.pixel(5, 4));
    assert!(out.pixel(4, 4).unwrap()[3] > out.pixel(4, 3).unwrap()[3]);
}

#[test]
fn passes_only_mix_along_their_axis() {
    // Vertical stripes: every column is constant, every row alternates.
    let (w, h) = (8u32, 5u32);
    let mut data = vec![0u8; (w * h * 4) as usize];
    for (i, px) in data.chunks_exact_mut(4).enumerate() {
        if (i as u32 % w) % 2 == 0 {
            px.copy_from_slice(&[255, 255, 255, 255]);
        }
    }
    let stripes = Bitmap::from_premul_rgba8(w, h, data).unwrap();
    let k = Kernel::gaussian(1.0).unwrap();

    assert_eq!(convolve(&stripes, &k, Axis::Vertical).unwrap(), stripes);
    let rows = convolve(&stripes, &k, Axis::Horizontal).unwrap();
    assert_ne!(rows, stripes);
    for x in 0..w {
        assert_eq!(rows.pixel(x, 0), rows.pixel(x, h - 1));
    }
}
