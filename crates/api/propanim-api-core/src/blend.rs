//! Blending utilities for scalar curve samples.
//! - f32 linear interpolation and its inverse
//! - bilinear interpolation over four corners

/// Linear interpolation for f32
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Position of `x` between `a` and `b` as a fraction. Zero-length spans map to 0.
#[inline]
pub fn inverse_lerp(a: f32, b: f32, x: f32) -> f32 {
    let span = b - a;
    if span == 0.0 {
        0.0
    } else {
        (x - a) / span
    }
}

/// Bilinear weights for the corners (top-left, top-right, bottom-left,
/// bottom-right) at parameter (u, v). Rows are blended by `u`, then the row
/// results by `v`; the weights are the expanded form of that product.
#[inline]
pub fn bilinear_weights(u: f32, v: f32) -> [f32; 4] {
    [
        (1.0 - u) * (1.0 - v),
        u * (1.0 - v),
        (1.0 - u) * v,
        u * v,
    ]
}
