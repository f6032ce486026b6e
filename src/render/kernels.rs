//! Pixel kernels behind the CPU backend's programs.
//!
//! Every buffer is premultiplied RGBA8, tightly packed. Reads outside a buffer are transparent.

use crate::foundation::math::{add_sat_u8, mul_div255_u8, opacity_u16};
use crate::render::backend::Axis;
use crate::style::computed::{BlendMode, MaskMode};

pub(crate) fn px(src: &[u8], width: u32, height: u32, x: i32, y: i32) -> [u8; 4] {
    if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
        return [0, 0, 0, 0];
    }
    let idx = ((y as usize) * (width as usize) + (x as usize)) * 4;
    [src[idx], src[idx + 1], src[idx + 2], src[idx + 3]]
}

/// Bilinear sample at continuous position `(fx, fy)`; texel `k` has its center at `k + 0.5`.
pub(crate) fn sample_bilinear(src: &[u8], width: u32, height: u32, fx: f32, fy: f32) -> [f32; 4] {
    let x = fx - 0.5;
    let y = fy - 0.5;
    let x0 = x.floor();
    let y0 = y.floor();
    let tx = x - x0;
    let ty = y - y0;
    let (x0, y0) = (x0 as i32, y0 as i32);
    let a = px(src, width, height, x0, y0);
    let b = px(src, width, height, x0 + 1, y0);
    let c = px(src, width, height, x0, y0 + 1);
    let d = px(src, width, height, x0 + 1, y0 + 1);
    let mut out = [0f32; 4];
    for i in 0..4 {
        let top = f32::from(a[i]) * (1.0 - tx) + f32::from(b[i]) * tx;
        let bot = f32::from(c[i]) * (1.0 - tx) + f32::from(d[i]) * tx;
        out[i] = top * (1.0 - ty) + bot * ty;
    }
    out
}

fn to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

pub(crate) fn premul_over_px_opacity(dst: &mut [u8], src: [u8; 4], op: u16) {
    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return;
    }
    let inv = 255u16 - u16::from(sa);
    dst[3] = add_sat_u8(sa, mul_div255_u8(u16::from(dst[3]), inv));
    for c in 0..3 {
        let sc = mul_div255_u8(u16::from(src[c]), op);
        let dc = mul_div255_u8(u16::from(dst[c]), inv);
        dst[c] = add_sat_u8(sc, dc);
    }
}

/// Copy the overlap of `src` into the top-left of `dst`, offset by `(ox, oy)` in the source.
pub(crate) fn crop(src: &[u8], sw: u32, sh: u32, dst: &mut [u8], dw: u32, dh: u32, ox: i32, oy: i32) {
    for y in 0..dh as i32 {
        for x in 0..dw as i32 {
            let p = px(src, sw, sh, x + ox, y + oy);
            let i = ((y as usize) * (dw as usize) + (x as usize)) * 4;
            dst[i..i + 4].copy_from_slice(&p);
        }
    }
}

/// One zero-edge box pass.
pub(crate) fn box_blur(src: &[u8], dst: &mut [u8], width: u32, height: u32, radius: u32, axis: Axis) {
    debug_assert_eq!(src.len(), dst.len());
    if radius == 0 {
        dst.copy_from_slice(src);
        return;
    }
    let (w, h) = (width as i32, height as i32);
    let r = radius as i32;
    let taps = (2 * radius + 1) as u32;
    let (lines, len) = match axis {
        Axis::X => (h, w),
        Axis::Y => (w, h),
    };
    let at = |line: i32, k: i32| -> usize {
        match axis {
            Axis::X => ((line * w + k) as usize) * 4,
            Axis::Y => ((k * w + line) as usize) * 4,
        }
    };
    for line in 0..lines {
        let mut acc = [0u32; 4];
        for k in -r..=r {
            if (0..len).contains(&k) {
                let i = at(line, k);
                for c in 0..4 {
                    acc[c] += u32::from(src[i + c]);
                }
            }
        }
        for k in 0..len {
            let o = at(line, k);
            for c in 0..4 {
                dst[o + c] = ((acc[c] + taps / 2) / taps) as u8;
            }
            let leave = k - r;
            if (0..len).contains(&leave) {
                let i = at(line, leave);
                for c in 0..4 {
                    acc[c] -= u32::from(src[i + c]);
                }
            }
            let enter = k + r + 1;
            if (0..len).contains(&enter) {
                let i = at(line, enter);
                for c in 0..4 {
                    acc[c] += u32::from(src[i + c]);
                }
            }
        }
    }
}

/// Dual-filter downsample: a 4×4 footprint around each 2×2 block, weights 5 (inner) and 1.
pub(crate) fn kawase_down(src: &[u8], sw: u32, sh: u32, dst: &mut [u8], dw: u32, dh: u32) {
    const W: [[u32; 4]; 4] = [[1, 1, 1, 1], [1, 5, 5, 1], [1, 5, 5, 1], [1, 1, 1, 1]];
    for y in 0..dh as i32 {
        for x in 0..dw as i32 {
            let mut acc = [0u32; 4];
            for (j, row) in W.iter().enumerate() {
                for (i, w) in row.iter().enumerate() {
                    let p = px(src, sw, sh, 2 * x - 1 + i as i32, 2 * y - 1 + j as i32);
                    for c in 0..4 {
                        acc[c] += u32::from(p[c]) * w;
                    }
                }
            }
            let o = ((y as usize) * (dw as usize) + (x as usize)) * 4;
            for c in 0..4 {
                dst[o + c] = ((acc[c] + 16) / 32) as u8;
            }
        }
    }
}

/// Tent upsample by two; output pixel `2i + a` mixes source `i` and its neighbour 3:1.
pub(crate) fn kawase_up(src: &[u8], sw: u32, sh: u32, dst: &mut [u8], dw: u32, dh: u32) {
    let taps = |o: i32| -> [(i32, u32); 2] {
        let i = o.div_euclid(2);
        if o.rem_euclid(2) == 0 {
            [(i - 1, 1), (i, 3)]
        } else {
            [(i, 3), (i + 1, 1)]
        }
    };
    for y in 0..dh as i32 {
        let ty = taps(y);
        for x in 0..dw as i32 {
            let tx = taps(x);
            let mut acc = [0u32; 4];
            for (sy, wy) in ty {
                for (sx, wx) in tx {
                    let p = px(src, sw, sh, sx, sy);
                    for c in 0..4 {
                        acc[c] += u32::from(p[c]) * wx * wy;
                    }
                }
            }
            let o = ((y as usize) * (dw as usize) + (x as usize)) * 4;
            for c in 0..4 {
                dst[o + c] = ((acc[c] + 8) / 16) as u8;
            }
        }
    }
}

/// One directional tent pass over `±(dx, dy)`.
pub(crate) fn motion_tent(src: &[u8], dst: &mut [u8], width: u32, height: u32, dx: f32, dy: f32) {
    let n = dx.hypot(dy).ceil().max(1.0) as i32;
    let mut taps = Vec::with_capacity((2 * n + 1) as usize);
    let mut total = 0f32;
    for k in -n..=n {
        let w = (n + 1 - k.abs()) as f32;
        let t = k as f32 / n as f32;
        taps.push((t * dx, t * dy, w));
        total += w;
    }
    for y in 0..height {
        for x in 0..width {
            let cx = x as f32 + 0.5;
            let cy = y as f32 + 0.5;
            let mut acc = [0f32; 4];
            for &(ox, oy, w) in &taps {
                let s = sample_bilinear(src, width, height, cx + ox, cy + oy);
                for c in 0..4 {
                    acc[c] += s[c] * w;
                }
            }
            let o = ((y as usize) * (width as usize) + (x as usize)) * 4;
            for c in 0..4 {
                dst[o + c] = to_u8(acc[c] / total);
            }
        }
    }
}

/// Zoom blur: average of `samples` taps from each pixel toward `center`.
pub(crate) fn radial(
    src: &[u8],
    dst: &mut [u8],
    width: u32,
    height: u32,
    center: [f32; 2],
    strength: f32,
    samples: u32,
) {
    let n = samples.max(2);
    let strength = strength.clamp(0.0, 0.9);
    for y in 0..height {
        for x in 0..width {
            let cx = x as f32 + 0.5;
            let cy = y as f32 + 0.5;
            let mut acc = [0f32; 4];
            for i in 0..n {
                let t = strength * i as f32 / (n - 1) as f32;
                let s = sample_bilinear(
                    src,
                    width,
                    height,
                    cx + (center[0] - cx) * t,
                    cy + (center[1] - cy) * t,
                );
                for c in 0..4 {
                    acc[c] += s[c];
                }
            }
            let o = ((y as usize) * (width as usize) + (x as usize)) * 4;
            for c in 0..4 {
                dst[o + c] = to_u8(acc[c] / n as f32);
            }
        }
    }
}

pub(crate) fn color_matrix_rgba8_premul(src: &[u8], dst: &mut [u8], m: [f32; 20]) {
    debug_assert_eq!(src.len(), dst.len());
    for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
        let pr = s[0] as f32 / 255.0;
        let pg = s[1] as f32 / 255.0;
        let pb = s[2] as f32 / 255.0;
        let pa = s[3] as f32 / 255.0;

        let inv_a = if pa > 0.0 { 1.0 / pa } else { 0.0 };
        let r = pr * inv_a;
        let g = pg * inv_a;
        let b = pb * inv_a;
        let a = pa;

        let out_r = (m[0] * r + m[1] * g + m[2] * b + m[3] * a + m[4]).clamp(0.0, 1.0);
        let out_g = (m[5] * r + m[6] * g + m[7] * b + m[8] * a + m[9]).clamp(0.0, 1.0);
        let out_b = (m[10] * r + m[11] * g + m[12] * b + m[13] * a + m[14]).clamp(0.0, 1.0);
        let out_a = (m[15] * r + m[16] * g + m[17] * b + m[18] * a + m[19]).clamp(0.0, 1.0);

        d[0] = to_u8(out_r * out_a * 255.0);
        d[1] = to_u8(out_g * out_a * 255.0);
        d[2] = to_u8(out_b * out_a * 255.0);
        d[3] = to_u8(out_a * 255.0);
    }
}

fn luma_u8(p: &[u8]) -> u8 {
    let r = u16::from(p[0]);
    let g = u16::from(p[1]);
    let b = u16::from(p[2]);
    ((r * 54 + g * 183 + b * 19 + 128) >> 8) as u8
}

pub(crate) fn mask_apply_rgba8_premul(src: &[u8], mask: &[u8], dst: &mut [u8], mode: MaskMode) {
    debug_assert_eq!(src.len(), mask.len());
    debug_assert_eq!(src.len(), dst.len());
    let luma = mode.uses_luma();
    for ((s, m), d) in src
        .chunks_exact(4)
        .zip(mask.chunks_exact(4))
        .zip(dst.chunks_exact_mut(4))
    {
        let w16 = u16::from(if luma { luma_u8(m) } else { m[3] });
        d[0] = mul_div255_u8(u16::from(s[0]), w16);
        d[1] = mul_div255_u8(u16::from(s[1]), w16);
        d[2] = mul_div255_u8(u16::from(s[2]), w16);
        d[3] = mul_div255_u8(u16::from(s[3]), w16);
    }
}

pub(crate) fn threshold(src: &[u8], dst: &mut [u8], t: f32) {
    let t16 = opacity_u16(t);
    for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
        // Premultiplied luma compared against the threshold scaled by alpha.
        let keep = s[3] > 0 && u16::from(luma_u8(s)) >= u16::from(mul_div255_u8(t16, u16::from(s[3])));
        if keep {
            d.copy_from_slice(s);
        } else {
            d.fill(0);
        }
    }
}

pub(crate) fn add(base: &[u8], glow: &[u8], dst: &mut [u8], strength: f32) {
    let k = strength.max(0.0);
    for ((b, g), d) in base
        .chunks_exact(4)
        .zip(glow.chunks_exact(4))
        .zip(dst.chunks_exact_mut(4))
    {
        let a = to_u8(f32::from(b[3]) + f32::from(g[3]) * k);
        for c in 0..3 {
            d[c] = to_u8(f32::from(b[c]) + f32::from(g[c]) * k).min(a);
        }
        d[3] = a;
    }
}

pub(crate) fn composite_over_rgba8_premul(dst: &mut [u8], src: &[u8], blend: BlendMode) {
    debug_assert_eq!(src.len(), dst.len());
    match blend {
        BlendMode::Normal => {
            for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
                premul_over_px_opacity(d, [s[0], s[1], s[2], s[3]], 255);
            }
        }
        BlendMode::Multiply => composite_over_rgba8_premul_blend(dst, src, |s, d| s * d),
        BlendMode::Screen => composite_over_rgba8_premul_blend(dst, src, |s, d| s + d - s * d),
        BlendMode::Overlay => composite_over_rgba8_premul_blend(dst, src, |s, d| {
            if d <= 0.5 {
                2.0 * s * d
            } else {
                1.0 - 2.0 * (1.0 - s) * (1.0 - d)
            }
        }),
        BlendMode::Darken => composite_over_rgba8_premul_blend(dst, src, |s, d| s.min(d)),
        BlendMode::Lighten => composite_over_rgba8_premul_blend(dst, src, |s, d| s.max(d)),
        BlendMode::ColorDodge => composite_over_rgba8_premul_blend(dst, src, |s, d| {
            if s >= 1.0 {
                1.0
            } else {
                (d / (1.0 - s)).min(1.0)
            }
        }),
        BlendMode::ColorBurn => composite_over_rgba8_premul_blend(dst, src, |s, d| {
            if s <= 0.0 {
                0.0
            } else {
                1.0 - ((1.0 - d) / s).min(1.0)
            }
        }),
        BlendMode::SoftLight => composite_over_rgba8_premul_blend(dst, src, |s, d| {
            if s <= 0.5 {
                d - (1.0 - 2.0 * s) * d * (1.0 - d)
            } else {
                let g = if d <= 0.25 {
                    ((16.0 * d - 12.0) * d + 4.0) * d
                } else {
                    d.sqrt()
                };
                d + (2.0 * s - 1.0) * (g - d)
            }
        }),
        BlendMode::HardLight => composite_over_rgba8_premul_blend(dst, src, |s, d| {
            if s <= 0.5 {
                2.0 * s * d
            } else {
                1.0 - 2.0 * (1.0 - s) * (1.0 - d)
            }
        }),
        BlendMode::Difference => composite_over_rgba8_premul_blend(dst, src, |s, d| (d - s).abs()),
        BlendMode::Exclusion => {
            composite_over_rgba8_premul_blend(dst, src, |s, d| d + s - 2.0 * d * s)
        }
    }
}

#[inline(always)]
fn composite_over_rgba8_premul_blend<F>(dst: &mut [u8], src: &[u8], blend_fn: F)
where
    F: Fn(f32, f32) -> f32,
{
    let unpremul = |p: f32, a: f32| if a > 0.0 { (p / a).clamp(0.0, 1.0) } else { 0.0 };
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        // out_a = sa + da * (1 - sa)
        // out_p = sp * (1 - da) + dp * (1 - sa) + B(sc, dc) * sa * da
        let sa = s[3] as f32 / 255.0;
        if sa <= 0.0 {
            continue;
        }
        let da = d[3] as f32 / 255.0;
        let out_a = (sa + da * (1.0 - sa)).clamp(0.0, 1.0);
        for c in 0..3 {
            let sp = s[c] as f32 / 255.0;
            let dp = d[c] as f32 / 255.0;
            let b = blend_fn(unpremul(sp, sa), unpremul(dp, da)).clamp(0.0, 1.0);
            let out = (sp * (1.0 - da) + dp * (1.0 - sa) + b * sa * da).clamp(0.0, 1.0);
            d[c] = to_u8(out * 255.0);
        }
        d[3] = to_u8(out_a * 255.0);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/kernels.rs"]
mod tests;
