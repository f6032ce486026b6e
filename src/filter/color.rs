//! 4×5 straight-alpha color matrices, row-major with the offset in the last column.

use crate::foundation::error::StratumResult;
use crate::foundation::ids::TextureId;
use crate::render::backend::{Program, Target};
use crate::render::resources::Resources;
use crate::style::filter::Filter;

pub(crate) const IDENTITY: [f32; 20] = [
    1.0, 0.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 0.0, 1.0, 0.0,
];

fn rgb(rows: [[f32; 3]; 3], offset: f32) -> [f32; 20] {
    let mut m = IDENTITY;
    for (i, row) in rows.iter().enumerate() {
        m[i * 5..i * 5 + 3].copy_from_slice(row);
        m[i * 5 + 4] = offset;
    }
    m
}

pub(crate) fn hue_rotate(degrees: f32) -> [f32; 20] {
    let (sin, cos) = degrees.to_radians().sin_cos();
    rgb(
        [
            [
                0.213 + cos * 0.787 - sin * 0.213,
                0.715 - cos * 0.715 - sin * 0.715,
                0.072 - cos * 0.072 + sin * 0.928,
            ],
            [
                0.213 - cos * 0.213 + sin * 0.143,
                0.715 + cos * 0.285 + sin * 0.140,
                0.072 - cos * 0.072 - sin * 0.283,
            ],
            [
                0.213 - cos * 0.213 - sin * 0.787,
                0.715 - cos * 0.715 + sin * 0.715,
                0.072 + cos * 0.928 + sin * 0.072,
            ],
        ],
        0.0,
    )
}

pub(crate) fn saturate(s: f32) -> [f32; 20] {
    rgb(
        [
            [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
            [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
            [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
        ],
        0.0,
    )
}

pub(crate) fn grayscale(amount: f32) -> [f32; 20] {
    let g = 1.0 - amount.clamp(0.0, 1.0);
    rgb(
        [
            [0.2126 + 0.7874 * g, 0.7152 - 0.7152 * g, 0.0722 - 0.0722 * g],
            [0.2126 - 0.2126 * g, 0.7152 + 0.2848 * g, 0.0722 - 0.0722 * g],
            [0.2126 - 0.2126 * g, 0.7152 - 0.7152 * g, 0.0722 + 0.9278 * g],
        ],
        0.0,
    )
}

pub(crate) fn sepia(amount: f32) -> [f32; 20] {
    let g = 1.0 - amount.clamp(0.0, 1.0);
    rgb(
        [
            [0.393 + 0.607 * g, 0.769 - 0.769 * g, 0.189 - 0.189 * g],
            [0.349 - 0.349 * g, 0.686 + 0.314 * g, 0.168 - 0.168 * g],
            [0.272 - 0.272 * g, 0.534 - 0.534 * g, 0.131 + 0.869 * g],
        ],
        0.0,
    )
}

/// Additive light (positive) or dark (negative) offset.
pub(crate) fn brightness(amount: f32) -> [f32; 20] {
    rgb([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]], amount)
}

pub(crate) fn contrast(c: f32) -> [f32; 20] {
    rgb([[c, 0.0, 0.0], [0.0, c, 0.0], [0.0, 0.0, c]], 0.5 * (1.0 - c))
}

pub(crate) fn invert(amount: f32) -> [f32; 20] {
    let a = amount.clamp(0.0, 1.0);
    let k = 1.0 - 2.0 * a;
    rgb([[k, 0.0, 0.0], [0.0, k, 0.0], [0.0, 0.0, k]], a)
}

/// Matrix for a pointwise color filter; `None` for spatial filters.
pub(crate) fn matrix_for(f: &Filter) -> Option<[f32; 20]> {
    Some(match *f {
        Filter::HueRotate { degrees } => hue_rotate(degrees),
        Filter::Saturate { amount } => saturate(amount),
        Filter::Brightness { amount } => brightness(amount),
        Filter::Contrast { amount } => contrast(amount),
        Filter::Sepia { amount } => sepia(amount),
        Filter::Grayscale { amount } => grayscale(amount),
        Filter::Invert { amount } => invert(amount),
        _ => return None,
    })
}

/// `outer ∘ inner`: apply `inner` first.
pub(crate) fn compose(outer: &[f32; 20], inner: &[f32; 20]) -> [f32; 20] {
    let mut out = [0.0f32; 20];
    for i in 0..4 {
        for j in 0..5 {
            let mut v = (0..4).map(|k| outer[i * 5 + k] * inner[k * 5 + j]).sum::<f32>();
            if j == 4 {
                v += outer[i * 5 + 4];
            }
            out[i * 5 + j] = v;
        }
    }
    out
}

pub(crate) fn is_identity(m: &[f32; 20]) -> bool {
    m.iter().zip(IDENTITY.iter()).all(|(a, b)| (a - b).abs() <= 1e-6)
}

pub(crate) fn run(res: &mut Resources, tex: TextureId, m: [f32; 20]) -> StratumResult<()> {
    let t = Target::Texture(tex);
    res.gpu.run_program(&Program::ColorMatrix(m), &[t], t)
}

#[cfg(test)]
#[path = "../../tests/unit/filter/color.rs"]
mod tests;
