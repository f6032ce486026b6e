use crate::filter::MAX_BLUR_SIGMA;
use crate::foundation::error::StratumResult;
use crate::foundation::ids::TextureId;
use crate::render::backend::{Axis, Program, Target};
use crate::render::resources::Resources;

/// Box widths whose iterated application approximates a gaussian of `sigma`.
///
/// Widths are odd; the first `m` use the lower width and the rest the upper one.
pub(crate) fn boxes_for_gauss(sigma: f32, n: usize) -> Vec<u32> {
    let nf = n as f32;
    let sigma = sigma.clamp(0.0, MAX_BLUR_SIGMA);
    let w_ideal = (12.0 * sigma * sigma / nf + 1.0).sqrt();
    let mut wl = w_ideal.floor() as i32;
    if wl % 2 == 0 {
        wl -= 1;
    }
    let wl = wl.max(1);
    let wu = wl + 2;
    let wlf = wl as f32;
    let m_ideal =
        (12.0 * sigma * sigma - nf * wlf * wlf - 4.0 * nf * wlf - 3.0 * nf) / (-4.0 * wlf - 4.0);
    let m = m_ideal.round().max(0.0) as usize;
    (0..n)
        .map(|i| if i < m { wl as u32 } else { wu as u32 })
        .collect()
}

/// Halving steps taken before the box passes.
pub(crate) fn kawase_steps(sigma: f32) -> u32 {
    match sigma {
        s if s >= 128.0 => 4,
        s if s >= 64.0 => 3,
        s if s >= 32.0 => 2,
        s if s >= 16.0 => 1,
        _ => 0,
    }
}

fn radii(sigma: f32) -> Vec<u32> {
    let sigma = sigma.clamp(0.0, MAX_BLUR_SIGMA);
    let small = sigma / (1u32 << kawase_steps(sigma)) as f32;
    boxes_for_gauss(small, 3)
        .into_iter()
        .map(|w| (w - 1) / 2)
        .collect()
}

fn radius_sum(sigma: f32) -> i32 {
    radii(sigma).iter().fold(0i32, |acc, r| acc.saturating_add_unsigned(*r))
}

/// Pixels the blurred output reaches past its input.
pub(crate) fn spread(sigma: f32) -> i32 {
    let steps = kawase_steps(sigma);
    let three_sigma = (3.0 * sigma.clamp(0.0, MAX_BLUR_SIGMA)).ceil() as i32;
    three_sigma.max(radius_sum(sigma).saturating_mul(1 << steps))
}

/// Input pixels around an output pixel that can influence it.
pub(crate) fn support(sigma: f32) -> i32 {
    let steps = kawase_steps(sigma);
    radius_sum(sigma)
        .saturating_add(8)
        .saturating_mul(1 << steps)
}

fn box_passes(res: &mut Resources, tex: TextureId, sigma: f32) -> StratumResult<()> {
    let t = Target::Texture(tex);
    for radius in radii(sigma) {
        for axis in [Axis::X, Axis::Y] {
            res.gpu.run_program(&Program::BoxBlur { radius, axis }, &[t], t)?;
        }
    }
    Ok(())
}

/// Blur a `w × h` texture in place.
pub(crate) fn run(res: &mut Resources, tex: TextureId, w: u32, h: u32, sigma: f32) -> StratumResult<()> {
    let steps = kawase_steps(sigma);
    if steps == 0 {
        return box_passes(res, tex, sigma);
    }

    let mut levels = vec![tex];
    let out = pyramid(res, &mut levels, w, h, steps, sigma);
    for id in levels.into_iter().skip(1) {
        res.gpu.delete_texture(id);
    }
    out
}

fn pyramid(
    res: &mut Resources,
    levels: &mut Vec<TextureId>,
    w: u32,
    h: u32,
    steps: u32,
    sigma: f32,
) -> StratumResult<()> {
    let mut size = (w, h);
    for _ in 0..steps {
        size = (size.0.div_ceil(2).max(1), size.1.div_ceil(2).max(1));
        let next = res.gpu.create_texture(size.0, size.1, None)?;
        let prev = levels[levels.len() - 1];
        levels.push(next);
        res.gpu.run_program(
            &Program::KawaseDown,
            &[Target::Texture(prev)],
            Target::Texture(next),
        )?;
    }

    let smallest = levels[levels.len() - 1];
    box_passes(res, smallest, sigma)?;

    for k in (0..levels.len() - 1).rev() {
        res.gpu.run_program(
            &Program::KawaseUp,
            &[Target::Texture(levels[k + 1])],
            Target::Texture(levels[k]),
        )?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/filter/blur.rs"]
mod tests;
