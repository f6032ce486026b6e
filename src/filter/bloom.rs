use crate::foundation::error::StratumResult;
use crate::foundation::ids::TextureId;
use crate::render::backend::{Program, Target};
use crate::render::resources::Resources;

/// Pyramid depth for a glow radius.
pub(crate) fn levels(sigma: f32) -> u32 {
    (sigma.max(1.0).log2().ceil() as i32).clamp(1, 4) as u32
}

pub(crate) fn spread(sigma: f32) -> i32 {
    3 << levels(sigma)
}

pub(crate) fn support(sigma: f32) -> i32 {
    (4 << levels(sigma)) + 4
}

/// Threshold, blur through a Kawase pyramid and add the glow back onto `tex`.
pub(crate) fn run(
    res: &mut Resources,
    tex: TextureId,
    w: u32,
    h: u32,
    threshold: f32,
    sigma: f32,
    strength: f32,
) -> StratumResult<()> {
    let glow = res.gpu.create_texture(w, h, None)?;
    let mut chain = vec![glow];
    let out = glow_chain(res, tex, &mut chain, w, h, threshold, levels(sigma), strength);
    for id in chain {
        res.gpu.delete_texture(id);
    }
    out
}

#[allow(clippy::too_many_arguments)]
fn glow_chain(
    res: &mut Resources,
    tex: TextureId,
    chain: &mut Vec<TextureId>,
    w: u32,
    h: u32,
    threshold: f32,
    levels: u32,
    strength: f32,
) -> StratumResult<()> {
    let glow = chain[0];
    res.gpu.run_program(
        &Program::Threshold(threshold),
        &[Target::Texture(tex)],
        Target::Texture(glow),
    )?;

    let mut size = (w, h);
    for _ in 0..levels {
        size = (size.0.div_ceil(2).max(1), size.1.div_ceil(2).max(1));
        let next = res.gpu.create_texture(size.0, size.1, None)?;
        let prev = chain[chain.len() - 1];
        chain.push(next);
        res.gpu.run_program(
            &Program::KawaseDown,
            &[Target::Texture(prev)],
            Target::Texture(next),
        )?;
    }
    for k in (0..chain.len() - 1).rev() {
        res.gpu.run_program(
            &Program::KawaseUp,
            &[Target::Texture(chain[k + 1])],
            Target::Texture(chain[k]),
        )?;
    }

    res.gpu.run_program(
        &Program::Add { strength },
        &[Target::Texture(tex), Target::Texture(glow)],
        Target::Texture(tex),
    )
}
