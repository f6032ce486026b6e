use crate::foundation::core::{IRect, Point, Rect};
use crate::foundation::error::StratumResult;
use crate::foundation::ids::TextureId;
use crate::render::backend::{Program, Target};
use crate::render::resources::Resources;

pub(crate) const SAMPLES: u32 = 32;

fn scale_about(r: Rect, c: Point, k: f64) -> Rect {
    Rect::new(
        c.x + (r.x0 - c.x) * k,
        c.y + (r.y0 - c.y) * k,
        c.x + (r.x1 - c.x) * k,
        c.y + (r.y1 - c.y) * k,
    )
}

/// Input scaled about the center by `1 / (1 - strength)`, unioned with the input.
pub(crate) fn out_region(input: IRect, center: Point, strength: f32) -> IRect {
    let s = f64::from(strength.clamp(0.0, 0.9));
    let r = input.to_rect();
    let grown = scale_about(r, center, 1.0 / (1.0 - s));
    IRect::round_out(r.union(grown))
}

/// The tile plus the tile pulled toward the center; every sample of a tile pixel lands inside.
pub(crate) fn scratch_region(tile: IRect, center: Point, strength: f32) -> IRect {
    let s = f64::from(strength.clamp(0.0, 0.9));
    let r = tile.to_rect();
    let pulled = scale_about(r, center, 1.0 - s);
    IRect::round_out(r.union(pulled)).inflate(2, 2)
}

/// Zoom blur in place; `region` places the texture in node-local pixels.
pub(crate) fn run(
    res: &mut Resources,
    tex: TextureId,
    region: IRect,
    center: Point,
    strength: f32,
) -> StratumResult<()> {
    let t = Target::Texture(tex);
    let program = Program::Radial {
        center: [
            (center.x - f64::from(region.x0)) as f32,
            (center.y - f64::from(region.y0)) as f32,
        ],
        strength,
        samples: SAMPLES,
    };
    res.gpu.run_program(&program, &[t], t)
}
