use crate::filter::MAX_MOTION_DISTANCE;
use crate::foundation::error::StratumResult;
use crate::foundation::ids::TextureId;
use crate::render::backend::{Program, Target};
use crate::render::resources::Resources;

const ITERATIONS: i32 = 3;

fn reach(d: f32) -> i32 {
    let d = d.abs().min(MAX_MOTION_DISTANCE);
    // Each tent pass reaches a third of the length plus one bilinear texel.
    ITERATIONS * ((d / ITERATIONS as f32).ceil() as i32 + 1)
}

/// Pixels the output reaches past its input along each axis.
pub(crate) fn spread(dx: f32, dy: f32) -> (i32, i32) {
    (reach(dx), reach(dy))
}

pub(crate) fn support(dx: f32, dy: f32) -> (i32, i32) {
    let (sx, sy) = spread(dx, dy);
    (sx.saturating_add(3), sy.saturating_add(3))
}

/// Blur along `(dx, dy)` in place with three tent passes.
pub(crate) fn run(res: &mut Resources, tex: TextureId, dx: f32, dy: f32) -> StratumResult<()> {
    let t = Target::Texture(tex);
    let step = Program::MotionTent {
        dx: dx / ITERATIONS as f32,
        dy: dy / ITERATIONS as f32,
    };
    for _ in 0..ITERATIONS {
        res.gpu.run_program(&step, &[t], t)?;
    }
    Ok(())
}
