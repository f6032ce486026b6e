use crate::cache::texture::TextureCache;
use crate::foundation::core::{Affine, Point, Rect};
use crate::foundation::error::StratumResult;
use crate::foundation::math::{overlaps, transform_rect_bbox};
use crate::render::backend::{GpuBackend, Program, Target, with_target};
use crate::render::batch::QuadBatch;
use crate::render::resources::Resources;
use crate::style::computed::BlendMode;

/// Emits textured quads into one bound target, flushing at the texture-unit limit.
pub(crate) struct Painter<'a> {
    gpu: &'a mut dyn GpuBackend,
    batch: &'a mut QuadBatch,
    target: Target,
    bounds: Rect,
    batching: bool,
    pub(crate) quads: u64,
}

impl<'a> Painter<'a> {
    /// Painter over `target`, which must be the bound target.
    pub(crate) fn new(gpu: &'a mut dyn GpuBackend, batch: &'a mut QuadBatch, target: Target) -> Self {
        let (w, h) = gpu.target_size();
        let batching = gpu.supports_batching();
        batch.clear();
        Self {
            gpu,
            batch,
            target,
            bounds: Rect::new(0.0, 0.0, f64::from(w), f64::from(h)),
            batching,
            quads: 0,
        }
    }

    /// Draw every sub-texture of `cache` under `m` (cache-local to target pixels).
    pub(crate) fn draw(
        &mut self,
        cache: &TextureCache,
        m: Affine,
        opacity: f32,
        blend: BlendMode,
    ) -> StratumResult<()> {
        if opacity <= 0.0 || cache.subs.is_empty() {
            return Ok(());
        }
        if !overlaps(transform_rect_bbox(m, cache.bbox), self.bounds) {
            return Ok(());
        }
        if blend == BlendMode::Normal {
            self.quads += emit(
                &mut *self.gpu,
                self.batch,
                self.bounds,
                self.batching,
                cache,
                m,
                opacity,
            )?;
            return Ok(());
        }

        // Non-normal blending: draw into a cleared intermediate, then blend it onto the target.
        self.flush()?;
        let (w, h) = (self.bounds.width() as u32, self.bounds.height() as u32);
        let scratch = self.gpu.create_texture(w, h, None)?;
        let (bounds, batching) = (self.bounds, self.batching);
        let batch = &mut *self.batch;
        let drawn = with_target(&mut *self.gpu, Target::Texture(scratch), |gpu| {
            gpu.clear([0, 0, 0, 0])?;
            let n = emit(gpu, batch, bounds, batching, cache, m, opacity)?;
            flush(gpu, batch)?;
            Ok(n)
        });
        let out = drawn.and_then(|n| {
            self.quads += n;
            self.gpu.run_program(
                &Program::Blend(blend),
                &[Target::Texture(scratch), self.target],
                self.target,
            )
        });
        self.gpu.delete_texture(scratch);
        out
    }

    pub(crate) fn flush(&mut self) -> StratumResult<()> {
        flush(&mut *self.gpu, self.batch)
    }
}

/// Bind `target`, optionally clear it, and paint through `f`. Returns the quads emitted.
pub(crate) fn paint_into(
    res: &mut Resources,
    target: Target,
    clear: Option<[u8; 4]>,
    f: impl FnOnce(&mut Painter<'_>) -> StratumResult<()>,
) -> StratumResult<u64> {
    let Resources { gpu, batch, .. } = res;
    with_target(gpu.as_mut(), target, |gpu| {
        if let Some(rgba) = clear {
            gpu.clear(rgba)?;
        }
        let mut painter = Painter::new(gpu, batch, target);
        f(&mut painter)?;
        painter.flush()?;
        Ok(painter.quads)
    })
}

fn flush(gpu: &mut dyn GpuBackend, batch: &mut QuadBatch) -> StratumResult<()> {
    if batch.is_empty() {
        return Ok(());
    }
    gpu.draw_batch(batch)?;
    batch.clear();
    Ok(())
}

fn emit(
    gpu: &mut dyn GpuBackend,
    batch: &mut QuadBatch,
    bounds: Rect,
    batching: bool,
    cache: &TextureCache,
    m: Affine,
    opacity: f32,
) -> StratumResult<u64> {
    let mut n = 0;
    for sub in &cache.subs {
        let b = sub.bbox;
        if !overlaps(transform_rect_bbox(m, b), bounds) {
            continue;
        }
        let corners = [
            m * Point::new(b.x0, b.y0),
            m * Point::new(b.x1, b.y0),
            m * Point::new(b.x0, b.y1),
            m * Point::new(b.x1, b.y1),
        ];
        let tc = sub.tex_coords();
        if !batch.push_quad(sub.texture, corners, tc, opacity) {
            flush(gpu, batch)?;
            batch.push_quad(sub.texture, corners, tc, opacity);
        }
        n += 1;
        if !batching {
            flush(gpu, batch)?;
        }
    }
    Ok(n)
}

#[cfg(test)]
#[path = "../../tests/unit/render/painter.rs"]
mod tests;
