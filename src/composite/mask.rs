use crate::cache::texture::{SubTexture, TextureCache};
use crate::composite::replay;
use crate::foundation::core::{Affine, IRect};
use crate::foundation::error::StratumResult;
use crate::render::backend::{Program, Target};
use crate::render::painter::paint_into;
use crate::render::resources::Resources;
use crate::scene::structure::skip;
use crate::scene::tree::Scene;
use crate::style::computed::BlendMode;

/// Composite the siblings governed by the mask at `index`, weighted by the mask's layer.
///
/// The result lives in the mask's local space and is tiled over the mask's own extent.
pub(crate) fn build_mask(scene: &Scene, res: &mut Resources, index: usize) -> StratumResult<TextureCache> {
    let e = scene.list[index];
    let mask = scene.node(e.node);
    let mut out = TextureCache::owned(Vec::new(), &res.release);
    let Some(shape) = mask.caches.unmasked() else {
        return Ok(out);
    };

    let start = index + e.total + 1;
    let end = skip(&scene.list, index, true);
    // Siblings share the mask's parent space; bring them into the mask's own.
    let to_mask = mask.local.inverse();
    let mode = mask.style.mask_mode;
    let region = IRect::round_out(shape.bbox);

    for tile in region.tiles(res.unit) {
        let (w, h) = (tile.width(), tile.height());
        let texture = res.gpu.create_texture(w, h, None)?;
        out.push(SubTexture {
            texture,
            bbox: tile.to_rect(),
            width: w,
            height: h,
            tc: None,
        });
        let m0 = Affine::translate((-f64::from(tile.x0), -f64::from(tile.y0)));

        res.with_scratch(w, h, |res, weights| {
            paint_into(res, Target::Texture(weights), Some([0, 0, 0, 0]), |p| {
                p.draw(shape, m0, 1.0, BlendMode::Normal)
            })?;
            res.with_scratch(w, h, |res, content| {
                paint_into(res, Target::Texture(content), Some([0, 0, 0, 0]), |p| {
                    if mode.with_background() {
                        p.draw(shape, m0, 1.0, BlendMode::Normal)?;
                    }
                    replay(p, scene, start, end, m0 * to_mask, e.lv.saturating_sub(1))
                })?;
                res.gpu.run_program(
                    &Program::Mask(mode),
                    &[Target::Texture(content), Target::Texture(weights)],
                    Target::Texture(texture),
                )
            })
        })?;
    }
    tracing::trace!(node = e.node.0, governed = e.next, tiles = out.subs.len(), "mask");
    Ok(out)
}
