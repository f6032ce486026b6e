use crate::cache::texture::{SubTexture, TextureCache};
use crate::filter::PassFx;
use crate::foundation::core::{Affine, IRect};
use crate::foundation::error::StratumResult;
use crate::render::backend::{Program, Target};
use crate::render::painter::paint_into;
use crate::render::resources::Resources;
use crate::style::computed::BlendMode;

/// Snap `r` outward so both corners sit on multiples of `align`.
pub(crate) fn align_out(r: IRect, align: i32) -> IRect {
    if align <= 1 {
        return r;
    }
    let down = |v: i32| v.div_euclid(align) * align;
    let up = |v: i32| {
        let d = down(v);
        if d == v { v } else { d + align }
    };
    IRect::new(down(r.x0), down(r.y0), up(r.x1), up(r.y1))
}

/// Shrink `scratch` around `tile` so neither side exceeds `limit`, keeping grid alignment.
///
/// The pass then sees less support than it asks for near the cut edges.
pub(crate) fn bound_scratch(scratch: IRect, tile: IRect, limit: u32, align: i32) -> IRect {
    if scratch.width() <= limit && scratch.height() <= limit {
        return scratch;
    }
    let margin = |side: u32| {
        let room = i32::try_from(limit.saturating_sub(side) / 2).unwrap_or(i32::MAX);
        (room - align.max(1)).max(0)
    };
    let (mx, my) = (margin(tile.width()), margin(tile.height()));
    align_out(scratch.intersect(tile.inflate(mx, my)), align)
}

/// Run one pass over a possibly tiled source, producing output tiles of at most `unit` pixels.
///
/// Every output tile is computed from a scratch covering the tile plus the pass support, so
/// tile edges match a single-tile run. A scratch larger than the backend's texture limit is
/// cut down around the tile.
pub(crate) fn run_tiled(
    res: &mut Resources,
    src: &TextureCache,
    pass: &PassFx,
) -> StratumResult<TextureCache> {
    let mut out = TextureCache::owned(Vec::new(), &res.release);
    let input = IRect::round_out(src.bbox);
    if input.is_empty() || src.subs.is_empty() {
        return Ok(out);
    }
    let region = pass.out_region(input);
    let align = pass.align();
    let limit = res.gpu.max_texture_size();
    let mut cut = 0usize;

    for tile in region.tiles(res.unit) {
        let wanted = align_out(pass.scratch_region(tile), align);
        let scratch = bound_scratch(wanted, tile, limit, align);
        if scratch != wanted {
            cut += 1;
        }
        let (sw, sh) = (scratch.width(), scratch.height());
        let texture = res.with_scratch(sw, sh, |res, tex| {
            let m = Affine::translate((-f64::from(scratch.x0), -f64::from(scratch.y0)));
            paint_into(res, Target::Texture(tex), Some([0, 0, 0, 0]), |p| {
                p.draw(src, m, 1.0, BlendMode::Normal)
            })?;
            pass.run(res, tex, scratch)?;

            let dst = res.gpu.create_texture(tile.width(), tile.height(), None)?;
            let crop = Program::Crop {
                x: tile.x0 - scratch.x0,
                y: tile.y0 - scratch.y0,
            };
            if let Err(e) =
                res.gpu
                    .run_program(&crop, &[Target::Texture(tex)], Target::Texture(dst))
            {
                res.gpu.delete_texture(dst);
                return Err(e);
            }
            Ok(dst)
        })?;
        out.push(SubTexture {
            texture,
            bbox: tile.to_rect(),
            width: tile.width(),
            height: tile.height(),
            tc: None,
        });
    }
    if cut > 0 {
        tracing::warn!(tiles = cut, limit, "filter support cut to the texture size limit");
    }
    tracing::trace!(tiles = out.subs.len(), ?region, "filter pass");
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/filter/tiled.rs"]
mod tests;
