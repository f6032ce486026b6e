//! Grouped composites: subtree replay, the merge pass and masking.

pub(crate) mod mask;
pub(crate) mod merge;
pub(crate) mod scratch;

use crate::cache::texture::TextureCache;
use crate::foundation::core::{Affine, IRect};
use crate::foundation::error::StratumResult;
use crate::render::backend::{FrameRGBA, Target};
use crate::render::painter::{Painter, paint_into};
use crate::render::resources::Resources;
use crate::scene::node::Paint;
use crate::scene::structure::skip;
use crate::scene::tree::Scene;
use crate::style::computed::BlendMode;
use smallvec::{SmallVec, smallvec};

/// Pixels of one node layer, placed in node-local space.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeTexture {
    /// Node-local x of the first column.
    pub x: i32,
    /// Node-local y of the first row.
    pub y: i32,
    /// Premultiplied pixels.
    pub frame: FrameRGBA,
}

/// Draw list entries `start..end` under `base`, which maps the space of the depth-`base_lv`
/// parent into the target.
///
/// Hidden subtrees are skipped; grouped nodes are drawn from their composite without walking
/// below them.
pub(crate) fn replay(
    p: &mut Painter<'_>,
    scene: &Scene,
    start: usize,
    end: usize,
    base: Affine,
    base_lv: usize,
) -> StratumResult<()> {
    let list = &scene.list;
    let mut stack: SmallVec<[(usize, Affine, f32); 16]> = smallvec![(base_lv, base, 1.0)];
    let mut j = start;
    while j < end {
        let e = list[j];
        while stack.len() > 1 && stack[stack.len() - 1].0 >= e.lv {
            stack.pop();
        }
        let (_, parent_m, parent_op) = stack[stack.len() - 1];
        let node = scene.node(e.node);
        if !node.style.visible {
            j = skip(list, j, false);
            continue;
        }
        if node.local_opacity <= 0.0 {
            j = skip(list, j, node.is_mask());
            continue;
        }
        let m = parent_m * node.local;
        let op = parent_op * node.local_opacity;
        match node.paint(e.total, e.next) {
            Paint::Group(cache) => {
                p.draw(cache, m, op, node.style.blend_mode)?;
                j = skip(list, j, node.is_mask());
            }
            Paint::Own(cache) => {
                if let Some(cache) = cache {
                    p.draw(cache, m, op, node.style.blend_mode)?;
                }
                stack.push((e.lv, m, op));
                j += 1;
            }
            Paint::Missing => j = skip(list, j, node.is_mask()),
        }
    }
    Ok(())
}

/// Read a cache back as one image covering its pixel-rounded bbox.
pub(crate) fn read_cache(res: &mut Resources, cache: &TextureCache) -> StratumResult<NodeTexture> {
    let region = IRect::round_out(cache.bbox);
    if region.is_empty() {
        return Ok(NodeTexture {
            x: region.x0,
            y: region.y0,
            frame: FrameRGBA {
                width: 0,
                height: 0,
                data: Vec::new(),
                premultiplied: true,
            },
        });
    }
    let frame = res.with_scratch(region.width(), region.height(), |res, tex| {
        let m = Affine::translate((-f64::from(region.x0), -f64::from(region.y0)));
        paint_into(res, Target::Texture(tex), Some([0, 0, 0, 0]), |p| {
            p.draw(cache, m, 1.0, BlendMode::Normal)
        })?;
        res.gpu.read_pixels(Target::Texture(tex))
    })?;
    Ok(NodeTexture {
        x: region.x0,
        y: region.y0,
        frame,
    })
}
