use crate::cache::ensure_own_cache;
use crate::foundation::core::Affine;
use crate::foundation::error::StratumResult;
use crate::render::backend::Target;
use crate::render::painter::paint_into;
use crate::render::resources::Resources;
use crate::scene::node::Paint;
use crate::scene::structure::skip;
use crate::scene::tree::Scene;

/// Counters of one drawn frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Quads emitted to the screen.
    pub quads: u64,
    /// Draw calls issued for the whole frame, composites included.
    pub draw_calls: u64,
    /// Nodes whose world matrix was recomputed.
    pub world_updates: usize,
}

/// Refresh world matrices and opacities of visible nodes, parents first.
///
/// A node is recomputed when its own local state changed or when its parent's world version
/// differs from the one it last saw.
pub(crate) fn update_world(scene: &mut Scene) -> usize {
    let mut updated = 0;
    let mut j = 0;
    while j < scene.list.len() {
        let id = scene.list[j].node;
        let node = scene.node(id);
        if !node.style.visible {
            j = skip(&scene.list, j, false);
            continue;
        }
        let (parent_world, parent_opacity, parent_version) = match node.parent {
            Some(p) => {
                let p = scene.node(p);
                (p.world, p.world_opacity, p.world_version)
            }
            None => (Affine::IDENTITY, 1.0, 0),
        };
        if node.local_dirty || node.parent_version_seen != parent_version {
            let version = scene.next_version();
            let node = scene.node_mut(id);
            node.world = parent_world * node.local;
            node.world_opacity = parent_opacity * node.local_opacity;
            node.world_version = version;
            node.parent_version_seen = parent_version;
            node.local_dirty = false;
            updated += 1;
        }
        j += 1;
    }
    updated
}

/// Draw the flattened list onto the screen.
#[tracing::instrument(skip_all)]
pub(crate) fn render_frame(
    scene: &mut Scene,
    res: &mut Resources,
    clear: [u8; 4],
) -> StratumResult<FrameStats> {
    let world_updates = update_world(scene);
    ensure_visible_caches(scene, res)?;

    let calls_before = res.gpu.stats().draw_calls;
    let scene = &*scene;
    let quads = paint_into(res, Target::Screen, Some(clear), |p| {
        let list = &scene.list;
        let mut j = 0;
        while j < list.len() {
            let e = list[j];
            let node = scene.node(e.node);
            if !node.style.visible {
                j = skip(list, j, false);
                continue;
            }
            if node.world_opacity <= 0.0 {
                j = skip(list, j, node.is_mask());
                continue;
            }
            let blend = node.style.blend_mode;
            match node.paint(e.total, e.next) {
                Paint::Group(cache) => {
                    p.draw(cache, node.world, node.world_opacity, blend)?;
                    j = skip(list, j, node.is_mask());
                }
                Paint::Own(cache) => {
                    if let Some(cache) = cache {
                        p.draw(cache, node.world, node.world_opacity, blend)?;
                    }
                    j += 1;
                }
                Paint::Missing => j = skip(list, j, node.is_mask()),
            }
        }
        Ok(())
    })?;

    let stats = FrameStats {
        quads,
        draw_calls: res.gpu.stats().draw_calls - calls_before,
        world_updates,
    };
    tracing::debug!(quads, draw_calls = stats.draw_calls, world_updates, "frame");
    Ok(stats)
}

fn ensure_visible_caches(scene: &mut Scene, res: &mut Resources) -> StratumResult<()> {
    let mut j = 0;
    while j < scene.list.len() {
        let e = scene.list[j];
        let node = scene.node(e.node);
        if !node.style.visible {
            j = skip(&scene.list, j, false);
            continue;
        }
        if node.world_opacity <= 0.0 {
            j = skip(&scene.list, j, node.is_mask());
            continue;
        }
        match node.paint(e.total, e.next) {
            Paint::Own(_) => {
                ensure_own_cache(scene.node_mut(e.node), res)?;
                j += 1;
            }
            Paint::Group(_) | Paint::Missing => j = skip(&scene.list, j, node.is_mask()),
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
