//! Dirty-level propagation: style changes in, minimal recomputation and cache release out.

use crate::foundation::ids::NodeId;
use crate::scene::compute;
use crate::scene::tree::Scene;
use crate::style::computed::{StyleChange, StyleKey};
use crate::style::level::{RefreshLevel, level_for_key};

/// Outcome of one update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct UpdateOutcome {
    pub(crate) level: RefreshLevel,
    pub(crate) schedule: bool,
}

/// Apply `changes` to a node and invalidate what they affect.
///
/// Changes that leave a value unchanged contribute no level; an empty combined level is a
/// no-op that releases nothing and schedules no frame.
pub(crate) fn add_update(
    scene: &mut Scene,
    id: NodeId,
    changes: impl IntoIterator<Item = StyleChange>,
    explicit: RefreshLevel,
) -> UpdateOutcome {
    let mut level = explicit;
    let mut own_visibility = false;
    {
        let node = scene.node_mut(id);
        for change in changes {
            let key = change.key();
            if node.style.apply(change) {
                level |= level_for_key(key);
                own_visibility |= key == StyleKey::Visible;
            }
        }
    }
    if level.is_empty() {
        return UpdateOutcome::default();
    }

    recompute(scene, id, level);
    release(scene, id, level);

    let schedule =
        scene.node(id).attached && scene.is_visible_chain(id, !own_visibility);
    tracing::trace!(node = id.0, level = ?level, schedule, "update");
    UpdateOutcome { level, schedule }
}

fn recompute(scene: &mut Scene, id: NodeId, level: RefreshLevel) {
    let node = scene.node_mut(id);
    node.refresh_level |= level;
    if level.contains(RefreshLevel::REFLOW) {
        compute::cal_reflow(node);
    } else if level.touches_transform() {
        compute::cal_matrix(node, level & RefreshLevel::TRANSFORM_ALL);
    }
    if level.contains(RefreshLevel::OPACITY) {
        compute::cal_opacity(node);
    }
    if level.contains(RefreshLevel::FILTER) {
        compute::cal_filter(node);
    }
    if level.contains(RefreshLevel::REPAINT) {
        compute::cal_repaint(node);
    }
    if level.contains(RefreshLevel::MASK) {
        let parent = node.parent;
        if let Some(p) = parent {
            scene.refresh_mask_reach(p);
        }
    }
}

fn release(scene: &mut Scene, id: NodeId, level: RefreshLevel) {
    let node = scene.node_mut(id);
    if level.intersects(RefreshLevel::REPAINT | RefreshLevel::REFLOW) {
        node.caches.release_all();
    } else if level.contains(RefreshLevel::FILTER) {
        node.caches.filter = None;
        node.caches.mask = None;
    } else if level.contains(RefreshLevel::MASK) {
        node.caches.mask = None;
    }
    // A mask composite bakes in the governed siblings relative to the mask's own matrix.
    if node.is_mask() && level.touches_transform() {
        node.caches.mask = None;
    }
    let regroup = RefreshLevel::OPACITY
        | RefreshLevel::MIX_BLEND
        | RefreshLevel::FILTER
        | RefreshLevel::MASK;
    if level.intersects(regroup) && scene.node(id).caches.total.is_some() {
        let (subtree, reach) = scene
            .index_of(id)
            .map_or((0, 0), |i| (scene.list[i].total, scene.list[i].next));
        let node = scene.node_mut(id);
        if !node.needs_total(subtree, reach) {
            node.caches.total = None;
        }
    }
    scene.clear_tex_cache_upward(id);
}

/// Forced invalidation of the whole attached tree.
///
/// REPAINT and REFLOW release every cache; lower levels leave caches alone.
pub(crate) fn refresh_all(scene: &mut Scene, level: RefreshLevel) -> bool {
    if level.is_empty() {
        return false;
    }
    let release = level.intersects(RefreshLevel::REPAINT | RefreshLevel::REFLOW);
    for e in scene.list.clone() {
        let node = scene.node_mut(e.node);
        node.refresh_level |= level;
        if release {
            node.caches.release_all();
        }
    }
    true
}

#[cfg(test)]
#[path = "../../tests/unit/refresh/mod.rs"]
mod tests;
