//! Per-frame merge pass: find nodes whose grouped composites are missing, size them, cull them
//! against the viewport and regenerate the visible ones bottom-up.

use crate::cache::texture::{SubTexture, TextureCache};
use crate::cache::{ensure_exact_scale, ensure_own_cache};
use crate::composite::mask::build_mask;
use crate::composite::replay;
use crate::composite::scratch::{Candidate, MergeScratch};
use crate::filter::{apply_chain, expand_bbox};
use crate::foundation::core::{Affine, IRect, Rect};
use crate::foundation::error::{StratumError, StratumResult};
use crate::foundation::ids::NodeId;
use crate::foundation::math::{overlaps, transform_rect_bbox, union_nonempty};
use crate::render::backend::Target;
use crate::render::painter::paint_into;
use crate::render::resources::Resources;
use crate::scene::node::Paint;
use crate::scene::structure::skip;
use crate::scene::tree::Scene;
use crate::style::computed::{BlendMode, Overflow};
use std::ops::Range;

/// Which part of the tree a merge pass covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Scope {
    /// The whole list, culled against the viewport.
    Frame,
    /// One node's subtree and mask reach, generated regardless of the viewport.
    Forced(NodeId),
}

/// Counters of one merge pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Nodes whose composites were missing.
    pub candidates: usize,
    /// Candidates regenerated.
    pub generated: usize,
    /// Candidates left for a later frame because they are off-screen.
    pub culled: usize,
    /// Candidates whose generation failed; they are omitted from this frame.
    pub failed: usize,
}

#[tracing::instrument(skip_all, fields(scope = ?scope))]
pub(crate) fn merge(
    scene: &mut Scene,
    res: &mut Resources,
    scratch: &mut MergeScratch,
    scope: Scope,
) -> StratumResult<MergeStats> {
    scratch.reset();
    let (range, forced) = match scope {
        Scope::Frame => (0..scene.list.len(), false),
        Scope::Forced(id) => {
            let i = scene
                .index_of(id)
                .ok_or_else(|| StratumError::validation(format!("node {} is not attached", id.0)))?;
            (i..skip(&scene.list, i, true), true)
        }
    };

    collect(scene, scratch, range, forced);
    aggregate(scene, scratch);
    resolve_validity(scene, res.viewport, scratch, forced);

    let mut stats = MergeStats {
        candidates: scratch.candidates.len(),
        ..MergeStats::default()
    };
    for c in scratch.candidates.iter().rev() {
        if !c.valid {
            stats.culled += 1;
            continue;
        }
        if let Err(err) = generate(scene, res, c) {
            tracing::warn!(node = c.node.0, %err, "composite generation failed, node skipped");
            stats.failed += 1;
            continue;
        }
        stats.generated += 1;
    }
    tracing::debug!(
        candidates = stats.candidates,
        generated = stats.generated,
        culled = stats.culled,
        failed = stats.failed,
        "merge"
    );
    Ok(stats)
}

/// Phase 1: candidates in pre-order. Hidden subtrees and available groups are skipped.
fn collect(scene: &Scene, scratch: &mut MergeScratch, range: Range<usize>, forced: bool) {
    let list = &scene.list;
    let mut j = range.start;
    while j < range.end {
        let e = list[j];
        let node = scene.node(e.node);
        if !(forced && j == range.start) {
            if !node.style.visible {
                j = skip(list, j, false);
                continue;
            }
            if node.local_opacity <= 0.0 {
                j = skip(list, j, node.is_mask());
                continue;
            }
        }
        if node.is_merge_candidate(e.total, e.next) {
            scratch.candidates.push(Candidate {
                index: j,
                node: e.node,
                temp_bbox: Rect::ZERO,
                out_bbox: Rect::ZERO,
                valid: false,
                nested: false,
                sub: 0..0,
            });
            j += 1;
        } else if matches!(node.paint(e.total, e.next), Paint::Group(_)) {
            j = skip(list, j, node.is_mask());
        } else {
            j += 1;
        }
    }
}

/// Phase 2: subtree extents in reverse pre-order, so nested candidates are sized first.
fn aggregate(scene: &Scene, scratch: &mut MergeScratch) {
    for c in (0..scratch.candidates.len()).rev() {
        let i = scratch.candidates[c].index;
        let e = scene.list[i];
        let node = scene.node(e.node);
        let grouped = node.needs_total(e.total, e.next);
        let temp = match node.caches.total.as_ref() {
            Some(total) if grouped => total.bbox,
            _ if !grouped || node.style.overflow == Overflow::Clip => node.bbox,
            _ => subtree_extent(scene, scratch, i),
        };
        let end = skip(&scene.list, i, node.needs_mask(e.next));
        let sub = scratch.within(i + 1..end);
        let cand = &mut scratch.candidates[c];
        cand.temp_bbox = temp;
        cand.out_bbox = expand_bbox(&node.style, temp);
        cand.sub = sub;
    }
}

/// Union of everything the subtree at `i` draws, in the space of node `i`.
pub(crate) fn subtree_extent(scene: &Scene, scratch: &mut MergeScratch, i: usize) -> Rect {
    let list = &scene.list;
    let root = list[i];
    let mut acc = union_nonempty(None, scene.node(root.node).bbox);
    scratch.stack.clear();
    scratch.stack.push((root.lv, Affine::IDENTITY));
    let end = i + root.total + 1;
    let mut j = i + 1;
    while j < end {
        let e = list[j];
        while scratch.stack.len() > 1 && scratch.stack[scratch.stack.len() - 1].0 >= e.lv {
            scratch.stack.pop();
        }
        let parent_m = scratch.stack[scratch.stack.len() - 1].1;
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
        if let Some(k) = scratch.find(j) {
            acc = union_nonempty(acc, transform_rect_bbox(m, scratch.candidates[k].out_bbox));
            j = skip(list, j, node.is_mask());
            continue;
        }
        match node.paint(e.total, e.next) {
            Paint::Group(cache) => {
                acc = union_nonempty(acc, transform_rect_bbox(m, cache.bbox));
                j = skip(list, j, node.is_mask());
            }
            Paint::Own(_) => {
                acc = union_nonempty(acc, transform_rect_bbox(m, node.bbox));
                scratch.stack.push((e.lv, m));
                j += 1;
            }
            Paint::Missing => j = skip(list, j, node.is_mask()),
        }
    }
    acc.unwrap_or(Rect::ZERO)
}

/// Phase 3: top-level candidates are culled under their world matrix; nested ones inherit.
fn resolve_validity(scene: &Scene, viewport: Rect, scratch: &mut MergeScratch, forced: bool) {
    let n = scratch.candidates.len();
    for c in 0..n {
        for k in scratch.candidates[c].sub.clone() {
            scratch.candidates[k].nested = true;
        }
    }
    for c in 0..n {
        let cand = &scratch.candidates[c];
        let valid = forced
            || cand.valid
            || (!cand.nested
                && overlaps(
                    transform_rect_bbox(scene.node(cand.node).world, cand.out_bbox),
                    viewport,
                ));
        scratch.candidates[c].valid = valid;
        if valid {
            for k in scratch.candidates[c].sub.clone() {
                scratch.candidates[k].valid = true;
            }
        }
    }
}

/// Build the missing layers of one candidate: total, then filter, then mask.
fn generate(scene: &mut Scene, res: &mut Resources, cand: &Candidate) -> StratumResult<()> {
    let (index, id) = (cand.index, cand.node);
    let e = scene.list[index];
    let node = scene.node(id);
    let needs_total = node.needs_total(e.total, e.next);
    let needs_filter = node.needs_filter();
    let needs_mask = node.needs_mask(e.next);

    if needs_total && node.caches.total.is_none() {
        ensure_subtree_caches(scene, res, index)?;
        let total = build_total(scene, res, index, cand.temp_bbox)?;
        scene.node_mut(id).caches.total = Some(total);
    }

    if needs_filter && scene.node(id).caches.filter.is_none() {
        if !needs_total {
            ensure_exact_scale(scene.node_mut(id), res)?;
        }
        let node = scene.node(id);
        let src = if needs_total {
            node.caches.total.as_ref()
        } else {
            node.caches.cache.as_ref()
        };
        let filtered = match src {
            Some(src) => apply_chain(res, src, &node.style, node.bbox)?,
            None => TextureCache::owned(Vec::new(), &res.release),
        };
        scene.node_mut(id).caches.filter = Some(filtered);
    }

    if needs_mask && scene.node(id).caches.mask.is_none() {
        if !needs_total && !needs_filter {
            ensure_exact_scale(scene.node_mut(id), res)?;
        }
        let start = index + e.total + 1;
        let end = skip(&scene.list, index, true);
        ensure_range_caches(scene, res, start..end)?;
        let masked = build_mask(scene, res, index)?;
        scene.node_mut(id).caches.mask = Some(masked);
    }
    Ok(())
}

/// Own caches of the node at `index` and of everything drawn below it.
pub(crate) fn ensure_subtree_caches(
    scene: &mut Scene,
    res: &mut Resources,
    index: usize,
) -> StratumResult<()> {
    let e = scene.list[index];
    ensure_own_cache(scene.node_mut(e.node), res)?;
    ensure_range_caches(scene, res, index + 1..index + e.total + 1)
}

/// Own caches of every node in `range` that will be drawn from its own content.
pub(crate) fn ensure_range_caches(
    scene: &mut Scene,
    res: &mut Resources,
    range: Range<usize>,
) -> StratumResult<()> {
    let mut j = range.start;
    while j < range.end {
        let e = scene.list[j];
        let node = scene.node(e.node);
        if !node.style.visible {
            j = skip(&scene.list, j, false);
            continue;
        }
        if node.local_opacity <= 0.0 {
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

/// Replay the subtree at `index` into tiles covering `extent` (node-local).
pub(crate) fn build_total(
    scene: &Scene,
    res: &mut Resources,
    index: usize,
    extent: Rect,
) -> StratumResult<TextureCache> {
    let e = scene.list[index];
    let node = scene.node(e.node);
    let region = IRect::round_out(extent);
    let mut out = TextureCache::owned(Vec::new(), &res.release);
    for tile in region.tiles(res.unit) {
        let texture = res.gpu.create_texture(tile.width(), tile.height(), None)?;
        out.push(SubTexture {
            texture,
            bbox: tile.to_rect(),
            width: tile.width(),
            height: tile.height(),
            tc: None,
        });
        let m0 = Affine::translate((-f64::from(tile.x0), -f64::from(tile.y0)));
        paint_into(res, Target::Texture(texture), Some([0, 0, 0, 0]), |p| {
            if let Some(own) = node.caches.cache.as_ref() {
                p.draw(own, m0, 1.0, BlendMode::Normal)?;
            }
            replay(p, scene, index + 1, index + e.total + 1, m0, e.lv)
        })?;
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/composite/merge.rs"]
mod tests;
