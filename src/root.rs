//! Public façade over the scene, the caches and the backend.

use crate::cache::media_is_stale;
use crate::cache::shared::SharedStats;
use crate::composite::merge::{self, MergeStats, Scope};
use crate::composite::scratch::MergeScratch;
use crate::composite::{NodeTexture, read_cache};
use crate::foundation::core::{Affine, Rect};
use crate::foundation::error::{StratumError, StratumResult};
use crate::foundation::ids::NodeId;
use crate::refresh::{add_update, refresh_all};
use crate::render::backend::{BackendStats, FrameRGBA, GpuBackend, Target};
use crate::render::frame::{self, FrameStats};
use crate::render::resources::Resources;
use crate::scene::content::Content;
use crate::scene::node::FrameSignal;
use crate::scene::structure::StructEntry;
use crate::scene::tree::Scene;
use crate::style::computed::{ComputedStyle, StyleChange};
use crate::style::level::RefreshLevel;

/// Renderer configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RootOpts {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Largest tile edge for rasters, composites and filter passes.
    pub tile_unit: u32,
    /// Premultiplied color the screen is cleared to each frame.
    pub clear_rgba: [u8; 4],
}

impl Default for RootOpts {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            tile_unit: 1024,
            clear_rgba: [0, 0, 0, 0],
        }
    }
}

impl RootOpts {
    /// Options for a `width × height` output with default tiling.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }
}

/// Lifecycle signal emitted after a drawn frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderEvent {
    /// The frame was drawn.
    Drawn {
        /// Frame counter, starting at 1.
        frame: u64,
    },
    /// The frame was drawn and no visible content is still arriving.
    Loaded,
    /// Some visible content is still arriving.
    Waiting,
    /// Content that was arriving is now available.
    CanPlay,
}

/// What one [`Root::draw`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Frame counter, starting at 1.
    pub frame: u64,
    /// Composite regeneration.
    pub merge: MergeStats,
    /// Screen pass.
    pub render: FrameStats,
    /// Textures deleted at the end of the frame.
    pub released: usize,
}

/// Which cache slots of a node are available.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheState {
    /// Own content.
    pub own: bool,
    /// Subtree composite.
    pub total: bool,
    /// Filtered result.
    pub filter: bool,
    /// Masked result.
    pub mask: bool,
}

/// Resource counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RootStats {
    /// Backend texture and draw counters.
    pub backend: BackendStats,
    /// Shared-source table counters.
    pub shared: SharedStats,
    /// Textures waiting for the next collection point.
    pub pending_release: usize,
}

/// A retained scene drawn through a [`GpuBackend`].
///
/// Mutations update computed state immediately and raise dirty levels; the next [`Root::draw`]
/// regenerates whatever composites they invalidated.
pub struct Root {
    opts: RootOpts,
    scene: Scene,
    res: Resources,
    scratch: MergeScratch,
    frame_requested: bool,
    frame: u64,
    was_waiting: bool,
    events: Vec<RenderEvent>,
}

impl Root {
    /// Create a renderer; backend initialization failure is returned as an error.
    pub fn new(opts: RootOpts, gpu: Box<dyn GpuBackend>) -> StratumResult<Self> {
        if opts.width == 0 || opts.height == 0 {
            return Err(StratumError::validation(format!(
                "output size must be non-zero, got {}x{}",
                opts.width, opts.height
            )));
        }
        if opts.tile_unit == 0 {
            return Err(StratumError::validation("tile_unit must be > 0"));
        }
        let canvas = crate::foundation::core::Canvas {
            width: opts.width,
            height: opts.height,
        };
        let res = Resources::new(gpu, canvas, opts.tile_unit)?;
        tracing::debug!(
            width = opts.width,
            height = opts.height,
            unit = res.unit,
            "root created"
        );
        Ok(Self {
            opts,
            scene: Scene::new(f64::from(opts.width), f64::from(opts.height)),
            res,
            scratch: MergeScratch::default(),
            frame_requested: true,
            frame: 0,
            was_waiting: false,
            events: Vec::new(),
        })
    }

    /// Options the renderer was created with.
    pub fn opts(&self) -> RootOpts {
        self.opts
    }

    /// The root node, sized to the output.
    pub fn root_node(&self) -> NodeId {
        self.scene.root
    }

    /// Create a detached node.
    pub fn create_node(&mut self, style: ComputedStyle, content: Content) -> NodeId {
        self.scene.create(style, content)
    }

    /// Name a node for lookup.
    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) -> StratumResult<()> {
        self.scene.check(id)?;
        self.scene.node_mut(id).name = Some(name.into());
        Ok(())
    }

    /// Name given with [`Root::set_name`].
    pub fn name(&self, id: NodeId) -> StratumResult<Option<&str>> {
        self.scene.check(id)?;
        Ok(self.scene.node(id).name.as_deref())
    }

    /// First attached node with `name`, in draw order.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.scene
            .list
            .iter()
            .map(|e| e.node)
            .find(|id| self.scene.node(*id).name.as_deref() == Some(name))
    }

    /// Append `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> StratumResult<()> {
        self.scene.append_child(parent, child)?;
        self.schedule_if_shown(child);
        Ok(())
    }

    /// Insert `child` before the existing child `before` of `parent`.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: NodeId,
    ) -> StratumResult<()> {
        self.scene.insert_before(parent, child, before)?;
        self.schedule_if_shown(child);
        Ok(())
    }

    /// Detach `child` and its subtree, cancelling their pending frame callbacks.
    pub fn remove(&mut self, child: NodeId) -> StratumResult<()> {
        self.scene.check(child)?;
        let shown = self.scene.node(child).attached && self.scene.is_visible_chain(child, true);
        let ids = self.scene.remove(child)?;
        for id in ids {
            let node = self.scene.node_mut(id);
            node.caches.release_all();
            for cb in std::mem::take(&mut node.frame_callbacks) {
                cb(FrameSignal::Cancelled);
            }
        }
        if shown {
            self.frame_requested = true;
        }
        Ok(())
    }

    /// Apply style changes, returning the combined dirty level.
    pub fn update_style(
        &mut self,
        id: NodeId,
        changes: impl IntoIterator<Item = StyleChange>,
    ) -> StratumResult<RefreshLevel> {
        self.scene.check(id)?;
        let out = add_update(&mut self.scene, id, changes, RefreshLevel::empty());
        self.frame_requested |= out.schedule;
        Ok(out.level)
    }

    /// Replace a node's content.
    pub fn set_content(&mut self, id: NodeId, content: Content) -> StratumResult<()> {
        self.scene.check(id)?;
        self.scene.node_mut(id).content = content;
        let out = add_update(&mut self.scene, id, [], RefreshLevel::REPAINT);
        self.frame_requested |= out.schedule;
        Ok(())
    }

    /// Force invalidation of the whole tree at `level`.
    pub fn refresh(&mut self, level: RefreshLevel) {
        if refresh_all(&mut self.scene, level) {
            self.frame_requested = true;
        }
    }

    /// Schedule a frame without invalidating anything.
    pub fn request_frame(&mut self) {
        self.frame_requested = true;
    }

    /// Whether a frame is scheduled.
    pub fn needs_frame(&self) -> bool {
        self.frame_requested
    }

    /// Run `cb` once after the next drawn frame, or with [`FrameSignal::Cancelled`] if the
    /// node is removed first.
    pub fn on_frame(
        &mut self,
        id: NodeId,
        cb: impl FnOnce(FrameSignal) + 'static,
    ) -> StratumResult<()> {
        self.scene.check(id)?;
        self.scene.node_mut(id).frame_callbacks.push(Box::new(cb));
        Ok(())
    }

    /// Regenerate invalid composites and draw the frame.
    #[tracing::instrument(skip_all, fields(frame = self.frame + 1))]
    pub fn draw(&mut self) -> StratumResult<FrameReport> {
        self.refresh_stale_media();

        frame::update_world(&mut self.scene);
        let merge = merge::merge(
            &mut self.scene,
            &mut self.res,
            &mut self.scratch,
            Scope::Frame,
        )?;
        let render = frame::render_frame(&mut self.scene, &mut self.res, self.opts.clear_rgba)?;

        self.frame += 1;
        self.frame_requested = false;
        self.finish_frame();
        let released = self.res.collect_garbage();

        Ok(FrameReport {
            frame: self.frame,
            merge,
            render,
            released,
        })
    }

    /// Read back the last drawn frame.
    pub fn read_pixels(&mut self) -> StratumResult<FrameRGBA> {
        self.res.gpu.read_pixels(Target::Screen)
    }

    /// Materialize the node's subtree (without its mask) regardless of the viewport.
    pub fn gen_texture(&mut self, id: NodeId) -> StratumResult<NodeTexture> {
        self.scene.check(id)?;
        frame::update_world(&mut self.scene);
        merge::merge(
            &mut self.scene,
            &mut self.res,
            &mut self.scratch,
            Scope::Forced(id),
        )?;
        let i = self
            .scene
            .index_of(id)
            .ok_or_else(|| StratumError::validation(format!("node {} is not attached", id.0)))?;
        let e = self.scene.list[i];
        let node = self.scene.node(id);
        if node.needs_filter() || node.needs_total(e.total, e.next) {
            let slot = if node.needs_filter() {
                node.caches.filter.as_ref()
            } else {
                node.caches.total.as_ref()
            };
            let cache = slot.ok_or_else(|| {
                StratumError::evaluation(format!("composite of node {} was not generated", id.0))
            })?;
            return read_cache(&mut self.res, cache);
        }

        merge::ensure_subtree_caches(&mut self.scene, &mut self.res, i)?;
        let extent = merge::subtree_extent(&self.scene, &mut self.scratch, i);
        let cache = merge::build_total(&self.scene, &mut self.res, i, extent)?;
        let out = read_cache(&mut self.res, &cache);
        drop(cache);
        self.res.collect_garbage();
        out
    }

    /// Materialize the masked result of a mask node.
    pub fn gen_mask(&mut self, id: NodeId) -> StratumResult<NodeTexture> {
        self.scene.check(id)?;
        let reach = self
            .scene
            .index_of(id)
            .map(|i| self.scene.list[i].next)
            .unwrap_or(0);
        if !self.scene.node(id).needs_mask(reach) {
            return Err(StratumError::validation(format!(
                "node {} does not mask any sibling",
                id.0
            )));
        }
        frame::update_world(&mut self.scene);
        merge::merge(
            &mut self.scene,
            &mut self.res,
            &mut self.scratch,
            Scope::Forced(id),
        )?;
        let cache = self.scene.node(id).caches.mask.as_ref().ok_or_else(|| {
            StratumError::evaluation(format!("mask of node {} was not generated", id.0))
        })?;
        read_cache(&mut self.res, cache)
    }

    /// Drain lifecycle events in emission order.
    pub fn take_events(&mut self) -> Vec<RenderEvent> {
        std::mem::take(&mut self.events)
    }

    /// The incrementally maintained flattened list.
    pub fn structure(&self) -> &[StructEntry] {
        &self.scene.list
    }

    /// The flattened list rebuilt from the tree.
    pub fn reflatten(&self) -> Vec<StructEntry> {
        self.scene.flatten(self.scene.root, 0)
    }

    /// Children of a node.
    pub fn children(&self, id: NodeId) -> StratumResult<&[NodeId]> {
        self.scene.check(id)?;
        Ok(&self.scene.node(id).children)
    }

    /// Computed style of a node.
    pub fn style(&self, id: NodeId) -> StratumResult<&ComputedStyle> {
        self.scene.check(id)?;
        Ok(&self.scene.node(id).style)
    }

    /// Local matrix (parent space from node space).
    pub fn local_matrix(&self, id: NodeId) -> StratumResult<Affine> {
        self.scene.check(id)?;
        Ok(self.scene.node(id).local)
    }

    /// World matrix as of the last draw.
    pub fn world_matrix(&self, id: NodeId) -> StratumResult<Affine> {
        self.scene.check(id)?;
        Ok(self.scene.node(id).world)
    }

    /// Content box and filter-expanded box, node-local.
    pub fn boxes(&self, id: NodeId) -> StratumResult<(Rect, Rect)> {
        self.scene.check(id)?;
        let n = self.scene.node(id);
        Ok((n.bbox, n.filter_bbox))
    }

    /// Dirty levels accumulated since the last drawn frame.
    pub fn refresh_level(&self, id: NodeId) -> StratumResult<RefreshLevel> {
        self.scene.check(id)?;
        Ok(self.scene.node(id).refresh_level)
    }

    /// Available cache slots of a node.
    pub fn cache_state(&self, id: NodeId) -> StratumResult<CacheState> {
        self.scene.check(id)?;
        let c = &self.scene.node(id).caches;
        Ok(CacheState {
            own: c.cache.is_some(),
            total: c.total.is_some(),
            filter: c.filter.is_some(),
            mask: c.mask.is_some(),
        })
    }

    /// Resource counters.
    pub fn stats(&self) -> RootStats {
        RootStats {
            backend: self.res.gpu.stats(),
            shared: self.res.shared.stats(),
            pending_release: self.res.release.len(),
        }
    }

    fn schedule_if_shown(&mut self, id: NodeId) {
        if self.scene.node(id).attached && self.scene.is_visible_chain(id, true) {
            self.frame_requested = true;
        }
    }

    /// Video and canvas nodes whose source moved on get a repaint.
    fn refresh_stale_media(&mut self) {
        let stale: Vec<NodeId> = self
            .scene
            .list
            .iter()
            .map(|e| e.node)
            .filter(|id| media_is_stale(self.scene.node(*id)))
            .collect();
        for id in stale {
            add_update(&mut self.scene, id, [], RefreshLevel::REPAINT);
        }
    }

    fn finish_frame(&mut self) {
        let mut waiting = false;
        let mut callbacks = Vec::new();
        let ids: Vec<NodeId> = self.scene.list.iter().map(|e| e.node).collect();
        for id in ids {
            let visible = self.scene.is_visible_chain(id, true);
            let node = self.scene.node_mut(id);
            node.refresh_level = RefreshLevel::empty();
            waiting |= visible && node.content.is_waiting();
            callbacks.append(&mut node.frame_callbacks);
        }
        for cb in callbacks {
            cb(FrameSignal::Drawn);
        }

        self.events.push(RenderEvent::Drawn { frame: self.frame });
        if waiting {
            self.events.push(RenderEvent::Waiting);
        } else {
            if self.was_waiting {
                self.events.push(RenderEvent::CanPlay);
            }
            self.events.push(RenderEvent::Loaded);
        }
        self.was_waiting = waiting;
    }
}

#[cfg(test)]
#[path = "../tests/unit/root.rs"]
mod tests;
