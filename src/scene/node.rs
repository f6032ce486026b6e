use crate::cache::shared::ResourceKey;
use crate::cache::texture::TextureCache;
use crate::foundation::core::{Affine, Rect};
use crate::foundation::ids::NodeId;
use crate::scene::content::Content;
use crate::style::computed::{BlendMode, ComputedStyle, Overflow};
use crate::style::level::RefreshLevel;

/// Why a frame callback fired.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameSignal {
    /// The frame containing the node's latest state was drawn.
    Drawn,
    /// The node left the tree before its frame was drawn.
    Cancelled,
}

/// One-shot callback run after the next frame.
pub type FrameCallback = Box<dyn FnOnce(FrameSignal)>;

/// The four cache slots of a node. A slot holding `Some` is available.
#[derive(Debug, Default)]
pub(crate) struct NodeCaches {
    /// Own content.
    pub(crate) cache: Option<TextureCache>,
    /// Composited subtree.
    pub(crate) total: Option<TextureCache>,
    /// Post-filter result.
    pub(crate) filter: Option<TextureCache>,
    /// Post-mask result.
    pub(crate) mask: Option<TextureCache>,
}

impl NodeCaches {
    /// Most specific available cache: mask > filter > total > own.
    pub(crate) fn target(&self) -> Option<&TextureCache> {
        self.mask
            .as_ref()
            .or(self.filter.as_ref())
            .or(self.total.as_ref())
            .or(self.cache.as_ref())
    }

    /// Source for masking and filtering: the best cache below the mask slot.
    pub(crate) fn unmasked(&self) -> Option<&TextureCache> {
        self.filter
            .as_ref()
            .or(self.total.as_ref())
            .or(self.cache.as_ref())
    }

    pub(crate) fn release_all(&mut self) {
        self.cache = None;
        self.release_grouped();
    }

    pub(crate) fn release_grouped(&mut self) {
        self.total = None;
        self.filter = None;
        self.mask = None;
    }

    pub(crate) fn has_any(&self) -> bool {
        self.cache.is_some() || self.total.is_some() || self.filter.is_some() || self.mask.is_some()
    }
}

/// What the renderers draw for a node.
pub(crate) enum Paint<'a> {
    /// A grouped composite standing in for the whole subtree.
    Group(&'a TextureCache),
    /// Own content (if any), then the children.
    Own(Option<&'a TextureCache>),
    /// A required composite is unavailable; the node and its subtree are omitted.
    Missing,
}

/// A vertex of the scene tree.
pub(crate) struct Node {
    pub(crate) name: Option<String>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) attached: bool,

    pub(crate) style: ComputedStyle,
    pub(crate) content: Content,

    /// Content box, node-local.
    pub(crate) bbox: Rect,
    /// Content box expanded by the filter chain, node-local.
    pub(crate) filter_bbox: Rect,
    /// The filter chain leaves at least one pass.
    pub(crate) has_filter: bool,
    pub(crate) local: Affine,
    pub(crate) local_opacity: f32,

    pub(crate) world: Affine,
    pub(crate) world_opacity: f32,
    pub(crate) world_version: u64,
    pub(crate) parent_version_seen: u64,
    pub(crate) local_dirty: bool,

    /// Levels accumulated since the last drawn frame.
    pub(crate) refresh_level: RefreshLevel,
    pub(crate) caches: NodeCaches,
    /// Source identity the own cache was built from.
    pub(crate) content_key: Option<ResourceKey>,
    /// Mask sibling whose reach covers this node.
    pub(crate) masked_by: Option<NodeId>,
    pub(crate) frame_callbacks: Vec<FrameCallback>,
}

impl Node {
    pub(crate) fn new(style: ComputedStyle, content: Content) -> Self {
        let mut n = Self {
            name: None,
            parent: None,
            children: Vec::new(),
            attached: false,
            style,
            content,
            bbox: Rect::ZERO,
            filter_bbox: Rect::ZERO,
            has_filter: false,
            local: Affine::IDENTITY,
            local_opacity: 1.0,
            world: Affine::IDENTITY,
            world_opacity: 1.0,
            world_version: 0,
            parent_version_seen: u64::MAX,
            local_dirty: true,
            refresh_level: RefreshLevel::empty(),
            caches: NodeCaches::default(),
            content_key: None,
            masked_by: None,
            frame_callbacks: Vec::new(),
        };
        crate::scene::compute::cal_reflow(&mut n);
        crate::scene::compute::cal_opacity(&mut n);
        n
    }

    pub(crate) fn is_mask(&self) -> bool {
        self.style.mask_mode.is_mask()
    }

    /// Whether the subtree must be drawn through a `total` composite.
    pub(crate) fn needs_total(&self, subtree: usize, reach: usize) -> bool {
        subtree > 0
            && (self.style.opacity < 1.0
                || self.style.blend_mode != BlendMode::Normal
                || self.style.overflow == Overflow::Clip
                || self.has_filter
                || (self.is_mask() && reach > 0))
    }

    pub(crate) fn needs_filter(&self) -> bool {
        self.has_filter
    }

    pub(crate) fn needs_mask(&self, reach: usize) -> bool {
        self.is_mask() && reach > 0
    }

    /// Return `true` when some required composite is not available.
    pub(crate) fn is_merge_candidate(&self, subtree: usize, reach: usize) -> bool {
        (self.needs_mask(reach) && self.caches.mask.is_none())
            || (self.needs_filter() && self.caches.filter.is_none())
            || (self.needs_total(subtree, reach) && self.caches.total.is_none())
    }

    /// Decide how the node is drawn given its subtree size and mask reach.
    pub(crate) fn paint(&self, subtree: usize, reach: usize) -> Paint<'_> {
        if self.is_mask() {
            return match (reach, self.caches.mask.as_ref()) {
                (0, _) | (_, None) => Paint::Missing,
                (_, Some(c)) => Paint::Group(c),
            };
        }
        if self.needs_filter() {
            return self.caches.filter.as_ref().map_or(Paint::Missing, Paint::Group);
        }
        if self.needs_total(subtree, reach) {
            return self.caches.total.as_ref().map_or(Paint::Missing, Paint::Group);
        }
        Paint::Own(self.caches.cache.as_ref())
    }

    /// Return `true` when the node paints anything of its own.
    pub(crate) fn has_own_paint(&self) -> bool {
        !self.style.background_color.is_transparent() || !self.content.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/node.rs"]
mod tests;
