use crate::foundation::core::Rect;
use crate::foundation::error::{StratumError, StratumResult};
use crate::foundation::ids::NodeId;
use crate::scene::content::Content;
use crate::scene::node::Node;
use crate::scene::structure::StructEntry;
use crate::style::computed::ComputedStyle;

/// Node arena plus the flattened pre-order list of the attached tree.
pub(crate) struct Scene {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    pub(crate) list: Vec<StructEntry>,
    version: u64,
}

impl Scene {
    /// Create a scene whose root covers `width × height`.
    pub(crate) fn new(width: f64, height: f64) -> Self {
        let mut root = Node::new(
            ComputedStyle {
                width,
                height,
                ..ComputedStyle::default()
            },
            Content::None,
        );
        root.attached = true;
        root.name = Some("root".to_owned());
        let mut scene = Self {
            nodes: vec![root],
            root: NodeId(0),
            list: Vec::new(),
            version: 0,
        };
        scene.list = scene.flatten(scene.root, 0);
        scene
    }

    pub(crate) fn create(&mut self, style: ComputedStyle, content: Content) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(style, content));
        id
    }

    pub(crate) fn contains(&self, id: NodeId) -> bool {
        id.idx() < self.nodes.len()
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.idx()]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.idx()]
    }

    pub(crate) fn check(&self, id: NodeId) -> StratumResult<()> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(StratumError::validation(format!("unknown node {}", id.0)))
        }
    }

    pub(crate) fn next_version(&mut self) -> u64 {
        self.version += 1;
        self.version
    }

    /// Parent chain of `id`, nearest first.
    pub(crate) fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.node(id).parent, |p| self.node(*p).parent)
    }

    pub(crate) fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count()
    }

    /// Return `true` when every ancestor (and `id` itself when `include_self`) is visible.
    pub(crate) fn is_visible_chain(&self, id: NodeId, include_self: bool) -> bool {
        (!include_self || self.node(id).style.visible)
            && self.ancestors(id).all(|a| self.node(a).style.visible)
    }

    /// Pre-order ids of the subtree rooted at `id`.
    pub(crate) fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.node(n).children.iter().rev().copied());
        }
        out
    }

    /// World-space bbox of a node's own box.
    pub(crate) fn world_box(&self, id: NodeId) -> Rect {
        let n = self.node(id);
        crate::foundation::math::transform_rect_bbox(n.world, n.bbox)
    }

    fn check_link(&self, parent: NodeId, child: NodeId) -> StratumResult<()> {
        self.check(parent)?;
        self.check(child)?;
        if child == self.root {
            return Err(StratumError::validation("the root cannot be re-parented"));
        }
        if self.node(child).parent.is_some() {
            return Err(StratumError::validation(format!(
                "node {} already has a parent",
                child.0
            )));
        }
        if parent == child || self.ancestors(parent).any(|a| a == child) {
            return Err(StratumError::validation(format!(
                "linking node {} under {} would create a cycle",
                child.0, parent.0
            )));
        }
        Ok(())
    }

    pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) -> StratumResult<()> {
        self.check_link(parent, child)?;
        self.node_mut(parent).children.push(child);
        self.link(parent, child);
        Ok(())
    }

    pub(crate) fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: NodeId,
    ) -> StratumResult<()> {
        self.check_link(parent, child)?;
        let Some(pos) = self.node(parent).children.iter().position(|c| *c == before) else {
            return Err(StratumError::validation(format!(
                "node {} is not a child of {}",
                before.0, parent.0
            )));
        };
        self.node_mut(parent).children.insert(pos, child);
        self.link(parent, child);
        Ok(())
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        let n = self.node_mut(child);
        n.parent = Some(parent);
        n.local_dirty = true;
        n.parent_version_seen = u64::MAX;
        if self.node(parent).attached {
            for id in self.subtree(child) {
                self.node_mut(id).attached = true;
            }
            self.insert_struct(child);
        }
        self.refresh_mask_reach(parent);
        self.clear_grouped_from(parent);
    }

    /// Unlink `child` from its parent, returning the detached subtree in pre-order.
    pub(crate) fn remove(&mut self, child: NodeId) -> StratumResult<Vec<NodeId>> {
        self.check(child)?;
        let Some(parent) = self.node(child).parent else {
            return Err(StratumError::validation(format!(
                "node {} has no parent",
                child.0
            )));
        };
        if self.node(child).attached {
            self.delete_struct(child);
        }
        self.node_mut(parent).children.retain(|c| *c != child);
        let n = self.node_mut(child);
        n.parent = None;
        n.masked_by = None;
        let ids = self.subtree(child);
        for id in &ids {
            self.node_mut(*id).attached = false;
        }
        self.refresh_mask_reach(parent);
        self.clear_grouped_from(parent);
        Ok(ids)
    }

    /// Release grouped composites of `id` and its ancestors, plus any mask composite
    /// that governs a node on the chain.
    pub(crate) fn clear_grouped_from(&mut self, id: NodeId) {
        let mut cur = Some(id);
        while let Some(n) = cur {
            let node = self.node_mut(n);
            node.caches.release_grouped();
            let masked_by = node.masked_by;
            cur = node.parent;
            if let Some(m) = masked_by {
                self.node_mut(m).caches.mask = None;
            }
        }
    }

    /// Release grouped composites of every ancestor of `id` (not `id` itself), and the mask
    /// composites governing `id` or any of them.
    pub(crate) fn clear_tex_cache_upward(&mut self, id: NodeId) {
        if let Some(m) = self.node(id).masked_by {
            self.node_mut(m).caches.mask = None;
        }
        if let Some(p) = self.node(id).parent {
            self.clear_grouped_from(p);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/tree.rs"]
mod tests;
