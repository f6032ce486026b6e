//! Pre-order flattening of the attached tree.
//!
//! For the entry at index `i`, entries `i + 1 ..= i + total` are exactly its descendants.
//! Both splice operations keep that invariant with O(depth) bookkeeping plus the size of
//! the moved subtree.

use crate::foundation::ids::NodeId;
use crate::scene::tree::Scene;

/// One node of the flattened list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StructEntry {
    /// The node.
    pub node: NodeId,
    /// Direct children.
    pub num: usize,
    /// All descendants.
    pub total: usize,
    /// Depth below the root.
    pub lv: usize,
    /// Following siblings governed by this node's mask.
    pub next: usize,
}

/// Index just past the subtree at `i` and, when `with_reach`, past the siblings its mask governs.
pub(crate) fn skip(list: &[StructEntry], i: usize, with_reach: bool) -> usize {
    let mut j = i + list[i].total + 1;
    if with_reach {
        for _ in 0..list[i].next {
            if j >= list.len() {
                break;
            }
            j += list[j].total + 1;
        }
    }
    j
}

impl Scene {
    /// Flatten the subtree at `id` with `id` at depth `lv`.
    pub(crate) fn flatten(&self, id: NodeId, lv: usize) -> Vec<StructEntry> {
        let mut out = Vec::new();
        // (entry index, child cursor)
        let mut stack: Vec<(usize, usize)> = Vec::new();
        out.push(self.entry(id, lv));
        stack.push((0, 0));
        while let Some(top) = stack.last_mut() {
            let (at, cursor) = *top;
            let node = self.node(out[at].node);
            if let Some(&child) = node.children.get(cursor) {
                top.1 += 1;
                let child_lv = out[at].lv + 1;
                out.push(self.entry(child, child_lv));
                stack.push((out.len() - 1, 0));
            } else {
                out[at].total = out.len() - at - 1;
                stack.pop();
            }
        }
        out
    }

    fn entry(&self, id: NodeId, lv: usize) -> StructEntry {
        StructEntry {
            node: id,
            num: self.node(id).children.len(),
            total: 0,
            lv,
            next: self.mask_reach(id),
        }
    }

    /// List indices of the path from the root to `id`, `id` last.
    ///
    /// For a freshly linked child whose entries are not spliced yet, the last index is where
    /// they go. Returns `None` for detached nodes.
    pub(crate) fn path_indices(&self, id: NodeId) -> Option<Vec<usize>> {
        let mut path: Vec<NodeId> = self.ancestors(id).collect();
        path.reverse();
        path.push(id);
        if path[0] != self.root {
            return None;
        }
        let mut out = Vec::with_capacity(path.len());
        let mut idx = 0;
        out.push(idx);
        for w in path.windows(2) {
            let (parent, child) = (w[0], w[1]);
            let mut j = idx + 1;
            for sib in &self.node(parent).children {
                if *sib == child {
                    break;
                }
                j += self.list.get(j)?.total + 1;
            }
            idx = j;
            out.push(idx);
        }
        Some(out)
    }

    pub(crate) fn index_of(&self, id: NodeId) -> Option<usize> {
        self.path_indices(id).and_then(|p| p.last().copied())
    }

    /// Splice the entries of a newly attached subtree into the list.
    pub(crate) fn insert_struct(&mut self, child: NodeId) {
        let Some(path) = self.path_indices(child) else {
            return;
        };
        let lv = path.len() - 1;
        let entries = self.flatten(child, lv);
        let k = entries.len();
        let at = path[lv];
        self.list.splice(at..at, entries);
        for &a in &path[..lv] {
            self.list[a].total += k;
        }
        if lv > 0 {
            self.list[path[lv - 1]].num += 1;
        }
    }

    /// Drain the entries of an attached subtree. Call before unlinking it.
    pub(crate) fn delete_struct(&mut self, child: NodeId) {
        let Some(path) = self.path_indices(child) else {
            return;
        };
        let lv = path.len() - 1;
        let at = path[lv];
        let k = self.list[at].total + 1;
        self.list.drain(at..at + k);
        for &a in &path[..lv] {
            self.list[a].total -= k;
        }
        if lv > 0 {
            self.list[path[lv - 1]].num -= 1;
        }
    }

    /// Following siblings governed by the mask at `id`: up to the next mask sibling
    /// (exclusive), a `break_mask` sibling (inclusive) or the last sibling.
    pub(crate) fn mask_reach(&self, id: NodeId) -> usize {
        let node = self.node(id);
        if !node.is_mask() {
            return 0;
        }
        let Some(parent) = node.parent else {
            return 0;
        };
        let siblings = &self.node(parent).children;
        let Some(pos) = siblings.iter().position(|c| *c == id) else {
            return 0;
        };
        let mut reach = 0;
        for sib in &siblings[pos + 1..] {
            let s = self.node(*sib);
            if s.is_mask() {
                break;
            }
            reach += 1;
            if s.style.break_mask {
                break;
            }
        }
        reach
    }

    /// Recompute mask reach over the children of `parent`.
    ///
    /// Updates `next` in the list and `masked_by` on the children, and releases the mask
    /// composite of every mask whose governed set changed. Returns those masks.
    pub(crate) fn refresh_mask_reach(&mut self, parent: NodeId) -> Vec<NodeId> {
        let children = self.node(parent).children.clone();
        let mut governed: Vec<Option<NodeId>> = vec![None; children.len()];
        let mut reaches = vec![0usize; children.len()];
        for (i, c) in children.iter().enumerate() {
            let r = self.mask_reach(*c);
            reaches[i] = r;
            for g in governed.iter_mut().skip(i + 1).take(r) {
                *g = Some(*c);
            }
        }

        let mut changed = Vec::new();

        let parent_idx = self.index_of(parent);
        let mut j = parent_idx.map(|p| p + 1);
        for (i, c) in children.iter().enumerate() {
            let old = self.node(*c).masked_by;
            if old != governed[i] {
                mark(old, &mut changed);
                mark(governed[i], &mut changed);
                self.node_mut(*c).masked_by = governed[i];
            }
            if let Some(at) = j {
                if let Some(e) = self.list.get_mut(at) {
                    if e.next != reaches[i] {
                        e.next = reaches[i];
                        mark(Some(*c), &mut changed);
                    }
                    j = Some(at + e.total + 1);
                }
            }
        }

        for m in &changed {
            self.node_mut(*m).caches.mask = None;
        }
        changed
    }
}

fn mark(m: Option<NodeId>, changed: &mut Vec<NodeId>) {
    if let Some(m) = m
        && !changed.contains(&m)
    {
        changed.push(m);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/structure.rs"]
mod tests;
