use crate::foundation::core::{Affine, Rect};
use crate::foundation::ids::NodeId;
use std::ops::Range;

/// One node whose grouped composite must be (re)generated this pass.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Candidate {
    /// Position in the flattened list.
    pub(crate) index: usize,
    pub(crate) node: NodeId,
    /// Subtree extent, node-local.
    pub(crate) temp_bbox: Rect,
    /// `temp_bbox` grown by the filter chain, or the mask shape for masks.
    pub(crate) out_bbox: Rect,
    pub(crate) valid: bool,
    /// Lies inside another candidate's subtree or mask reach.
    pub(crate) nested: bool,
    /// Candidates inside this one's subtree or reach, as a range into the candidate list.
    pub(crate) sub: Range<usize>,
}

/// Per-pass bookkeeping, reused across frames.
#[derive(Debug, Default)]
pub(crate) struct MergeScratch {
    pub(crate) candidates: Vec<Candidate>,
    /// `(depth, relative matrix)` of the open ancestors during aggregation.
    pub(crate) stack: Vec<(usize, Affine)>,
}

impl MergeScratch {
    pub(crate) fn reset(&mut self) {
        self.candidates.clear();
        self.stack.clear();
    }

    /// Candidate at flattened index `index`, if any.
    pub(crate) fn find(&self, index: usize) -> Option<usize> {
        self.candidates
            .binary_search_by_key(&index, |c| c.index)
            .ok()
    }

    /// Candidates whose flattened index falls in `range`.
    pub(crate) fn within(&self, range: Range<usize>) -> Range<usize> {
        let lo = self.candidates.partition_point(|c| c.index < range.start);
        let hi = self.candidates.partition_point(|c| c.index < range.end);
        lo..hi
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composite/scratch.rs"]
mod tests;
