use crate::foundation::core::{Point, Rect};
use crate::foundation::ids::TextureId;
use smallvec::SmallVec;

/// Index value that ends a primitive in the index stream.
pub const PRIMITIVE_RESTART: u32 = u32::MAX;

/// Textured quads sharing one draw call.
///
/// Each quad contributes four vertices (top-left, top-right, bottom-left, bottom-right, as a
/// triangle strip) and five indices: the four vertex indices and [`PRIMITIVE_RESTART`].
#[derive(Clone, Debug)]
pub struct QuadBatch {
    pub(crate) positions: Vec<[f32; 2]>,
    pub(crate) tex_coords: Vec<[f32; 2]>,
    pub(crate) opacities: Vec<f32>,
    pub(crate) tex_indices: Vec<u32>,
    pub(crate) indices: Vec<u32>,
    pub(crate) textures: SmallVec<[TextureId; 16]>,
    limit: usize,
}

/// A quad decoded back from the buffers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct QuadRef {
    pub(crate) texture: TextureId,
    /// Top-left, top-right, bottom-left, bottom-right.
    pub(crate) corners: [[f32; 2]; 4],
    /// Texture coordinates of the same corners.
    pub(crate) uv: [[f32; 2]; 4],
    pub(crate) opacity: f32,
}

impl QuadBatch {
    /// Empty batch sampling at most `limit` distinct textures.
    pub fn new(limit: usize) -> Self {
        Self {
            positions: Vec::new(),
            tex_coords: Vec::new(),
            opacities: Vec::new(),
            tex_indices: Vec::new(),
            indices: Vec::new(),
            textures: SmallVec::new(),
            limit: limit.max(1),
        }
    }

    /// Return `true` when no quad has been pushed.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Quads in the batch.
    pub fn quad_count(&self) -> usize {
        self.positions.len() / 4
    }

    /// Distinct textures sampled.
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Drop all quads, keeping capacity.
    pub fn clear(&mut self) {
        self.positions.clear();
        self.tex_coords.clear();
        self.opacities.clear();
        self.tex_indices.clear();
        self.indices.clear();
        self.textures.clear();
    }

    fn slot_for(&mut self, texture: TextureId) -> Option<u32> {
        if let Some(i) = self.textures.iter().position(|t| *t == texture) {
            return Some(i as u32);
        }
        if self.textures.len() >= self.limit {
            return None;
        }
        self.textures.push(texture);
        Some((self.textures.len() - 1) as u32)
    }

    /// Append a quad; returns `false` (and pushes nothing) when the texture-unit limit is hit.
    pub(crate) fn push_quad(
        &mut self,
        texture: TextureId,
        corners: [Point; 4],
        tc: Rect,
        opacity: f32,
    ) -> bool {
        let Some(slot) = self.slot_for(texture) else {
            return false;
        };
        let base = self.positions.len() as u32;
        for p in corners {
            self.positions.push([p.x as f32, p.y as f32]);
        }
        self.tex_coords.extend_from_slice(&[
            [tc.x0 as f32, tc.y0 as f32],
            [tc.x1 as f32, tc.y0 as f32],
            [tc.x0 as f32, tc.y1 as f32],
            [tc.x1 as f32, tc.y1 as f32],
        ]);
        for _ in 0..4 {
            self.opacities.push(opacity);
            self.tex_indices.push(slot);
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 3, PRIMITIVE_RESTART]);
        true
    }

    /// Walk the index stream, yielding one quad per primitive.
    pub(crate) fn quads(&self) -> impl Iterator<Item = QuadRef> + '_ {
        self.indices
            .split(|i| *i == PRIMITIVE_RESTART)
            .filter(|prim| prim.len() == 4)
            .map(move |prim| {
                let v = |k: usize| prim[k] as usize;
                QuadRef {
                    texture: self.textures[self.tex_indices[v(0)] as usize],
                    corners: [
                        self.positions[v(0)],
                        self.positions[v(1)],
                        self.positions[v(2)],
                        self.positions[v(3)],
                    ],
                    uv: [
                        self.tex_coords[v(0)],
                        self.tex_coords[v(1)],
                        self.tex_coords[v(2)],
                        self.tex_coords[v(3)],
                    ],
                    opacity: self.opacities[v(0)],
                }
            })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/batch.rs"]
mod tests;
