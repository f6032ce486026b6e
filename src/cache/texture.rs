use crate::cache::shared::{ResourceKey, SharedHandle};
use crate::foundation::core::Rect;
use crate::foundation::ids::TextureId;
use crate::style::computed::ObjectFit;
use std::cell::RefCell;
use std::rc::Rc;

/// Texture ids whose owning caches were dropped, deleted at the next collection point.
#[derive(Clone, Debug, Default)]
pub(crate) struct ReleaseQueue(Rc<RefCell<Vec<TextureId>>>);

impl ReleaseQueue {
    pub(crate) fn push(&self, id: TextureId) {
        self.0.borrow_mut().push(id);
    }

    pub(crate) fn extend(&self, ids: impl IntoIterator<Item = TextureId>) {
        self.0.borrow_mut().extend(ids);
    }

    pub(crate) fn drain(&self) -> Vec<TextureId> {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    pub(crate) fn len(&self) -> usize {
        self.0.borrow().len()
    }
}

/// One backend texture placed in node-local space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct SubTexture {
    pub(crate) texture: TextureId,
    /// Area the texture covers, node-local.
    pub(crate) bbox: Rect,
    pub(crate) width: u32,
    pub(crate) height: u32,
    /// Normalized texture-coordinate window; `None` samples the whole texture.
    pub(crate) tc: Option<Rect>,
}

impl SubTexture {
    pub(crate) fn tex_coords(&self) -> Rect {
        self.tc.unwrap_or(Rect::new(0.0, 0.0, 1.0, 1.0))
    }
}

#[derive(Debug)]
enum CacheOwner {
    Owned(ReleaseQueue),
    Shared(SharedHandle),
}

/// Textures holding one rendered layer of a node (own content, composite, filter or mask).
#[derive(Debug)]
pub(crate) struct TextureCache {
    pub(crate) subs: Vec<SubTexture>,
    /// Union of the sub-texture boxes, node-local.
    pub(crate) bbox: Rect,
    owner: CacheOwner,
}

impl TextureCache {
    /// Cache that owns its textures; dropping it queues them for deletion.
    pub(crate) fn owned(subs: Vec<SubTexture>, release: &ReleaseQueue) -> Self {
        let bbox = subs
            .iter()
            .map(|s| s.bbox)
            .reduce(|a, b| a.union(b))
            .unwrap_or(Rect::ZERO);
        Self {
            subs,
            bbox,
            owner: CacheOwner::Owned(release.clone()),
        }
    }

    /// View of a shared entry fitted into `box_rect`.
    ///
    /// Returns the handle back when the fit cannot be expressed by remapping shared tiles.
    pub(crate) fn shared(
        handle: SharedHandle,
        box_rect: Rect,
        fit: ObjectFit,
    ) -> Result<Self, SharedHandle> {
        let v = handle.value();
        let (nw, nh) = (f64::from(v.width.max(1)), f64::from(v.height.max(1)));
        let subs = match fit {
            ObjectFit::Fill => {
                let sx = box_rect.width() / nw;
                let sy = box_rect.height() / nh;
                v.tiles
                    .iter()
                    .map(|t| SubTexture {
                        bbox: Rect::new(
                            box_rect.x0 + t.bbox.x0 * sx,
                            box_rect.y0 + t.bbox.y0 * sy,
                            box_rect.x0 + t.bbox.x1 * sx,
                            box_rect.y0 + t.bbox.y1 * sy,
                        ),
                        ..*t
                    })
                    .collect()
            }
            ObjectFit::Cover => {
                let [t] = v.tiles.as_slice() else {
                    return Err(handle);
                };
                let s = (box_rect.width() / nw).max(box_rect.height() / nh);
                if s <= 0.0 {
                    return Err(handle);
                }
                let vis_w = box_rect.width() / s / nw;
                let vis_h = box_rect.height() / s / nh;
                let u0 = (1.0 - vis_w) * 0.5;
                let v0 = (1.0 - vis_h) * 0.5;
                vec![SubTexture {
                    bbox: box_rect,
                    tc: Some(Rect::new(u0, v0, u0 + vis_w, v0 + vis_h)),
                    ..*t
                }]
            }
        };
        Ok(Self {
            subs,
            bbox: box_rect,
            owner: CacheOwner::Shared(handle),
        })
    }

    /// Append a tile to an owned cache built incrementally.
    pub(crate) fn push(&mut self, sub: SubTexture) {
        self.bbox = if self.subs.is_empty() {
            sub.bbox
        } else {
            self.bbox.union(sub.bbox)
        };
        self.subs.push(sub);
    }

    pub(crate) fn is_shared(&self) -> bool {
        matches!(self.owner, CacheOwner::Shared(_))
    }

    pub(crate) fn shared_key(&self) -> Option<ResourceKey> {
        match &self.owner {
            CacheOwner::Shared(h) => Some(h.key()),
            CacheOwner::Owned(_) => None,
        }
    }

    /// Return `true` when the textures map 1:1 onto node pixels with no cropping.
    pub(crate) fn is_pixel_exact(&self) -> bool {
        self.subs.iter().all(|s| {
            s.tc.is_none()
                && s.bbox.width() == f64::from(s.width)
                && s.bbox.height() == f64::from(s.height)
                && s.bbox.x0.fract() == 0.0
                && s.bbox.y0.fract() == 0.0
        })
    }
}

impl Drop for TextureCache {
    fn drop(&mut self) {
        if let CacheOwner::Owned(release) = &self.owner {
            release.extend(self.subs.iter().map(|s| s.texture));
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/texture.rs"]
mod tests;
