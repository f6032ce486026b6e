//! Own-content caches: private raster tiles or views of shared source textures.

pub(crate) mod raster;
pub(crate) mod shared;
pub(crate) mod texture;

use crate::cache::raster::{RasterCache, box_pixels};
use crate::cache::shared::{ResourceKey, SharedTextures};
use crate::cache::texture::TextureCache;
use crate::foundation::error::StratumResult;
use crate::render::resources::Resources;
use crate::scene::content::Content;
use crate::scene::node::Node;

/// Sharing key of a node's content right now, if it can be shared.
pub(crate) fn resource_key(content: &Content) -> Option<ResourceKey> {
    match content {
        Content::Image(img) if img.is_loaded() => Some(ResourceKey::Image(img.key())),
        Content::Video(v) => v.provider().current().map(|f| ResourceKey::Frame(f.id)),
        Content::Canvas(c) => Some(ResourceKey::Canvas {
            surface: c.identity(),
            revision: c.revision(),
        }),
        _ => None,
    }
}

/// Return `true` when the own cache no longer shows the media source's current pixels.
///
/// Video caches go stale when their frame stops being authoritative or a newer frame is
/// current; canvas caches when the surface revision moves.
pub(crate) fn media_is_stale(node: &Node) -> bool {
    if node.caches.cache.is_none() {
        return false;
    }
    match &node.content {
        Content::Video(v) => {
            if let Some(ResourceKey::Frame(id)) = node.content_key
                && !v.provider().is_authoritative(id)
            {
                return true;
            }
            node.content_key != resource_key(&node.content)
        }
        Content::Canvas(_) => node.content_key != resource_key(&node.content),
        _ => false,
    }
}

/// Make sure the node's own content cache exists, building it on demand.
///
/// Shareable sources drawn without a background use a view of the shared native-size
/// textures; everything else is rasterized privately at node size.
pub(crate) fn ensure_own_cache(node: &mut Node, res: &mut Resources) -> StratumResult<()> {
    if media_is_stale(node) {
        node.caches.release_all();
    }
    if node.caches.cache.is_some() || !node.has_own_paint() {
        return Ok(());
    }

    if node.style.background_color.is_transparent()
        && node.content.is_shareable()
        && let Some(key) = resource_key(&node.content)
        && let Some(bmp) = node.content.bitmap()
    {
        let Resources {
            gpu, shared, unit, ..
        } = res;
        let unit = *unit;
        let handle = shared.acquire(key, || {
            let raster = RasterCache::from_bitmap(&bmp, unit)?;
            let tiles = raster.upload(gpu.as_mut())?;
            Ok(Some(SharedTextures {
                width: bmp.width,
                height: bmp.height,
                tiles,
                raster,
            }))
        })?;
        if let Some(handle) = handle {
            match TextureCache::shared(handle, node.bbox, node.style.object_fit) {
                Ok(cache) => {
                    node.caches.cache = Some(cache);
                    node.content_key = Some(key);
                    return Ok(());
                }
                Err(handle) => drop(handle),
            }
        }
    }

    rasterize_private(node, res)
}

fn rasterize_private(node: &mut Node, res: &mut Resources) -> StratumResult<()> {
    node.content_key = resource_key(&node.content);
    let Some(raster) = RasterCache::rasterize(&node.style, &node.content, res.unit)? else {
        return Ok(());
    };
    let subs = raster.upload(res.gpu.as_mut())?;
    node.caches.cache = Some(TextureCache::owned(subs, &res.release));
    Ok(())
}

/// Replace a shared own cache that does not map 1:1 onto node pixels with a private one.
///
/// Filters and masks sample their source pixel for pixel, so a stretched or cropped shared
/// view is regenerated at node size first.
pub(crate) fn ensure_exact_scale(node: &mut Node, res: &mut Resources) -> StratumResult<()> {
    ensure_own_cache(node, res)?;
    let Some(cache) = node.caches.cache.as_ref() else {
        return Ok(());
    };
    if !cache.is_shared() {
        return Ok(());
    }
    let (w, h) = box_pixels(&node.style);
    if node.content.needs_regen(w, h) || !cache.is_pixel_exact() {
        tracing::debug!(w, h, "shared source regenerated at node scale");
        node.caches.cache = None;
        rasterize_private(node, res)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/cache/mod.rs"]
mod tests;
