use crate::cache::raster::RasterCache;
use crate::cache::texture::{ReleaseQueue, SubTexture};
use crate::foundation::error::StratumResult;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Stable identity of a shareable content source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum ResourceKey {
    /// Digest of an encoded image.
    Image(u64),
    /// Decoded video frame id.
    Frame(u64),
    /// External surface at a revision.
    Canvas { surface: usize, revision: u64 },
}

/// Textures (and their raster tiles) for one source at its native size.
pub(crate) struct SharedTextures {
    pub(crate) width: u32,
    pub(crate) height: u32,
    /// Tiles with `bbox` in native pixel space.
    pub(crate) tiles: Vec<SubTexture>,
    pub(crate) raster: RasterCache,
}

/// Allocation counters, for leak and double-free checks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SharedStats {
    /// Entries created.
    pub allocs: u64,
    /// Entries freed after their count reached zero.
    pub frees: u64,
    /// Entries currently alive.
    pub live: usize,
    /// Live handles across all entries.
    pub handles: usize,
}

struct Entry {
    value: Rc<SharedTextures>,
    count: usize,
}

struct TableInner {
    entries: HashMap<ResourceKey, Entry>,
    stats: SharedStats,
    release: ReleaseQueue,
}

/// Reference-counted resource table keyed by content identity.
///
/// The only increment is [`SharedTable::acquire`] and the only decrement is dropping a
/// [`SharedHandle`]; at zero the entry's textures go to the release queue.
#[derive(Clone)]
pub(crate) struct SharedTable {
    inner: Rc<RefCell<TableInner>>,
}

impl SharedTable {
    pub(crate) fn new(release: ReleaseQueue) -> Self {
        Self {
            inner: Rc::new(RefCell::new(TableInner {
                entries: HashMap::new(),
                stats: SharedStats::default(),
                release,
            })),
        }
    }

    /// Return a handle for `key`, building the value with `make` on first request.
    ///
    /// `make` returning `Ok(None)` means the source has nothing to share; no entry is created.
    pub(crate) fn acquire(
        &self,
        key: ResourceKey,
        make: impl FnOnce() -> StratumResult<Option<SharedTextures>>,
    ) -> StratumResult<Option<SharedHandle>> {
        {
            let mut inner = self.inner.borrow_mut();
            if let Some(e) = inner.entries.get_mut(&key) {
                e.count += 1;
                let value = e.value.clone();
                inner.stats.handles += 1;
                return Ok(Some(SharedHandle {
                    key,
                    value,
                    table: self.inner.clone(),
                }));
            }
        }

        let Some(value) = make()? else {
            return Ok(None);
        };
        let value = Rc::new(value);
        let mut inner = self.inner.borrow_mut();
        inner.entries.insert(
            key,
            Entry {
                value: value.clone(),
                count: 1,
            },
        );
        inner.stats.allocs += 1;
        inner.stats.live += 1;
        inner.stats.handles += 1;
        Ok(Some(SharedHandle {
            key,
            value,
            table: self.inner.clone(),
        }))
    }

    pub(crate) fn count(&self, key: ResourceKey) -> usize {
        self.inner
            .borrow()
            .entries
            .get(&key)
            .map(|e| e.count)
            .unwrap_or(0)
    }

    pub(crate) fn stats(&self) -> SharedStats {
        self.inner.borrow().stats
    }
}

/// A counted reference to a shared entry; dropping it is the release.
pub(crate) struct SharedHandle {
    key: ResourceKey,
    value: Rc<SharedTextures>,
    table: Rc<RefCell<TableInner>>,
}

impl SharedHandle {
    pub(crate) fn key(&self) -> ResourceKey {
        self.key
    }

    pub(crate) fn value(&self) -> &SharedTextures {
        &self.value
    }
}

impl std::fmt::Debug for SharedHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedHandle").field("key", &self.key).finish()
    }
}

impl Drop for SharedHandle {
    fn drop(&mut self) {
        let mut inner = self.table.borrow_mut();
        inner.stats.handles = inner.stats.handles.saturating_sub(1);
        let Some(e) = inner.entries.get_mut(&self.key) else {
            return;
        };
        e.count -= 1;
        if e.count > 0 {
            return;
        }
        if let Some(e) = inner.entries.remove(&self.key) {
            inner.release.extend(e.value.tiles.iter().map(|t| t.texture));
            inner.stats.frees += 1;
            inner.stats.live = inner.stats.live.saturating_sub(1);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/shared.rs"]
mod tests;
