//! Recycled texture pixmaps for the CPU backend.
//!
//! Composites, scratch tiles and filter pyramids create and delete many same-sized textures
//! per frame; deleted pixmaps park here until a texture of the same size is created.

use std::collections::HashMap;

/// Retention limits for recycled pixmaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SurfacePoolOpts {
    /// Bytes kept across all sizes.
    pub max_pool_bytes: usize,
    /// Pixmaps kept per size.
    pub max_surfaces_per_bucket: usize,
}

impl Default for SurfacePoolOpts {
    fn default() -> Self {
        Self {
            max_pool_bytes: 64 * 1024 * 1024,
            max_surfaces_per_bucket: 8,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PoolStats {
    /// Pixmaps waiting for reuse.
    pub(crate) parked: usize,
    pub(crate) parked_bytes: usize,
    /// Pixmaps allocated because nothing of that size was parked.
    pub(crate) fresh: u64,
    pub(crate) recycled: u64,
    /// Pixmaps dropped on return because a limit was reached.
    pub(crate) discarded: u64,
}

fn byte_len(w: u16, h: u16) -> usize {
    usize::from(w) * usize::from(h) * 4
}

pub(crate) struct SurfacePool {
    opts: SurfacePoolOpts,
    stats: PoolStats,
    parked: HashMap<(u16, u16), Vec<vello_cpu::Pixmap>>,
}

impl SurfacePool {
    pub(crate) fn new(opts: SurfacePoolOpts) -> Self {
        Self {
            opts,
            stats: PoolStats::default(),
            parked: HashMap::new(),
        }
    }

    pub(crate) fn stats(&self) -> PoolStats {
        self.stats
    }

    /// A `w × h` pixmap. Recycled pixmaps keep their old pixels; callers overwrite or clear.
    pub(crate) fn take(&mut self, w: u16, h: u16) -> vello_cpu::Pixmap {
        if let Some(pm) = self.parked.get_mut(&(w, h)).and_then(Vec::pop) {
            self.stats.parked -= 1;
            self.stats.parked_bytes -= byte_len(w, h);
            self.stats.recycled += 1;
            return pm;
        }
        self.stats.fresh += 1;
        vello_cpu::Pixmap::new(w, h)
    }

    /// Park `pm` for reuse, or drop it when either limit would be exceeded.
    pub(crate) fn give(&mut self, pm: vello_cpu::Pixmap) {
        let (w, h) = (pm.width(), pm.height());
        let bytes = byte_len(w, h);
        let bucket = self.parked.entry((w, h)).or_default();
        if bucket.len() >= self.opts.max_surfaces_per_bucket
            || self.stats.parked_bytes + bytes > self.opts.max_pool_bytes
        {
            self.stats.discarded += 1;
            return;
        }
        bucket.push(pm);
        self.stats.parked += 1;
        self.stats.parked_bytes += bytes;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface_pool.rs"]
mod tests;
