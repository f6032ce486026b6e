use crate::cache::shared::SharedTable;
use crate::cache::texture::ReleaseQueue;
use crate::foundation::core::{Canvas, Rect};
use crate::foundation::error::StratumResult;
use crate::foundation::ids::TextureId;
use crate::render::backend::GpuBackend;
use crate::render::batch::QuadBatch;

/// Backend plus the bookkeeping every pass needs.
pub(crate) struct Resources {
    pub(crate) gpu: Box<dyn GpuBackend>,
    pub(crate) release: ReleaseQueue,
    pub(crate) shared: SharedTable,
    pub(crate) batch: QuadBatch,
    /// Maximum tile edge.
    pub(crate) unit: u32,
    /// Screen rectangle.
    pub(crate) viewport: Rect,
}

impl Resources {
    /// Initialize the backend; failure here is fatal for the renderer.
    pub(crate) fn new(mut gpu: Box<dyn GpuBackend>, canvas: Canvas, tile_unit: u32) -> StratumResult<Self> {
        gpu.init(canvas.width, canvas.height)?;
        let unit = tile_unit.clamp(1, gpu.max_texture_size().max(1));
        let batch = QuadBatch::new(gpu.max_texture_units());
        let release = ReleaseQueue::default();
        Ok(Self {
            gpu,
            shared: SharedTable::new(release.clone()),
            release,
            batch,
            unit,
            viewport: canvas.viewport(),
        })
    }

    /// Delete every texture whose owner was dropped. Returns the count.
    pub(crate) fn collect_garbage(&mut self) -> usize {
        let ids = self.release.drain();
        for id in &ids {
            self.gpu.delete_texture(*id);
        }
        if !ids.is_empty() {
            tracing::debug!(count = ids.len(), "deleted released textures");
        }
        ids.len()
    }

    /// Run `f` with a cleared `width × height` scratch texture, deleted afterwards on every path.
    pub(crate) fn with_scratch<R>(
        &mut self,
        width: u32,
        height: u32,
        f: impl FnOnce(&mut Self, TextureId) -> StratumResult<R>,
    ) -> StratumResult<R> {
        let tex = self.gpu.create_texture(width, height, None)?;
        let out = f(self, tex);
        self.gpu.delete_texture(tex);
        out
    }
}
