use crate::foundation::error::StratumResult;
use crate::foundation::ids::TextureId;
use crate::render::batch::QuadBatch;
use crate::render::cpu::CpuBackendOpts;
use crate::style::computed::{BlendMode, MaskMode};

/// A rendered frame as RGBA8 pixels.
///
/// Frames are **premultiplied alpha**; the `premultiplied` flag makes this explicit at API
/// boundaries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Pixel at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        Some([self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]])
    }

    /// Content digest of the pixel bytes.
    pub fn digest(&self) -> u64 {
        crate::foundation::math::digest_bytes(&self.data)
    }

    /// Convert the pixels to straight alpha in place, for encoders that expect it.
    pub fn unpremultiply(&mut self) {
        if !self.premultiplied {
            return;
        }
        for px in self.data.chunks_exact_mut(4) {
            let a = u16::from(px[3]);
            match a {
                0 => px[..3].fill(0),
                255 => {}
                _ => {
                    for c in &mut px[..3] {
                        *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
                    }
                }
            }
        }
        self.premultiplied = false;
    }
}

/// Render target: the output surface or an offscreen texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    /// The frame surface sized at init.
    Screen,
    /// An offscreen texture.
    Texture(TextureId),
}

/// Axis of a separable pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    /// Horizontal.
    X,
    /// Vertical.
    Y,
}

/// Full-surface GPU passes. Inputs are sampled in output pixel space unless noted.
#[derive(Clone, Debug, PartialEq)]
pub enum Program {
    /// Copy input 0 into the output's top-left.
    Copy,
    /// Output pixel `p` takes input 0 at `p + (x, y)`; transparent outside.
    Crop {
        /// Horizontal source offset.
        x: i32,
        /// Vertical source offset.
        y: i32,
    },
    /// One zero-edge box pass of `2 * radius + 1` taps.
    BoxBlur {
        /// Half window.
        radius: u32,
        /// Pass direction.
        axis: Axis,
    },
    /// Dual-filter halving; the output is `ceil(input / 2)`.
    KawaseDown,
    /// Tent doubling; the output is `2 * input`, cropped to the output size.
    KawaseUp,
    /// Directional tent over `±(dx, dy)` pixels.
    MotionTent {
        /// Half-length along x.
        dx: f32,
        /// Half-length along y.
        dy: f32,
    },
    /// Zoom blur toward `center` (output pixels).
    Radial {
        /// Blur center.
        center: [f32; 2],
        /// Fraction of the way to the center covered by the samples.
        strength: f32,
        /// Sample count.
        samples: u32,
    },
    /// 4×5 straight-alpha color matrix (row-major, offsets in the last column).
    ColorMatrix([f32; 20]),
    /// Input 0 weighted by the alpha or luminance of input 1.
    Mask(MaskMode),
    /// Input 0 blended over input 1.
    Blend(BlendMode),
    /// Keep pixels whose luminance reaches the threshold.
    Threshold(f32),
    /// Input 0 plus `strength ×` input 1, saturating.
    Add {
        /// Glow multiplier.
        strength: f32,
    },
}

/// Backend counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BackendStats {
    /// Textures created.
    pub textures_created: u64,
    /// Textures deleted.
    pub textures_deleted: u64,
    /// Deletions of ids that were not alive.
    pub double_deletes: u64,
    /// Textures alive now.
    pub live_textures: usize,
    /// Quad draw calls issued.
    pub draw_calls: u64,
    /// Program passes run.
    pub program_runs: u64,
}

/// The GPU as the compositor sees it.
///
/// Bound target is implicit state; multi-step passes go through [`with_target`] so the previous
/// binding is restored on every path.
pub trait GpuBackend {
    /// Create the output surface and programs; failure is fatal for the renderer.
    fn init(&mut self, width: u32, height: u32) -> StratumResult<()>;

    /// Textures one draw call may sample.
    fn max_texture_units(&self) -> usize;

    /// Largest texture edge.
    fn max_texture_size(&self) -> u32;

    /// Whether one draw call may carry quads from several textures.
    fn supports_batching(&self) -> bool;

    /// Allocate a texture, optionally initialized with premultiplied RGBA8 rows.
    fn create_texture(&mut self, width: u32, height: u32, data: Option<&[u8]>)
    -> StratumResult<TextureId>;

    /// Free a texture; unknown ids are counted and ignored.
    fn delete_texture(&mut self, id: TextureId);

    /// Size of a live texture.
    fn texture_size(&self, id: TextureId) -> Option<(u32, u32)>;

    /// Bind `target`, returning the previously bound one.
    fn bind_target(&mut self, target: Target) -> Target;

    /// Size of the bound target.
    fn target_size(&self) -> (u32, u32);

    /// Fill the bound target with a premultiplied color.
    fn clear(&mut self, rgba: [u8; 4]) -> StratumResult<()>;

    /// Draw textured quads into the bound target.
    fn draw_batch(&mut self, batch: &QuadBatch) -> StratumResult<()>;

    /// Run a full-surface pass; `output` may alias one of `inputs`.
    fn run_program(
        &mut self,
        program: &Program,
        inputs: &[Target],
        output: Target,
    ) -> StratumResult<()>;

    /// Read back a target.
    fn read_pixels(&mut self, target: Target) -> StratumResult<FrameRGBA>;

    /// Counters.
    fn stats(&self) -> BackendStats;
}

/// Run `f` with `target` bound, restoring the previous binding afterwards.
pub(crate) fn with_target<R>(
    gpu: &mut dyn GpuBackend,
    target: Target,
    f: impl FnOnce(&mut dyn GpuBackend) -> StratumResult<R>,
) -> StratumResult<R> {
    let prev = gpu.bind_target(target);
    let out = f(&mut *gpu);
    gpu.bind_target(prev);
    out
}

/// Available backend kinds.
///
/// - `Cpu` is always available.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Software backend over `vello_cpu` pixmaps.
    #[default]
    Cpu,
}

/// Create a backend implementation.
pub fn create_backend(kind: BackendKind, opts: CpuBackendOpts) -> Box<dyn GpuBackend> {
    match kind {
        BackendKind::Cpu => Box::new(crate::render::cpu::CpuBackend::new(opts)),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/backend.rs"]
mod tests;
