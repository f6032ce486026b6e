use crate::cache::raster::pixmap_dims;
use crate::foundation::error::{StratumError, StratumResult};
use crate::foundation::ids::TextureId;
use crate::foundation::math::opacity_u16;
use crate::render::backend::{BackendStats, FrameRGBA, GpuBackend, Program, Target};
use crate::render::batch::{QuadBatch, QuadRef};
use crate::render::kernels;
use crate::render::surface_pool::{SurfacePool, SurfacePoolOpts};
use std::collections::HashMap;

/// Options for the CPU backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CpuBackendOpts {
    /// Scratch pixmap retention.
    pub pool: SurfacePoolOpts,
    /// Textures one draw call may sample.
    pub max_texture_units: usize,
    /// Largest texture edge.
    pub max_texture_size: u32,
    /// Whether draw calls may mix textures; `false` draws one quad per call.
    pub batching: bool,
}

impl Default for CpuBackendOpts {
    fn default() -> Self {
        Self {
            pool: SurfacePoolOpts::default(),
            max_texture_units: 16,
            max_texture_size: 8192,
            batching: true,
        }
    }
}

impl CpuBackendOpts {
    /// Return options with multi-texture batching switched on or off.
    pub fn with_batching(mut self, batching: bool) -> Self {
        self.batching = batching;
        self
    }

    /// Return options with a different texture-unit limit.
    pub fn with_max_texture_units(mut self, units: usize) -> Self {
        self.max_texture_units = units.max(1);
        self
    }
}

/// Software implementation of [`GpuBackend`]; every surface is a `vello_cpu::Pixmap`.
pub struct CpuBackend {
    opts: CpuBackendOpts,
    pool: SurfacePool,
    screen: Option<vello_cpu::Pixmap>,
    textures: HashMap<u32, vello_cpu::Pixmap>,
    next_id: u32,
    bound: Target,
    stats: BackendStats,
}

impl CpuBackend {
    /// Create an uninitialized backend; call [`GpuBackend::init`] before drawing.
    pub fn new(opts: CpuBackendOpts) -> Self {
        Self {
            opts,
            pool: SurfacePool::new(opts.pool),
            screen: None,
            textures: HashMap::new(),
            next_id: 1,
            bound: Target::Screen,
            stats: BackendStats::default(),
        }
    }

    fn take_surface(&mut self, target: Target) -> StratumResult<vello_cpu::Pixmap> {
        match target {
            Target::Screen => self
                .screen
                .take()
                .ok_or_else(|| StratumError::gpu("screen surface is not initialized")),
            Target::Texture(id) => self
                .textures
                .remove(&id.0)
                .ok_or_else(|| StratumError::gpu(format!("texture {} is not alive", id.0))),
        }
    }

    fn put_surface(&mut self, target: Target, pixmap: vello_cpu::Pixmap) {
        match target {
            Target::Screen => self.screen = Some(pixmap),
            Target::Texture(id) => {
                self.textures.insert(id.0, pixmap);
            }
        }
    }

    fn surface(&self, target: Target) -> Option<&vello_cpu::Pixmap> {
        match target {
            Target::Screen => self.screen.as_ref(),
            Target::Texture(id) => self.textures.get(&id.0),
        }
    }

    fn surface_bytes(&self, target: Target) -> StratumResult<(Vec<u8>, u32, u32)> {
        let pm = self
            .surface(target)
            .ok_or_else(|| StratumError::gpu(format!("program input {target:?} is not alive")))?;
        Ok((
            pm.data_as_u8_slice().to_vec(),
            u32::from(pm.width()),
            u32::from(pm.height()),
        ))
    }

    fn check_size(&self, width: u32, height: u32) -> StratumResult<()> {
        if width == 0 || height == 0 {
            return Err(StratumError::gpu(format!(
                "surface size must be non-zero, got {width}x{height}"
            )));
        }
        let max = self.opts.max_texture_size.min(u32::from(u16::MAX));
        if width > max || height > max {
            return Err(StratumError::gpu(format!(
                "surface {width}x{height} exceeds max texture size {max}"
            )));
        }
        Ok(())
    }
}

impl GpuBackend for CpuBackend {
    fn init(&mut self, width: u32, height: u32) -> StratumResult<()> {
        self.check_size(width, height)?;
        let (w, h) = pixmap_dims(width, height)?;
        self.screen = Some(vello_cpu::Pixmap::new(w, h));
        self.bound = Target::Screen;
        tracing::debug!(width, height, "cpu backend initialized");
        Ok(())
    }

    fn max_texture_units(&self) -> usize {
        self.opts.max_texture_units.max(1)
    }

    fn max_texture_size(&self) -> u32 {
        self.opts.max_texture_size.min(u32::from(u16::MAX))
    }

    fn supports_batching(&self) -> bool {
        self.opts.batching
    }

    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        data: Option<&[u8]>,
    ) -> StratumResult<TextureId> {
        self.check_size(width, height)?;
        let (w, h) = pixmap_dims(width, height)?;
        let mut pm = self.pool.take(w, h);
        match data {
            Some(bytes) => {
                let dst = pm.data_as_u8_slice_mut();
                if bytes.len() != dst.len() {
                    self.pool.give(pm);
                    return Err(StratumError::gpu("texture upload byte len mismatch"));
                }
                dst.copy_from_slice(bytes);
            }
            None => pm.data_as_u8_slice_mut().fill(0),
        }
        let id = self.next_id;
        self.next_id += 1;
        self.textures.insert(id, pm);
        self.stats.textures_created += 1;
        self.stats.live_textures = self.textures.len();
        Ok(TextureId(id))
    }

    fn delete_texture(&mut self, id: TextureId) {
        match self.textures.remove(&id.0) {
            Some(pm) => {
                self.pool.give(pm);
                self.stats.textures_deleted += 1;
                self.stats.live_textures = self.textures.len();
            }
            None => {
                self.stats.double_deletes += 1;
                tracing::warn!(texture = id.0, "delete of a texture that is not alive");
            }
        }
    }

    fn texture_size(&self, id: TextureId) -> Option<(u32, u32)> {
        self.textures
            .get(&id.0)
            .map(|pm| (u32::from(pm.width()), u32::from(pm.height())))
    }

    fn bind_target(&mut self, target: Target) -> Target {
        std::mem::replace(&mut self.bound, target)
    }

    fn target_size(&self) -> (u32, u32) {
        self.surface(self.bound)
            .map(|pm| (u32::from(pm.width()), u32::from(pm.height())))
            .unwrap_or((0, 0))
    }

    fn clear(&mut self, rgba: [u8; 4]) -> StratumResult<()> {
        let bound = self.bound;
        let mut pm = self.take_surface(bound)?;
        for px in pm.data_as_u8_slice_mut().chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
        self.put_surface(bound, pm);
        Ok(())
    }

    fn draw_batch(&mut self, batch: &QuadBatch) -> StratumResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let bound = self.bound;
        let mut dst = self.take_surface(bound)?;
        for q in batch.quads() {
            match self.textures.get(&q.texture.0) {
                Some(src) => draw_quad(&mut dst, src, &q),
                None => tracing::debug!(texture = q.texture.0, "quad samples a missing texture"),
            }
        }
        self.put_surface(bound, dst);
        self.stats.draw_calls += 1;
        Ok(())
    }

    fn run_program(
        &mut self,
        program: &Program,
        inputs: &[Target],
        output: Target,
    ) -> StratumResult<()> {
        let srcs = inputs
            .iter()
            .map(|t| self.surface_bytes(*t))
            .collect::<StratumResult<Vec<_>>>()?;
        let mut out = self.take_surface(output)?;
        let (ow, oh) = (u32::from(out.width()), u32::from(out.height()));
        let res = apply_program(program, &srcs, out.data_as_u8_slice_mut(), ow, oh);
        self.put_surface(output, out);
        self.stats.program_runs += 1;
        res
    }

    fn read_pixels(&mut self, target: Target) -> StratumResult<FrameRGBA> {
        let (data, width, height) = self.surface_bytes(target)?;
        Ok(FrameRGBA {
            width,
            height,
            data,
            premultiplied: true,
        })
    }

    fn stats(&self) -> BackendStats {
        self.stats
    }
}

type Surface = (Vec<u8>, u32, u32);

fn apply_program(
    program: &Program,
    srcs: &[Surface],
    dst: &mut [u8],
    ow: u32,
    oh: u32,
) -> StratumResult<()> {
    let input = |i: usize| -> StratumResult<&Surface> {
        srcs.get(i)
            .ok_or_else(|| StratumError::gpu(format!("{program:?} expects input {i}")))
    };
    let same_size = |s: &Surface| -> StratumResult<()> {
        if s.1 != ow || s.2 != oh {
            return Err(StratumError::gpu(format!(
                "{program:?} input {}x{} does not match output {ow}x{oh}",
                s.1, s.2
            )));
        }
        Ok(())
    };

    match program {
        Program::Copy => {
            let (src, sw, sh) = input(0)?;
            kernels::crop(src, *sw, *sh, dst, ow, oh, 0, 0);
        }
        Program::Crop { x, y } => {
            let (src, sw, sh) = input(0)?;
            kernels::crop(src, *sw, *sh, dst, ow, oh, *x, *y);
        }
        Program::BoxBlur { radius, axis } => {
            let s = input(0)?;
            same_size(s)?;
            kernels::box_blur(&s.0, dst, ow, oh, *radius, *axis);
        }
        Program::KawaseDown => {
            let (src, sw, sh) = input(0)?;
            kernels::kawase_down(src, *sw, *sh, dst, ow, oh);
        }
        Program::KawaseUp => {
            let (src, sw, sh) = input(0)?;
            kernels::kawase_up(src, *sw, *sh, dst, ow, oh);
        }
        Program::MotionTent { dx, dy } => {
            let s = input(0)?;
            same_size(s)?;
            kernels::motion_tent(&s.0, dst, ow, oh, *dx, *dy);
        }
        Program::Radial {
            center,
            strength,
            samples,
        } => {
            let s = input(0)?;
            same_size(s)?;
            kernels::radial(&s.0, dst, ow, oh, *center, *strength, *samples);
        }
        Program::ColorMatrix(m) => {
            let s = input(0)?;
            same_size(s)?;
            kernels::color_matrix_rgba8_premul(&s.0, dst, *m);
        }
        Program::Mask(mode) => {
            let (s, m) = (input(0)?, input(1)?);
            same_size(s)?;
            same_size(m)?;
            kernels::mask_apply_rgba8_premul(&s.0, &m.0, dst, *mode);
        }
        Program::Blend(mode) => {
            let (s, d) = (input(0)?, input(1)?);
            same_size(s)?;
            same_size(d)?;
            dst.copy_from_slice(&d.0);
            kernels::composite_over_rgba8_premul(dst, &s.0, *mode);
        }
        Program::Threshold(t) => {
            let s = input(0)?;
            same_size(s)?;
            kernels::threshold(&s.0, dst, *t);
        }
        Program::Add { strength } => {
            let (b, g) = (input(0)?, input(1)?);
            same_size(b)?;
            same_size(g)?;
            kernels::add(&b.0, &g.0, dst, *strength);
        }
    }
    Ok(())
}

/// Rasterize one textured quad with source-over.
///
/// The quad is treated as the affine image of its texture-coordinate window; pixels whose
/// centers fall inside are covered. Whole-pixel translations sample nearest texels exactly,
/// anything else samples bilinearly, clamped to the window.
fn draw_quad(dst: &mut vello_cpu::Pixmap, src: &vello_cpu::Pixmap, q: &QuadRef) {
    let (dw, dh) = (i32::from(dst.width()), i32::from(dst.height()));
    let (sw, sh) = (u32::from(src.width()), u32::from(src.height()));
    let op = opacity_u16(q.opacity);
    if op == 0 {
        return;
    }

    let pt = |i: usize| (f64::from(q.corners[i][0]), f64::from(q.corners[i][1]));
    let (p0, p1, p2, p3) = (pt(0), pt(1), pt(2), pt(3));
    let s0 = f64::from(q.uv[0][0]) * f64::from(sw);
    let t0 = f64::from(q.uv[0][1]) * f64::from(sh);
    let s1 = f64::from(q.uv[1][0]) * f64::from(sw);
    let t1 = f64::from(q.uv[2][1]) * f64::from(sh);
    let (ds, dt) = (s1 - s0, t1 - t0);
    if ds <= 0.0 || dt <= 0.0 {
        return;
    }

    let ex = ((p1.0 - p0.0) / ds, (p1.1 - p0.1) / ds);
    let ey = ((p2.0 - p0.0) / dt, (p2.1 - p0.1) / dt);
    let det = ex.0 * ey.1 - ey.0 * ex.1;
    if det.abs() < 1e-12 {
        return;
    }

    let xs = [p0.0, p1.0, p2.0, p3.0];
    let ys = [p0.1, p1.1, p2.1, p3.1];
    let min_x = xs.iter().copied().fold(f64::INFINITY, f64::min).floor().max(0.0) as i32;
    let max_x = (xs.iter().copied().fold(f64::NEG_INFINITY, f64::max).ceil() as i32).min(dw);
    let min_y = ys.iter().copied().fold(f64::INFINITY, f64::min).floor().max(0.0) as i32;
    let max_y = (ys.iter().copied().fold(f64::NEG_INFINITY, f64::max).ceil() as i32).min(dh);
    if min_x >= max_x || min_y >= max_y {
        return;
    }

    let nearest = ex == (1.0, 0.0)
        && ey == (0.0, 1.0)
        && (p0.0 - s0).fract() == 0.0
        && (p0.1 - t0).fract() == 0.0;
    let lo = (s0.floor() as i32, t0.floor() as i32);
    let hi = (s1.ceil() as i32 - 1, t1.ceil() as i32 - 1);

    let src_data = src.data_as_u8_slice();
    let dst_data = dst.data_as_u8_slice_mut();
    for y in min_y..max_y {
        for x in min_x..max_x {
            let vx = f64::from(x) + 0.5 - p0.0;
            let vy = f64::from(y) + 0.5 - p0.1;
            let s = s0 + (vx * ey.1 - ey.0 * vy) / det;
            let t = t0 + (ex.0 * vy - vx * ex.1) / det;
            if s < s0 || s >= s1 || t < t0 || t >= t1 {
                continue;
            }
            let texel = if nearest {
                kernels::px(src_data, sw, sh, s.floor() as i32, t.floor() as i32)
            } else {
                sample_bilinear_clamped(src_data, sw, s, t, lo, hi)
            };
            let i = ((y as usize) * (dw as usize) + (x as usize)) * 4;
            kernels::premul_over_px_opacity(&mut dst_data[i..i + 4], texel, op);
        }
    }
}

fn sample_bilinear_clamped(
    src: &[u8],
    width: u32,
    s: f64,
    t: f64,
    lo: (i32, i32),
    hi: (i32, i32),
) -> [u8; 4] {
    let x = s - 0.5;
    let y = t - 0.5;
    let xf = x.floor();
    let yf = y.floor();
    let (tx, ty) = (x - xf, y - yf);
    let cx = |v: i32| v.clamp(lo.0, hi.0.max(lo.0));
    let cy = |v: i32| v.clamp(lo.1, hi.1.max(lo.1));
    let (x0, y0) = (xf as i32, yf as i32);
    let at = |xx: i32, yy: i32| -> usize { ((cy(yy) as usize) * (width as usize) + cx(xx) as usize) * 4 };
    let (a, b, c, d) = (at(x0, y0), at(x0 + 1, y0), at(x0, y0 + 1), at(x0 + 1, y0 + 1));
    let mut out = [0u8; 4];
    for k in 0..4 {
        let top = f64::from(src[a + k]) * (1.0 - tx) + f64::from(src[b + k]) * tx;
        let bot = f64::from(src[c + k]) * (1.0 - tx) + f64::from(src[d + k]) * tx;
        out[k] = (top * (1.0 - ty) + bot * ty).round().clamp(0.0, 255.0) as u8;
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
