use super::*;
use crate::cache::texture::{ReleaseQueue, SubTexture};
use crate::render::cpu::{CpuBackend, CpuBackendOpts};

fn backend(opts: CpuBackendOpts) -> CpuBackend {
    let mut b = CpuBackend::new(opts);
    b.init(4, 4).unwrap();
    b
}

fn solid_tiles(gpu: &mut dyn GpuBackend, q: &ReleaseQueue, colors: &[[u8; 4]]) -> TextureCache {
    let subs = colors
        .iter()
        .enumerate()
        .map(|(i, c)| SubTexture {
            texture: gpu.create_texture(1, 1, Some(c)).unwrap(),
            bbox: Rect::new(i as f64, 0.0, i as f64 + 1.0, 1.0),
            width: 1,
            height: 1,
            tc: None,
        })
        .collect();
    TextureCache::owned(subs, q)
}

#[test]
fn flushes_when_texture_units_run_out() {
    let q = ReleaseQueue::default();
    let mut gpu = backend(CpuBackendOpts::default().with_max_texture_units(2));
    let cache = solid_tiles(&mut gpu, &q, &[[255, 0, 0, 255], [0, 255, 0, 255], [0, 0, 255, 255]]);
    let mut batch = QuadBatch::new(gpu.max_texture_units());
    let mut p = Painter::new(&mut gpu, &mut batch, Target::Screen);
    p.draw(&cache, Affine::translate((1.0, 2.0)), 1.0, BlendMode::Normal)
        .unwrap();
    p.flush().unwrap();
    assert_eq!(p.quads, 3);
    assert_eq!(gpu.stats().draw_calls, 2);
    let f = gpu.read_pixels(Target::Screen).unwrap();
    assert_eq!(f.pixel(1, 2), Some([255, 0, 0, 255]));
    assert_eq!(f.pixel(3, 2), Some([0, 0, 255, 255]));
}

#[test]
fn one_quad_per_call_without_batching() {
    let q = ReleaseQueue::default();
    let mut gpu = backend(CpuBackendOpts::default().with_batching(false));
    let cache = solid_tiles(&mut gpu, &q, &[[9, 9, 9, 255], [9, 9, 9, 255]]);
    let mut batch = QuadBatch::new(16);
    let mut p = Painter::new(&mut gpu, &mut batch, Target::Screen);
    p.draw(&cache, Affine::IDENTITY, 1.0, BlendMode::Normal).unwrap();
    p.flush().unwrap();
    assert_eq!(gpu.stats().draw_calls, 2);
}

#[test]
fn culls_quads_outside_the_target() {
    let q = ReleaseQueue::default();
    let mut gpu = backend(CpuBackendOpts::default());
    let cache = solid_tiles(&mut gpu, &q, &[[9, 9, 9, 255]]);
    let mut batch = QuadBatch::new(16);
    let mut p = Painter::new(&mut gpu, &mut batch, Target::Screen);
    p.draw(&cache, Affine::translate((10.0, 0.0)), 1.0, BlendMode::Normal)
        .unwrap();
    p.flush().unwrap();
    assert_eq!(p.quads, 0);
    assert_eq!(gpu.stats().draw_calls, 0);
}

#[test]
fn non_normal_blend_goes_through_an_intermediate() {
    let q = ReleaseQueue::default();
    let mut gpu = backend(CpuBackendOpts::default());
    gpu.clear([128, 128, 128, 255]).unwrap();
    let cache = solid_tiles(&mut gpu, &q, &[[255, 255, 255, 255]]);
    let live = gpu.stats().live_textures;
    let mut batch = QuadBatch::new(16);
    let mut p = Painter::new(&mut gpu, &mut batch, Target::Screen);
    p.draw(&cache, Affine::IDENTITY, 1.0, BlendMode::Multiply).unwrap();
    p.flush().unwrap();
    let f = gpu.read_pixels(Target::Screen).unwrap();
    assert_eq!(f.pixel(0, 0), Some([128, 128, 128, 255]));
    assert_eq!(f.pixel(1, 1), Some([128, 128, 128, 255]));
    assert_eq!(gpu.stats().live_textures, live);
    assert_eq!(gpu.stats().program_runs, 1);
}
