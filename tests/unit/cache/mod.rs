use super::*;
use crate::foundation::core::{Canvas, Color};
use crate::render::cpu::{CpuBackend, CpuBackendOpts};
use crate::scene::content::{Bitmap, CanvasSource, ImageSource};
use crate::style::computed::ComputedStyle;

fn resources() -> Resources {
    Resources::new(
        Box::new(CpuBackend::new(CpuBackendOpts::default())),
        Canvas {
            width: 8,
            height: 8,
        },
        64,
    )
    .unwrap()
}

fn image() -> ImageSource {
    let data = [200u8, 100, 50, 255].repeat(4 * 2);
    ImageSource::from_bitmap(Bitmap::from_premul(4, 2, data).unwrap())
}

fn node(w: f64, h: f64, content: Content) -> Node {
    Node::new(
        ComputedStyle {
            width: w,
            height: h,
            ..ComputedStyle::default()
        },
        content,
    )
}

#[test]
fn same_image_is_uploaded_once() {
    let mut res = resources();
    let img = image();
    let mut a = node(4.0, 2.0, Content::Image(img.clone()));
    let mut b = node(8.0, 4.0, Content::Image(img.clone()));
    ensure_own_cache(&mut a, &mut res).unwrap();
    ensure_own_cache(&mut b, &mut res).unwrap();
    let key = ResourceKey::Image(img.key());
    assert_eq!(res.shared.count(key), 2);
    assert_eq!(res.gpu.stats().textures_created, 1);
    assert!(a.caches.cache.as_ref().unwrap().is_pixel_exact());
    assert!(!b.caches.cache.as_ref().unwrap().is_pixel_exact());

    drop(a);
    drop(b);
    assert_eq!(res.shared.count(key), 0);
    assert_eq!(res.collect_garbage(), 1);
    assert_eq!(res.gpu.stats().live_textures, 0);
}

#[test]
fn scale_mismatch_regenerates_a_private_cache() {
    let mut res = resources();
    let img = image();
    let mut n = node(8.0, 4.0, Content::Image(img.clone()));
    ensure_own_cache(&mut n, &mut res).unwrap();
    assert!(n.caches.cache.as_ref().unwrap().is_shared());
    ensure_exact_scale(&mut n, &mut res).unwrap();
    let c = n.caches.cache.as_ref().unwrap();
    assert!(!c.is_shared());
    assert!(c.is_pixel_exact());
    assert_eq!(res.shared.count(ResourceKey::Image(img.key())), 0);
}

#[test]
fn exact_scale_keeps_a_matching_shared_cache() {
    let mut res = resources();
    let mut n = node(4.0, 2.0, Content::Image(image()));
    ensure_exact_scale(&mut n, &mut res).unwrap();
    assert!(n.caches.cache.as_ref().unwrap().is_shared());
}

#[test]
fn background_forces_a_private_raster() {
    let mut res = resources();
    let mut n = node(4.0, 2.0, Content::Image(image()));
    n.style.background_color = Color::rgb(0, 0, 0);
    ensure_own_cache(&mut n, &mut res).unwrap();
    assert!(!n.caches.cache.as_ref().unwrap().is_shared());
    assert_eq!(res.shared.stats().allocs, 0);
}

#[test]
fn canvas_update_makes_the_cache_stale() {
    let mut res = resources();
    let canvas = CanvasSource::new(2, 2);
    let mut n = node(2.0, 2.0, Content::Canvas(canvas.clone()));
    ensure_own_cache(&mut n, &mut res).unwrap();
    assert!(!media_is_stale(&n));
    canvas.update(|px| px.fill(255));
    assert!(media_is_stale(&n));
    ensure_own_cache(&mut n, &mut res).unwrap();
    assert!(!media_is_stale(&n));
    assert_eq!(
        n.caches.cache.as_ref().unwrap().shared_key(),
        Some(ResourceKey::Canvas {
            surface: canvas.identity(),
            revision: 1
        })
    );
}

#[test]
fn empty_node_gets_no_cache() {
    let mut res = resources();
    let mut n = node(4.0, 4.0, Content::None);
    ensure_own_cache(&mut n, &mut res).unwrap();
    assert!(n.caches.cache.is_none());
}
