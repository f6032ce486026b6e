use super::*;
use crate::foundation::core::Canvas;
use crate::render::backend::Target;
use crate::render::cpu::{CpuBackend, CpuBackendOpts};
use crate::render::painter::paint_into;

fn resources(unit: u32) -> Resources {
    Resources::new(
        Box::new(CpuBackend::new(CpuBackendOpts::default())),
        Canvas {
            width: 8,
            height: 8,
        },
        unit,
    )
    .unwrap()
}

fn checker_source(res: &mut Resources, w: u32, h: u32) -> TextureCache {
    let mut data = Vec::with_capacity((w * h * 4) as usize);
    for y in 0..h {
        for x in 0..w {
            let on = ((x / 5) + (y / 7)) % 2 == 0;
            data.extend_from_slice(if on { &[240u8, 40, 10, 255] } else { &[0u8, 0, 0, 0] });
        }
    }
    let texture = res.gpu.create_texture(w, h, Some(&data)).unwrap();
    TextureCache::owned(
        vec![crate::cache::texture::SubTexture {
            texture,
            bbox: Rect::new(0.0, 0.0, f64::from(w), f64::from(h)),
            width: w,
            height: h,
            tc: None,
        }],
        &res.release,
    )
}

fn flatten_to_pixels(res: &mut Resources, cache: &TextureCache) -> Vec<u8> {
    let r = IRect::round_out(cache.bbox);
    let tex = res.gpu.create_texture(r.width(), r.height(), None).unwrap();
    let m = crate::foundation::core::Affine::translate((-f64::from(r.x0), -f64::from(r.y0)));
    paint_into(res, Target::Texture(tex), Some([0, 0, 0, 0]), |p| {
        p.draw(cache, m, 1.0, crate::style::computed::BlendMode::Normal)
    })
    .unwrap();
    res.gpu.read_pixels(Target::Texture(tex)).unwrap().data
}

fn style_with(filters: Vec<Filter>) -> ComputedStyle {
    ComputedStyle {
        width: 40.0,
        height: 30.0,
        filters,
        ..ComputedStyle::default()
    }
}

fn filtered(unit: u32, filters: Vec<Filter>) -> (Rect, Vec<u8>) {
    let mut res = resources(unit);
    let src = checker_source(&mut res, 40, 30);
    let style = style_with(filters);
    let out = apply_chain(&mut res, &src, &style, src.bbox).unwrap();
    (out.bbox, flatten_to_pixels(&mut res, &out))
}

#[test]
fn identity_filters_emit_no_pass() {
    let p = normalize_filters(
        &[
            Filter::Blur { sigma: 0.0 },
            Filter::Saturate { amount: 1.0 },
            Filter::Brightness { amount: 0.0 },
        ],
        Rect::new(0.0, 0.0, 10.0, 10.0),
    );
    assert!(p.passes.is_empty());
}

#[test]
fn adjacent_color_filters_fold_into_one_matrix() {
    let p = normalize_filters(
        &[
            Filter::Contrast { amount: 1.5 },
            Filter::Sepia { amount: 0.5 },
            Filter::Blur { sigma: 2.0 },
            Filter::Invert { amount: 1.0 },
        ],
        Rect::new(0.0, 0.0, 10.0, 10.0),
    );
    assert_eq!(p.passes.len(), 3);
    assert!(matches!(p.passes[0], PassFx::Color(_)));
    assert_eq!(p.passes[1], PassFx::Blur { sigma: 2.0 });
    assert!(matches!(p.passes[2], PassFx::Color(_)));
}

#[test]
fn inverse_color_pair_cancels_out() {
    let p = normalize_filters(
        &[Filter::Invert { amount: 1.0 }, Filter::Invert { amount: 1.0 }],
        Rect::new(0.0, 0.0, 10.0, 10.0),
    );
    assert!(p.passes.is_empty());
}

#[test]
fn radial_center_is_placed_in_the_node_box() {
    let p = normalize_filters(
        &[Filter::RadialBlur {
            center: [0.25, 0.5],
            strength: 0.4,
        }],
        Rect::new(0.0, 0.0, 40.0, 20.0),
    );
    assert_eq!(
        p.passes,
        vec![PassFx::Radial {
            center: Point::new(10.0, 10.0),
            strength: 0.4,
        }]
    );
}

#[test]
fn expanded_box_contains_content_and_spread() {
    let bbox = Rect::new(0.0, 0.0, 40.0, 30.0);
    assert_eq!(expand_bbox(&style_with(Vec::new()), bbox), bbox);

    let blurred = expand_bbox(&style_with(vec![Filter::Blur { sigma: 3.0 }]), bbox);
    assert!(blurred.x0 <= -9.0 && blurred.y1 >= 39.0);

    let motion = expand_bbox(
        &style_with(vec![Filter::MotionBlur {
            angle: 0.0,
            distance: 12.0,
        }]),
        bbox,
    );
    assert!(motion.x0 <= -12.0 && motion.x1 >= 52.0);
    assert!(motion.y0 > -6.0);
}

#[test]
fn problems_are_reported_per_filter() {
    assert!(problem(&Filter::Blur { sigma: -1.0 }).is_some());
    assert!(problem(&Filter::Blur { sigma: f32::NAN }).is_some());
    assert!(
        problem(&Filter::RadialBlur {
            center: [0.5, 0.5],
            strength: 0.95,
        })
        .is_some()
    );
    assert!(problem(&Filter::Invert { amount: 2.0 }).is_some());
    assert!(problem(&Filter::Blur { sigma: 4.0 }).is_none());

    assert!(problem(&Filter::Blur { sigma: MAX_BLUR_SIGMA }).is_none());
    assert!(problem(&Filter::Blur { sigma: 1.0e20 }).is_some());
    assert!(
        problem(&Filter::MotionBlur {
            angle: 0.0,
            distance: MAX_MOTION_DISTANCE + 1.0,
        })
        .is_some()
    );
    assert!(
        problem(&Filter::RadialBlur {
            center: [5.0, 0.5],
            strength: 0.5,
        })
        .is_some()
    );
}

#[test]
fn blur_output_is_independent_of_tile_unit() {
    let filters = vec![Filter::Blur { sigma: 3.0 }];
    let (a_box, a) = filtered(16, filters.clone());
    let (b_box, b) = filtered(256, filters);
    assert_eq!(a_box, b_box);
    assert_eq!(a, b);
    assert!(a.chunks_exact(4).any(|p| p[3] > 0 && p[3] < 255));
}

#[test]
fn downsampled_blur_is_independent_of_tile_unit() {
    let filters = vec![Filter::Blur { sigma: 18.0 }];
    let (a_box, a) = filtered(32, filters.clone());
    let (b_box, b) = filtered(512, filters);
    assert_eq!(a_box, b_box);
    assert_eq!(a, b);
}

#[test]
fn motion_and_color_chain_is_independent_of_tile_unit() {
    let filters = vec![
        Filter::MotionBlur {
            angle: 30.0,
            distance: 9.0,
        },
        Filter::Grayscale { amount: 1.0 },
    ];
    let (_, a) = filtered(16, filters.clone());
    let (_, b) = filtered(256, filters);
    assert_eq!(a, b);
}

#[test]
fn folded_identity_chain_emits_nothing() {
    let chain = [
        Filter::Invert { amount: 1.0 },
        Filter::Brightness { amount: 0.0 },
        Filter::Invert { amount: 1.0 },
    ];
    assert!(!emits_passes(&chain));
    let style = style_with(chain.to_vec());
    assert!(!style.has_effective_filters());
    let bbox = Rect::new(0.0, 0.0, 40.0, 30.0);
    assert_eq!(expand_bbox(&style, bbox), bbox);
}

#[test]
fn oversized_parameters_are_clamped() {
    let bbox = Rect::new(0.0, 0.0, 10.0, 10.0);
    let p = normalize_filters(
        &[
            Filter::Blur { sigma: 1.0e20 },
            Filter::MotionBlur {
                angle: 0.0,
                distance: f32::INFINITY,
            },
            Filter::RadialBlur {
                center: [1.0e9, f32::NAN],
                strength: 0.5,
            },
        ],
        bbox,
    );
    assert_eq!(p.passes[0], PassFx::Blur { sigma: MAX_BLUR_SIGMA });
    assert_eq!(
        p.passes[1],
        PassFx::Motion {
            dx: MAX_MOTION_DISTANCE,
            dy: 0.0,
        }
    );
    assert_eq!(
        p.passes[2],
        PassFx::Radial {
            center: Point::new(20.0, 5.0),
            strength: 0.5,
        }
    );

    let style = style_with(vec![Filter::Blur { sigma: f32::MAX }]);
    let grown = expand_bbox(&style, bbox);
    let capped = expand_bbox(&style_with(vec![Filter::Blur { sigma: MAX_BLUR_SIGMA }]), bbox);
    assert_eq!(grown, capped);
}

#[test]
fn empty_source_yields_empty_output() {
    let mut res = resources(64);
    let src = TextureCache::owned(Vec::new(), &res.release);
    let style = style_with(vec![Filter::Blur { sigma: 2.0 }]);
    let out = apply_chain(&mut res, &src, &style, Rect::ZERO).unwrap();
    assert!(out.subs.is_empty());
}

#[test]
fn passes_leave_no_temporaries_behind() {
    let mut res = resources(16);
    let src = checker_source(&mut res, 40, 30);
    let style = style_with(vec![
        Filter::Blur { sigma: 20.0 },
        Filter::Bloom {
            threshold: 0.5,
            sigma: 6.0,
            strength: 0.8,
        },
    ]);
    let out = apply_chain(&mut res, &src, &style, src.bbox).unwrap();
    let live = res.gpu.stats().live_textures;
    assert_eq!(live, 1 + out.subs.len() + res.release.len());
    drop(out);
    drop(src);
    res.collect_garbage();
    assert_eq!(res.gpu.stats().live_textures, 0);
}
