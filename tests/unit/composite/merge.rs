use super::*;
use crate::foundation::core::{Canvas, Color};
use crate::render::cpu::{CpuBackend, CpuBackendOpts};
use crate::render::frame::update_world;
use crate::scene::content::Content;
use crate::style::computed::{ComputedStyle, MaskMode};

fn setup(w: u32, h: u32) -> (Scene, Resources, MergeScratch) {
    let res = Resources::new(
        Box::new(CpuBackend::new(CpuBackendOpts::default())),
        Canvas {
            width: w,
            height: h,
        },
        32,
    )
    .unwrap();
    (
        Scene::new(f64::from(w), f64::from(h)),
        res,
        MergeScratch::default(),
    )
}

fn node(scene: &mut Scene, parent: NodeId, style: ComputedStyle) -> NodeId {
    let id = scene.create(style, Content::None);
    scene.append_child(parent, id).unwrap();
    id
}

fn boxed(x: f64, y: f64, w: f64, h: f64) -> ComputedStyle {
    ComputedStyle {
        left: x,
        top: y,
        width: w,
        height: h,
        background_color: Color::rgb(10, 200, 30),
        ..ComputedStyle::default()
    }
}

fn group(x: f64, y: f64, opacity: f32) -> ComputedStyle {
    ComputedStyle {
        left: x,
        top: y,
        width: 4.0,
        height: 4.0,
        opacity,
        ..ComputedStyle::default()
    }
}

fn run(scene: &mut Scene, res: &mut Resources, scratch: &mut MergeScratch) -> MergeStats {
    update_world(scene);
    merge(scene, res, scratch, Scope::Frame).unwrap()
}

#[test]
fn generated_groups_stop_being_candidates() {
    let (mut s, mut res, mut scratch) = setup(32, 32);
    let parent = s.root;
    let g = node(&mut s, parent, group(0.0, 0.0, 0.5));
    node(&mut s, g, boxed(0.0, 0.0, 4.0, 4.0));

    let first = run(&mut s, &mut res, &mut scratch);
    assert_eq!(
        first,
        MergeStats {
            candidates: 1,
            generated: 1,
            culled: 0,
            failed: 0,
        }
    );
    assert!(s.node(g).caches.total.is_some());

    let second = run(&mut s, &mut res, &mut scratch);
    assert_eq!(second, MergeStats::default());
}

#[test]
fn off_screen_candidates_are_culled_until_they_move_in() {
    let (mut s, mut res, mut scratch) = setup(32, 32);
    let parent = s.root;
    let g = node(&mut s, parent, group(100.0, 0.0, 0.5));
    node(&mut s, g, boxed(0.0, 0.0, 4.0, 4.0));

    let stats = run(&mut s, &mut res, &mut scratch);
    assert_eq!(stats.culled, 1);
    assert_eq!(stats.generated, 0);
    assert!(s.node(g).caches.total.is_none());

    s.node_mut(g).style.left = 8.0;
    crate::scene::compute::cal_reflow(s.node_mut(g));
    let stats = run(&mut s, &mut res, &mut scratch);
    assert_eq!(stats.generated, 1);
    assert!(s.node(g).caches.total.is_some());
}

#[test]
fn children_reaching_on_screen_keep_the_group_alive() {
    let (mut s, mut res, mut scratch) = setup(32, 32);
    let parent = s.root;
    let g = node(&mut s, parent, group(40.0, 0.0, 0.5));
    node(&mut s, g, boxed(-38.0, 0.0, 4.0, 4.0));

    let stats = run(&mut s, &mut res, &mut scratch);
    assert_eq!(stats.generated, 1);
    let total = s.node(g).caches.total.as_ref().unwrap();
    assert_eq!(total.bbox, Rect::new(-38.0, 0.0, 4.0, 4.0));
}

#[test]
fn nested_candidates_follow_their_outer_group() {
    let (mut s, mut res, mut scratch) = setup(32, 32);
    let parent = s.root;
    let outer = node(&mut s, parent, group(0.0, 0.0, 0.5));
    let inner = node(&mut s, outer, group(2.0, 2.0, 0.5));
    node(&mut s, inner, boxed(0.0, 0.0, 6.0, 6.0));

    let stats = run(&mut s, &mut res, &mut scratch);
    assert_eq!(stats.candidates, 2);
    assert_eq!(stats.generated, 2);
    assert!(scratch.candidates[1].nested);
    assert!(!scratch.candidates[0].nested);
    assert_eq!(scratch.candidates[0].sub, 1..2);
    // The outer extent covers the inner group placed at (2, 2).
    assert_eq!(scratch.candidates[0].temp_bbox, Rect::new(0.0, 0.0, 8.0, 8.0));
    assert!(s.node(inner).caches.total.is_some());
    assert!(s.node(outer).caches.total.is_some());
}

#[test]
fn clipping_groups_use_their_own_box() {
    let (mut s, mut res, mut scratch) = setup(32, 32);
    let mut style = group(0.0, 0.0, 1.0);
    style.overflow = Overflow::Clip;
    let parent = s.root;
    let g = node(&mut s, parent, style);
    node(&mut s, g, boxed(2.0, 2.0, 10.0, 10.0));

    run(&mut s, &mut res, &mut scratch);
    let total = s.node(g).caches.total.as_ref().unwrap();
    assert_eq!(total.bbox, Rect::new(0.0, 0.0, 4.0, 4.0));
}

#[test]
fn mask_reach_is_generated_with_the_mask() {
    let (mut s, mut res, mut scratch) = setup(32, 32);
    let mut mask = boxed(0.0, 0.0, 8.0, 8.0);
    mask.mask_mode = MaskMode::Alpha;
    let parent = s.root;
    let m = node(&mut s, parent, mask);
    // A grouped sibling that sits off-screen on its own is still part of the masked result.
    let parent = s.root;
    let b = node(&mut s, parent, group(64.0, 0.0, 0.5));
    node(&mut s, b, boxed(0.0, 0.0, 4.0, 4.0));
    assert_eq!(s.list[s.index_of(m).unwrap()].next, 1);

    let stats = run(&mut s, &mut res, &mut scratch);
    assert_eq!(stats.candidates, 2);
    assert_eq!(stats.generated, 2);
    assert!(s.node(m).caches.mask.is_some());
    assert!(s.node(b).caches.total.is_some());
}

#[test]
fn forced_scope_ignores_the_viewport() {
    let (mut s, mut res, mut scratch) = setup(32, 32);
    let parent = s.root;
    let g = node(&mut s, parent, group(500.0, 500.0, 0.5));
    node(&mut s, g, boxed(0.0, 0.0, 4.0, 4.0));
    update_world(&mut s);
    let stats = merge(&mut s, &mut res, &mut scratch, Scope::Forced(g)).unwrap();
    assert_eq!(stats.generated, 1);
    assert!(s.node(g).caches.total.is_some());
}

#[test]
fn subtree_extent_applies_child_matrices() {
    let (mut s, _res, mut scratch) = setup(32, 32);
    let parent = s.root;
    let g = node(&mut s, parent, group(0.0, 0.0, 0.5));
    let mut child = boxed(4.0, 0.0, 2.0, 2.0);
    child.scale_x = 2.0;
    child.transform_origin = Some(crate::foundation::core::Point::ZERO);
    node(&mut s, g, child);
    update_world(&mut s);
    let i = s.index_of(g).unwrap();
    assert_eq!(subtree_extent(&s, &mut scratch, i), Rect::new(0.0, 0.0, 8.0, 4.0));
}
