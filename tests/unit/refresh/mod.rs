use super::*;
use crate::cache::texture::{ReleaseQueue, SubTexture, TextureCache};
use crate::foundation::core::Rect;
use crate::foundation::ids::TextureId;
use crate::scene::content::Content;
use crate::style::computed::{BlendMode, ComputedStyle, MaskMode};
use crate::style::filter::Filter;

fn cache(id: u32, q: &ReleaseQueue) -> Option<TextureCache> {
    Some(TextureCache::owned(
        vec![SubTexture {
            texture: TextureId(id),
            bbox: Rect::new(0.0, 0.0, 1.0, 1.0),
            width: 1,
            height: 1,
            tc: None,
        }],
        q,
    ))
}

struct Fixture {
    scene: Scene,
    q: ReleaseQueue,
    parent: NodeId,
    child: NodeId,
}

fn fixture() -> Fixture {
    let q = ReleaseQueue::default();
    let mut scene = Scene::new(100.0, 100.0);
    let parent = scene.create(
        ComputedStyle {
            width: 50.0,
            height: 50.0,
            opacity: 0.5,
            ..ComputedStyle::default()
        },
        Content::None,
    );
    let child = scene.create(
        ComputedStyle {
            width: 10.0,
            height: 10.0,
            ..ComputedStyle::default()
        },
        Content::None,
    );
    let leaf = scene.create(ComputedStyle::default(), Content::None);
    scene.append_child(scene.root, parent).unwrap();
    scene.append_child(parent, child).unwrap();
    scene.append_child(child, leaf).unwrap();
    scene.node_mut(parent).caches.cache = cache(1, &q);
    scene.node_mut(parent).caches.total = cache(2, &q);
    scene.node_mut(child).caches.cache = cache(3, &q);
    scene.node_mut(child).caches.total = cache(4, &q);
    scene.node_mut(child).caches.filter = cache(5, &q);
    Fixture {
        scene,
        q,
        parent,
        child,
    }
}

#[test]
fn unchanged_value_is_a_no_op() {
    let mut f = fixture();
    let out = add_update(
        &mut f.scene,
        f.child,
        [StyleChange::Width(10.0), StyleChange::Opacity(1.0)],
        RefreshLevel::empty(),
    );
    assert_eq!(out, UpdateOutcome::default());
    assert!(f.scene.node(f.parent).caches.total.is_some());
    assert!(f.scene.node(f.child).caches.filter.is_some());
    assert_eq!(f.q.len(), 0);
}

#[test]
fn translate_keeps_own_caches_and_clears_ancestor_groups() {
    let mut f = fixture();
    let out = add_update(
        &mut f.scene,
        f.child,
        [StyleChange::TranslateX(5.0)],
        RefreshLevel::empty(),
    );
    assert_eq!(out.level, RefreshLevel::TRANSLATE_X);
    assert!(out.schedule);
    let child = f.scene.node(f.child);
    assert!(child.caches.cache.is_some());
    assert!(child.caches.total.is_some());
    let parent = f.scene.node(f.parent);
    assert!(parent.caches.cache.is_some());
    assert!(parent.caches.total.is_none());
    assert_eq!(f.q.drain(), vec![TextureId(2)]);
}

#[test]
fn repaint_releases_every_slot_of_the_node() {
    let mut f = fixture();
    add_update(
        &mut f.scene,
        f.child,
        [StyleChange::BackgroundColor(crate::foundation::core::Color::rgb(1, 2, 3))],
        RefreshLevel::empty(),
    );
    assert!(!f.scene.node(f.child).caches.has_any());
    assert!(f.scene.node(f.parent).caches.cache.is_some());
}

#[test]
fn filter_change_keeps_the_total() {
    let mut f = fixture();
    add_update(
        &mut f.scene,
        f.child,
        [StyleChange::Filter(vec![Filter::Blur { sigma: 3.0 }])],
        RefreshLevel::empty(),
    );
    let child = f.scene.node(f.child);
    assert!(child.caches.total.is_some());
    assert!(child.caches.filter.is_none());
    assert!(child.filter_bbox.contains_rect(child.bbox));
}

#[test]
fn hidden_ancestor_suppresses_scheduling() {
    let mut f = fixture();
    f.scene.node_mut(f.parent).style.visible = false;
    let out = add_update(
        &mut f.scene,
        f.child,
        [StyleChange::TranslateY(2.0)],
        RefreshLevel::empty(),
    );
    assert!(!out.schedule);
    assert!(!out.level.is_empty());
}

#[test]
fn hiding_a_node_still_schedules_a_frame() {
    let mut f = fixture();
    let out = add_update(
        &mut f.scene,
        f.child,
        [StyleChange::Visible(false)],
        RefreshLevel::empty(),
    );
    assert!(out.schedule);
    let out = add_update(
        &mut f.scene,
        f.child,
        [StyleChange::Opacity(0.3)],
        RefreshLevel::empty(),
    );
    assert!(!out.schedule);
}

#[test]
fn detached_nodes_never_schedule() {
    let mut f = fixture();
    let lone = f.scene.create(ComputedStyle::default(), Content::None);
    let out = add_update(&mut f.scene, lone, [StyleChange::Rotate(10.0)], RefreshLevel::empty());
    assert_eq!(out.level, RefreshLevel::ROTATE);
    assert!(!out.schedule);
}

#[test]
fn mask_change_reassociates_siblings() {
    let mut f = fixture();
    let sib = f.scene.create(ComputedStyle::default(), Content::None);
    f.scene.append_child(f.parent, sib).unwrap();
    assert_eq!(f.scene.node(sib).masked_by, None);
    let out = add_update(
        &mut f.scene,
        f.child,
        [StyleChange::MaskMode(MaskMode::Gray)],
        RefreshLevel::empty(),
    );
    assert!(out.level.contains(RefreshLevel::MASK));
    assert_eq!(f.scene.node(sib).masked_by, Some(f.child));
    let idx = f.scene.index_of(f.child).unwrap();
    assert_eq!(f.scene.list[idx].next, 1);
}

#[test]
fn explicit_level_alone_invalidates() {
    let mut f = fixture();
    let out = add_update(&mut f.scene, f.child, [], RefreshLevel::REPAINT);
    assert_eq!(out.level, RefreshLevel::REPAINT);
    assert!(!f.scene.node(f.child).caches.has_any());
}

#[test]
fn refresh_all_releases_on_repaint_only() {
    let mut f = fixture();
    assert!(refresh_all(&mut f.scene, RefreshLevel::OPACITY));
    assert!(f.scene.node(f.child).caches.has_any());
    assert!(refresh_all(&mut f.scene, RefreshLevel::REFLOW));
    assert!(!f.scene.node(f.child).caches.has_any());
    assert!(!f.scene.node(f.parent).caches.has_any());
}

#[test]
fn opacity_back_to_one_releases_the_total() {
    let mut f = fixture();
    let out = add_update(
        &mut f.scene,
        f.parent,
        [StyleChange::Opacity(1.0)],
        RefreshLevel::empty(),
    );
    assert_eq!(out.level, RefreshLevel::OPACITY);
    let parent = f.scene.node(f.parent);
    assert!(parent.caches.total.is_none());
    assert!(parent.caches.cache.is_some());
    assert_eq!(f.q.drain(), vec![TextureId(2)]);
}

#[test]
fn ungrouping_changes_release_the_total() {
    let mut f = fixture();
    add_update(
        &mut f.scene,
        f.child,
        [StyleChange::BlendMode(BlendMode::Multiply)],
        RefreshLevel::empty(),
    );
    assert!(f.scene.node(f.child).caches.total.is_some());
    add_update(
        &mut f.scene,
        f.child,
        [StyleChange::BlendMode(BlendMode::Normal)],
        RefreshLevel::empty(),
    );
    assert!(f.scene.node(f.child).caches.total.is_none());

    f.scene.node_mut(f.child).caches.total = cache(6, &f.q);
    add_update(
        &mut f.scene,
        f.child,
        [StyleChange::Filter(vec![
            Filter::Invert { amount: 1.0 },
            Filter::Invert { amount: 1.0 },
        ])],
        RefreshLevel::empty(),
    );
    let child = f.scene.node(f.child);
    assert!(!child.needs_filter());
    assert!(child.caches.total.is_none());
    assert!(child.caches.cache.is_some());
}
