use super::*;
use crate::cache::texture::{ReleaseQueue, SubTexture};
use crate::foundation::ids::TextureId;
use crate::style::computed::MaskMode;
use crate::style::filter::Filter;

fn cache(id: u32, release: &ReleaseQueue) -> TextureCache {
    TextureCache::owned(
        vec![SubTexture {
            texture: TextureId(id),
            bbox: Rect::new(0.0, 0.0, 1.0, 1.0),
            width: 1,
            height: 1,
            tc: None,
        }],
        release,
    )
}

fn target_id(n: &Node) -> Option<u32> {
    n.caches.target().map(|c| c.subs[0].texture.0)
}

#[test]
fn target_prefers_most_specific_slot() {
    let q = ReleaseQueue::default();
    let mut n = Node::new(ComputedStyle::default(), Content::None);
    assert!(target_id(&n).is_none());
    n.caches.cache = Some(cache(1, &q));
    assert_eq!(target_id(&n), Some(1));
    n.caches.total = Some(cache(2, &q));
    assert_eq!(target_id(&n), Some(2));
    n.caches.filter = Some(cache(3, &q));
    n.caches.mask = Some(cache(4, &q));
    assert_eq!(target_id(&n), Some(4));
    n.caches.mask = None;
    assert_eq!(target_id(&n), Some(3));
    assert_eq!(q.len(), 1);
}

#[test]
fn releasing_grouped_keeps_own_cache() {
    let q = ReleaseQueue::default();
    let mut n = Node::new(ComputedStyle::default(), Content::None);
    n.caches.cache = Some(cache(1, &q));
    n.caches.total = Some(cache(2, &q));
    n.caches.release_grouped();
    assert_eq!(target_id(&n), Some(1));
    assert_eq!(q.drain(), vec![TextureId(2)]);
    n.caches.release_all();
    assert!(!n.caches.has_any());
}

#[test]
fn grouping_requires_descendants_except_for_filters() {
    let mut style = ComputedStyle {
        opacity: 0.5,
        ..ComputedStyle::default()
    };
    let n = Node::new(style.clone(), Content::None);
    assert!(!n.needs_total(0, 0));
    assert!(n.needs_total(3, 0));
    assert!(matches!(n.paint(0, 0), Paint::Own(None)));
    assert!(matches!(n.paint(3, 0), Paint::Missing));

    style.opacity = 1.0;
    style.filters = vec![Filter::Blur { sigma: 2.0 }];
    let n = Node::new(style, Content::None);
    assert!(n.needs_filter());
    assert!(n.is_merge_candidate(0, 0));
}

#[test]
fn mask_without_reach_never_paints() {
    let style = ComputedStyle {
        mask_mode: MaskMode::Alpha,
        ..ComputedStyle::default()
    };
    let n = Node::new(style, Content::None);
    assert!(matches!(n.paint(0, 0), Paint::Missing));
    assert!(!n.needs_mask(0));
    assert!(n.needs_mask(2));
    assert!(n.is_merge_candidate(0, 2));
}

#[test]
fn chains_that_fold_away_need_no_filter_slot() {
    let style = ComputedStyle {
        width: 10.0,
        height: 10.0,
        filters: vec![Filter::Invert { amount: 1.0 }, Filter::Invert { amount: 1.0 }],
        ..ComputedStyle::default()
    };
    let n = Node::new(style, Content::None);
    assert!(!n.needs_filter());
    assert!(!n.needs_total(2, 0));
    assert!(!n.is_merge_candidate(2, 0));
    assert_eq!(n.filter_bbox, n.bbox);
    assert!(matches!(n.paint(2, 0), Paint::Own(None)));
}
