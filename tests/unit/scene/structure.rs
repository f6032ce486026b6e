use super::*;
use crate::scene::content::Content;
use crate::style::computed::{ComputedStyle, MaskMode};

fn leaf(scene: &mut Scene) -> NodeId {
    scene.create(ComputedStyle::default(), Content::None)
}

fn mask(scene: &mut Scene) -> NodeId {
    scene.create(
        ComputedStyle {
            mask_mode: MaskMode::Alpha,
            ..ComputedStyle::default()
        },
        Content::None,
    )
}

fn assert_consistent(scene: &Scene) {
    assert_eq!(scene.list, scene.flatten(scene.root, 0));
}

#[test]
fn flatten_back_patches_num_and_total() {
    let mut s = Scene::new(100.0, 100.0);
    let a = leaf(&mut s);
    let a1 = leaf(&mut s);
    let a2 = leaf(&mut s);
    let b = leaf(&mut s);
    s.append_child(a, a1).unwrap();
    s.append_child(a, a2).unwrap();
    s.append_child(s.root, a).unwrap();
    s.append_child(s.root, b).unwrap();

    let nodes: Vec<_> = s.list.iter().map(|e| e.node).collect();
    assert_eq!(nodes, vec![s.root, a, a1, a2, b]);
    assert_eq!(s.list[0].total, 4);
    assert_eq!(s.list[0].num, 2);
    assert_eq!(s.list[1].total, 2);
    assert_eq!(s.list[1].num, 2);
    assert_eq!(s.list[2].lv, 2);
    assert_eq!(s.list[4].lv, 1);
    assert_consistent(&s);
}

#[test]
fn incremental_splices_match_reflatten() {
    let mut s = Scene::new(10.0, 10.0);
    let a = leaf(&mut s);
    let b = leaf(&mut s);
    let c = leaf(&mut s);
    let d = leaf(&mut s);
    s.append_child(s.root, a).unwrap();
    s.append_child(s.root, c).unwrap();
    s.insert_before(s.root, b, c).unwrap();
    assert_consistent(&s);
    s.append_child(b, d).unwrap();
    assert_consistent(&s);
    assert_eq!(s.index_of(d), Some(3));

    s.remove(b).unwrap();
    assert_consistent(&s);
    assert_eq!(s.list.len(), 3);
    assert_eq!(s.index_of(b), None);

    s.insert_before(s.root, b, a).unwrap();
    assert_consistent(&s);
    assert_eq!(s.index_of(d), Some(2));
}

#[test]
fn detached_subtree_is_spliced_whole() {
    let mut s = Scene::new(10.0, 10.0);
    let a = leaf(&mut s);
    let a1 = leaf(&mut s);
    let a11 = leaf(&mut s);
    s.append_child(a1, a11).unwrap();
    s.append_child(a, a1).unwrap();
    assert_eq!(s.list.len(), 1);
    s.append_child(s.root, a).unwrap();
    assert_eq!(s.list.len(), 4);
    assert!(s.node(a11).attached);
    assert_consistent(&s);
}

#[test]
fn mask_reach_includes_break_mask_sibling() {
    let mut s = Scene::new(10.0, 10.0);
    let a = mask(&mut s);
    let b = leaf(&mut s);
    let c = s.create(
        ComputedStyle {
            break_mask: true,
            ..ComputedStyle::default()
        },
        Content::None,
    );
    let d = leaf(&mut s);
    for n in [a, b, c, d] {
        s.append_child(s.root, n).unwrap();
    }
    let ai = s.index_of(a).unwrap();
    assert_eq!(s.list[ai].next, 2);
    assert_eq!(s.node(b).masked_by, Some(a));
    assert_eq!(s.node(c).masked_by, Some(a));
    assert_eq!(s.node(d).masked_by, None);
    assert_eq!(skip(&s.list, ai, true), s.index_of(d).unwrap());
    assert_consistent(&s);
}

#[test]
fn mask_reach_stops_before_next_mask() {
    let mut s = Scene::new(10.0, 10.0);
    let a = mask(&mut s);
    let b = leaf(&mut s);
    let m2 = mask(&mut s);
    let c = leaf(&mut s);
    for n in [a, b, m2, c] {
        s.append_child(s.root, n).unwrap();
    }
    assert_eq!(s.mask_reach(a), 1);
    assert_eq!(s.mask_reach(m2), 1);
    assert_eq!(s.node(c).masked_by, Some(m2));
}

#[test]
fn removing_a_governed_sibling_shrinks_reach() {
    let mut s = Scene::new(10.0, 10.0);
    let a = mask(&mut s);
    let b = leaf(&mut s);
    let c = leaf(&mut s);
    for n in [a, b, c] {
        s.append_child(s.root, n).unwrap();
    }
    assert_eq!(s.list[1].next, 2);
    s.remove(b).unwrap();
    assert_eq!(s.list[1].next, 1);
    assert_eq!(s.node(b).masked_by, None);
    assert_consistent(&s);
}
