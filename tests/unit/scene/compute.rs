use super::*;
use crate::foundation::core::Point;
use crate::scene::content::Content;
use crate::style::computed::StyleChange;

fn node(style: ComputedStyle) -> Node {
    Node::new(style, Content::None)
}

#[test]
fn rotation_is_about_box_center_by_default() {
    let n = node(ComputedStyle {
        left: 10.0,
        top: 20.0,
        width: 100.0,
        height: 50.0,
        rotate: 180.0,
        ..ComputedStyle::default()
    });
    let p = n.local * Point::new(0.0, 0.0);
    assert!((p.x - 110.0).abs() < 1e-9);
    assert!((p.y - 70.0).abs() < 1e-9);
    let c = n.local * Point::new(50.0, 25.0);
    assert!((c.x - 60.0).abs() < 1e-9);
    assert!((c.y - 45.0).abs() < 1e-9);
}

#[test]
fn translate_fast_path_is_bit_exact_with_full_path() {
    let mut n = node(ComputedStyle {
        left: 3.25,
        top: -7.5,
        width: 33.0,
        height: 17.0,
        rotate: 27.0,
        scale_x: 1.7,
        scale_y: 0.6,
        skew_x: 9.0,
        ..ComputedStyle::default()
    });
    let before = n.local.as_coeffs();
    n.style.apply(StyleChange::TranslateX(5.0));
    cal_matrix(&mut n, RefreshLevel::TRANSLATE_X);
    let fast = n.local.as_coeffs();
    assert_eq!(&fast[..4], &before[..4]);
    assert_eq!(fast, full_matrix(&n.style).as_coeffs());
    assert_eq!(fast[4].to_bits(), full_matrix(&n.style).as_coeffs()[4].to_bits());
}

#[test]
fn translate_plus_five_moves_only_translation() {
    let mut n = node(ComputedStyle {
        width: 10.0,
        height: 10.0,
        ..ComputedStyle::default()
    });
    let before = n.local.as_coeffs();
    n.style.apply(StyleChange::TranslateX(5.0));
    cal_matrix(&mut n, RefreshLevel::TRANSLATE_X);
    let after = n.local.as_coeffs();
    assert_eq!(after[4], before[4] + 5.0);
    assert_eq!(after[5], before[5]);
    assert_eq!(&after[..4], &before[..4]);
}

#[test]
fn reflow_updates_box_and_filter_box() {
    let mut n = node(ComputedStyle::default());
    n.style.apply(StyleChange::Width(40.0));
    n.style.apply(StyleChange::Height(20.0));
    n.style.apply(StyleChange::Filter(vec![
        crate::style::filter::Filter::Blur { sigma: 2.0 },
    ]));
    cal_reflow(&mut n);
    assert_eq!(n.bbox, Rect::new(0.0, 0.0, 40.0, 20.0));
    assert!(n.filter_bbox.contains_rect(n.bbox));
    assert!(n.filter_bbox.width() > n.bbox.width());
}
