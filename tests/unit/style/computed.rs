use super::*;

#[test]
fn apply_reports_only_real_changes() {
    let mut s = ComputedStyle::default();
    assert!(!s.apply(StyleChange::Opacity(1.0)));
    assert!(s.apply(StyleChange::Opacity(0.5)));
    assert!(!s.apply(StyleChange::Opacity(0.5)));
    assert!(s.apply(StyleChange::TranslateX(5.0)));
    assert_eq!(s.translate_x, 5.0);
}

#[test]
fn opacity_and_size_are_clamped() {
    let mut s = ComputedStyle::default();
    s.apply(StyleChange::Opacity(3.0));
    assert_eq!(s.opacity, 1.0);
    s.apply(StyleChange::Width(-4.0));
    assert_eq!(s.width, 0.0);
}

#[test]
fn origin_defaults_to_box_center() {
    let s = ComputedStyle {
        width: 40.0,
        height: 10.0,
        ..ComputedStyle::default()
    };
    assert_eq!(s.origin(), Point::new(20.0, 5.0));
}

#[test]
fn mask_mode_capabilities() {
    assert!(!MaskMode::None.is_mask());
    assert!(MaskMode::GrayWithBackground.with_background());
    assert!(MaskMode::Gray.uses_luma());
    assert!(!MaskMode::Alpha.uses_luma());
}

#[test]
fn style_change_deserializes_from_tagged_json() {
    let c: StyleChange = serde_json::from_str(r#"{"key":"translate_x","value":5.0}"#).unwrap();
    assert_eq!(c, StyleChange::TranslateX(5.0));
    assert_eq!(c.key(), StyleKey::TranslateX);
}
