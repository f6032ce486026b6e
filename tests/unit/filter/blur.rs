use super::*;

#[test]
fn box_widths_are_odd_and_grow_with_sigma() {
    for sigma in [0.5f32, 1.0, 2.0, 5.0, 12.0] {
        let w = boxes_for_gauss(sigma, 3);
        assert_eq!(w.len(), 3);
        assert!(w.iter().all(|w| w % 2 == 1));
    }
    let small: u32 = boxes_for_gauss(2.0, 3).iter().sum();
    let large: u32 = boxes_for_gauss(8.0, 3).iter().sum();
    assert!(large > small);
}

#[test]
fn box_variance_tracks_the_gaussian() {
    let sigma = 6.0f32;
    let var: f32 = boxes_for_gauss(sigma, 3)
        .iter()
        .map(|&w| ((w * w) as f32 - 1.0) / 12.0)
        .sum();
    assert!((var.sqrt() - sigma).abs() < 1.0);
}

#[test]
fn downsampling_steps_follow_sigma_thresholds() {
    assert_eq!(kawase_steps(8.0), 0);
    assert_eq!(kawase_steps(16.0), 1);
    assert_eq!(kawase_steps(40.0), 2);
    assert_eq!(kawase_steps(64.0), 3);
    assert_eq!(kawase_steps(500.0), 4);
}

#[test]
fn support_covers_the_spread() {
    for sigma in [1.0f32, 4.0, 20.0, 70.0] {
        assert!(support(sigma) >= spread(sigma));
    }
}

#[test]
fn oversized_sigma_saturates_at_the_cap() {
    for sigma in [1.0e20f32, f32::MAX, f32::INFINITY] {
        assert_eq!(spread(sigma), spread(crate::filter::MAX_BLUR_SIGMA));
        assert_eq!(support(sigma), support(crate::filter::MAX_BLUR_SIGMA));
        assert!(boxes_for_gauss(sigma, 3).iter().all(|w| w % 2 == 1));
    }
}
