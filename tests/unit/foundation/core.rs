use super::*;

#[test]
fn premul_rounds_to_nearest() {
    let p = Rgba8Premul::from_straight_rgba(255, 128, 0, 128);
    assert_eq!(p.a, 128);
    assert_eq!(p.r, 128);
    assert_eq!(p.g, 64);
    assert_eq!(p.b, 0);
}

#[test]
fn irect_round_out_covers_fractional_edges() {
    let r = IRect::round_out(Rect::new(-0.5, 1.2, 10.1, 20.0));
    assert_eq!(r, IRect::new(-1, 1, 11, 20));
    assert_eq!(r.width(), 12);
    assert_eq!(r.height(), 19);
}

#[test]
fn irect_tiles_cover_area_without_overlap() {
    let r = IRect::new(-10, -10, 2038, 1000);
    let tiles = r.tiles(1024);
    assert_eq!(tiles.len(), 2);
    assert_eq!(tiles[0], IRect::new(-10, -10, 1014, 1000));
    assert_eq!(tiles[1], IRect::new(1014, -10, 2038, 1000));
    let area: u64 = tiles
        .iter()
        .map(|t| u64::from(t.width()) * u64::from(t.height()))
        .sum();
    assert_eq!(area, u64::from(r.width()) * u64::from(r.height()));
}

#[test]
fn irect_empty_has_no_tiles() {
    assert!(IRect::new(0, 0, 0, 10).tiles(64).is_empty());
    assert!(IRect::new(5, 5, 1, 1).is_empty());
}

#[test]
fn inflate_saturates_at_the_integer_range() {
    let r = IRect::new(-10, -10, 10, 10).inflate(i32::MAX, 5);
    assert_eq!(r, IRect::new(i32::MIN, -15, i32::MAX, 15));
    assert_eq!(r.width(), i32::MAX as u32);
}
