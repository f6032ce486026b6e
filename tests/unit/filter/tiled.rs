use super::*;

#[test]
fn align_out_snaps_to_the_grid() {
    assert_eq!(align_out(IRect::new(-3, 5, 9, 16), 4), IRect::new(-4, 4, 12, 16));
    assert_eq!(align_out(IRect::new(-3, 5, 9, 16), 1), IRect::new(-3, 5, 9, 16));
}

#[test]
fn oversized_scratch_is_cut_around_the_tile() {
    let tile = IRect::new(-51, 0, -35, 16);
    let wanted = IRect::new(-1000, -900, 900, 1000);
    assert_eq!(bound_scratch(tile.inflate(4, 4), tile, 64, 1), tile.inflate(4, 4));

    let cut = bound_scratch(wanted, tile, 64, 4);
    assert!(cut.width() <= 64 && cut.height() <= 64);
    assert_eq!(cut, align_out(cut, 4));
    assert_eq!(cut.intersect(tile), tile);
}
