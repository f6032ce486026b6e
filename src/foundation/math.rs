use crate::foundation::core::{Affine, Point, Rect};

pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

pub(crate) fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

/// Opacity in `[0, 1]` quantized to an 8-bit multiplier.
pub(crate) fn opacity_u16(opacity: f32) -> u16 {
    ((opacity.clamp(0.0, 1.0) * 255.0).round() as i32).clamp(0, 255) as u16
}

/// Axis-aligned bounding box of `rect` mapped through `m`.
pub(crate) fn transform_rect_bbox(m: Affine, rect: Rect) -> Rect {
    if rect.width() <= 0.0 || rect.height() <= 0.0 {
        let p = m * Point::new(rect.x0, rect.y0);
        return Rect::new(p.x, p.y, p.x, p.y);
    }
    let corners = [
        m * Point::new(rect.x0, rect.y0),
        m * Point::new(rect.x1, rect.y0),
        m * Point::new(rect.x1, rect.y1),
        m * Point::new(rect.x0, rect.y1),
    ];
    let mut out = Rect::new(corners[0].x, corners[0].y, corners[0].x, corners[0].y);
    for p in &corners[1..] {
        out = out.union_pt(*p);
    }
    out
}

/// Union that treats zero-area rectangles as absent.
pub(crate) fn union_nonempty(acc: Option<Rect>, r: Rect) -> Option<Rect> {
    if r.width() <= 0.0 || r.height() <= 0.0 {
        return acc;
    }
    Some(match acc {
        Some(a) => a.union(r),
        None => r,
    })
}

/// Return `true` when two rectangles share a positive-area region.
pub(crate) fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}

/// Return `true` when `m` only translates, by whole pixels.
pub(crate) fn is_integer_translation(m: Affine) -> bool {
    let c = m.as_coeffs();
    c[0] == 1.0
        && c[1] == 0.0
        && c[2] == 0.0
        && c[3] == 1.0
        && c[4].fract() == 0.0
        && c[5].fract() == 0.0
}

/// Content hash used for resource identity and frame digests.
pub(crate) fn digest_bytes(bytes: &[u8]) -> u64 {
    xxhash_rust::xxh3::xxh3_64(bytes)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
