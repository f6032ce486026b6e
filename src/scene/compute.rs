//! Entry points that turn a node's computed style into geometry.
//!
//! The dirty propagator calls the cheapest one that covers the change level.

use crate::foundation::core::{Affine, Rect};
use crate::scene::node::Node;
use crate::style::computed::ComputedStyle;
use crate::style::level::RefreshLevel;

/// Translation coefficients for a linear part `(a, b, c, d)` about the style's origin.
fn translation(style: &ComputedStyle, a: f64, b: f64, c: f64, d: f64) -> (f64, f64) {
    let o = style.origin();
    let e = style.left + style.translate_x + o.x - (a * o.x + c * o.y);
    let f = style.top + style.translate_y + o.y - (b * o.x + d * o.y);
    (e, f)
}

/// Full local matrix: `T(left + translate + origin) · R · K · S · T(-origin)`.
pub(crate) fn full_matrix(style: &ComputedStyle) -> Affine {
    let linear = Affine::rotate(style.rotate.to_radians())
        * Affine::skew(
            style.skew_x.to_radians().tan(),
            style.skew_y.to_radians().tan(),
        )
        * Affine::scale_non_uniform(style.scale_x, style.scale_y);
    let [a, b, c, d, _, _] = linear.as_coeffs();
    let (e, f) = translation(style, a, b, c, d);
    Affine::new([a, b, c, d, e, f])
}

/// Layout change: box, matrix and filter box.
pub(crate) fn cal_reflow(node: &mut Node) {
    node.bbox = Rect::new(0.0, 0.0, node.style.width, node.style.height);
    node.local = full_matrix(&node.style);
    node.local_dirty = true;
    cal_filter(node);
}

/// Transform change. Translate-only levels patch `coeffs[4]` and `coeffs[5]` of the
/// existing matrix with the same arithmetic as the full path.
pub(crate) fn cal_matrix(node: &mut Node, level: RefreshLevel) {
    if level.is_translate_only() {
        let [a, b, c, d, _, _] = node.local.as_coeffs();
        let (e, f) = translation(&node.style, a, b, c, d);
        node.local = Affine::new([a, b, c, d, e, f]);
    } else {
        node.local = full_matrix(&node.style);
    }
    node.local_dirty = true;
}

pub(crate) fn cal_opacity(node: &mut Node) {
    node.local_opacity = node.style.opacity.clamp(0.0, 1.0);
    node.local_dirty = true;
}

pub(crate) fn cal_filter(node: &mut Node) {
    node.has_filter = crate::filter::emits_passes(&node.style.filters);
    node.filter_bbox = crate::filter::expand_bbox(&node.style, node.bbox);
}

/// Style-driven redraw: only the derived boxes depend on paint-level style.
pub(crate) fn cal_repaint(node: &mut Node) {
    node.bbox = Rect::new(0.0, 0.0, node.style.width, node.style.height);
    cal_filter(node);
}

#[cfg(test)]
#[path = "../../tests/unit/scene/compute.rs"]
mod tests;
