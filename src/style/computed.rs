use crate::foundation::core::{Color, Point};
use crate::style::filter::Filter;

/// How a node composites over what is beneath it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Source-over.
    #[default]
    Normal,
    /// `s * d`.
    Multiply,
    /// `s + d - s * d`.
    Screen,
    /// Hard light with layers swapped.
    Overlay,
    /// `min(s, d)`.
    Darken,
    /// `max(s, d)`.
    Lighten,
    /// Brighten the backdrop.
    ColorDodge,
    /// Darken the backdrop.
    ColorBurn,
    /// Soft light.
    SoftLight,
    /// Hard light.
    HardLight,
    /// `|d - s|`.
    Difference,
    /// `d + s - 2 * d * s`.
    Exclusion,
}

/// Masking behaviour of a node over its following siblings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskMode {
    /// Not a mask.
    #[default]
    None,
    /// Governed siblings are multiplied by the mask's alpha.
    Alpha,
    /// Like [`MaskMode::Alpha`], with the mask's own content drawn beneath the siblings.
    AlphaWithBackground,
    /// Governed siblings are multiplied by the mask's luminance.
    Gray,
    /// Like [`MaskMode::Gray`], with the mask's own content drawn beneath the siblings.
    GrayWithBackground,
}

impl MaskMode {
    /// Return `true` for every mode except [`MaskMode::None`].
    pub fn is_mask(self) -> bool {
        !matches!(self, Self::None)
    }

    /// Return `true` when the mask's own content is part of the masked result.
    pub fn with_background(self) -> bool {
        matches!(self, Self::AlphaWithBackground | Self::GrayWithBackground)
    }

    /// Return `true` when the mask weight is taken from luminance rather than alpha.
    pub fn uses_luma(self) -> bool {
        matches!(self, Self::Gray | Self::GrayWithBackground)
    }
}

/// Overflow behaviour of a node's children.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Overflow {
    /// Children may paint outside the node box.
    #[default]
    Visible,
    /// Children are clipped to the node box.
    Clip,
}

/// How bitmap-like content is fitted into the node box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectFit {
    /// Stretch to the box.
    #[default]
    Fill,
    /// Scale uniformly to cover the box and crop the overflow.
    Cover,
}

/// Resolved per-node style, as produced by the style/layout collaborator.
///
/// Lengths are CSS pixels in the parent's coordinate space; angles are degrees.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ComputedStyle {
    /// Box left edge.
    pub left: f64,
    /// Box top edge.
    pub top: f64,
    /// Box width.
    pub width: f64,
    /// Box height.
    pub height: f64,
    /// Horizontal translation.
    pub translate_x: f64,
    /// Vertical translation.
    pub translate_y: f64,
    /// Rotation in degrees, clockwise in y-down space.
    pub rotate: f64,
    /// Horizontal scale.
    pub scale_x: f64,
    /// Vertical scale.
    pub scale_y: f64,
    /// Horizontal skew in degrees.
    pub skew_x: f64,
    /// Vertical skew in degrees.
    pub skew_y: f64,
    /// Transform origin in box-local pixels; `None` means the box center.
    pub transform_origin: Option<Point>,
    /// Local opacity in `[0, 1]`.
    pub opacity: f32,
    /// Whether the node (and its subtree) is drawn.
    pub visible: bool,
    /// Background fill of the box.
    pub background_color: Color,
    /// Ordered filter chain.
    pub filters: Vec<Filter>,
    /// Blend mode against the backdrop.
    pub blend_mode: BlendMode,
    /// Mask behaviour over following siblings.
    pub mask_mode: MaskMode,
    /// Ends the reach of a preceding mask at this node (inclusive).
    pub break_mask: bool,
    /// Child clipping.
    pub overflow: Overflow,
    /// Bitmap fitting.
    pub object_fit: ObjectFit,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width: 0.0,
            height: 0.0,
            translate_x: 0.0,
            translate_y: 0.0,
            rotate: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            skew_x: 0.0,
            skew_y: 0.0,
            transform_origin: None,
            opacity: 1.0,
            visible: true,
            background_color: Color::TRANSPARENT,
            filters: Vec::new(),
            blend_mode: BlendMode::Normal,
            mask_mode: MaskMode::None,
            break_mask: false,
            overflow: Overflow::Visible,
            object_fit: ObjectFit::Fill,
        }
    }
}

/// Style property identifier, the unit of dirty-level mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StyleKey {
    /// [`ComputedStyle::left`].
    Left,
    /// [`ComputedStyle::top`].
    Top,
    /// [`ComputedStyle::width`].
    Width,
    /// [`ComputedStyle::height`].
    Height,
    /// [`ComputedStyle::translate_x`].
    TranslateX,
    /// [`ComputedStyle::translate_y`].
    TranslateY,
    /// [`ComputedStyle::rotate`].
    Rotate,
    /// [`ComputedStyle::scale_x`].
    ScaleX,
    /// [`ComputedStyle::scale_y`].
    ScaleY,
    /// [`ComputedStyle::skew_x`].
    SkewX,
    /// [`ComputedStyle::skew_y`].
    SkewY,
    /// [`ComputedStyle::transform_origin`].
    TransformOrigin,
    /// [`ComputedStyle::opacity`].
    Opacity,
    /// [`ComputedStyle::visible`].
    Visible,
    /// [`ComputedStyle::background_color`].
    BackgroundColor,
    /// [`ComputedStyle::filters`].
    Filter,
    /// [`ComputedStyle::blend_mode`].
    BlendMode,
    /// [`ComputedStyle::mask_mode`].
    MaskMode,
    /// [`ComputedStyle::break_mask`].
    BreakMask,
    /// [`ComputedStyle::overflow`].
    Overflow,
    /// [`ComputedStyle::object_fit`].
    ObjectFit,
}

/// A new value for one style property.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "key", content = "value", rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum StyleChange {
    Left(f64),
    Top(f64),
    Width(f64),
    Height(f64),
    TranslateX(f64),
    TranslateY(f64),
    Rotate(f64),
    ScaleX(f64),
    ScaleY(f64),
    SkewX(f64),
    SkewY(f64),
    TransformOrigin(Option<Point>),
    Opacity(f32),
    Visible(bool),
    BackgroundColor(Color),
    Filter(Vec<Filter>),
    BlendMode(BlendMode),
    MaskMode(MaskMode),
    BreakMask(bool),
    Overflow(Overflow),
    ObjectFit(ObjectFit),
}

impl StyleChange {
    /// The property this change targets.
    pub fn key(&self) -> StyleKey {
        match self {
            Self::Left(_) => StyleKey::Left,
            Self::Top(_) => StyleKey::Top,
            Self::Width(_) => StyleKey::Width,
            Self::Height(_) => StyleKey::Height,
            Self::TranslateX(_) => StyleKey::TranslateX,
            Self::TranslateY(_) => StyleKey::TranslateY,
            Self::Rotate(_) => StyleKey::Rotate,
            Self::ScaleX(_) => StyleKey::ScaleX,
            Self::ScaleY(_) => StyleKey::ScaleY,
            Self::SkewX(_) => StyleKey::SkewX,
            Self::SkewY(_) => StyleKey::SkewY,
            Self::TransformOrigin(_) => StyleKey::TransformOrigin,
            Self::Opacity(_) => StyleKey::Opacity,
            Self::Visible(_) => StyleKey::Visible,
            Self::BackgroundColor(_) => StyleKey::BackgroundColor,
            Self::Filter(_) => StyleKey::Filter,
            Self::BlendMode(_) => StyleKey::BlendMode,
            Self::MaskMode(_) => StyleKey::MaskMode,
            Self::BreakMask(_) => StyleKey::BreakMask,
            Self::Overflow(_) => StyleKey::Overflow,
            Self::ObjectFit(_) => StyleKey::ObjectFit,
        }
    }
}

fn set<T: PartialEq>(slot: &mut T, v: T) -> bool {
    if *slot == v {
        return false;
    }
    *slot = v;
    true
}

impl ComputedStyle {
    /// Apply `change`, returning `true` only when the stored value differs afterwards.
    pub fn apply(&mut self, change: StyleChange) -> bool {
        match change {
            StyleChange::Left(v) => set(&mut self.left, v),
            StyleChange::Top(v) => set(&mut self.top, v),
            StyleChange::Width(v) => set(&mut self.width, v.max(0.0)),
            StyleChange::Height(v) => set(&mut self.height, v.max(0.0)),
            StyleChange::TranslateX(v) => set(&mut self.translate_x, v),
            StyleChange::TranslateY(v) => set(&mut self.translate_y, v),
            StyleChange::Rotate(v) => set(&mut self.rotate, v),
            StyleChange::ScaleX(v) => set(&mut self.scale_x, v),
            StyleChange::ScaleY(v) => set(&mut self.scale_y, v),
            StyleChange::SkewX(v) => set(&mut self.skew_x, v),
            StyleChange::SkewY(v) => set(&mut self.skew_y, v),
            StyleChange::TransformOrigin(v) => set(&mut self.transform_origin, v),
            StyleChange::Opacity(v) => set(&mut self.opacity, v.clamp(0.0, 1.0)),
            StyleChange::Visible(v) => set(&mut self.visible, v),
            StyleChange::BackgroundColor(v) => set(&mut self.background_color, v),
            StyleChange::Filter(v) => set(&mut self.filters, v),
            StyleChange::BlendMode(v) => set(&mut self.blend_mode, v),
            StyleChange::MaskMode(v) => set(&mut self.mask_mode, v),
            StyleChange::BreakMask(v) => set(&mut self.break_mask, v),
            StyleChange::Overflow(v) => set(&mut self.overflow, v),
            StyleChange::ObjectFit(v) => set(&mut self.object_fit, v),
        }
    }

    /// Transform origin in box-local pixels.
    pub fn origin(&self) -> Point {
        self.transform_origin
            .unwrap_or_else(|| Point::new(self.width * 0.5, self.height * 0.5))
    }

    /// Return `true` when the chain still emits a pass once identities are dropped and color
    /// adjustments are folded.
    pub fn has_effective_filters(&self) -> bool {
        crate::filter::emits_passes(&self.filters)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/style/computed.rs"]
mod tests;
