use crate::style::computed::StyleKey;
use bitflags::bitflags;

bitflags! {
    /// Cheapest category of recomputation a change requires, one bit per category.
    ///
    /// Bits are ordered from cheapest to most expensive; a combined level is the OR of its parts.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct RefreshLevel: u32 {
        /// Horizontal translation only.
        const TRANSLATE_X = 1 << 0;
        /// Vertical translation only.
        const TRANSLATE_Y = 1 << 1;
        /// Rotation.
        const ROTATE = 1 << 2;
        /// Horizontal scale.
        const SCALE_X = 1 << 3;
        /// Vertical scale.
        const SCALE_Y = 1 << 4;
        /// Skew.
        const SKEW = 1 << 5;
        /// Transform origin or full transform.
        const TRANSFORM = 1 << 6;
        /// Opacity.
        const OPACITY = 1 << 7;
        /// Filter chain.
        const FILTER = 1 << 8;
        /// Blend mode.
        const MIX_BLEND = 1 << 9;
        /// Mask mode or mask association.
        const MASK = 1 << 10;
        /// Redraw without geometry change.
        const REPAINT = 1 << 11;
        /// Layout change.
        const REFLOW = 1 << 12;

        /// Translation on either axis.
        const TRANSLATE = Self::TRANSLATE_X.bits() | Self::TRANSLATE_Y.bits();
        /// Any transform bit.
        const TRANSFORM_ALL = Self::TRANSLATE.bits()
            | Self::ROTATE.bits()
            | Self::SCALE_X.bits()
            | Self::SCALE_Y.bits()
            | Self::SKEW.bits()
            | Self::TRANSFORM.bits();
    }
}

impl RefreshLevel {
    /// Return `true` when only translation bits are set.
    pub fn is_translate_only(self) -> bool {
        !self.is_empty() && Self::TRANSLATE.contains(self)
    }

    /// Return `true` when any transform bit is set.
    pub fn touches_transform(self) -> bool {
        self.intersects(Self::TRANSFORM_ALL)
    }

    /// Return `true` at or above [`RefreshLevel::REPAINT`].
    pub fn needs_repaint(self) -> bool {
        self.intersects(Self::REPAINT | Self::REFLOW)
    }
}

/// Minimal refresh level for a change to `key`.
pub fn level_for_key(key: StyleKey) -> RefreshLevel {
    match key {
        StyleKey::Left | StyleKey::Top | StyleKey::Width | StyleKey::Height => RefreshLevel::REFLOW,
        StyleKey::TranslateX => RefreshLevel::TRANSLATE_X,
        StyleKey::TranslateY => RefreshLevel::TRANSLATE_Y,
        StyleKey::Rotate => RefreshLevel::ROTATE,
        StyleKey::ScaleX => RefreshLevel::SCALE_X,
        StyleKey::ScaleY => RefreshLevel::SCALE_Y,
        StyleKey::SkewX | StyleKey::SkewY => RefreshLevel::SKEW,
        StyleKey::TransformOrigin => RefreshLevel::TRANSFORM,
        StyleKey::Opacity => RefreshLevel::OPACITY,
        StyleKey::Filter => RefreshLevel::FILTER,
        StyleKey::BlendMode => RefreshLevel::MIX_BLEND,
        StyleKey::MaskMode | StyleKey::BreakMask => RefreshLevel::MASK,
        StyleKey::Visible
        | StyleKey::BackgroundColor
        | StyleKey::Overflow
        | StyleKey::ObjectFit => RefreshLevel::REPAINT,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/style/level.rs"]
mod tests;
