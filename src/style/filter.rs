/// One entry of a node's filter chain, applied in order.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Filter {
    /// Gaussian blur with standard deviation `sigma` in pixels.
    Blur {
        /// Standard deviation in pixels.
        sigma: f32,
    },
    /// Directional blur along `angle` (degrees, y-down) over `distance` pixels.
    MotionBlur {
        /// Direction in degrees.
        angle: f32,
        /// Blur length in pixels.
        distance: f32,
    },
    /// Zoom blur toward `center`, given as a fraction of the node box.
    RadialBlur {
        /// Blur center relative to the node box (`[0.5, 0.5]` is the middle).
        center: [f32; 2],
        /// Fraction of the distance to the center covered by the samples, in `[0, 0.9]`.
        strength: f32,
    },
    /// Bright-pass glow added back onto the source.
    Bloom {
        /// Luminance threshold in `[0, 1]`.
        threshold: f32,
        /// Glow radius in pixels.
        sigma: f32,
        /// Additive strength.
        strength: f32,
    },
    /// Hue rotation in degrees.
    HueRotate {
        /// Angle in degrees.
        degrees: f32,
    },
    /// Saturation multiplier; `1` is identity.
    Saturate {
        /// Multiplier.
        amount: f32,
    },
    /// Additive light (`> 0`) or dark (`< 0`) offset in `[-1, 1]`; `0` is identity.
    Brightness {
        /// Offset.
        amount: f32,
    },
    /// Contrast around mid-gray; `1` is identity.
    Contrast {
        /// Multiplier.
        amount: f32,
    },
    /// Sepia tone strength in `[0, 1]`.
    Sepia {
        /// Strength.
        amount: f32,
    },
    /// Grayscale strength in `[0, 1]`.
    Grayscale {
        /// Strength.
        amount: f32,
    },
    /// Inversion strength in `[0, 1]`.
    Invert {
        /// Strength.
        amount: f32,
    },
}

impl Filter {
    /// Return `true` when the filter leaves every pixel unchanged and emits no pass.
    pub fn is_identity(&self) -> bool {
        match *self {
            Self::Blur { sigma } => sigma <= 0.0,
            Self::MotionBlur { distance, .. } => distance.abs() < 1.0,
            Self::RadialBlur { strength, .. } => strength <= 0.0,
            Self::Bloom { strength, sigma, .. } => strength <= 0.0 || sigma <= 0.0,
            Self::HueRotate { degrees } => degrees.rem_euclid(360.0) == 0.0,
            Self::Saturate { amount } => amount == 1.0,
            Self::Brightness { amount } => amount == 0.0,
            Self::Contrast { amount } => amount == 1.0,
            Self::Sepia { amount } | Self::Grayscale { amount } | Self::Invert { amount } => {
                amount <= 0.0
            }
        }
    }

    /// Return `true` for the pointwise color adjustments folded into one matrix pass.
    pub fn is_color_matrix(&self) -> bool {
        matches!(
            self,
            Self::HueRotate { .. }
                | Self::Saturate { .. }
                | Self::Brightness { .. }
                | Self::Contrast { .. }
                | Self::Sepia { .. }
                | Self::Grayscale { .. }
                | Self::Invert { .. }
        )
    }
}
