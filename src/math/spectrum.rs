// Copyright 2020 @TwoCookingMice

use super::constants::{Float, Vector3f};

pub type RGBSpectrum = Vector3f;

// Encode a linear value for display, clamped to [0, 1].
pub fn gamma_encode(value: Float, gamma: Float) -> Float {
    value.max(0.0).min(1.0).powf(1.0 / gamma)
}
