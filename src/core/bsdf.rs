// Copyright @yucwang 2026

use crate::math::constants::{ Float, Vector2f, Vector3f };
use crate::math::spectrum::RGBSpectrum;

// Definitions of types used in BSDF sampling, all directions in the local
// shading frame (z = normal).
pub type BSDFValue = RGBSpectrum;

/// `weight` is `f · |cos θ_i| / pdf`. A black weight means the path was
/// absorbed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BSDFSampleRecord {
    pub wi: Vector3f,
    pub wo: Vector3f,
    pub pdf: Float,
    pub weight: BSDFValue,
}

pub trait BSDF: Send + Sync {
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// `wo` points away from the surface. `u1` picks the direction, `u2.x`
    /// picks the lobe for layered materials.
    fn sample(&self, u1: Vector2f, u2: Vector2f, wo: Vector3f) -> BSDFSampleRecord;
}

impl Default for BSDFSampleRecord {
    fn default() -> Self {
        Self {
            wi: Vector3f::zeros(),
            wo: Vector3f::zeros(),
            pdf: 0.0,
            weight: BSDFValue::zeros(),
        }
    }
}

impl BSDFSampleRecord {
    pub fn new(wi: Vector3f, wo: Vector3f, pdf: Float, weight: BSDFValue) -> Self {
        Self { wi, wo, pdf, weight }
    }

    pub fn absorbed(wo: Vector3f) -> Self {
        Self { wo, ..Default::default() }
    }

    pub fn is_absorbed(&self) -> bool {
        self.pdf <= 0.0 || self.weight.iter().all(|c| *c <= 0.0)
    }
}
