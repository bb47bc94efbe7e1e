// Copyright @yucwang 2026

use crate::core::bsdf::{BSDFSampleRecord, BSDF};
use crate::materials::fresnel::reflect_local;
use crate::math::constants::{Vector2f, Vector3f};
use crate::math::spectrum::RGBSpectrum;

/// Perfect specular reflector.
pub struct MirrorBSDF {
    color: RGBSpectrum,
}

impl MirrorBSDF {
    pub fn new(color: RGBSpectrum) -> Self {
        Self { color }
    }
}

impl BSDF for MirrorBSDF {
    fn sample(&self, _u1: Vector2f, _u2: Vector2f, wo: Vector3f) -> BSDFSampleRecord {
        if wo.z == 0.0 {
            return BSDFSampleRecord::absorbed(wo);
        }
        BSDFSampleRecord::new(reflect_local(&wo), wo, 1.0, self.color)
    }
}
