// Copyright @yucwang 2023

use crate::core::bsdf::{BSDFSampleRecord, BSDF};
use crate::math::constants::{ Vector2f, Vector3f };
use crate::math::spectrum::RGBSpectrum;
use crate::math::warp::{ sample_cosine_hemisphere, sample_cosine_hemisphere_pdf };

pub struct LambertianDiffuseBSDF {
    color: RGBSpectrum
}

impl BSDF for LambertianDiffuseBSDF {
    // Cosine-weighted sampling; f·cos/pdf reduces to the albedo.
    fn sample(&self, 
              u1: Vector2f, 
              _u2: Vector2f,
              wo: Vector3f) -> BSDFSampleRecord {
        let mut wi = sample_cosine_hemisphere(&u1);
        if wo.z < 0.0 {
            wi.z *= -1.0;
        }
        let pdf = sample_cosine_hemisphere_pdf(wi.z.abs());
        if pdf <= 0.0 {
            return BSDFSampleRecord::absorbed(wo);
        }

        BSDFSampleRecord::new(wi, wo, pdf, self.color)
    }
}

impl LambertianDiffuseBSDF {
    pub fn new(rgb: RGBSpectrum) -> Self {
        Self {
            color: rgb,
        }
    }
}
