// Copyright @yucwang 2026

use crate::core::bsdf::{BSDFSampleRecord, BSDF};
use crate::core::error::{Error, Result};
use crate::materials::fresnel::{fresnel_dielectric, reflect_local, refract};
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::spectrum::RGBSpectrum;

/// Smooth dielectric interface. Reflection and refraction are chosen in
/// proportion to the Fresnel term, so both weights reduce to the tints.
pub struct DielectricBSDF {
    int_ior: Float,
    ext_ior: Float,
    specular_reflectance: RGBSpectrum,
    specular_transmittance: RGBSpectrum,
}

impl DielectricBSDF {
    pub fn new(int_ior: Float,
               ext_ior: Float,
               specular_reflectance: RGBSpectrum,
               specular_transmittance: RGBSpectrum) -> Result<Self> {
        if !(int_ior > 0.0) || !(ext_ior > 0.0) {
            return Err(Error::invalid_config("ior", format!("must be positive, got {} / {}", int_ior, ext_ior)));
        }
        Ok(Self { int_ior, ext_ior, specular_reflectance, specular_transmittance })
    }
}

impl BSDF for DielectricBSDF {
    fn sample(&self, _u1: Vector2f, u2: Vector2f, wo: Vector3f) -> BSDFSampleRecord {
        if wo.z == 0.0 {
            return BSDFSampleRecord::absorbed(wo);
        }

        let f = fresnel_dielectric(wo.z, self.ext_ior, self.int_ior);
        if u2.x < f {
            return BSDFSampleRecord::new(reflect_local(&wo), wo, f, self.specular_reflectance);
        }

        let entering = wo.z > 0.0;
        let (eta_i, eta_t) = if entering { (self.ext_ior, self.int_ior) } else { (self.int_ior, self.ext_ior) };
        let m = if entering { Vector3f::new(0.0, 0.0, 1.0) } else { Vector3f::new(0.0, 0.0, -1.0) };
        match refract(&wo, &m, eta_i / eta_t) {
            Some(wi) => BSDFSampleRecord::new(wi.normalize(), wo, 1.0 - f, self.specular_transmittance),
            // Only reachable through rounding when f is just below one.
            None => BSDFSampleRecord::new(reflect_local(&wo), wo, 1.0, self.specular_reflectance),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::SampleRng;

    fn glass() -> DielectricBSDF {
        DielectricBSDF::new(1.5, 1.0, RGBSpectrum::new(1.0, 1.0, 1.0), RGBSpectrum::new(0.95, 0.95, 0.95)).unwrap()
    }

    #[test]
    fn test_reflection_frequency_matches_fresnel() {
        let bsdf = glass();
        let wo = Vector3f::new(0.0, 0.0, 1.0);
        let expected = fresnel_dielectric(1.0, 1.0, 1.5);
        let mut rng = SampleRng::new(17);
        let trials = 50_000;
        let mut reflected = 0;
        for _ in 0..trials {
            let rec = bsdf.sample(rng.next_vector2(), rng.next_vector2(), wo);
            if rec.wi.z > 0.0 {
                reflected += 1;
            } else {
                assert!((rec.wi - Vector3f::new(0.0, 0.0, -1.0)).norm() < 1e-9);
                assert_eq!(rec.weight, RGBSpectrum::new(0.95, 0.95, 0.95));
            }
        }
        let frequency = reflected as Float / trials as Float;
        assert!((frequency - expected).abs() < 0.005);
    }

    #[test]
    fn test_total_internal_reflection_from_inside() {
        let bsdf = glass();
        // Leaving the glass at 60 degrees.
        let wo = Vector3f::new((0.75 as Float).sqrt(), 0.0, -0.5);
        let rec = bsdf.sample(Vector2f::zeros(), Vector2f::new(0.999, 0.0), wo);
        assert!(rec.wi.z < 0.0);
        assert_eq!(rec.weight, RGBSpectrum::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_refraction_bends_toward_normal() {
        let bsdf = glass();
        let wo = Vector3f::new(0.6, 0.0, 0.8);
        let rec = bsdf.sample(Vector2f::zeros(), Vector2f::new(0.999, 0.0), wo);
        assert!(rec.wi.z < 0.0);
        assert!(rec.wi.x.abs() < 0.6);
        assert!(DielectricBSDF::new(0.0, 1.0, RGBSpectrum::zeros(), RGBSpectrum::zeros()).is_err());
    }
}
