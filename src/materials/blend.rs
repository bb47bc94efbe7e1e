// Copyright @yucwang 2026

use std::sync::Arc;

use crate::core::bsdf::{BSDFSampleRecord, BSDF};
use crate::math::constants::{Float, Vector2f, Vector3f};

/// Stochastic mixture: `bsdf_a` with probability `weight`, otherwise
/// `bsdf_b`. The chosen lobe's weight is returned unchanged, which keeps the
/// one-sample estimate of the mixture unbiased.
pub struct BlendBSDF {
    bsdf_a: Arc<dyn BSDF>,
    bsdf_b: Arc<dyn BSDF>,
    weight: Float,
}

impl BlendBSDF {
    pub fn new(bsdf_a: Arc<dyn BSDF>, bsdf_b: Arc<dyn BSDF>, weight: Float) -> Self {
        let weight = weight.max(0.0).min(1.0);
        Self { bsdf_a, bsdf_b, weight }
    }

    pub fn weight(&self) -> Float {
        self.weight
    }
}

impl BSDF for BlendBSDF {
    fn sample(&self, u1: Vector2f, u2: Vector2f, wo: Vector3f) -> BSDFSampleRecord {
        let choose_a = u2.x < self.weight;
        let mut remapped = u2;
        if self.weight > 0.0 && self.weight < 1.0 {
            if choose_a {
                remapped.x = u2.x / self.weight;
            } else {
                remapped.x = (u2.x - self.weight) / (1.0 - self.weight);
            }
        }

        let (sample, select_pdf) = if choose_a {
            (self.bsdf_a.sample(u1, remapped, wo), self.weight)
        } else {
            (self.bsdf_b.sample(u1, remapped, wo), 1.0 - self.weight)
        };
        BSDFSampleRecord { pdf: sample.pdf * select_pdf, ..sample }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::SampleRng;
    use crate::materials::lambertian_diffuse::LambertianDiffuseBSDF;
    use crate::materials::mirror::MirrorBSDF;
    use crate::math::spectrum::RGBSpectrum;

    #[test]
    fn test_blend_selection_frequency() {
        let blend = BlendBSDF::new(Arc::new(MirrorBSDF::new(RGBSpectrum::new(1.0, 0.0, 0.0))),
                                   Arc::new(LambertianDiffuseBSDF::new(RGBSpectrum::new(0.0, 1.0, 0.0))),
                                   0.2);
        let wo = Vector3f::new(0.0, 0.6, 0.8);
        let mut rng = SampleRng::new(2);
        let trials = 20_000;
        let mut mirror = 0;
        for _ in 0..trials {
            let rec = blend.sample(rng.next_vector2(), rng.next_vector2(), wo);
            if rec.weight.x > 0.0 {
                mirror += 1;
                assert!((rec.pdf - 0.2).abs() < 1e-12);
            }
        }
        let frequency = mirror as Float / trials as Float;
        assert!((frequency - 0.2).abs() < 0.015);
    }

    #[test]
    fn test_weight_is_clamped() {
        let a: Arc<dyn BSDF> = Arc::new(MirrorBSDF::new(RGBSpectrum::new(1.0, 1.0, 1.0)));
        assert_eq!(BlendBSDF::new(a.clone(), a.clone(), 1.5).weight(), 1.0);
        assert_eq!(BlendBSDF::new(a.clone(), a, -0.5).weight(), 0.0);
    }
}
