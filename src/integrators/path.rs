// Copyright @yucwang 2026

use crate::core::rng::SampleRng;
use crate::core::roulette::{PathState, RouletteTerminator};
use crate::core::scene::SceneQuery;
use crate::math::ray::Ray3f;
use crate::math::spectrum::RGBSpectrum;

/// Unidirectional path tracing estimator for one camera ray.
#[derive(Debug, Clone, Default)]
pub struct PathSampler {
    roulette: RouletteTerminator,
}

impl PathSampler {
    pub fn new(roulette: RouletteTerminator) -> Self {
        Self { roulette }
    }

    pub fn roulette(&self) -> &RouletteTerminator {
        &self.roulette
    }

    /// Radiance estimate along `ray`. Never fails; only consumes `rng`.
    pub fn sample<S: SceneQuery + ?Sized>(&self, scene: &S, ray: &Ray3f, rng: &mut SampleRng) -> RGBSpectrum {
        let mut radiance = RGBSpectrum::zeros();
        let mut state = PathState::new();
        let mut ray = *ray;

        loop {
            let hit = match scene.intersect(&ray) {
                Some(hit) => hit,
                None => {
                    radiance += state.throughput().component_mul(&scene.background(&ray.dir()));
                    break;
                }
            };

            let wo = -ray.dir();
            let shaded = scene.shade(&hit, &wo, rng);
            radiance += state.throughput().component_mul(&shaded.emitted);

            let direction = match shaded.direction {
                Some(direction) => direction,
                None => break,
            };

            state.scale(&shaded.weight);
            state.advance();
            if !self.roulette.apply(&mut state, rng).is_continue() {
                break;
            }

            ray = Ray3f::spawn(hit.p(), hit.geo_normal(), direction);
        }

        radiance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::interaction::SurfaceIntersection;
    use crate::core::scene::ShadeSample;
    use crate::math::constants::{Float, Vector3f};
    use approx::assert_abs_diff_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // Every ray hits an emitting surface that reflects `albedo` back out.
    struct FurnaceScene {
        emitted: Float,
        albedo: Float,
        absorb: bool,
        hit: bool,
        shades: AtomicUsize,
    }

    impl FurnaceScene {
        fn new(emitted: Float, albedo: Float) -> Self {
            Self { emitted, albedo, absorb: false, hit: true, shades: AtomicUsize::new(0) }
        }
    }

    impl SceneQuery for FurnaceScene {
        fn intersect(&self, ray: &Ray3f) -> Option<SurfaceIntersection> {
            if !self.hit {
                return None;
            }
            Some(SurfaceIntersection::new(ray.at(1.0), -ray.dir(), 1.0))
        }

        fn shade(&self, _hit: &SurfaceIntersection, wo: &Vector3f, _rng: &mut SampleRng) -> ShadeSample {
            self.shades.fetch_add(1, Ordering::Relaxed);
            let emitted = RGBSpectrum::new(self.emitted, self.emitted, self.emitted);
            if self.absorb {
                return ShadeSample::absorbed(emitted);
            }
            ShadeSample {
                emitted,
                direction: Some(*wo),
                weight: RGBSpectrum::new(self.albedo, self.albedo, self.albedo),
            }
        }

        fn background(&self, _dir: &Vector3f) -> RGBSpectrum {
            RGBSpectrum::new(0.25, 0.5, 1.0)
        }
    }

    fn camera_ray() -> Ray3f {
        Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0), None, None)
    }

    fn geometric_sum(emitted: Float, albedo: Float, bounces: i32) -> Float {
        emitted * (1.0 - albedo.powi(bounces)) / (1.0 - albedo)
    }

    #[test]
    fn test_miss_returns_background() {
        let mut scene = FurnaceScene::new(0.0, 0.5);
        scene.hit = false;
        let value = PathSampler::default().sample(&scene, &camera_ray(), &mut SampleRng::new(0));
        assert_eq!(value, RGBSpectrum::new(0.25, 0.5, 1.0));
    }

    #[test]
    fn test_absorbed_path_returns_emission() {
        let mut scene = FurnaceScene::new(0.7, 0.5);
        scene.absorb = true;
        let value = PathSampler::default().sample(&scene, &camera_ray(), &mut SampleRng::new(0));
        assert_eq!(value, RGBSpectrum::new(0.7, 0.7, 0.7));
        assert_eq!(scene.shades.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_without_roulette_path_stops_at_max_depth() {
        let roulette = RouletteTerminator { min_depth: 0, max_depth: 6, delta: 0.0, cutoff: 0.0 };
        let scene = FurnaceScene::new(0.1, 0.5);
        let value = PathSampler::new(roulette).sample(&scene, &camera_ray(), &mut SampleRng::new(0));
        assert_abs_diff_eq!(value.x, geometric_sum(0.1, 0.5, 6), epsilon = 1e-12);
        assert_eq!(scene.shades.load(Ordering::Relaxed), 6);
    }

    #[test]
    fn test_roulette_keeps_estimate_unbiased() {
        let scene = FurnaceScene::new(0.1, 0.5);
        let sampler = PathSampler::new(RouletteTerminator::default());
        let expected = geometric_sum(0.1, 0.5, 15);

        let trials = 100_000;
        let mut rng = SampleRng::new(1234);
        let mut sum = 0.0;
        for _ in 0..trials {
            sum += sampler.sample(&scene, &camera_ray(), &mut rng).x;
        }
        let mean = sum / trials as Float;
        assert!((mean - expected).abs() / expected < 0.02, "mean {} expected {}", mean, expected);

        // Roulette must have cut some paths short.
        assert!(scene.shades.load(Ordering::Relaxed) < trials * 15);
    }
}
