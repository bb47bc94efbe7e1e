// Copyright @yucwang 2026

use crate::math::bounds::Bounds2f;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::warp::sample_uniform_sphere;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Explicitly seeded random source owned by one worker.
///
/// Streams are derived from `(seed, stream)` so a sample index always sees
/// the same numbers no matter which worker runs it.
pub struct SampleRng {
    inner: StdRng,
    seed: u64,
}

impl SampleRng {
    pub fn new(seed: u64) -> Self {
        Self { inner: StdRng::seed_from_u64(seed), seed }
    }

    pub fn for_stream(seed: u64, stream: u64) -> Self {
        Self::new(mix_seed(seed, stream))
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform in [0, 1).
    pub fn next_float(&mut self) -> Float {
        self.inner.gen::<Float>()
    }

    pub fn next_vector2(&mut self) -> Vector2f {
        let u = self.next_float();
        let v = self.next_float();
        Vector2f::new(u, v)
    }

    pub fn uniform_in(&mut self, bounds: &Bounds2f) -> Vector2f {
        let u = self.next_vector2();
        bounds.lerp(&u)
    }

    pub fn uniform_direction(&mut self) -> Vector3f {
        let u = self.next_vector2();
        sample_uniform_sphere(&u)
    }
}

// splitmix64 finalizer over the combined seed.
fn mix_seed(seed: u64, stream: u64) -> u64 {
    let mut z = seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
