// Copyright @yucwang 2026

use crate::math::constants::{Float, Vector3f};

/// Per-channel running mean and variance (Welford).
///
/// Partial statistics combine with the Chan et al. pairwise formula, so any
/// split of a sample stream merges back to the same mean and variance up to
/// rounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunningStats {
    count: u64,
    mean: Vector3f,
    m2: Vector3f,
}

impl Default for RunningStats {
    fn default() -> Self {
        Self { count: 0, mean: Vector3f::zeros(), m2: Vector3f::zeros() }
    }
}

impl RunningStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: &Vector3f) {
        self.count += 1;
        let delta = sample - self.mean;
        self.mean += delta / self.count as Float;
        let delta2 = sample - self.mean;
        self.m2 += delta.component_mul(&delta2);
    }

    pub fn merge(&mut self, other: &RunningStats) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = *other;
            return;
        }
        let na = self.count as Float;
        let nb = other.count as Float;
        let n = na + nb;
        let delta = other.mean - self.mean;
        self.mean += delta * (nb / n);
        self.m2 += other.m2 + delta.component_mul(&delta) * (na * nb / n);
        self.count += other.count;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> Vector3f {
        self.mean
    }

    /// Unbiased sample variance, zero below two samples.
    pub fn variance(&self) -> Vector3f {
        if self.count < 2 {
            return Vector3f::zeros();
        }
        (self.m2 / (self.count - 1) as Float).map(|v| v.max(0.0))
    }

    pub fn std_dev(&self) -> Vector3f {
        self.variance().map(|v| v.sqrt())
    }

    /// Standard deviation of the mean estimate, `sqrt(variance / n)`.
    pub fn std_error(&self) -> Vector3f {
        if self.count == 0 {
            return Vector3f::zeros();
        }
        (self.variance() / self.count as Float).map(|v| v.sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn stats_of(samples: &[Vector3f]) -> RunningStats {
        let mut stats = RunningStats::new();
        for s in samples {
            stats.push(s);
        }
        stats
    }

    #[test]
    fn test_welford_matches_two_pass() {
        let samples: Vec<Vector3f> = (0..50)
            .map(|i| Vector3f::new(i as Float * 0.1, (i % 7) as Float, 1e6 + (i % 3) as Float))
            .collect();
        let stats = stats_of(&samples);

        let n = samples.len() as Float;
        let mean = samples.iter().fold(Vector3f::zeros(), |acc, s| acc + s) / n;
        let var = samples.iter()
            .fold(Vector3f::zeros(), |acc, s| acc + (s - mean).component_mul(&(s - mean))) / (n - 1.0);

        assert_eq!(stats.count(), 50);
        for c in 0..3 {
            assert_relative_eq!(stats.mean()[c], mean[c], max_relative = 1e-12);
            assert_relative_eq!(stats.variance()[c], var[c], max_relative = 1e-9);
        }
        assert_relative_eq!(stats.std_error()[1], (var[1] / n).sqrt(), max_relative = 1e-9);
    }

    #[test]
    fn test_empty_and_single() {
        let empty = RunningStats::new();
        assert_eq!(empty.variance(), Vector3f::zeros());
        assert_eq!(empty.std_error(), Vector3f::zeros());

        let one = stats_of(&[Vector3f::new(1.0, 2.0, 3.0)]);
        assert_eq!(one.mean(), Vector3f::new(1.0, 2.0, 3.0));
        assert_eq!(one.variance(), Vector3f::zeros());

        let mut merged = RunningStats::new();
        merged.merge(&one);
        assert_eq!(merged, one);
        merged.merge(&empty);
        assert_eq!(merged, one);
    }

    proptest! {
        #[test]
        fn prop_merge_is_order_independent(
            values in prop::collection::vec(0.0f64..10.0, 2..120),
            cut_a in 0usize..120,
            cut_b in 0usize..120,
        ) {
            let samples: Vec<Vector3f> = values.iter()
                .map(|v| Vector3f::new(*v, v * v, 1.0 - v))
                .collect();
            let whole = stats_of(&samples);

            let mut cuts = [cut_a.min(samples.len()), cut_b.min(samples.len())];
            cuts.sort();
            let a = stats_of(&samples[..cuts[0]]);
            let b = stats_of(&samples[cuts[0]..cuts[1]]);
            let c = stats_of(&samples[cuts[1]..]);

            let mut left = a;
            left.merge(&b);
            left.merge(&c);

            let mut right = c;
            let mut bc = b;
            bc.merge(&a);
            right.merge(&bc);

            for merged in [left, right] {
                prop_assert_eq!(merged.count(), whole.count());
                for ch in 0..3 {
                    prop_assert!((merged.mean()[ch] - whole.mean()[ch]).abs() < 1e-9);
                    prop_assert!((merged.variance()[ch] - whole.variance()[ch]).abs()
                        < 1e-7 * (1.0 + whole.variance()[ch]));
                }
            }
        }
    }
}
