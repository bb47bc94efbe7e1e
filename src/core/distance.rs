// Copyright @yucwang 2026

use crate::math::bounds::Bounds2f;
use crate::math::constants::{Float, Vector2f};

/// Signed distance to a closed 2-D boundary, positive inside.
pub trait DistanceField2: Sync {
    fn distance(&self, p: &Vector2f) -> Float;
    fn bounds(&self) -> Bounds2f;
}

pub trait PointDistanceField2: DistanceField2 {
    /// Closest boundary point to `p` together with the signed distance of `p`.
    fn nearest_boundary(&self, p: &Vector2f) -> (Vector2f, Float);
}

pub trait MedialAxisProjector: Sync {
    fn project(&self, p: &Vector2f) -> Vector2f;
}

/// Walks from a point directly away from its nearest boundary point until
/// the distance stops growing one-for-one with the step, i.e. until another
/// part of the boundary becomes closer. That crossing is on the medial axis.
///
/// `|sdf|` is 1-Lipschitz, so once the growth falls behind it never catches
/// up again and the crossing can be bracketed by bisection.
pub struct BisectionProjector<F> {
    field: F,
    iterations: usize,
}

impl<F: PointDistanceField2> BisectionProjector<F> {
    pub fn new(field: F) -> Self {
        Self { field, iterations: 32 }
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations.max(1);
        self
    }

    pub fn field(&self) -> &F {
        &self.field
    }
}

impl<F: PointDistanceField2> MedialAxisProjector for BisectionProjector<F> {
    fn project(&self, p: &Vector2f) -> Vector2f {
        let (boundary, signed) = self.field.nearest_boundary(p);
        let d0 = signed.abs();
        let away = p - boundary;
        let len = away.norm();
        if len <= 0.0 || d0 <= 0.0 {
            return *p;
        }
        let dir = away / len;

        let reach = self.field.bounds().diagonal();
        let tolerance = 1e-7 * reach;
        let past_axis = |t: Float| self.field.distance(&(p + dir * t)).abs() < d0 + t - tolerance;

        if !past_axis(reach) {
            return *p;
        }

        let (mut lo, mut hi) = (0.0, reach);
        for _ in 0..self.iterations {
            let mid = 0.5 * (lo + hi);
            if past_axis(mid) {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        p + dir * (0.5 * (lo + hi))
    }
}
