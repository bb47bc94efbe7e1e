// Copyright @yucwang 2026

use crate::core::error::{Error, Result};
use crate::core::interaction::SurfaceIntersection;
use crate::core::shape::Shape;
use crate::math::constants::{Float, Vector3f};
use crate::math::ray::Ray3f;

/// Axis-aligned box. Flat boxes (zero extent on one axis) are allowed and
/// act as rectangles.
pub struct Cube {
    p_min: Vector3f,
    p_max: Vector3f,
}

impl Cube {
    pub fn new(a: Vector3f, b: Vector3f) -> Result<Self> {
        if a.iter().chain(b.iter()).any(|c| !c.is_finite()) {
            return Err(Error::invalid_config("cube", "corners must be finite"));
        }
        Ok(Self { p_min: a.inf(&b), p_max: a.sup(&b) })
    }

    // Slab test; returns (t, outward normal) of the first crossing inside the
    // ray segment.
    fn intersect_slabs(&self, ray: &Ray3f) -> Option<(Float, Vector3f)> {
        let o = ray.origin();
        let d = ray.dir();

        let mut t_min = ray.min_t;
        let mut t_max = ray.max_t;
        let mut near_normal: Option<Vector3f> = None;
        let mut far_normal = Vector3f::zeros();

        for axis in 0..3 {
            let dir = d[axis];
            if dir.abs() < 1e-12 {
                if o[axis] < self.p_min[axis] || o[axis] > self.p_max[axis] {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / dir;
            let t0 = (self.p_min[axis] - o[axis]) * inv;
            let t1 = (self.p_max[axis] - o[axis]) * inv;
            let (t_enter, t_exit) = if t0 > t1 { (t1, t0) } else { (t0, t1) };

            let mut n = Vector3f::zeros();
            n[axis] = dir.signum();
            if t_enter > t_min {
                t_min = t_enter;
                near_normal = Some(-n);
            }
            if t_exit < t_max {
                t_max = t_exit;
                far_normal = n;
            }
            if t_max < t_min {
                return None;
            }
        }

        match near_normal {
            Some(n) => Some((t_min, n)),
            None if far_normal != Vector3f::zeros() && ray.test_segment(t_max) => Some((t_max, far_normal)),
            None => None,
        }
    }
}

impl Shape for Cube {
    fn bounding_box(&self) -> (Vector3f, Vector3f) {
        (self.p_min, self.p_max)
    }

    fn ray_intersection(&self, ray: &Ray3f) -> Option<SurfaceIntersection> {
        let (t, n) = self.intersect_slabs(ray)?;
        Some(SurfaceIntersection::new(ray.at(t), n, t))
    }

    fn describe(&self) -> String {
        format!("Cube [{:?} - {:?}]", self.p_min, self.p_max)
    }
}
