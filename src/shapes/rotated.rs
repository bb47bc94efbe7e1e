// Copyright @yucwang 2026

use std::sync::Arc;

use nalgebra::{Rotation3, Unit};

use crate::core::interaction::SurfaceIntersection;
use crate::core::shape::Shape;
use crate::math::constants::{Float, Vector3f};
use crate::math::ray::Ray3f;

/// A shape rotated about an axis through the world origin. Rays are taken
/// into the inner shape's frame, hits are brought back out.
pub struct RotatedShape {
    inner: Arc<dyn Shape>,
    to_world: Rotation3<Float>,
    to_local: Rotation3<Float>,
}

impl RotatedShape {
    pub fn new(inner: Arc<dyn Shape>, axis: Vector3f, angle: Float) -> Self {
        let to_world = Rotation3::from_axis_angle(&Unit::new_normalize(axis), angle);
        Self { inner, to_world, to_local: to_world.inverse() }
    }

    /// Rotation about world `z`, the turntable axis.
    pub fn about_z(inner: Arc<dyn Shape>, angle: Float) -> Self {
        Self::new(inner, Vector3f::new(0.0, 0.0, 1.0), angle)
    }
}

impl Shape for RotatedShape {
    fn bounding_box(&self) -> (Vector3f, Vector3f) {
        let (lo, hi) = self.inner.bounding_box();
        let mut out_lo = Vector3f::repeat(Float::INFINITY);
        let mut out_hi = Vector3f::repeat(Float::NEG_INFINITY);
        for i in 0..8 {
            let corner = Vector3f::new(if i & 1 == 0 { lo.x } else { hi.x },
                                       if i & 2 == 0 { lo.y } else { hi.y },
                                       if i & 4 == 0 { lo.z } else { hi.z });
            let p = self.to_world * corner;
            out_lo = out_lo.inf(&p);
            out_hi = out_hi.sup(&p);
        }
        (out_lo, out_hi)
    }

    fn ray_intersection(&self, ray: &Ray3f) -> Option<SurfaceIntersection> {
        let local = Ray3f::new(self.to_local * ray.origin(), self.to_local * ray.dir(),
                               Some(ray.min_t), Some(ray.max_t));
        let hit = self.inner.ray_intersection(&local)?;
        Some(SurfaceIntersection::new(self.to_world * hit.p(), self.to_world * hit.geo_normal(), hit.t())
            .with_object_index(hit.object_index()))
    }

    fn describe(&self) -> String {
        format!("RotatedShape [{:?}] of {}", self.to_world.scaled_axis(), self.inner.describe())
    }
}
