// Copyright @yucwang 2026

use crate::core::error::{Error, Result};
use crate::core::interaction::SurfaceIntersection;
use crate::core::shape::Shape;
use crate::math::constants::{Float, Vector3f};
use crate::math::ray::Ray3f;

pub struct Sphere {
    center: Vector3f,
    radius: Float,
}

impl Sphere {
    pub fn new(center: Vector3f, radius: Float) -> Result<Self> {
        if !(radius > 0.0) || !radius.is_finite() {
            return Err(Error::invalid_config("radius", format!("must be positive, got {}", radius)));
        }
        Ok(Self { center, radius })
    }

    pub fn center(&self) -> Vector3f {
        self.center
    }

    pub fn radius(&self) -> Float {
        self.radius
    }
}

impl Shape for Sphere {
    fn bounding_box(&self) -> (Vector3f, Vector3f) {
        let r = Vector3f::new(self.radius, self.radius, self.radius);
        (self.center - r, self.center + r)
    }

    fn ray_intersection(&self, ray: &Ray3f) -> Option<SurfaceIntersection> {
        // Direction is unit length, so a = 1.
        let oc = ray.origin() - self.center;
        let half_b = oc.dot(&ray.dir());
        let c = oc.norm_squared() - self.radius * self.radius;
        let discriminant = half_b * half_b - c;
        if discriminant < 0.0 {
            return None;
        }
        let root = discriminant.sqrt();

        let t = [-half_b - root, -half_b + root]
            .into_iter()
            .find(|t| ray.test_segment(*t))?;
        let p = ray.at(t);
        let n = (p - self.center) / self.radius;
        Some(SurfaceIntersection::new(p, n, t))
    }

    fn describe(&self) -> String {
        format!("Sphere [center: {:?}, radius: {}]", self.center, self.radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_sphere_intersection() {
        let sphere = Sphere::new(Vector3f::new(0.0, 0.0, 5.0), 1.0).unwrap();
        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0), None, None);
        let hit = sphere.ray_intersection(&ray).unwrap();
        assert_abs_diff_eq!(hit.t(), 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(hit.geo_normal().z, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sphere_inside_and_miss() {
        let sphere = Sphere::new(Vector3f::zeros(), 2.0).unwrap();
        let inside = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 1.0, 0.0), None, None);
        let hit = sphere.ray_intersection(&inside).unwrap();
        assert_abs_diff_eq!(hit.t(), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(hit.geo_normal().y, 1.0, epsilon = 1e-12);

        let miss = Ray3f::new(Vector3f::new(0.0, 3.0, -5.0), Vector3f::new(0.0, 0.0, 1.0), None, None);
        assert!(sphere.ray_intersection(&miss).is_none());

        let short = Ray3f::new(Vector3f::new(0.0, 0.0, -5.0), Vector3f::new(0.0, 0.0, 1.0), None, Some(1.0));
        assert!(sphere.ray_intersection(&short).is_none());
    }

    #[test]
    fn test_rejects_bad_radius() {
        assert!(Sphere::new(Vector3f::zeros(), 0.0).is_err());
        assert!(Sphere::new(Vector3f::zeros(), -1.0).is_err());
    }
}
