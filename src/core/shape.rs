// Copyright @yucwang 2023

use crate::core::interaction::SurfaceIntersection;
use crate::math::constants::Vector3f;
use crate::math::ray::Ray3f;

pub trait Shape: Send + Sync {
    /// Axis-aligned `(min, max)` corners.
    fn bounding_box(&self) -> (Vector3f, Vector3f);
    fn ray_intersection(&self, ray: &Ray3f) -> Option<SurfaceIntersection>;
    fn describe(&self) -> String {
        String::from("Shape")
    }
}
