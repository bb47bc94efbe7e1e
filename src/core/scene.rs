// Copyright @yucwang 2026

use crate::core::bsdf::BSDF;
use crate::core::error::{Error, Result};
use crate::core::interaction::SurfaceIntersection;
use crate::core::rng::SampleRng;
use crate::core::shape::Shape;
use crate::math::constants::{Float, Vector3f};
use crate::math::frame::Frame;
use crate::math::ray::Ray3f;
use crate::math::spectrum::RGBSpectrum;
use crate::shapes::rotated::RotatedShape;
use std::sync::Arc;

/// Result of shading one hit: what the surface emits toward the viewer and,
/// unless the path was absorbed, where it continues.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadeSample {
    pub emitted: RGBSpectrum,
    pub direction: Option<Vector3f>,
    pub weight: RGBSpectrum,
}

impl ShadeSample {
    pub fn absorbed(emitted: RGBSpectrum) -> Self {
        Self { emitted, direction: None, weight: RGBSpectrum::zeros() }
    }
}

/// Read-only scene view used by the path kernel. Must be safe to share
/// across worker threads.
pub trait SceneQuery: Sync {
    fn intersect(&self, ray: &Ray3f) -> Option<SurfaceIntersection>;
    fn shade(&self, hit: &SurfaceIntersection, wo: &Vector3f, rng: &mut SampleRng) -> ShadeSample;
    fn background(&self, dir: &Vector3f) -> RGBSpectrum;
}

#[derive(Clone)]
pub struct SceneObject {
    pub shape: Arc<dyn Shape>,
    pub material: Arc<dyn BSDF>,
    pub emission: RGBSpectrum,
    pub name: Option<String>,
}

impl SceneObject {
    pub fn new(shape: Arc<dyn Shape>, material: Arc<dyn BSDF>) -> Self {
        Self { shape, material, emission: RGBSpectrum::zeros(), name: None }
    }

    pub fn with_emission(shape: Arc<dyn Shape>, material: Arc<dyn BSDF>, emission: RGBSpectrum) -> Self {
        Self { shape, material, emission, name: None }
    }

    pub fn with_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    pub fn shape(&self) -> &Arc<dyn Shape> {
        &self.shape
    }
}

#[derive(Clone)]
pub struct Scene {
    objects: Vec<SceneObject>,
    background: RGBSpectrum,
}

impl Scene {
    pub fn new() -> Self {
        Self { objects: Vec::new(), background: RGBSpectrum::zeros() }
    }

    pub fn with_objects(objects: Vec<SceneObject>) -> Self {
        Self { objects, background: RGBSpectrum::zeros() }
    }

    pub fn add_object(&mut self, object: SceneObject) {
        self.objects.push(object);
    }

    pub fn objects(&self) -> &Vec<SceneObject> {
        &self.objects
    }

    pub fn set_background(&mut self, background: RGBSpectrum) {
        self.background = background;
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// `(min, max)` over all object bounds, `None` for an empty scene.
    pub fn bounds(&self) -> Option<(Vector3f, Vector3f)> {
        let mut iter = self.objects.iter().map(|o| o.shape.bounding_box());
        let first = iter.next()?;
        Some(iter.fold(first, |(lo, hi), (a, b)| (lo.inf(&a), hi.sup(&b))))
    }

    pub fn emitter_count(&self) -> usize {
        self.objects.iter().filter(|o| o.emission.iter().any(|c| *c > 0.0)).count()
    }

    /// Copy of the scene with the object called `name` turned `angle`
    /// radians about the world `z` axis. Everything else is shared.
    pub fn with_rotated_object(&self, name: &str, angle: Float) -> Result<Scene> {
        let mut scene = self.clone();
        let object = scene.objects.iter_mut()
            .find(|o| o.name.as_deref() == Some(name))
            .ok_or_else(|| Error::invalid_config("turntable_object", format!("no object named '{}'", name)))?;
        object.shape = Arc::new(RotatedShape::about_z(object.shape.clone(), angle));
        Ok(scene)
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneQuery for Scene {
    // Closest hit by linear search; scenes here hold a handful of primitives.
    fn intersect(&self, ray: &Ray3f) -> Option<SurfaceIntersection> {
        let mut ray = *ray;
        let mut closest = None;
        for (idx, object) in self.objects.iter().enumerate() {
            if let Some(hit) = object.shape.ray_intersection(&ray) {
                if ray.update(hit.t()) {
                    closest = Some(hit.with_object_index(Some(idx)));
                }
            }
        }
        closest
    }

    fn shade(&self, hit: &SurfaceIntersection, wo: &Vector3f, rng: &mut SampleRng) -> ShadeSample {
        let object = match hit.object_index().and_then(|idx| self.objects.get(idx)) {
            Some(object) => object,
            None => return ShadeSample::absorbed(RGBSpectrum::zeros()),
        };

        let normal = hit.geo_normal();
        // Emitters radiate from their front face only.
        let emitted = if normal.dot(wo) > 0.0 { object.emission } else { RGBSpectrum::zeros() };

        let frame = Frame::from_normal(&normal);
        let wo_local = frame.to_local(wo);
        let u1 = rng.next_vector2();
        let u2 = rng.next_vector2();
        let record = object.material.sample(u1, u2, wo_local);
        if record.is_absorbed() {
            return ShadeSample::absorbed(emitted);
        }

        ShadeSample {
            emitted,
            direction: Some(frame.from_local(&record.wi).normalize()),
            weight: record.weight,
        }
    }

    fn background(&self, _dir: &Vector3f) -> RGBSpectrum {
        self.background
    }
}
