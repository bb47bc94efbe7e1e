// Copyright @yucwang 2026

use crate::core::distance::{DistanceField2, MedialAxisProjector};
use crate::core::error::{Error, Result};
use crate::core::rng::SampleRng;
use crate::core::scheduler::{ReduceTask, SamplingScheduler};
use crate::math::constants::Float;
use crate::volumes::height_field::HeightField;

pub use crate::volumes::height_field::SphereFootprint;

#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisSettings {
    pub resolution: usize,
    pub iterations: usize,
    pub max_radius: Float,
    pub height_scale: Float,
    pub max_attempts: usize,
    pub seed: u64,
    pub workers: usize,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            resolution: 2048,
            iterations: 40000,
            max_radius: 0.9,
            height_scale: 0.7,
            max_attempts: 64,
            seed: 0,
            workers: 0,
        }
    }
}

impl SynthesisSettings {
    pub fn validate(&self) -> Result<()> {
        if self.resolution == 0 {
            return Err(Error::invalid_config("resolution", "must be at least 1"));
        }
        if !(self.max_radius > 0.0) {
            return Err(Error::invalid_config("max_radius", format!("must be positive, got {}", self.max_radius)));
        }
        if !(self.height_scale > 0.0) {
            return Err(Error::invalid_config("height_scale", format!("must be positive, got {}", self.height_scale)));
        }
        if self.max_attempts == 0 {
            return Err(Error::invalid_config("max_attempts", "must be at least 1"));
        }
        Ok(())
    }
}

/// Draws sphere footprints centered on the medial axis of a 2-D shape.
pub struct SolidSampler<'a, F, P> {
    field: &'a F,
    projector: &'a P,
    max_radius: Float,
    max_attempts: usize,
}

impl<'a, F: DistanceField2, P: MedialAxisProjector> SolidSampler<'a, F, P> {
    pub fn new(field: &'a F, projector: &'a P, max_radius: Float, max_attempts: usize) -> Self {
        Self { field, projector, max_radius, max_attempts: max_attempts.max(1) }
    }

    /// `None` when every attempt projected onto a point outside the shape.
    pub fn sample_footprint(&self, rng: &mut SampleRng) -> Option<SphereFootprint> {
        let bounds = self.field.bounds();
        for _ in 0..self.max_attempts {
            let candidate = rng.uniform_in(&bounds);
            let center = self.projector.project(&candidate);
            let dist = self.field.distance(&center);
            if dist > 0.0 {
                return Some(SphereFootprint::new(center, dist, dist.min(self.max_radius)));
            }
        }
        None
    }
}

/// One footprint per index, painted into a worker-local height field and
/// max-merged into the global one.
pub struct SphereFillTask<'a, F, P> {
    sampler: SolidSampler<'a, F, P>,
    template: HeightField,
}

impl<'a, F: DistanceField2, P: MedialAxisProjector> SphereFillTask<'a, F, P> {
    pub fn new(sampler: SolidSampler<'a, F, P>, template: &HeightField) -> Self {
        Self { sampler, template: template.empty_like() }
    }
}

impl<'a, F: DistanceField2, P: MedialAxisProjector> ReduceTask for SphereFillTask<'a, F, P> {
    type Local = HeightField;
    type Global = HeightField;

    fn new_local(&self) -> HeightField {
        self.template.clone()
    }

    fn sample(&self, local: &mut HeightField, index: usize, rng: &mut SampleRng) {
        match self.sampler.sample_footprint(rng) {
            Some(footprint) => local.add_footprint(&footprint),
            None => log::debug!("Sample {} found no interior point.", index),
        }
    }

    fn merge(&self, global: &mut HeightField, local: HeightField) -> Result<()> {
        global.merge(&local)
    }
}

pub fn synthesize_height_field<F, P>(field: &F,
                                     projector: &P,
                                     settings: &SynthesisSettings,
                                     scheduler: &SamplingScheduler) -> Result<HeightField>
where
    F: DistanceField2,
    P: MedialAxisProjector,
{
    settings.validate()?;
    let global = HeightField::new(field.bounds(), settings.resolution)?;
    log::info!("Synthesizing {}x{} height field from {} spheres.",
               global.width(), global.height(), settings.iterations);

    let sampler = SolidSampler::new(field, projector, settings.max_radius, settings.max_attempts);
    let task = SphereFillTask::new(sampler, &global);
    let result = scheduler.reduce(&task, 0..settings.iterations, global)?;

    log::info!("Height field covers {} cells, peak height {:.4}.", result.covered_cells(), result.max_height());
    Ok(result)
}
