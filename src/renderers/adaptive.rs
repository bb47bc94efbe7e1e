// Copyright @yucwang 2026

use crate::core::convergence::{ConvergenceCriterion, PixelState};
use crate::core::error::{Error, Result};
use crate::core::rng::SampleRng;
use crate::core::roulette::RouletteTerminator;
use crate::core::scene::SceneQuery;
use crate::core::scheduler::{sample_until_terminal, AdaptiveTask, ReduceTask, SamplingScheduler};
use crate::core::sensor::Sensor;
use crate::core::stats::RunningStats;
use crate::integrators::path::PathSampler;
use crate::math::bitmap::Bitmap;
use crate::math::constants::{Float, Vector2f, Vector3f};

pub use super::renderer::{RenderOutput, Renderer};

#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub criterion: ConvergenceCriterion,
    pub roulette: RouletteTerminator,
    /// Jitter width in pixels around each pixel center.
    pub antialias: Float,
    pub workers: usize,
    pub seed: u64,
    pub show_progress: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            criterion: ConvergenceCriterion::default(),
            roulette: RouletteTerminator::default(),
            antialias: 1.0,
            workers: 0,
            seed: 0,
            show_progress: false,
        }
    }
}

impl RenderSettings {
    pub fn validate(&self) -> Result<()> {
        self.criterion.validate()?;
        self.roulette.validate()?;
        if !(self.antialias >= 0.0) {
            return Err(Error::invalid_config("antialias", format!("must be non-negative, got {}", self.antialias)));
        }
        Ok(())
    }

    fn scheduler(&self) -> SamplingScheduler {
        SamplingScheduler::new(self.workers, self.seed).with_progress(self.show_progress)
    }
}

struct PixelTask<'a> {
    scene: &'a dyn SceneQuery,
    sensor: &'a dyn Sensor,
    sampler: PathSampler,
    antialias: Float,
    width: usize,
    height: usize,
}

impl<'a> PixelTask<'a> {
    fn film_position(&self, item: usize, rng: &mut SampleRng) -> Vector2f {
        let x = (item % self.width) as Float;
        let y = (item / self.width) as Float;
        let jitter = (rng.next_vector2() - Vector2f::new(0.5, 0.5)) * self.antialias;
        Vector2f::new((x + 0.5 + jitter.x) / self.width as Float,
                      (y + 0.5 + jitter.y) / self.height as Float)
    }
}

impl<'a> AdaptiveTask for PixelTask<'a> {
    fn sample(&self, item: usize, rng: &mut SampleRng) -> Vector3f {
        let u = self.film_position(item, rng);
        let ray = self.sensor.sample_ray(&u);
        self.sampler.sample(self.scene, &ray, rng)
    }
}

/// Path tracer that keeps sampling each pixel until its estimate is stable
/// under the configured criterion.
pub struct AdaptiveRenderer {
    settings: RenderSettings,
}

impl AdaptiveRenderer {
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Samples pixel `(x, y)` alone, reproducing the record a full render
    /// with the same settings would keep for it.
    pub fn render_pixel(&self,
                        scene: &dyn SceneQuery,
                        sensor: &dyn Sensor,
                        x: usize,
                        y: usize) -> Result<(RunningStats, PixelState)> {
        self.settings.validate()?;
        let (width, height) = (sensor.width(), sensor.height());
        if x >= width || y >= height {
            return Err(Error::invalid_config("pixel", format!("({}, {}) is outside {}x{}", x, y, width, height)));
        }
        let task = PixelTask {
            scene,
            sensor,
            sampler: PathSampler::new(self.settings.roulette.clone()),
            antialias: self.settings.antialias,
            width,
            height,
        };
        Ok(sample_until_terminal(&task, y * width + x, self.settings.seed, &self.settings.criterion))
    }
}

impl Renderer for AdaptiveRenderer {
    fn render(&self, scene: &dyn SceneQuery, sensor: &dyn Sensor) -> Result<RenderOutput> {
        self.settings.validate()?;
        let (width, height) = (sensor.width(), sensor.height());
        log::info!("Rendering {}x{} with {}.", width, height, sensor.describe());

        let task = PixelTask {
            scene,
            sensor,
            sampler: PathSampler::new(self.settings.roulette.clone()),
            antialias: self.settings.antialias,
            width,
            height,
        };
        let outcome = self.settings.scheduler().run_adaptive(&task, width * height, &self.settings.criterion)?;

        let mut bitmap = Bitmap::new(width, height);
        for (item, stats) in outcome.stats.iter().enumerate() {
            bitmap[(item % width, item / width)] = stats.mean();
        }
        Ok(RenderOutput { bitmap, outcome })
    }
}

struct VarianceTask<'a> {
    pixels: PixelTask<'a>,
    samples: usize,
}

impl<'a> ReduceTask for VarianceTask<'a> {
    type Local = (Float, usize);
    type Global = (Float, usize);

    fn new_local(&self) -> Self::Local {
        (0.0, 0)
    }

    fn sample(&self, local: &mut Self::Local, index: usize, rng: &mut SampleRng) {
        let mut stats = RunningStats::new();
        for _ in 0..self.samples {
            stats.push(&self.pixels.sample(index, rng));
        }
        local.0 += stats.variance().mean();
        local.1 += 1;
    }

    fn merge(&self, global: &mut Self::Global, local: Self::Local) -> Result<()> {
        global.0 += local.0;
        global.1 += local.1;
        Ok(())
    }
}

/// Mean per-pixel sample variance (averaged over channels) of a
/// `width x height` pass with `samples` rays per pixel. Summation order
/// follows the shard layout, so the last bits may vary with worker count.
pub fn ray_variance(scene: &dyn SceneQuery,
                    sensor: &dyn Sensor,
                    width: usize,
                    height: usize,
                    samples: usize,
                    settings: &RenderSettings) -> Result<Float> {
    if width == 0 || height == 0 {
        return Err(Error::invalid_config("ray_variance", format!("grid must be non-empty, got {}x{}", width, height)));
    }
    if samples < 2 {
        return Err(Error::invalid_config("ray_variance", "needs at least 2 samples per pixel"));
    }
    settings.validate()?;

    let task = VarianceTask {
        pixels: PixelTask {
            scene,
            sensor,
            sampler: PathSampler::new(settings.roulette.clone()),
            antialias: settings.antialias,
            width,
            height,
        },
        samples,
    };
    let (sum, count) = settings.scheduler().reduce(&task, 0..width * height, (0.0, 0))?;
    let variance = sum / count.max(1) as Float;
    log::info!("Ray variance over {}x{} pixels: {:.6}", width, height, variance);
    Ok(variance)
}
