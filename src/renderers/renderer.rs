// Copyright @yucwang 2021

use crate::core::error::Result;
use crate::core::scene::SceneQuery;
use crate::core::scheduler::AdaptiveOutcome;
use crate::core::sensor::Sensor;
use crate::math::bitmap::Bitmap;

/// Per-pixel means plus the sampling record each pixel ended with.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub bitmap: Bitmap,
    pub outcome: AdaptiveOutcome,
}

pub trait Renderer {
    fn render(&self, scene: &dyn SceneQuery, sensor: &dyn Sensor) -> Result<RenderOutput>;
}
