// Copyright @yucwang 2026

use crate::core::error::{Error, Result};
use crate::core::stats::RunningStats;
use crate::math::constants::{Float, Vector3f};

/// Lifecycle of one pixel under adaptive sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelState {
    Pending,
    Sampling { samples: u64 },
    Converged { samples: u64 },
    Exhausted { samples: u64 },
}

impl PixelState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PixelState::Converged { .. } | PixelState::Exhausted { .. })
    }

    pub fn samples(&self) -> u64 {
        match *self {
            PixelState::Pending => 0,
            PixelState::Sampling { samples }
            | PixelState::Converged { samples }
            | PixelState::Exhausted { samples } => samples,
        }
    }
}

/// Gamma-aware stop rule for per-pixel sampling.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceCriterion {
    pub min_samples: u64,
    pub max_samples: u64,
    pub error_margin: Float,
    pub gamma: Float,
    // A channel whose mean sits this many standard errors above
    // `saturation_level` is clipped on display and skips the error check.
    pub saturation_stddevs: Float,
    pub saturation_level: Float,
}

impl Default for ConvergenceCriterion {
    fn default() -> Self {
        Self {
            min_samples: 100,
            max_samples: 10_000,
            error_margin: 0.01,
            gamma: 2.2,
            saturation_stddevs: 3.0,
            saturation_level: 1.0,
        }
    }
}

impl ConvergenceCriterion {
    pub fn validate(&self) -> Result<()> {
        if self.min_samples == 0 {
            return Err(Error::invalid_config("min_samples", "must be at least 1"));
        }
        if self.max_samples < self.min_samples {
            return Err(Error::invalid_config(
                "max_samples",
                format!("{} is below min_samples {}", self.max_samples, self.min_samples),
            ));
        }
        if !(self.gamma > 0.0) {
            return Err(Error::invalid_config("gamma", format!("must be positive, got {}", self.gamma)));
        }
        if !(self.error_margin >= 0.0) {
            return Err(Error::invalid_config("error_margin", format!("must be non-negative, got {}", self.error_margin)));
        }
        if !(self.saturation_stddevs >= 0.0) {
            return Err(Error::invalid_config("saturation_stddevs", "must be non-negative"));
        }
        Ok(())
    }

    pub fn channel_converged(&self, mean: Float, stddev: Float) -> bool {
        if mean - self.saturation_stddevs * stddev > self.saturation_level {
            return true;
        }
        let inv_gamma = 1.0 / self.gamma;
        let high = (mean + stddev).max(0.0).powf(inv_gamma);
        let low = mean.max(0.0).powf(inv_gamma);
        high - low <= self.error_margin
    }

    /// `stddev` is the standard error of the mean, per channel.
    pub fn is_converged(&self, mean: &Vector3f, stddev: &Vector3f) -> bool {
        (0..3).all(|c| self.channel_converged(mean[c], stddev[c]))
    }

    pub fn classify(&self, stats: &RunningStats) -> PixelState {
        let samples = stats.count();
        if samples == 0 {
            return PixelState::Pending;
        }
        if samples >= self.min_samples && self.is_converged(&stats.mean(), &stats.std_error()) {
            return PixelState::Converged { samples };
        }
        if samples >= self.max_samples {
            return PixelState::Exhausted { samples };
        }
        PixelState::Sampling { samples }
    }
}
