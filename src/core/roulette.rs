// Copyright @yucwang 2026

use crate::core::error::{Error, Result};
use crate::core::rng::SampleRng;
use crate::math::constants::{Float, Vector3f};

/// Mutable state of one light path while it is being traced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathState {
    throughput: Vector3f,
    depth: u32,
    terminated: bool,
}

impl Default for PathState {
    fn default() -> Self {
        Self { throughput: Vector3f::new(1.0, 1.0, 1.0), depth: 0, terminated: false }
    }
}

impl PathState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_throughput(throughput: Vector3f) -> Self {
        Self { throughput, ..Self::default() }
    }

    pub fn throughput(&self) -> Vector3f {
        self.throughput
    }

    /// Scalar path weight used by the termination rules.
    pub fn weight(&self) -> Float {
        self.throughput.max().max(0.0)
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn scale(&mut self, factor: &Vector3f) {
        self.throughput = self.throughput.component_mul(factor);
    }

    pub fn advance(&mut self) {
        self.depth += 1;
    }

    fn terminate(&mut self) {
        self.terminated = true;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    MaxDepth,
    Cutoff,
    Roulette,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RouletteOutcome {
    Continue,
    // Survived a roulette draw; throughput was divided by `probability`.
    Survived { probability: Float },
    Terminated(Termination),
}

impl RouletteOutcome {
    pub fn is_continue(&self) -> bool {
        !matches!(self, RouletteOutcome::Terminated(_))
    }
}

/// Russian roulette with a hard depth limit and an absolute weight cutoff.
#[derive(Debug, Clone, PartialEq)]
pub struct RouletteTerminator {
    pub min_depth: u32,
    pub max_depth: u32,
    pub delta: Float,
    pub cutoff: Float,
}

impl Default for RouletteTerminator {
    fn default() -> Self {
        Self { min_depth: 3, max_depth: 15, delta: 0.2, cutoff: 1e-4 }
    }
}

impl RouletteTerminator {
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(Error::invalid_config("max_depth", "must be at least 1"));
        }
        if !(self.delta >= 0.0) {
            return Err(Error::invalid_config("roulette_delta", format!("must be non-negative, got {}", self.delta)));
        }
        if !(self.cutoff >= 0.0) {
            return Err(Error::invalid_config("cutoff", format!("must be non-negative, got {}", self.cutoff)));
        }
        Ok(())
    }

    pub fn continuation_probability(&self, weight: Float) -> Float {
        if self.delta <= 0.0 {
            return 1.0;
        }
        (weight / self.delta).min(1.0)
    }

    pub fn apply(&self, state: &mut PathState, rng: &mut SampleRng) -> RouletteOutcome {
        if state.depth >= self.max_depth {
            state.terminate();
            return RouletteOutcome::Terminated(Termination::MaxDepth);
        }

        let weight = state.weight();
        if weight <= 0.0 || weight < self.cutoff {
            state.terminate();
            return RouletteOutcome::Terminated(Termination::Cutoff);
        }

        if state.depth < self.min_depth {
            return RouletteOutcome::Continue;
        }

        let probability = self.continuation_probability(weight);
        if probability >= 1.0 {
            return RouletteOutcome::Continue;
        }
        if rng.next_float() < probability {
            state.throughput /= probability;
            RouletteOutcome::Survived { probability }
        } else {
            state.terminate();
            RouletteOutcome::Terminated(Termination::Roulette)
        }
    }
}
