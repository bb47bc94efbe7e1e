// Copyright @yucwang 2021

pub mod bsdf;
pub mod convergence;
pub mod distance;
pub mod error;
pub mod interaction;
pub mod outline_loader;
pub mod rng;
pub mod roulette;
pub mod scene;
pub mod scene_loader;
pub mod scheduler;
pub mod sensor;
pub mod shape;
pub mod stats;
