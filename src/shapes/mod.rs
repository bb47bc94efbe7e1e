// Copyright @yucwang 2021

pub mod cube;
pub mod outline;
pub mod rotated;
pub mod sphere;
