// Copyright @yucwang 2026

pub mod blend;
pub mod dielectric;
pub mod fresnel;
pub mod lambertian_diffuse;
pub mod mirror;
