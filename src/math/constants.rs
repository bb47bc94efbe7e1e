/* Copyright 2020 @Yuchen Wong */

pub type Float = f64;

pub type Vector2f = nalgebra::Vector2<Float>;
pub type Vector3f = nalgebra::Vector3<Float>;

pub const EPSILON: Float = 1e-4;
pub const PI: Float = std::f64::consts::PI;
pub const INV_PI: Float = std::f64::consts::FRAC_1_PI;
pub const INV_4PI: Float = 0.25 * std::f64::consts::FRAC_1_PI;
pub const FLOAT_MAX: Float = Float::MAX;
