// Copyright 2020 @TwoCookingMice

use super::constants::{Float, Vector3f, EPSILON, FLOAT_MAX};

#[derive(Debug, Clone, Copy)]
pub struct Ray3f {
    origin: Vector3f,
    dir: Vector3f,
    pub min_t: Float,
    pub max_t: Float
}

impl Ray3f {
    pub fn new(o: Vector3f, d: Vector3f, 
               min_t: Option<Float>, max_t: Option<Float>) -> Self {
        Self { origin: o, dir: d.normalize(), 
               min_t: min_t.unwrap_or(0.0),
               max_t: max_t.unwrap_or(FLOAT_MAX)}
    }

    // Continuation ray leaving a surface, pushed off along the side it travels into.
    pub fn spawn(p: Vector3f, n: Vector3f, d: Vector3f) -> Self {
        let offset = if n.dot(&d) >= 0.0 { n * EPSILON } else { -n * EPSILON };
        Self::new(p + offset, d, Some(EPSILON), None)
    }

    pub fn origin(&self) -> Vector3f {
        self.origin
    }

    pub fn dir(&self) -> Vector3f {
        self.dir
    }

    pub fn at(&self, t: Float) -> Vector3f {
        self.origin + self.dir * t
    }

    pub fn update(&mut self, t: Float) -> bool {
        if t < self.min_t || t > self.max_t {
            false
        } else {
            self.max_t = t;
            true
        }
    }

    pub fn test_segment(&self, t: Float) -> bool {
        t >= self.min_t && t <= self.max_t
    }
}

/* Tests for Ray */
