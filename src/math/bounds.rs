// Copyright 2020 @TwoCookingMice

use super::constants::{ Float, Vector2f, FLOAT_MAX };

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Bounds2f {
    pub p_min: Vector2f,
    pub p_max: Vector2f
}

impl Default for Bounds2f {
    fn default() -> Self {
        Self { p_min: Vector2f::new(FLOAT_MAX, FLOAT_MAX),
               p_max: Vector2f::new(-FLOAT_MAX, -FLOAT_MAX) }
    }
}

impl Bounds2f {
    pub fn new(p_min: Vector2f, p_max: Vector2f) -> Self {
        Self { p_min: p_min.inf(&p_max), p_max: p_max.sup(&p_min) }
    }

    pub fn from_points<'a, I: IntoIterator<Item = &'a Vector2f>>(points: I) -> Self {
        let mut bounds = Self::default();
        for p in points {
            bounds.expand_by_point(p);
        }
        bounds
    }

    pub fn is_valid(&self) -> bool {
        self.p_min.x <= self.p_max.x && self.p_min.y <= self.p_max.y
    }

    // Valid and with positive area.
    pub fn has_area(&self) -> bool {
        self.p_min.x < self.p_max.x && self.p_min.y < self.p_max.y
    }

    pub fn center(&self) -> Vector2f {
        0.5 * self.p_min + 0.5 * self.p_max
    }

    pub fn extent(&self) -> Vector2f {
        self.p_max - self.p_min
    }

    pub fn diagonal(&self) -> Float {
        self.extent().norm()
    }

    pub fn max_extent(&self) -> Float {
        let e = self.extent();
        e.x.max(e.y)
    }

    pub fn contains(&self, p: &Vector2f) -> bool {
        p.x >= self.p_min.x && p.x <= self.p_max.x &&
        p.y >= self.p_min.y && p.y <= self.p_max.y
    }

    pub fn expand_by_point(&mut self, p: &Vector2f) {
        self.p_min = self.p_min.inf(p);
        self.p_max = self.p_max.sup(p);
    }

    // Point at fractional coordinates `u` in [0, 1]^2.
    pub fn lerp(&self, u: &Vector2f) -> Vector2f {
        self.p_min + self.extent().component_mul(u)
    }
}

/* Test for Bounds2f */
