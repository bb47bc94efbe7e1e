// Copyright @yucwang 2026

use crate::core::distance::{DistanceField2, PointDistanceField2};
use crate::core::error::{Error, Result};
use crate::math::bounds::Bounds2f;
use crate::math::constants::{Float, Vector2f};

/// Control points of one cubic Bézier segment.
pub type CubicBezier = [Vector2f; 4];

pub fn eval_cubic_bezier(curve: &CubicBezier, t: Float) -> Vector2f {
    let s = 1.0 - t;
    curve[0] * (s * s * s)
        + curve[1] * (3.0 * s * s * t)
        + curve[2] * (3.0 * s * t * t)
        + curve[3] * (t * t * t)
}

/// Polyline through a chain of cubic curves, `segments` pieces per curve.
/// Consecutive duplicate points are dropped.
pub fn flatten_beziers(curves: &[CubicBezier], segments: usize) -> Vec<Vector2f> {
    let segments = segments.max(1);
    let mut points: Vec<Vector2f> = Vec::with_capacity(curves.len() * segments + 1);
    for curve in curves {
        for i in 0..=segments {
            let p = eval_cubic_bezier(curve, i as Float / segments as Float);
            if points.last().map_or(true, |last| (last - p).norm() > 1e-12) {
                points.push(p);
            }
        }
    }
    points
}

#[derive(Debug, Clone, PartialEq)]
pub struct Circle {
    center: Vector2f,
    radius: Float,
}

impl Circle {
    pub fn new(center: Vector2f, radius: Float) -> Result<Self> {
        if !(radius > 0.0) || !radius.is_finite() {
            return Err(Error::invalid_config("radius", format!("must be positive, got {}", radius)));
        }
        Ok(Self { center, radius })
    }

    pub fn center(&self) -> Vector2f {
        self.center
    }

    pub fn radius(&self) -> Float {
        self.radius
    }
}

impl DistanceField2 for Circle {
    fn distance(&self, p: &Vector2f) -> Float {
        self.radius - (p - self.center).norm()
    }

    fn bounds(&self) -> Bounds2f {
        let r = Vector2f::new(self.radius, self.radius);
        Bounds2f::new(self.center - r, self.center + r)
    }
}

impl PointDistanceField2 for Circle {
    fn nearest_boundary(&self, p: &Vector2f) -> (Vector2f, Float) {
        let offset = p - self.center;
        let len = offset.norm();
        let dir = if len > 0.0 { offset / len } else { Vector2f::new(1.0, 0.0) };
        (self.center + dir * self.radius, self.radius - len)
    }
}

/// Closed simple polygon; the last vertex connects back to the first.
/// Inside/outside follows the even-odd rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<Vector2f>,
    bounds: Bounds2f,
}

impl Polygon {
    pub fn new(vertices: Vec<Vector2f>) -> Result<Self> {
        if vertices.len() < 3 {
            return Err(Error::invalid_config("outline", format!("needs at least 3 vertices, got {}", vertices.len())));
        }
        if vertices.iter().any(|v| !v.x.is_finite() || !v.y.is_finite()) {
            return Err(Error::invalid_config("outline", "vertices must be finite"));
        }
        let bounds = Bounds2f::from_points(vertices.iter());
        if !bounds.has_area() {
            return Err(Error::invalid_config("outline", "vertices are collinear"));
        }
        Ok(Self { vertices, bounds })
    }

    pub fn from_cubic_beziers(curves: &[CubicBezier], segments_per_curve: usize) -> Result<Self> {
        Self::new(flatten_beziers(curves, segments_per_curve))
    }

    /// Closes a half outline drawn on the `x >= 0` side by appending its
    /// reflection across the y axis in reverse order.
    pub fn mirrored_x(half: &[Vector2f]) -> Result<Self> {
        let mut vertices = half.to_vec();
        for p in half.iter().rev() {
            let mirrored = Vector2f::new(-p.x, p.y);
            let duplicate = vertices.last().map_or(false, |last| (last - mirrored).norm() <= 1e-12)
                || (vertices[0] - mirrored).norm() <= 1e-12;
            if !duplicate {
                vertices.push(mirrored);
            }
        }
        Self::new(vertices)
    }

    pub fn scaled(&self, factor: Float) -> Result<Self> {
        Self::new(self.vertices.iter().map(|v| v * factor).collect())
    }

    pub fn vertices(&self) -> &[Vector2f] {
        &self.vertices
    }

    fn edges(&self) -> impl Iterator<Item = (&Vector2f, &Vector2f)> + '_ {
        self.vertices.iter().zip(self.vertices.iter().cycle().skip(1))
    }

    fn contains(&self, p: &Vector2f) -> bool {
        let mut inside = false;
        for (a, b) in self.edges() {
            if (a.y > p.y) != (b.y > p.y) {
                let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
                if p.x < x {
                    inside = !inside;
                }
            }
        }
        inside
    }

    fn closest_point(&self, p: &Vector2f) -> Vector2f {
        let mut best = self.vertices[0];
        let mut best_d2 = Float::INFINITY;
        for (a, b) in self.edges() {
            let ab = b - a;
            let len2 = ab.norm_squared();
            let t = if len2 > 0.0 { ((p - a).dot(&ab) / len2).clamp(0.0, 1.0) } else { 0.0 };
            let q = a + ab * t;
            let d2 = (p - q).norm_squared();
            if d2 < best_d2 {
                best_d2 = d2;
                best = q;
            }
        }
        best
    }
}

impl DistanceField2 for Polygon {
    fn distance(&self, p: &Vector2f) -> Float {
        self.nearest_boundary(p).1
    }

    fn bounds(&self) -> Bounds2f {
        self.bounds
    }
}

impl PointDistanceField2 for Polygon {
    fn nearest_boundary(&self, p: &Vector2f) -> (Vector2f, Float) {
        let q = self.closest_point(p);
        let d = (p - q).norm();
        (q, if self.contains(p) { d } else { -d })
    }
}

/// Outline loaded from a synthesis job.
#[derive(Debug, Clone, PartialEq)]
pub enum Outline {
    Circle(Circle),
    Polygon(Polygon),
}

impl DistanceField2 for Outline {
    fn distance(&self, p: &Vector2f) -> Float {
        match self {
            Outline::Circle(c) => c.distance(p),
            Outline::Polygon(poly) => poly.distance(p),
        }
    }

    fn bounds(&self) -> Bounds2f {
        match self {
            Outline::Circle(c) => c.bounds(),
            Outline::Polygon(poly) => poly.bounds(),
        }
    }
}

impl PointDistanceField2 for Outline {
    fn nearest_boundary(&self, p: &Vector2f) -> (Vector2f, Float) {
        match self {
            Outline::Circle(c) => c.nearest_boundary(p),
            Outline::Polygon(poly) => poly.nearest_boundary(p),
        }
    }
}
