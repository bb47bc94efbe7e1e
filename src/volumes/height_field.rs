// Copyright @yucwang 2026

use crate::core::distance::DistanceField2;
use crate::core::error::{Error, Result};
use crate::math::bounds::Bounds2f;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::shapes::outline::Outline;

/// Spherical cap standing on the plane: a disk of `radius` around `center`
/// whose peak reaches `height`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereFootprint {
    pub center: Vector2f,
    pub radius: Float,
    pub height: Float,
}

impl SphereFootprint {
    pub fn new(center: Vector2f, radius: Float, height: Float) -> Self {
        Self { center, radius, height }
    }

    /// Cap profile at `q`; `None` outside the disk.
    pub fn height_at(&self, q: &Vector2f) -> Option<Float> {
        let d2 = (q - self.center).norm_squared();
        let r2 = self.radius * self.radius;
        if d2 >= r2 {
            return None;
        }
        Some(self.height * (1.0 - d2 / r2).sqrt())
    }
}

/// Max-composited height samples at cell centers over a rectangle.
///
/// Cells are square; `resolution` counts cells along the longer side.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightField {
    bounds: Bounds2f,
    cell_size: Float,
    xres: usize,
    yres: usize,
    data: Vec<Float>,
}

impl HeightField {
    pub fn new(bounds: Bounds2f, resolution: usize) -> Result<Self> {
        if !bounds.has_area() {
            return Err(Error::invalid_config("bounds", format!("must have positive area, got {:?}", bounds)));
        }
        if resolution == 0 {
            return Err(Error::invalid_config("resolution", "must be at least 1"));
        }

        let extent = bounds.extent();
        let cell_size = bounds.max_extent() / resolution as Float;
        let cells = |len: Float| ((len / cell_size - 1e-9).ceil() as usize).max(1);
        let xres = cells(extent.x);
        let yres = cells(extent.y);
        Ok(Self { bounds, cell_size, xres, yres, data: vec![0.0; xres * yres] })
    }

    pub fn bounds(&self) -> Bounds2f {
        self.bounds
    }

    pub fn width(&self) -> usize {
        self.xres
    }

    pub fn height(&self) -> usize {
        self.yres
    }

    pub fn cell_size(&self) -> Float {
        self.cell_size
    }

    /// Row-major, `y` rows from `p_min.y` upward.
    pub fn values(&self) -> &[Float] {
        &self.data
    }

    pub fn get(&self, x: usize, y: usize) -> Float {
        self.data[x + y * self.xres]
    }

    pub fn cell_center(&self, x: usize, y: usize) -> Vector2f {
        self.bounds.p_min + Vector2f::new((x as Float + 0.5) * self.cell_size,
                                          (y as Float + 0.5) * self.cell_size)
    }

    /// Raises every cell whose center lies strictly inside the footprint's
    /// disk to the cap profile there. Cells outside the field are ignored.
    pub fn add_footprint(&mut self, footprint: &SphereFootprint) {
        if !(footprint.radius > 0.0) || !(footprint.height > 0.0) {
            return;
        }
        let local = (footprint.center - self.bounds.p_min) / self.cell_size;
        let r = footprint.radius / self.cell_size;

        let y_lo = cell_floor(local.y - r - 0.5, self.yres);
        let y_hi = cell_floor(local.y + r - 0.5, self.yres) + 1;
        let x_lo = cell_floor(local.x - r - 0.5, self.xres);
        let x_hi = cell_floor(local.x + r - 0.5, self.xres) + 1;

        for y in y_lo..y_hi.min(self.yres) {
            for x in x_lo..x_hi.min(self.xres) {
                let center = self.cell_center(x, y);
                if let Some(h) = footprint.height_at(&center) {
                    let cell = &mut self.data[x + y * self.xres];
                    if h > *cell {
                        *cell = h;
                    }
                }
            }
        }
    }

    /// Elementwise max with `other`. Fields must share bounds and shape;
    /// on mismatch `self` is left untouched.
    pub fn merge(&mut self, other: &HeightField) -> Result<()> {
        if self.xres != other.xres || self.yres != other.yres || self.bounds != other.bounds {
            return Err(Error::HeightFieldMismatch(format!(
                "{}x{} over {:?} vs {}x{} over {:?}",
                self.xres, self.yres, self.bounds, other.xres, other.yres, other.bounds
            )));
        }
        for (a, b) in self.data.iter_mut().zip(other.data.iter()) {
            if *b > *a {
                *a = *b;
            }
        }
        Ok(())
    }

    /// Value of the cell containing `p`, zero outside the field.
    pub fn height_at(&self, p: &Vector2f) -> Float {
        if !self.bounds.contains(p) {
            return 0.0;
        }
        let local = (p - self.bounds.p_min) / self.cell_size;
        let x = (local.x.floor() as usize).min(self.xres - 1);
        let y = (local.y.floor() as usize).min(self.yres - 1);
        self.get(x, y)
    }

    pub fn max_height(&self) -> Float {
        self.data.iter().cloned().fold(0.0, Float::max)
    }

    pub fn covered_cells(&self) -> usize {
        self.data.iter().filter(|h| **h > 0.0).count()
    }

    /// Fresh field with the same layout and every cell at zero.
    pub fn empty_like(&self) -> Self {
        Self {
            bounds: self.bounds,
            cell_size: self.cell_size,
            xres: self.xres,
            yres: self.yres,
            data: vec![0.0; self.data.len()],
        }
    }
}

// First cell index whose center is at or above `v` (in cell units, shifted
// by half a cell), clamped into `[0, n]`.
fn cell_floor(v: Float, n: usize) -> usize {
    if v <= 0.0 {
        0
    } else {
        (v.floor() as usize).min(n)
    }
}

/// Closed solid bounded above and below by the scaled height field:
/// `|z| <= height_scale * h(x, y)`, optionally cut by the extruded outline
/// the field was grown in so the rim follows the outline instead of the
/// cell staircase.
pub struct PillowSolid {
    field: HeightField,
    height_scale: Float,
    outline: Option<Outline>,
}

impl PillowSolid {
    pub fn new(field: HeightField, height_scale: Float) -> Result<Self> {
        if !(height_scale > 0.0) {
            return Err(Error::invalid_config("height_scale", format!("must be positive, got {}", height_scale)));
        }
        Ok(Self { field, height_scale, outline: None })
    }

    pub fn clipped_to(mut self, outline: Outline) -> Self {
        self.outline = Some(outline);
        self
    }

    pub fn field(&self) -> &HeightField {
        &self.field
    }

    pub fn contains(&self, p: &Vector3f) -> bool {
        let h = self.field.height_at(&Vector2f::new(p.x, p.y));
        let inside_outline = match &self.outline {
            Some(outline) => outline.distance(&Vector2f::new(p.x, p.y)) > 0.0,
            None => true,
        };
        h > 0.0 && p.z.abs() <= self.height_scale * h && inside_outline
    }

    pub fn bounds(&self) -> (Vector3f, Vector3f) {
        let b = self.field.bounds();
        let top = self.height_scale * self.field.max_height();
        (Vector3f::new(b.p_min.x, b.p_min.y, -top), Vector3f::new(b.p_max.x, b.p_max.y, top))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::outline::Circle;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    fn unit_bounds() -> Bounds2f {
        Bounds2f::new(Vector2f::new(-1.0, -1.0), Vector2f::new(1.0, 1.0))
    }

    #[test]
    fn test_layout() {
        let wide = HeightField::new(Bounds2f::new(Vector2f::zeros(), Vector2f::new(4.0, 1.0)), 8).unwrap();
        assert_eq!(wide.width(), 8);
        assert_eq!(wide.height(), 2);
        assert_abs_diff_eq!(wide.cell_size(), 0.5);
        assert_eq!(wide.cell_center(0, 0), Vector2f::new(0.25, 0.25));

        assert!(HeightField::new(unit_bounds(), 0).is_err());
        assert!(HeightField::new(Bounds2f::default(), 4).is_err());
    }

    #[test]
    fn test_footprint_profile() {
        let fp = SphereFootprint::new(Vector2f::zeros(), 2.0, 1.0);
        assert_abs_diff_eq!(fp.height_at(&Vector2f::zeros()).unwrap(), 1.0);
        assert_abs_diff_eq!(fp.height_at(&Vector2f::new(1.0, 0.0)).unwrap(), (0.75 as Float).sqrt());
        assert!(fp.height_at(&Vector2f::new(2.0, 0.0)).is_none());
    }

    #[test]
    fn test_add_footprint_only_inside_disk() {
        let mut field = HeightField::new(unit_bounds(), 20).unwrap();
        let fp = SphereFootprint::new(Vector2f::new(0.5, 0.5), 0.3, 0.2);
        field.add_footprint(&fp);

        for y in 0..field.height() {
            for x in 0..field.width() {
                let c = field.cell_center(x, y);
                let expected = fp.height_at(&c).unwrap_or(0.0);
                assert_abs_diff_eq!(field.get(x, y), expected);
            }
        }
        assert!(field.covered_cells() > 0);
        assert!(field.max_height() <= 0.2);
    }

    #[test]
    fn test_footprint_is_clipped_to_bounds() {
        let mut field = HeightField::new(unit_bounds(), 10).unwrap();
        field.add_footprint(&SphereFootprint::new(Vector2f::new(1.2, 0.0), 0.5, 1.0));
        assert!(field.covered_cells() > 0);
        field.add_footprint(&SphereFootprint::new(Vector2f::new(5.0, 5.0), 0.5, 1.0));
        field.add_footprint(&SphereFootprint::new(Vector2f::new(-5.0, -5.0), 0.5, 1.0));
        assert_eq!(field.height_at(&Vector2f::new(-0.95, -0.95)), 0.0);
    }

    #[test]
    fn test_merge_is_elementwise_max() {
        let mut a = HeightField::new(unit_bounds(), 16).unwrap();
        let mut b = a.empty_like();
        a.add_footprint(&SphereFootprint::new(Vector2f::new(-0.3, 0.0), 0.5, 0.4));
        b.add_footprint(&SphereFootprint::new(Vector2f::new(0.3, 0.0), 0.5, 0.6));

        let mut merged = a.clone();
        merged.merge(&b).unwrap();
        for (i, h) in merged.values().iter().enumerate() {
            assert_eq!(*h, a.values()[i].max(b.values()[i]));
        }
    }

    #[test]
    fn test_merge_mismatch_leaves_target_untouched() {
        let mut a = HeightField::new(unit_bounds(), 16).unwrap();
        a.add_footprint(&SphereFootprint::new(Vector2f::zeros(), 0.5, 0.4));
        let before = a.clone();

        let other = HeightField::new(unit_bounds(), 8).unwrap();
        assert!(matches!(a.merge(&other), Err(Error::HeightFieldMismatch(_))));
        let shifted = HeightField::new(Bounds2f::new(Vector2f::zeros(), Vector2f::new(2.0, 2.0)), 16).unwrap();
        assert!(a.merge(&shifted).is_err());
        assert_eq!(a, before);
    }

    #[test]
    fn test_pillow_solid_contains() {
        let mut field = HeightField::new(unit_bounds(), 32).unwrap();
        field.add_footprint(&SphereFootprint::new(Vector2f::zeros(), 0.8, 0.8));
        let solid = PillowSolid::new(field, 0.5).unwrap();

        assert!(solid.contains(&Vector3f::new(0.0, 0.0, 0.3)));
        assert!(solid.contains(&Vector3f::new(0.0, 0.0, -0.3)));
        assert!(!solid.contains(&Vector3f::new(0.0, 0.0, 0.45)));
        assert!(!solid.contains(&Vector3f::new(0.95, 0.95, 0.0)));
        let (lo, hi) = solid.bounds();
        assert!(hi.z <= 0.4 && lo.z >= -0.4);
        assert!(PillowSolid::new(HeightField::new(unit_bounds(), 4).unwrap(), 0.0).is_err());
    }

    #[test]
    fn test_pillow_solid_clipped_to_outline() {
        let mut field = HeightField::new(unit_bounds(), 32).unwrap();
        field.add_footprint(&SphereFootprint::new(Vector2f::zeros(), 0.8, 0.8));
        let rim = Vector3f::new(0.6, 0.0, 0.0);

        let open = PillowSolid::new(field.clone(), 0.5).unwrap();
        assert!(open.contains(&rim));

        let circle = Circle::new(Vector2f::zeros(), 0.5).unwrap();
        let clipped = PillowSolid::new(field, 0.5).unwrap().clipped_to(Outline::Circle(circle));
        assert!(!clipped.contains(&rim));
        assert!(clipped.contains(&Vector3f::new(0.0, 0.0, 0.3)));
        assert!(clipped.contains(&Vector3f::new(0.45, 0.0, 0.0)));
    }

    fn footprint_strategy() -> impl Strategy<Value = SphereFootprint> {
        (-1.5..1.5f64, -1.5..1.5f64, 0.05..1.0f64, 0.01..1.0f64)
            .prop_map(|(x, y, r, h)| SphereFootprint::new(Vector2f::new(x, y), r, h))
    }

    proptest! {
        #[test]
        fn prop_merge_is_associative_and_commutative(
            a in prop::collection::vec(footprint_strategy(), 0..6),
            b in prop::collection::vec(footprint_strategy(), 0..6),
            c in prop::collection::vec(footprint_strategy(), 0..6),
        ) {
            let base = HeightField::new(unit_bounds(), 12).unwrap();
            let build = |fps: &Vec<SphereFootprint>| {
                let mut f = base.empty_like();
                for fp in fps {
                    f.add_footprint(fp);
                }
                f
            };
            let (fa, fb, fc) = (build(&a), build(&b), build(&c));

            let mut left = fa.clone();
            left.merge(&fb).unwrap();
            left.merge(&fc).unwrap();

            let mut right_inner = fb.clone();
            right_inner.merge(&fc).unwrap();
            let mut right = right_inner;
            right.merge(&fa).unwrap();

            prop_assert_eq!(left, right);
        }
    }
}
