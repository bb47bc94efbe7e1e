// Copyright @yucwang 2026

use crate::core::error::{Error, Result};
use crate::core::sensor::Sensor;
use crate::math::constants::{Float, Vector2f, Vector3f, PI};
use crate::math::ray::Ray3f;

#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    origin: Vector3f,
    target: Vector3f,
    world_up: Vector3f,
    forward: Vector3f,
    right: Vector3f,
    up: Vector3f,
    fov_y: Float,
    tan_half_fov_y: Float,
    aspect: Float,
    width: usize,
    height: usize,
}

impl PerspectiveCamera {
    pub fn new(origin: Vector3f,
               target: Vector3f,
               up: Vector3f,
               fov_y_radians: Float,
               width: usize,
               height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::invalid_config("film", format!("size must be positive, got {}x{}", width, height)));
        }
        if !(fov_y_radians > 0.0 && fov_y_radians < PI) {
            return Err(Error::invalid_config("fov", format!("must be in (0, pi), got {}", fov_y_radians)));
        }
        let view = target - origin;
        if view.norm() <= 0.0 || view.cross(&up).norm() <= 1e-12 {
            return Err(Error::invalid_config("lookat", "target must differ from origin and not be parallel to up"));
        }

        let forward = view.normalize();
        let right = forward.cross(&up).normalize();
        let cam_up = right.cross(&forward).normalize();

        Ok(Self {
            origin,
            target,
            world_up: up,
            forward,
            right,
            up: cam_up,
            fov_y: fov_y_radians,
            tan_half_fov_y: (0.5 * fov_y_radians).tan(),
            aspect: width as Float / height as Float,
            width,
            height,
        })
    }

    /// Copy with a different film size, keeping the view.
    pub fn with_film(&self, width: usize, height: usize) -> Result<Self> {
        Self::new(self.origin, self.target, self.world_up, self.fov_y, width, height)
    }
}

impl Sensor for PerspectiveCamera {
    fn sample_ray(&self, u: &Vector2f) -> Ray3f {
        let px = (2.0 * u.x - 1.0) * self.aspect * self.tan_half_fov_y;
        let py = (1.0 - 2.0 * u.y) * self.tan_half_fov_y;

        let dir = self.right * px + self.up * py + self.forward;
        Ray3f::new(self.origin, dir, None, None)
    }

    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn describe(&self) -> String {
        format!("PerspectiveCamera [origin: {:?}, target: {:?}, fov_y: {}, film: {}x{}]",
                self.origin, self.target, self.fov_y, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(Vector3f::new(0.0, -7.0, 2.0),
                               Vector3f::new(0.0, 0.0, 2.0),
                               Vector3f::new(0.0, 0.0, 1.0),
                               PI / 2.0, 4, 4).unwrap()
    }

    #[test]
    fn test_perspective_camera_center_ray() {
        let ray = camera().sample_ray(&Vector2f::new(0.5, 0.5));
        let dir = ray.dir();

        assert_abs_diff_eq!(dir.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(dir.y, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(dir.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_film_corners() {
        let cam = camera();
        // 90 degree fov: top-left corner is 45 degrees up and left.
        let dir = cam.sample_ray(&Vector2f::new(0.0, 0.0)).dir();
        assert!(dir.x < 0.0);
        assert!(dir.z > 0.0);
        assert_abs_diff_eq!(dir.z / dir.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_camera() {
        let up = Vector3f::new(0.0, 0.0, 1.0);
        assert!(PerspectiveCamera::new(Vector3f::zeros(), Vector3f::zeros(), up, 1.0, 4, 4).is_err());
        assert!(PerspectiveCamera::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0), up, 1.0, 4, 4).is_err());
        assert!(PerspectiveCamera::new(Vector3f::zeros(), Vector3f::new(0.0, 1.0, 0.0), up, 0.0, 4, 4).is_err());
        assert!(PerspectiveCamera::new(Vector3f::zeros(), Vector3f::new(0.0, 1.0, 0.0), up, 1.0, 0, 4).is_err());
    }
}
