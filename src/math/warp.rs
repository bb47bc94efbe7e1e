// Copyright @yucwang 2023

use super::constants::{ INV_PI, INV_4PI, PI, Float, Vector2f, Vector3f };

pub fn sample_uniform_sphere(u: &Vector2f) -> Vector3f {
    let z: Float = 1.0 - 2.0 * u.x;
    let r: Float = (1.0 - z * z).max(0.0).sqrt();
    let phi: Float = 2.0 * PI * u.y;

    Vector3f::new(r * phi.cos(), r * phi.sin(), z)
}

pub fn sample_uniform_sphere_pdf() -> Float {
    INV_4PI
}

pub fn sample_uniform_disk_concentric(u: &Vector2f) -> Vector2f {
    let r1: Float = 2.0 * u.x - 1.0;
    let r2: Float = 2.0 * u.y - 1.0;

    let phi: Float;
    let r:   Float;

    if r1 == 0. && r2 == 0. {
        r = 0.0;
        phi = 0.0;
    } else if r1 * r1 > r2 * r2 {
        r = r1;
        phi = (PI / 4.0) * (r2 / r1);
    } else {
        r = r2;
        phi = (PI / 2.0) - (r1 / r2) * (PI / 4.0);
    }

    let (sin_phi, cos_phi) = phi.sin_cos();

    Vector2f::new(r * cos_phi, r * sin_phi)
}

pub fn sample_cosine_hemisphere(u: &Vector2f) -> Vector3f {
    let p = sample_uniform_disk_concentric(u);
    let z = (1. - p.x * p.x - p.y * p.y).max(0.0).sqrt();

    Vector3f::new(p.x, p.y, z)
}

pub fn sample_cosine_hemisphere_pdf(cos_theta: Float) -> Float {
    cos_theta * INV_PI
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_samples_are_unit() {
        for i in 0..16 {
            for j in 0..16 {
                let u = Vector2f::new(i as Float / 16.0, j as Float / 16.0);
                let d = sample_uniform_sphere(&u);
                assert!((d.norm() - 1.0).abs() < 1e-9);
            }
        }
        assert!((sample_uniform_sphere(&Vector2f::new(0.0, 0.3)).z - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_hemisphere_upper() {
        for i in 0..10 {
            let u = Vector2f::new(0.05 + i as Float * 0.09, 0.7);
            let w = sample_cosine_hemisphere(&u);
            assert!(w.z >= 0.0);
            assert!((w.norm() - 1.0).abs() < 1e-9);
            assert!(sample_cosine_hemisphere_pdf(w.z) >= 0.0);
        }
    }
}
