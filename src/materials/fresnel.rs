// Copyright @yucwang 2026

use crate::math::constants::{Float, Vector3f};

/// Mirror `v` about the local normal `(0, 0, 1)`.
pub fn reflect_local(v: &Vector3f) -> Vector3f {
    Vector3f::new(-v.x, -v.y, v.z)
}

/// `wi` and `m` on the same side; `eta = eta_i / eta_t`. `None` on total
/// internal reflection.
pub fn refract(wi: &Vector3f, m: &Vector3f, eta: Float) -> Option<Vector3f> {
    let cos_i = wi.dot(m).max(-1.0).min(1.0);
    let sin2_i = (1.0 - cos_i * cos_i).max(0.0);
    let sin2_t = eta * eta * sin2_i;
    if sin2_t >= 1.0 {
        return None;
    }
    let cos_t = (1.0 - sin2_t).sqrt();
    Some(-eta * wi + (eta * cos_i - cos_t) * m)
}

/// Unpolarized Fresnel reflectance. `cos_i < 0` means the ray arrives from
/// the `eta_t` side.
pub fn fresnel_dielectric(cos_i: Float, eta_i: Float, eta_t: Float) -> Float {
    let mut cos_i = cos_i.max(-1.0).min(1.0);
    let entering = cos_i > 0.0;
    let (eta_i, eta_t) = if entering { (eta_i, eta_t) } else { (eta_t, eta_i) };
    cos_i = cos_i.abs();

    let sin2_i = (1.0 - cos_i * cos_i).max(0.0);
    let eta = eta_i / eta_t;
    let sin2_t = eta * eta * sin2_i;
    if sin2_t >= 1.0 {
        return 1.0;
    }
    let cos_t = (1.0 - sin2_t).sqrt();
    let r_parl = (eta_t * cos_i - eta_i * cos_t) / (eta_t * cos_i + eta_i * cos_t);
    let r_perp = (eta_i * cos_i - eta_t * cos_t) / (eta_i * cos_i + eta_t * cos_t);
    0.5 * (r_parl * r_parl + r_perp * r_perp)
}
