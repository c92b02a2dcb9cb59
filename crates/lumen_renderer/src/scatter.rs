//! Specular scattering directions.

use lumen_math::Vec3A;

/// Mirror `direction` about `normal` (unit length).
#[inline]
pub fn reflect(direction: Vec3A, normal: Vec3A) -> Vec3A {
    direction - 2.0 * direction.dot(normal) * normal
}

/// Refract `direction` (unit) through a surface with outward `normal` and
/// index of refraction `ior` on its inner side.
///
/// A ray leaving the surface (travelling along the normal) sees the normal
/// flipped and the indices swapped. Returns `None` on total internal
/// reflection or when the result has no valid direction.
pub fn refract(direction: Vec3A, normal: Vec3A, ior: f32) -> Option<Vec3A> {
    let mut cos_i = direction.dot(normal).clamp(-1.0, 1.0);
    let (mut eta_i, mut eta_t) = (1.0, ior);
    let mut n = normal;

    if cos_i < 0.0 {
        cos_i = -cos_i;
    } else {
        n = -normal;
        std::mem::swap(&mut eta_i, &mut eta_t);
    }

    let eta = eta_i / eta_t;
    let k = 1.0 - eta * eta * (1.0 - cos_i * cos_i);
    if k < 0.0 {
        return None;
    }
    (eta * direction + (eta * cos_i - k.sqrt()) * n).try_normalize()
}
