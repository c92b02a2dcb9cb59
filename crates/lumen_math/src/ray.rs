use crate::Vec3A;

/// A ray in 3D space with origin and direction.
///
/// Both vectors are stored as `Vec3A` (four SIMD lanes, the fourth unused) so
/// the slab and triangle tests vectorise. The reciprocal direction is cached
/// at construction because every box test along the ray needs it.
///
/// Rays are plain `Copy` values: every bounce and every shadow query builds
/// its own ray on the stack.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3A,
    pub direction: Vec3A,
    inv_direction: Vec3A,
}

impl Ray {
    /// Create a new ray. `direction` is used as given (not normalised).
    pub fn new(origin: Vec3A, direction: Vec3A) -> Self {
        Self {
            origin,
            direction,
            inv_direction: direction.recip(),
        }
    }

    /// Create a ray whose origin is nudged `epsilon` along `direction`.
    ///
    /// Used for every secondary ray so it does not immediately re-hit the
    /// surface it leaves.
    pub fn offset(point: Vec3A, direction: Vec3A, epsilon: f32) -> Self {
        Self::new(point + direction * epsilon, direction)
    }

    /// Component-wise `1 / direction`. Zero components become ±infinity.
    #[inline]
    pub fn inv_direction(&self) -> Vec3A {
        self.inv_direction
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3A {
        self.origin + self.direction * t
    }
}
