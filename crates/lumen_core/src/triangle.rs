//! Triangle primitive for the geometry store.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection, with
//! the two edge vectors cached at construction.

use lumen_math::{Aabb, Interval, Ray, Vec3A};
use rand::Rng;

/// Determinant below which a ray is treated as parallel to the triangle.
const PARALLEL_EPSILON: f32 = 1e-8;

/// An immutable triangle with derived data cached for repeated ray tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// Vertices
    pub v0: Vec3A,
    pub v1: Vec3A,
    pub v2: Vec3A,
    /// Index into the scene's material table
    pub material: u32,
    /// v1 - v0
    edge1: Vec3A,
    /// v2 - v0
    edge2: Vec3A,
    /// Unit geometric normal, zero for a degenerate triangle
    normal: Vec3A,
    centroid: Vec3A,
    area: f32,
}

impl Triangle {
    /// Create a new triangle from three vertices.
    pub fn new(v0: Vec3A, v1: Vec3A, v2: Vec3A, material: u32) -> Self {
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;
        let cross = edge1.cross(edge2);

        Self {
            v0,
            v1,
            v2,
            material,
            edge1,
            edge2,
            normal: cross.try_normalize().unwrap_or(Vec3A::ZERO),
            centroid: (v0 + v1 + v2) / 3.0,
            area: 0.5 * cross.length(),
        }
    }

    /// Unit geometric normal following the winding `v0 -> v1 -> v2`.
    #[inline]
    pub fn normal(&self) -> Vec3A {
        self.normal
    }

    #[inline]
    pub fn centroid(&self) -> Vec3A {
        self.centroid
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.area
    }

    /// Tight bounding box over the three vertices.
    pub fn bounds(&self) -> Aabb {
        let mut bbox = Aabb::EMPTY;
        bbox.grow(self.v0);
        bbox.grow(self.v1);
        bbox.grow(self.v2);
        bbox
    }

    /// Möller-Trumbore ray-triangle intersection.
    ///
    /// Returns the hit distance if it lies strictly inside `ray_t`.
    pub fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<f32> {
        let h = ray.direction.cross(self.edge2);
        let a = self.edge1.dot(h);

        // Ray is parallel to triangle
        if a.abs() < PARALLEL_EPSILON {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin - self.v0;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(self.edge1);
        let v = f * ray.direction.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * self.edge2.dot(q);
        ray_t.surrounds(t).then_some(t)
    }

    /// Uniformly distributed point on the triangle's surface.
    pub fn random_point<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3A {
        let r1: f32 = rng.gen();
        let r2: f32 = rng.gen();
        let s = r1.sqrt();
        self.v0 + self.edge1 * (s * (1.0 - r2)) + self.edge2 * (s * r2)
    }
}
