//! Area lights: triangles designated as emitters.

use lumen_math::Vec3A;
use rand::Rng;

use crate::Triangle;

/// An emitting triangle. Its material's color is the emitted radiance.
///
/// Lights are one-sided: they emit along the triangle's geometric normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    triangle: Triangle,
}

/// A point sampled uniformly on a light's surface.
#[derive(Debug, Clone, Copy)]
pub struct LightSample {
    pub point: Vec3A,
    pub normal: Vec3A,
    pub area: f32,
}

impl Light {
    pub fn new(triangle: Triangle) -> Self {
        Self { triangle }
    }

    #[inline]
    pub fn triangle(&self) -> &Triangle {
        &self.triangle
    }

    /// Index of the material holding the emitted radiance.
    #[inline]
    pub fn material(&self) -> u32 {
        self.triangle.material
    }

    #[inline]
    pub fn normal(&self) -> Vec3A {
        self.triangle.normal()
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.triangle.area()
    }

    /// Uniformly sample a point on the emitter.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> LightSample {
        LightSample {
            point: self.triangle.random_point(rng),
            normal: self.normal(),
            area: self.area(),
        }
    }
}

impl From<Triangle> for Light {
    fn from(triangle: Triangle) -> Self {
        Self::new(triangle)
    }
}
