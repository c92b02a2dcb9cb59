//! Material records referenced by index from triangles and lights.

use lumen_math::Vec3;
use serde::{Deserialize, Serialize};

use crate::SceneError;

/// A surface description: base color plus the probabilities of the two
/// specular events.
///
/// The diffuse probability is implicit: `1 - reflection - refraction`. For a
/// light, `color` is the emitted radiance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Base color (RGB, linear)
    pub color: Vec3,
    /// Probability of a perfect mirror bounce
    pub reflection: f32,
    /// Probability of a refracted bounce
    pub refraction: f32,
    /// Index of refraction, used only when `refraction > 0`
    pub ior: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self::diffuse(Vec3::splat(0.5))
    }
}

impl Material {
    /// Pure Lambertian surface.
    pub fn diffuse(color: Vec3) -> Self {
        Self {
            color,
            reflection: 0.0,
            refraction: 0.0,
            ior: 1.0,
        }
    }

    /// Surface that mirrors with probability `reflection` and is diffuse
    /// otherwise.
    pub fn mirror(color: Vec3, reflection: f32) -> Self {
        Self {
            reflection,
            ..Self::diffuse(color)
        }
    }

    /// Transmissive surface refracting with probability `refraction`.
    pub fn glass(color: Vec3, refraction: f32, ior: f32) -> Self {
        Self {
            refraction,
            ior,
            ..Self::diffuse(color)
        }
    }

    /// Emitter material; `color` is the emitted radiance.
    pub fn emitter(radiance: Vec3) -> Self {
        Self::diffuse(radiance)
    }

    /// Probability mass left for a diffuse bounce.
    pub fn diffuse_probability(&self) -> f32 {
        (1.0 - self.reflection - self.refraction).max(0.0)
    }

    /// Check the record is usable by the integrator. `index` is only used in
    /// the error.
    pub fn validate(&self, index: usize) -> Result<(), SceneError> {
        let in_unit = |p: f32| (0.0..=1.0).contains(&p);
        if !in_unit(self.reflection)
            || !in_unit(self.refraction)
            || self.reflection + self.refraction > 1.0 + f32::EPSILON
        {
            return Err(SceneError::InvalidProbability {
                index,
                reflection: self.reflection,
                refraction: self.refraction,
            });
        }
        if self.refraction > 0.0 && !(self.ior > 0.0 && self.ior.is_finite()) {
            return Err(SceneError::InvalidIor {
                index,
                ior: self.ior,
            });
        }
        if !self.color.is_finite() || self.color.min_element() < 0.0 {
            return Err(SceneError::InvalidColor { index });
        }
        Ok(())
    }
}
