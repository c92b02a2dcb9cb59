//! The geometry store: triangle soup, emitters and the material table.
//!
//! A [`Scene`] is read-only once built. Renderers borrow it for the whole
//! frame and share it across worker threads without synchronisation.

use lumen_math::{Vec3A, Vec4};
use thiserror::Error;

use crate::{Light, Material, Triangle};

/// Errors raised while ingesting host geometry and materials.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("vertex buffer holds {vertices} vertices, not a multiple of 3")]
    IncompleteTriangle { vertices: usize },

    #[error("raw vertex buffer holds {floats} floats, not a multiple of 4")]
    VertexLayout { floats: usize },

    #[error("{triangles} triangles but {materials} material indices")]
    MaterialCountMismatch { triangles: usize, materials: usize },

    #[error("triangle {triangle} references material {material}, but only {available} exist")]
    UnknownMaterial {
        triangle: usize,
        material: u32,
        available: usize,
    },

    #[error("light {light} references material {material}, but only {available} exist")]
    UnknownLightMaterial {
        light: usize,
        material: u32,
        available: usize,
    },

    #[error("material {index}: reflection {reflection} and refraction {refraction} are not valid probabilities")]
    InvalidProbability {
        index: usize,
        reflection: f32,
        refraction: f32,
    },

    #[error("material {index}: index of refraction {ior} must be positive")]
    InvalidIor { index: usize, ior: f32 },

    #[error("material {index}: color must be finite and non-negative")]
    InvalidColor { index: usize },
}

/// Result type for scene ingestion.
pub type SceneResult<T> = Result<T, SceneError>;

/// Read-only scene data consumed by BVH construction and rendering.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    triangles: Vec<Triangle>,
    lights: Vec<Light>,
    materials: Vec<Material>,
}

impl Scene {
    /// Start building a scene.
    pub fn builder() -> SceneBuilder {
        SceneBuilder::default()
    }

    #[inline]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    #[inline]
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    #[inline]
    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    #[inline]
    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    /// Whether next-event estimation is possible at all.
    #[inline]
    pub fn has_lights(&self) -> bool {
        !self.lights.is_empty()
    }

    /// Material of a triangle or light. Indices are validated at build time.
    #[inline]
    pub fn material(&self, index: u32) -> &Material {
        &self.materials[index as usize]
    }

    /// Radiance emitted by a light.
    #[inline]
    pub fn emission(&self, light: &Light) -> Vec3A {
        Vec3A::from(self.material(light.material()).color)
    }
}

/// Accumulates host geometry, then validates it into a [`Scene`].
#[derive(Debug, Clone, Default)]
pub struct SceneBuilder {
    triangles: Vec<Triangle>,
    lights: Vec<Light>,
    materials: Vec<Material>,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the material table. Triangles refer to entries by position.
    pub fn materials(mut self, materials: Vec<Material>) -> Self {
        self.materials = materials;
        self
    }

    /// Append one material, returning its index.
    pub fn add_material(&mut self, material: Material) -> u32 {
        self.materials.push(material);
        (self.materials.len() - 1) as u32
    }

    /// Append one scene triangle.
    pub fn add_triangle(&mut self, v0: Vec3A, v1: Vec3A, v2: Vec3A, material: u32) -> &mut Self {
        self.triangles.push(Triangle::new(v0, v1, v2, material));
        self
    }

    /// Append one emitting triangle. Lights are kept apart from the BVH and
    /// tested explicitly by the integrator.
    pub fn add_light(&mut self, v0: Vec3A, v1: Vec3A, v2: Vec3A, material: u32) -> &mut Self {
        self.lights.push(Light::new(Triangle::new(v0, v1, v2, material)));
        self
    }

    /// Ingest a flat vertex buffer, three vertices per triangle, with one
    /// material index per triangle. The `w` component is ignored.
    pub fn add_geometry(&mut self, vertices: &[Vec4], materials: &[u32]) -> SceneResult<&mut Self> {
        if vertices.len() % 3 != 0 {
            return Err(SceneError::IncompleteTriangle {
                vertices: vertices.len(),
            });
        }
        let count = vertices.len() / 3;
        if materials.len() != count {
            return Err(SceneError::MaterialCountMismatch {
                triangles: count,
                materials: materials.len(),
            });
        }

        self.triangles.reserve(count);
        for (corners, &material) in vertices.chunks_exact(3).zip(materials) {
            self.triangles.push(Triangle::new(
                Vec3A::from(corners[0].truncate()),
                Vec3A::from(corners[1].truncate()),
                Vec3A::from(corners[2].truncate()),
                material,
            ));
        }
        Ok(self)
    }

    /// Ingest the host's raw float buffer (four floats per vertex).
    pub fn add_vertex_floats(
        &mut self,
        floats: &[f32],
        materials: &[u32],
    ) -> SceneResult<&mut Self> {
        let vertices: &[[f32; 4]] = bytemuck::try_cast_slice(floats)
            .map_err(|_| SceneError::VertexLayout {
                floats: floats.len(),
            })?;
        let vertices: Vec<Vec4> = vertices.iter().map(|v| Vec4::from_array(*v)).collect();
        self.add_geometry(&vertices, materials)
    }

    /// Validate materials and indices and freeze the scene.
    pub fn build(self) -> SceneResult<Scene> {
        let available = self.materials.len();

        for (index, material) in self.materials.iter().enumerate() {
            material.validate(index)?;
        }
        if let Some((triangle, tri)) = self
            .triangles
            .iter()
            .enumerate()
            .find(|(_, t)| t.material as usize >= available)
        {
            return Err(SceneError::UnknownMaterial {
                triangle,
                material: tri.material,
                available,
            });
        }
        if let Some((light, l)) = self
            .lights
            .iter()
            .enumerate()
            .find(|(_, l)| l.material() as usize >= available)
        {
            return Err(SceneError::UnknownLightMaterial {
                light,
                material: l.material(),
                available,
            });
        }

        log::debug!(
            "Scene: {} triangles, {} lights, {} materials",
            self.triangles.len(),
            self.lights.len(),
            available
        );
        if self.lights.is_empty() {
            log::warn!("Scene has no lights; direct light sampling is disabled");
        }

        Ok(Scene {
            triangles: self.triangles,
            lights: self.lights,
            materials: self.materials,
        })
    }
}
