//! Lumen Core - geometry store for the lumen path tracer.
//!
//! This crate provides:
//!
//! - **Primitives**: `Triangle` with cached edges, normal, centroid and area
//! - **Materials**: `Material` records (color, reflection, refraction, IOR)
//! - **Lights**: `Light`, an emitting triangle that can be sampled
//! - **Scene**: `Scene` and `SceneBuilder`, validating host ingestion
//!
//! # Example
//!
//! ```ignore
//! use lumen_core::{Material, Scene};
//!
//! let mut builder = Scene::builder().materials(materials);
//! builder.add_geometry(&vertices, &material_indices)?;
//! let scene = builder.build()?;
//! println!("{} triangles, {} lights", scene.triangle_count(), scene.light_count());
//! ```

pub mod light;
pub mod material;
pub mod scene;
pub mod triangle;

// Re-export commonly used types
pub use light::{Light, LightSample};
pub use material::Material;
pub use scene::{Scene, SceneBuilder, SceneError, SceneResult};
pub use triangle::Triangle;
