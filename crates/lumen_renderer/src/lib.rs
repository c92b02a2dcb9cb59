//! Lumen Renderer - CPU path tracing core
//!
//! A Monte Carlo path tracer over a triangle soup:
//! - BVH construction (midpoint or binned SAH splits) and near-first traversal
//! - Next-event estimation with a combined light/hemisphere PDF
//! - Mirror and glass events chosen per material probability
//! - Per-pixel adaptive sampling while the camera is still
//!
//! # Example
//!
//! ```ignore
//! use lumen_renderer::{PixelBuffer, RenderConfig, Renderer};
//!
//! let mut renderer = Renderer::new(scene, RenderConfig::default());
//! let mut target = PixelBuffer::new(640, 480)?;
//! loop {
//!     let stats = renderer.render_frame(&frustum, &mut target)?;
//!     present(target.pixels());
//! }
//! ```

pub mod adaptive;
pub mod buffer;
pub mod bvh;
pub mod config;
pub mod integrator;
pub mod renderer;
pub mod sampling;
pub mod scatter;
pub mod traversal;

pub use adaptive::PixelState;
pub use buffer::{pack_color, unpack_color, PixelBuffer};
pub use bvh::{Bvh, BvhNode, BvhStats};
pub use config::{BvhConfig, RenderConfig, SplitMethod};
pub use integrator::{mis_pdf, DirectSample, RenderContext, Surface, SurfaceHit};
pub use renderer::{CancelToken, FrameStats, RenderError, Renderer};
pub use traversal::{brute_force_hit, Hit};

/// Re-export the math and scene types renderer users need.
pub use lumen_core::{Light, Material, Scene, SceneBuilder, SceneError, Triangle};
pub use lumen_math::{Frustum, Interval, Ray, Vec3, Vec3A};
