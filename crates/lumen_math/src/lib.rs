// Re-export glam for convenience
pub use glam::*;

// Lumen math types
mod aabb;
mod frustum;
mod interval;
mod ray;

pub use aabb::Aabb;
pub use frustum::Frustum;
pub use interval::Interval;
pub use ray::Ray;
