//! Camera frustum as supplied by the host: an eye position plus three corners
//! of the virtual screen.
//!
//! Any point on the screen is reached by bilinear interpolation from the
//! top-left corner along the two screen edges.

use bytemuck::{Pod, Zeroable};

use crate::{Ray, Vec3, Vec3A};

/// Eye position and three screen corners (top-left, top-right, bottom-left).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Frustum {
    pub position: Vec3,
    pub top_left: Vec3,
    pub top_right: Vec3,
    pub bottom_left: Vec3,
}

impl Frustum {
    pub fn new(position: Vec3, top_left: Vec3, top_right: Vec3, bottom_left: Vec3) -> Self {
        Self {
            position,
            top_left,
            top_right,
            bottom_left,
        }
    }

    /// A pinhole camera at `position` looking at `target`, with the screen
    /// placed one unit in front of the eye.
    ///
    /// `vfov` is the vertical field of view in degrees.
    pub fn look_at(position: Vec3, target: Vec3, up: Vec3, vfov: f32, aspect: f32) -> Self {
        let w = (position - target).normalize();
        let u = up.cross(w).normalize();
        let v = w.cross(u);

        let half_height = (vfov.to_radians() * 0.5).tan();
        let half_width = half_height * aspect;
        let center = position - w;

        Self {
            position,
            top_left: center - u * half_width + v * half_height,
            top_right: center + u * half_width + v * half_height,
            bottom_left: center - u * half_width - v * half_height,
        }
    }

    /// Exact, bitwise comparison of all twelve components.
    ///
    /// Accumulated pixel history is only kept while this holds between two
    /// consecutive frames.
    pub fn same_as(&self, other: &Frustum) -> bool {
        bytemuck::bytes_of(self) == bytemuck::bytes_of(other)
    }

    /// Point on the screen at normalised coordinates `(u, v)`, where `(0, 0)`
    /// is the top-left corner and `(1, 1)` the bottom-right.
    pub fn point_on_screen(&self, u: f32, v: f32) -> Vec3A {
        let p1 = Vec3A::from(self.top_left);
        let p2 = Vec3A::from(self.top_right);
        let p3 = Vec3A::from(self.bottom_left);
        p1 + u * (p2 - p1) + v * (p3 - p1)
    }

    /// Primary ray through pixel `(x, y)` of a `width` x `height` target.
    ///
    /// The sample point is the pixel's top-left corner, matching the host's
    /// screen mapping. Returns `None` if the eye lies on the screen plane at
    /// that point (no valid direction).
    pub fn primary_ray(&self, x: u32, y: u32, width: u32, height: u32) -> Option<Ray> {
        let u = x as f32 / width as f32;
        let v = y as f32 / height as f32;
        let origin = Vec3A::from(self.position);
        let direction = (self.point_on_screen(u, v) - origin).try_normalize()?;
        Some(Ray::new(origin, direction))
    }
}
