//! Nearest-hit queries against a built [`Bvh`].

use lumen_core::Triangle;
use lumen_math::{Interval, Ray};

use crate::bvh::Bvh;

/// Nearest intersection found along a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Index into the scene's triangle store
    pub triangle: u32,
    /// Ray parameter of the hit point
    pub t: f32,
}

impl Bvh {
    /// Nearest triangle hit by `ray` with `t` strictly inside `ray_t`.
    ///
    /// Children are visited near-first; a subtree whose box is entered no
    /// closer than the best hit so far is skipped without descending.
    pub fn nearest_hit(&self, triangles: &[Triangle], ray: &Ray, ray_t: Interval) -> Option<Hit> {
        let mut closest = None;
        let mut range = ray_t;
        if self.root().bounds.intersect(ray).is_some() {
            self.visit(0, triangles, ray, &mut range, &mut closest);
        }
        closest
    }

    fn visit(
        &self,
        index: usize,
        triangles: &[Triangle],
        ray: &Ray,
        range: &mut Interval,
        closest: &mut Option<Hit>,
    ) {
        let node = &self.nodes()[index];

        let Some((left, right)) = node.children() else {
            for &i in &self.indices()[node.primitives()] {
                if let Some(t) = triangles[i as usize].intersect(ray, *range) {
                    *range = range.with_max(t);
                    *closest = Some(Hit { triangle: i, t });
                }
            }
            return;
        };

        let nodes = self.nodes();
        let near_left = nodes[left].bounds.hit_distance(ray);
        let near_right = nodes[right].bounds.hit_distance(ray);

        let order = match (near_left, near_right) {
            (Some(l), Some(r)) if r < l => [(right, Some(r)), (left, Some(l))],
            _ => [(left, near_left), (right, near_right)],
        };

        for (child, entry) in order {
            match entry {
                // Checked again after the first child may have shrunk the range.
                Some(entry) if entry < range.max => {
                    self.visit(child, triangles, ray, range, closest)
                }
                _ => {}
            }
        }
    }

    /// Whether any triangle is hit inside `ray_t`. Shadow rays pass the
    /// distance to the light as the upper bound.
    pub fn occluded(&self, triangles: &[Triangle], ray: &Ray, ray_t: Interval) -> bool {
        self.nearest_hit(triangles, ray, ray_t).is_some()
    }
}

/// Exhaustive nearest hit over every triangle, for validating the tree.
pub fn brute_force_hit(triangles: &[Triangle], ray: &Ray, ray_t: Interval) -> Option<Hit> {
    let mut range = ray_t;
    let mut closest = None;
    for (i, tri) in triangles.iter().enumerate() {
        if let Some(t) = tri.intersect(ray, range) {
            range = range.with_max(t);
            closest = Some(Hit { triangle: i as u32, t });
        }
    }
    closest
}
