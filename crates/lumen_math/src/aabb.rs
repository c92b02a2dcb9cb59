use crate::{Interval, Ray, Vec3A};

/// Axis-Aligned Bounding Box for spatial acceleration structures (BVH).
///
/// Stored as a min and a max corner. The empty box has `min = +inf` and
/// `max = -inf`, so growing it by any point yields that point.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Vec3A,
    pub max: Vec3A,
}

impl Aabb {
    /// Box containing nothing; the identity for [`Aabb::grow`].
    pub const EMPTY: Aabb = Aabb {
        min: Vec3A::INFINITY,
        max: Vec3A::NEG_INFINITY,
    };

    /// Expand the box to include `point`.
    #[inline]
    pub fn grow(&mut self, point: Vec3A) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Expand the box to include another box.
    #[inline]
    pub fn grow_box(&mut self, other: &Aabb) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// True when no point has been added yet.
    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    /// Size of the box along each axis.
    pub fn extent(&self) -> Vec3A {
        self.max - self.min
    }

    /// Surface area, used by the SAH split cost. Zero for an empty box.
    pub fn area(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let d = self.extent();
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    /// Returns the index (0=X, 1=Y, 2=Z) of the axis with the longest extent.
    pub fn longest_axis(&self) -> usize {
        let d = self.extent();
        if d.x > d.y && d.x > d.z {
            0
        } else if d.y > d.z {
            1
        } else {
            2
        }
    }

    /// Midpoint of the box along `axis`.
    pub fn center(&self, axis: usize) -> f32 {
        (self.min[axis] + self.max[axis]) * 0.5
    }

    /// Slab test against the three axis-aligned slab pairs.
    ///
    /// Returns the `[entry, exit]` parameter span along the ray, or `None`
    /// when the ray misses: the exit lies behind the origin or the entry lies
    /// past the exit. A ray starting inside the box gets a negative entry.
    ///
    /// An axis the ray runs parallel to only rejects the ray when the origin
    /// lies outside that slab; it never narrows the span.
    pub fn intersect(&self, ray: &Ray) -> Option<Interval> {
        if self.is_empty() {
            return None;
        }

        let inv = ray.inv_direction();
        let t1 = (self.min - ray.origin) * inv;
        let t2 = (self.max - ray.origin) * inv;

        let mut entry = f32::NEG_INFINITY;
        let mut exit = f32::INFINITY;
        for axis in 0..3 {
            if ray.direction[axis] == 0.0 {
                let o = ray.origin[axis];
                if o < self.min[axis] || o > self.max[axis] {
                    return None;
                }
                continue;
            }
            entry = entry.max(t1[axis].min(t2[axis]));
            exit = exit.min(t1[axis].max(t2[axis]));
        }

        if exit < 0.0 || entry > exit {
            return None;
        }
        Some(Interval::new(entry, exit))
    }

    /// Entry distance of the ray into the box, if it hits.
    #[inline]
    pub fn hit_distance(&self, ray: &Ray) -> Option<f32> {
        self.intersect(ray).map(|span| span.min)
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}
