//! Bounding Volume Hierarchy (BVH) construction.
//!
//! Nodes live in a flat pool addressed by index; node 0 is the root and an
//! interior node's children sit at `left` and `left + 1`. Leaves reference a
//! contiguous slice of the BVH's own triangle-index permutation, so several
//! BVHs can index one shared triangle store.

use std::ops::Range;

use lumen_core::Triangle;
use lumen_math::Aabb;

use crate::config::{BvhConfig, SplitMethod};

/// Relative cost of visiting a node vs. intersecting one triangle.
const TRAVERSAL_COST: f32 = 1.0;
const INTERSECT_COST: f32 = 1.0;

/// A node of the pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BvhNode {
    /// Box around every vertex of every triangle below this node
    pub bounds: Aabb,
    /// First child index (interior nodes only)
    pub left: u32,
    /// Offset of the first primitive in the index array
    pub first: u32,
    /// Number of primitives in `first..first + count`
    pub count: u32,
    /// Axis the node was split along (interior nodes only)
    pub axis: u8,
    pub is_leaf: bool,
}

impl Default for BvhNode {
    fn default() -> Self {
        Self {
            bounds: Aabb::EMPTY,
            left: 0,
            first: 0,
            count: 0,
            axis: 0,
            is_leaf: true,
        }
    }
}

impl BvhNode {
    fn leaf(first: usize, count: usize, bounds: Aabb) -> Self {
        Self {
            bounds,
            first: first as u32,
            count: count as u32,
            ..Self::default()
        }
    }

    /// Range into [`Bvh::indices`] covered by this node.
    #[inline]
    pub fn primitives(&self) -> Range<usize> {
        self.first as usize..(self.first + self.count) as usize
    }

    /// Pool indices of both children, `None` for a leaf.
    #[inline]
    pub fn children(&self) -> Option<(usize, usize)> {
        (!self.is_leaf).then(|| (self.left as usize, self.left as usize + 1))
    }
}

/// Shape summary of a built tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BvhStats {
    pub nodes: usize,
    pub leaves: usize,
    pub max_depth: usize,
    pub max_leaf_size: usize,
}

/// Built hierarchy: node pool plus triangle-index permutation.
#[derive(Debug, Clone)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    indices: Vec<u32>,
}

/// Chosen split plane: primitives whose centroid on `axis` is `<= position`
/// go left.
#[derive(Debug, Clone, Copy)]
struct Split {
    axis: usize,
    position: f32,
}

impl Bvh {
    /// Build over every triangle of the store.
    pub fn build(triangles: &[Triangle], config: &BvhConfig) -> Self {
        Self::build_range(triangles, 0..triangles.len(), config)
    }

    /// Build over the contiguous range `range` of the triangle store.
    ///
    /// Leaves store indices into the full store, so hits report global
    /// triangle indices.
    pub fn build_range(triangles: &[Triangle], range: Range<usize>, config: &BvhConfig) -> Self {
        let n = range.len();
        let mut indices: Vec<u32> = range.map(|i| i as u32).collect();

        // A full binary tree over n leaves has 2n - 1 nodes. The empty
        // scene still gets its single (empty) root leaf.
        let capacity = (2 * n).saturating_sub(1).max(1);
        let mut nodes = vec![BvhNode::default(); capacity];
        nodes[0] = BvhNode::leaf(0, n, bounds_of(triangles, &indices));

        // Shared allocation cursor; the stack replaces recursion so
        // degenerate inputs cannot overflow the call stack.
        let mut next_free = 1;
        let mut stack = vec![0usize];

        while let Some(index) = stack.pop() {
            let node = nodes[index];
            let count = node.count as usize;
            if count < config.min_split_count || count < 2 {
                continue;
            }

            let primitives = &mut indices[node.primitives()];
            let Some(split) = choose_split(triangles, primitives, &node.bounds, config.split) else {
                continue;
            };

            let mid = partition(primitives, |&i| {
                triangles[i as usize].centroid()[split.axis] <= split.position
            });
            if mid == 0 || mid == count {
                // Every centroid fell on one side: keep the node a leaf.
                continue;
            }

            let first = node.first as usize;
            let left = next_free;
            next_free += 2;

            let (left_slice, right_slice) = primitives.split_at(mid);
            nodes[left] = BvhNode::leaf(first, mid, bounds_of(triangles, left_slice));
            nodes[left + 1] =
                BvhNode::leaf(first + mid, count - mid, bounds_of(triangles, right_slice));

            let parent = &mut nodes[index];
            parent.is_leaf = false;
            parent.left = left as u32;
            parent.axis = split.axis as u8;

            stack.push(left + 1);
            stack.push(left);
        }

        nodes.truncate(next_free);
        let bvh = Self { nodes, indices };

        let stats = bvh.stats();
        log::debug!(
            "BVH: {} triangles, {} nodes ({} leaves), depth {}, largest leaf {}",
            n,
            stats.nodes,
            stats.leaves,
            stats.max_depth,
            stats.max_leaf_size
        );
        bvh
    }

    #[inline]
    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    #[inline]
    pub fn root(&self) -> &BvhNode {
        &self.nodes[0]
    }

    /// Triangle-index permutation; leaves slice into it.
    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of primitives the tree was built over.
    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Walk the tree and summarise its shape.
    pub fn stats(&self) -> BvhStats {
        let mut stats = BvhStats {
            nodes: self.nodes.len(),
            ..BvhStats::default()
        };
        let mut stack = vec![(0usize, 1usize)];
        while let Some((index, depth)) = stack.pop() {
            let node = &self.nodes[index];
            stats.max_depth = stats.max_depth.max(depth);
            match node.children() {
                Some((left, right)) => {
                    stack.push((left, depth + 1));
                    stack.push((right, depth + 1));
                }
                None => {
                    stats.leaves += 1;
                    stats.max_leaf_size = stats.max_leaf_size.max(node.count as usize);
                }
            }
        }
        stats
    }
}

/// Box over all three vertices of every referenced triangle.
fn bounds_of(triangles: &[Triangle], indices: &[u32]) -> Aabb {
    indices.iter().fold(Aabb::EMPTY, |mut bbox, &i| {
        let tri = &triangles[i as usize];
        bbox.grow(tri.v0);
        bbox.grow(tri.v1);
        bbox.grow(tri.v2);
        bbox
    })
}

fn choose_split(
    triangles: &[Triangle],
    indices: &[u32],
    bounds: &Aabb,
    method: SplitMethod,
) -> Option<Split> {
    match method {
        SplitMethod::Midpoint => {
            let axis = bounds.longest_axis();
            Some(Split {
                axis,
                position: bounds.center(axis),
            })
        }
        SplitMethod::BinnedSah { bins } => sah_split(triangles, indices, bounds, bins.max(2)),
    }
}

/// One bucket of the SAH sweep.
#[derive(Clone, Copy)]
struct Bin {
    bounds: Aabb,
    count: usize,
}

/// Binned surface-area-heuristic split search across all three axes.
///
/// Returns `None` when no split beats keeping the node as a leaf, or when
/// every centroid coincides.
fn sah_split(
    triangles: &[Triangle],
    indices: &[u32],
    bounds: &Aabb,
    bin_count: usize,
) -> Option<Split> {
    let mut centroid_bounds = Aabb::EMPTY;
    for &i in indices {
        centroid_bounds.grow(triangles[i as usize].centroid());
    }

    let mut best: Option<(Split, f32)> = None;
    let mut bins = vec![Bin { bounds: Aabb::EMPTY, count: 0 }; bin_count];
    let mut left_area = vec![0.0f32; bin_count - 1];
    let mut left_count = vec![0usize; bin_count - 1];

    for axis in 0..3 {
        let lo = centroid_bounds.min[axis];
        let extent = centroid_bounds.max[axis] - lo;
        if extent <= f32::EPSILON {
            continue;
        }

        bins.fill(Bin { bounds: Aabb::EMPTY, count: 0 });
        let scale = bin_count as f32 / extent;
        for &i in indices {
            let tri = &triangles[i as usize];
            let slot = (((tri.centroid()[axis] - lo) * scale) as usize).min(bin_count - 1);
            bins[slot].bounds.grow_box(&tri.bounds());
            bins[slot].count += 1;
        }

        let mut sweep = Aabb::EMPTY;
        let mut swept = 0;
        for i in 0..bin_count - 1 {
            sweep.grow_box(&bins[i].bounds);
            swept += bins[i].count;
            left_area[i] = sweep.area();
            left_count[i] = swept;
        }

        sweep = Aabb::EMPTY;
        swept = 0;
        for i in (1..bin_count).rev() {
            sweep.grow_box(&bins[i].bounds);
            swept += bins[i].count;
            if left_count[i - 1] == 0 || swept == 0 {
                continue;
            }
            let cost = TRAVERSAL_COST
                + INTERSECT_COST
                    * (left_count[i - 1] as f32 * left_area[i - 1] + swept as f32 * sweep.area());
            if best.map_or(true, |(_, c)| cost < c) {
                // Boundary between bins i - 1 and i.
                let position = lo + extent * (i as f32 / bin_count as f32);
                best = Some((Split { axis, position }, cost));
            }
        }
    }

    let leaf_cost = INTERSECT_COST * indices.len() as f32 * bounds.area();
    best.filter(|&(_, cost)| cost < leaf_cost).map(|(split, _)| split)
}

/// In-place partition, returning how many elements satisfy `pred` (they end
/// up at the front).
fn partition<T, F>(slice: &mut [T], pred: F) -> usize
where
    F: Fn(&T) -> bool,
{
    let mut left = 0;
    let mut right = slice.len();
    while left < right {
        if pred(&slice[left]) {
            left += 1;
        } else {
            right -= 1;
            slice.swap(left, right);
        }
    }
    left
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_math::Vec3A;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn make_tri(cx: f32, cy: f32, cz: f32) -> Triangle {
        Triangle::new(
            Vec3A::new(cx - 0.5, cy - 0.5, cz),
            Vec3A::new(cx + 0.5, cy - 0.5, cz),
            Vec3A::new(cx, cy + 0.5, cz),
            0,
        )
    }

    fn random_soup(count: usize, seed: u64) -> Vec<Triangle> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count)
            .map(|_| {
                let base = Vec3A::new(
                    rng.gen_range(-20.0..20.0),
                    rng.gen_range(-20.0..20.0),
                    rng.gen_range(-20.0..20.0),
                );
                let mut jitter = || {
                    Vec3A::new(
                        rng.gen_range(-1.0..1.0),
                        rng.gen_range(-1.0..1.0),
                        rng.gen_range(-1.0..1.0),
                    )
                };
                Triangle::new(base, base + jitter(), base + jitter(), 0)
            })
            .collect()
    }

    fn leaves(bvh: &Bvh) -> Vec<&BvhNode> {
        let mut out = Vec::new();
        let mut stack = vec![0usize];
        while let Some(index) = stack.pop() {
            let node = &bvh.nodes()[index];
            match node.children() {
                Some((l, r)) => {
                    stack.push(l);
                    stack.push(r);
                }
                None => out.push(node),
            }
        }
        out
    }

    fn assert_coverage(bvh: &Bvh, range: Range<usize>) {
        let mut seen = vec![0u32; bvh.len()];
        for leaf in leaves(bvh) {
            for slot in leaf.primitives() {
                seen[slot] += 1;
            }
        }
        assert!(seen.iter().all(|&c| c == 1), "every slot covered exactly once");

        let mut sorted = bvh.indices().to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, range.map(|i| i as u32).collect::<Vec<_>>());
    }

    fn contains_point(outer: &Aabb, point: Vec3A) -> bool {
        outer.min.cmple(point).all() && point.cmple(outer.max).all()
    }

    fn contains_box(outer: &Aabb, inner: &Aabb) -> bool {
        inner.is_empty() || (contains_point(outer, inner.min) && contains_point(outer, inner.max))
    }

    fn assert_containment(bvh: &Bvh, triangles: &[Triangle]) {
        for node in bvh.nodes() {
            match node.children() {
                Some((l, r)) => {
                    assert!(contains_box(&node.bounds, &bvh.nodes()[l].bounds));
                    assert!(contains_box(&node.bounds, &bvh.nodes()[r].bounds));
                }
                None => {
                    for &i in &bvh.indices()[node.primitives()] {
                        let tri = &triangles[i as usize];
                        for v in [tri.v0, tri.v1, tri.v2] {
                            assert!(contains_point(&node.bounds, v));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_empty_bvh_is_single_empty_leaf() {
        let bvh = Bvh::build(&[], &BvhConfig::default());

        assert_eq!(bvh.nodes().len(), 1);
        assert!(bvh.root().is_leaf);
        assert_eq!(bvh.root().count, 0);
        assert!(bvh.root().bounds.is_empty());
        assert!(bvh.is_empty());
    }

    #[test]
    fn test_small_node_stays_leaf() {
        let tris: Vec<Triangle> = (0..4).map(|i| make_tri(i as f32 * 3.0, 0.0, 0.0)).collect();
        let bvh = Bvh::build(&tris, &BvhConfig::default());

        assert_eq!(bvh.nodes().len(), 1);
        assert!(bvh.root().is_leaf);
        assert_eq!(bvh.root().count, 4);
    }

    #[test]
    fn test_many_triangles_builds_tree() {
        let tris: Vec<Triangle> = (0..100).map(|i| make_tri(i as f32 * 2.0, 0.0, 0.0)).collect();
        let bvh = Bvh::build(&tris, &BvhConfig::default());

        assert!(!bvh.root().is_leaf);
        assert_eq!(bvh.root().axis, 0);
        assert!(bvh.nodes().len() <= 2 * tris.len() - 1);
        assert!(bvh.root().bounds.min.x < 0.0);
        assert!(bvh.root().bounds.max.x > 198.0);
        assert_coverage(&bvh, 0..100);
        assert_containment(&bvh, &tris);
        assert!(bvh.stats().max_leaf_size < 5);
    }

    #[test]
    fn test_coincident_centroids_terminate() {
        // Identical triangles can never be separated by a plane.
        let tris = vec![make_tri(1.0, 1.0, 1.0); 50];
        let bvh = Bvh::build(&tris, &BvhConfig::default());

        assert_eq!(bvh.nodes().len(), 1);
        assert_eq!(bvh.root().count, 50);
        assert_coverage(&bvh, 0..50);
    }

    #[test]
    fn test_random_soup_invariants_both_split_methods() {
        let tris = random_soup(500, 11);
        for split in [SplitMethod::Midpoint, SplitMethod::BinnedSah { bins: 16 }] {
            let config = BvhConfig { split, ..BvhConfig::default() };
            let bvh = Bvh::build(&tris, &config);

            assert!(bvh.nodes().len() <= 2 * tris.len() - 1);
            assert_coverage(&bvh, 0..tris.len());
            assert_containment(&bvh, &tris);
        }
    }

    #[test]
    fn test_interior_box_is_union_of_children() {
        let tris = random_soup(200, 3);
        let bvh = Bvh::build(&tris, &BvhConfig::default());

        for node in bvh.nodes() {
            if let Some((l, r)) = node.children() {
                let mut union = bvh.nodes()[l].bounds;
                union.grow_box(&bvh.nodes()[r].bounds);
                assert_eq!(node.bounds, union);
            }
        }
    }

    #[test]
    fn test_build_range_indexes_global_store() {
        let tris = random_soup(300, 5);
        let bvh = Bvh::build_range(&tris, 100..250, &BvhConfig::default());

        assert_eq!(bvh.len(), 150);
        assert_coverage(&bvh, 100..250);
        assert_containment(&bvh, &tris);
    }

    #[test]
    fn test_partition_moves_matches_to_front() {
        let mut values = [5, 1, 8, 2, 9, 3];
        let mid = partition(&mut values, |&v| v <= 3);

        assert_eq!(mid, 3);
        assert!(values[..mid].iter().all(|&v| v <= 3));
        assert!(values[mid..].iter().all(|&v| v > 3));
    }
}
