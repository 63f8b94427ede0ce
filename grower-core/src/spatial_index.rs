//! Static kd-tree over the attraction points.
//!
//! The tree layout is fixed at build time. Growth only toggles the `active`
//! flag of individual points, and queries skip inactive points, so nothing
//! is ever rebuilt during a run.

use crate::{attractor::AttractionPoint, types::PointId};
use glam::Vec3;
use std::cmp::Ordering;

/// Points per leaf bucket.
const LEAF_SIZE: usize = 16;

/// Marks a leaf in `KdNode::left`.
const LEAF: u32 = u32::MAX;

#[derive(Clone, Copy, Debug)]
struct KdNode {
    min: Vec3,
    max: Vec3,
    left: u32,
    right: u32,
    // Leaf data: order[start..end]
    start: u32,
    end: u32,
    split: f32,
    axis: u8,
}

impl KdNode {
    /// Squared distance from `p` to this node's bounding box.
    #[inline]
    fn box_dist2(&self, p: Vec3) -> f32 {
        let d = (self.min - p).max(Vec3::ZERO).max(p - self.max);
        d.length_squared()
    }
}

/// One query result.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    pub id: PointId,
    pub dist2: f32,
}

impl Neighbor {
    #[inline]
    pub fn dist(&self) -> f32 {
        self.dist2.sqrt()
    }

    /// Ascending distance, then ascending point index.
    #[inline]
    fn cmp_key(&self, other: &Neighbor) -> Ordering {
        self.dist2
            .total_cmp(&other.dist2)
            .then(self.id.cmp(&other.id))
    }
}

/// Nearest-neighbor index over a fixed set of attraction points.
#[derive(Debug, Default)]
pub struct SpatialIndex {
    points: Vec<AttractionPoint>,
    nodes: Vec<KdNode>,
    order: Vec<PointId>,
}

impl SpatialIndex {
    /// Builds a balanced kd-tree over `positions`.
    ///
    /// Every point starts active and unowned. An empty `positions` slice
    /// gives an empty index; see [`SpatialIndex::is_empty`].
    ///
    /// ### Panics
    /// Panics if `positions` and `normals` differ in length.
    pub fn build(positions: &[Vec3], normals: &[Vec3]) -> Self {
        assert_eq!(
            positions.len(),
            normals.len(),
            "points and normals must be index aligned"
        );

        let points: Vec<AttractionPoint> = positions
            .iter()
            .zip(normals)
            .map(|(&pos, &normal)| AttractionPoint::new(pos, normal))
            .collect();

        let mut index = Self {
            order: (0..points.len()).collect(),
            nodes: Vec::new(),
            points,
        };

        if !index.points.is_empty() {
            // A balanced tree has roughly 2 * N / LEAF_SIZE nodes.
            index.nodes.reserve(2 * index.points.len() / LEAF_SIZE + 1);
            index.build_recursive(0, index.points.len());
        }
        index
    }

    fn build_recursive(&mut self, start: usize, end: usize) -> u32 {
        let count = end - start;

        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for &id in &self.order[start..end] {
            let p = self.points[id].pos;
            min = min.min(p);
            max = max.max(p);
        }

        if count <= LEAF_SIZE {
            let node_idx = self.nodes.len() as u32;
            self.nodes.push(KdNode {
                min,
                max,
                left: LEAF,
                right: LEAF,
                start: start as u32,
                end: end as u32,
                split: 0.0,
                axis: 0,
            });
            return node_idx;
        }

        // Split the widest axis at the median.
        let extent = max - min;
        let axis = if extent.x >= extent.y && extent.x >= extent.z {
            0
        } else if extent.y >= extent.z {
            1
        } else {
            2
        };

        let mid = start + count / 2;
        let points = &self.points;
        self.order[start..end].select_nth_unstable_by(count / 2, |&a, &b| {
            points[a].pos[axis]
                .total_cmp(&points[b].pos[axis])
                .then(a.cmp(&b))
        });
        let split = self.points[self.order[mid]].pos[axis];

        let left = self.build_recursive(start, mid);
        let right = self.build_recursive(mid, end);

        let node_idx = self.nodes.len() as u32;
        self.nodes.push(KdNode {
            min,
            max,
            left,
            right,
            start: 0,
            end: 0,
            split,
            axis: axis as u8,
        });
        node_idx
    }

    /// Returns `true` if the index holds no points.
    ///
    /// The growth engine treats an empty index as "nothing to grow toward".
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Collects up to `limit` active points within `radius` of `pos`.
    ///
    /// `out` is cleared and refilled, sorted by ascending distance with ties
    /// broken by ascending point index. Callers keep one buffer alive across
    /// queries so its capacity is reused.
    ///
    /// ### Returns
    /// The number of neighbors written to `out`.
    pub fn query(&self, pos: Vec3, radius: f32, limit: usize, out: &mut Vec<Neighbor>) -> usize {
        out.clear();
        if self.nodes.is_empty() || limit == 0 || radius < 0.0 {
            return 0;
        }

        let mut search = Search {
            pos,
            radius2: radius * radius,
            limit,
            out,
        };
        // Root is the last node pushed in the recursive build.
        self.query_recursive(self.nodes.len() as u32 - 1, &mut search);
        search.out.len()
    }

    fn query_recursive(&self, node_idx: u32, search: &mut Search<'_>) {
        let node = &self.nodes[node_idx as usize];

        // Strict comparison: a box at exactly the bound may still hold a
        // point that wins the index tie-break.
        if node.box_dist2(search.pos) > search.bound() {
            return;
        }

        if node.left == LEAF {
            for &id in &self.order[node.start as usize..node.end as usize] {
                let p = &self.points[id];
                if !p.active {
                    continue;
                }
                let dist2 = (p.pos - search.pos).length_squared();
                if dist2 <= search.radius2 {
                    search.offer(Neighbor { id, dist2 });
                }
            }
            return;
        }

        let diff = search.pos[node.axis as usize] - node.split;
        let (first, second) = if diff <= 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        self.query_recursive(first, search);
        self.query_recursive(second, search);
    }

    /// Marks a point unavailable to future queries. Idempotent.
    #[inline]
    pub fn deactivate(&mut self, id: PointId) {
        self.points[id].active = false;
    }

    /// Makes every point visible to queries again.
    pub fn reactivate_all(&mut self) {
        for p in &mut self.points {
            p.active = true;
        }
    }

    /// The full backing array, indexed by [`PointId`].
    pub fn all_points(&self) -> &[AttractionPoint] {
        &self.points
    }

    #[inline]
    pub fn point_mut(&mut self, id: PointId) -> &mut AttractionPoint {
        &mut self.points[id]
    }

    pub fn active_count(&self) -> usize {
        self.points.iter().filter(|p| p.active).count()
    }
}

/// State of one bounded query.
struct Search<'a> {
    pos: Vec3,
    radius2: f32,
    limit: usize,
    out: &'a mut Vec<Neighbor>,
}

impl Search<'_> {
    /// Squared distance beyond which nothing can enter the result.
    #[inline]
    fn bound(&self) -> f32 {
        if self.out.len() < self.limit {
            self.radius2
        } else {
            self.out.last().map_or(self.radius2, |n| n.dist2)
        }
    }

    /// Inserts `n` in sorted position, evicting the worst entry when full.
    fn offer(&mut self, n: Neighbor) {
        if self.out.len() == self.limit {
            match self.out.last() {
                Some(worst) if n.cmp_key(worst) == Ordering::Less => {
                    self.out.pop();
                }
                _ => return,
            }
        }
        let at = self
            .out
            .partition_point(|e| e.cmp_key(&n) == Ordering::Less);
        self.out.insert(at, n);
    }
}
