//! Post-growth pass: surface normals and straightening of sharp kinks.

use crate::{
    skeleton::Skeleton,
    spatial_index::{Neighbor, SpatialIndex},
    types::NodeId,
};
use glam::Vec3;
use std::f32::consts::FRAC_1_SQRT_2;

/// Normal given to nodes with no nearby point and no usable parent normal.
pub const DEFAULT_NORMAL: Vec3 = Vec3::Y;

/// cos(45°). A child whose outgoing direction is below this against the
/// incoming one is re-parented.
pub const MIN_COS_ANGLE: f32 = FRAC_1_SQRT_2;

/// Tolerance under which a parent normal counts as unset.
const ZERO_NORMAL_EPS: f32 = 1e-3;

/// Assigns normals and straightens the skeleton after growth.
///
/// Every point is reactivated first, so normal lookups see the whole cloud
/// and not just what survived growth. Nodes are then visited once, in
/// ascending id order; each node gets its normal, then its children are
/// checked against the node's incoming direction.
///
/// ### Parameters
/// - `skeleton` - The converged skeleton.
/// - `index` - The index used during growth.
/// - `kill_radius` - Radius of the normal lookup.
///
/// ### Returns
/// The number of children re-parented.
pub fn finalize(skeleton: &mut Skeleton, index: &mut SpatialIndex, kill_radius: f32) -> usize {
    index.reactivate_all();

    let mut nearest = Vec::with_capacity(1);
    let mut moved = 0;
    let node_count = skeleton.len();
    for id in 0..node_count {
        assign_normal(skeleton, index, id, kill_radius, &mut nearest);
        moved += straighten_children(skeleton, id);
    }
    moved
}

/// Sets the normal of node `id`.
///
/// The nearest point within `radius` wins. Failing that the parent's
/// normal is inherited if it is set, and [`DEFAULT_NORMAL`] is the last
/// resort.
fn assign_normal(
    skeleton: &mut Skeleton,
    index: &SpatialIndex,
    id: NodeId,
    radius: f32,
    nearest: &mut Vec<Neighbor>,
) {
    let node = &skeleton.nodes[id];
    let normal = if index.query(node.pos, radius, 1, nearest) == 1 {
        index.all_points()[nearest[0].id].normal
    } else if let Some(parent) = node.parent
        && !skeleton.nodes[parent]
            .normal
            .abs_diff_eq(Vec3::ZERO, ZERO_NORMAL_EPS)
    {
        skeleton.nodes[parent].normal
    } else {
        DEFAULT_NORMAL
    };
    skeleton.nodes[id].normal = normal;
}

/// Runs one straightening sweep over the whole skeleton.
///
/// This is the same check [`finalize`] applies, without touching normals.
/// A single sweep can leave kinks behind in long chains, since a moved
/// child is not checked again against its new parent.
///
/// ### Returns
/// The number of children re-parented.
pub fn straighten_pass(skeleton: &mut Skeleton) -> usize {
    let mut moved = 0;
    for id in 0..skeleton.len() {
        moved += straighten_children(skeleton, id);
    }
    moved
}

/// Moves every child of `id` that turns by more than 45° onto `id`'s parent.
fn straighten_children(skeleton: &mut Skeleton, id: NodeId) -> usize {
    let Some(parent) = skeleton.nodes[id].parent else {
        return 0;
    };
    let pos = skeleton.nodes[id].pos;
    let Some(incoming) = (pos - skeleton.nodes[parent].pos).try_normalize() else {
        return 0;
    };

    let mut moved = 0;
    let mut slot = 0;
    while slot < skeleton.nodes[id].children.len() {
        let child = skeleton.nodes[id].children[slot];
        match (skeleton.nodes[child].pos - pos).try_normalize() {
            Some(outgoing) if incoming.dot(outgoing) < MIN_COS_ANGLE => {
                // The last child now fills `slot`, check it next.
                skeleton.reparent(id, slot, parent);
                moved += 1;
            }
            _ => slot += 1,
        }
    }
    moved
}
