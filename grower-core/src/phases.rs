//! The phases of one growth iteration.
//!
//! The growth loop looks like:
//! 1. [`claim_phase`] — every alive node queries the spatial index and
//!    offers itself as owner of the points it finds.
//! 2. [`alive_owners`] — the nodes owning at least one of those points
//!    become the alive set for this round.
//! 3. [`growth_phase`] — each alive node spawns one child toward the
//!    average direction of its points, unless that child already exists.
//! 4. [`kill_phase`] — points close to the new nodes are deactivated.
//!
//! Alive nodes are always processed in ascending [`NodeId`] order, and
//! index queries return points by ascending distance then ascending
//! [`PointId`]. Together these fix the claim tie-break, so a run is fully
//! reproducible.

use crate::{
    config::GrowthParameters,
    influence_buffer::InfluenceBuffer,
    skeleton::{DUPLICATE_EPSILON, Skeleton},
    spatial_index::{Neighbor, SpatialIndex},
    types::{NodeId, PointId},
};

/// Reusable buffers for the claim and kill queries.
#[derive(Debug, Default)]
pub struct ClaimScratch {
    /// Result buffer handed to [`SpatialIndex::query`].
    pub neighbors: Vec<Neighbor>,
    /// Points returned to any alive node this round, in first-seen order.
    pub affected: Vec<PointId>,
    /// Membership bits for `affected`, indexed by [`PointId`].
    seen: Vec<bool>,
}

impl ClaimScratch {
    pub fn new(point_count: usize, max_neighbors: usize) -> Self {
        Self {
            neighbors: Vec::with_capacity(max_neighbors),
            affected: Vec::with_capacity(max_neighbors),
            seen: vec![false; point_count],
        }
    }
}

/// What the growth phase did with the alive nodes.
#[derive(Debug, Default)]
pub struct GrowthRound {
    /// Alive nodes that spawned a child and stay alive.
    pub survivors: Vec<NodeId>,
    /// Children created this round, in creation order.
    pub new_ids: Vec<NodeId>,
    /// Nodes dropped because an existing child already sits at the target.
    pub duplicates: usize,
    /// Nodes dropped because their points gave no usable direction.
    pub stalled: usize,
}

/// Lets every alive node claim the active points within the search radius.
///
/// For each alive node, in the given order:
///
/// 1. Query up to `params.max_neighbors` active points within
///    `params.search_radius`.
/// 2. Add each returned point to `scratch.affected` if not already there.
/// 3. Offer the node as owner via
///    [`AttractionPoint::offer`](crate::attractor::AttractionPoint::offer):
///    unowned points are taken, owned points move only to a strictly
///    closer node.
///
/// Ownership is never reset between iterations. A point keeps its last
/// owner until a strictly closer alive node queries it.
///
/// ### Parameters
/// - `skeleton` - Current skeleton; only positions are read.
/// - `index` - Spatial index; owner fields of returned points are updated.
/// - `alive` - Alive nodes, in ascending id order.
/// - `params` - Provides the search radius and the neighbor cap.
/// - `scratch` - Reusable buffers; `affected` holds the result.
pub fn claim_phase(
    skeleton: &Skeleton,
    index: &mut SpatialIndex,
    alive: &[NodeId],
    params: &GrowthParameters,
    scratch: &mut ClaimScratch,
) {
    scratch.affected.clear();

    for &node in alive {
        let pos = skeleton.nodes[node].pos;
        index.query(
            pos,
            params.search_radius,
            params.max_neighbors,
            &mut scratch.neighbors,
        );

        for n in &scratch.neighbors {
            if !scratch.seen[n.id] {
                scratch.seen[n.id] = true;
                scratch.affected.push(n.id);
            }
            index.point_mut(n.id).offer(node, n.dist());
        }
    }

    // Leave the bitset clean for the next round.
    for &id in &scratch.affected {
        scratch.seen[id] = false;
    }
}

/// Collects the distinct owners of the affected points into `out`,
/// sorted by ascending id.
pub fn alive_owners(index: &SpatialIndex, affected: &[PointId], out: &mut Vec<NodeId>) {
    out.clear();
    let points = index.all_points();
    out.extend(affected.iter().filter_map(|&id| points[id].owner));
    out.sort_unstable();
    out.dedup();
}

/// Spawns one child per alive node toward the points it owns.
///
/// For each alive node:
///
/// 1. Sum the unit directions from the node to each affected point it
///    owns, skipping points that coincide with the node.
/// 2. If nothing usable remains, drop the node (stalled).
/// 3. Propose `pos + normalize(sum) * params.grow_step`.
/// 4. If an existing child lies within [`DUPLICATE_EPSILON`] of the
///    proposal, drop the node (duplicate).
/// 5. Otherwise append the child; the node survives.
///
/// ### Parameters
/// - `skeleton` - The skeleton to grow; children are appended.
/// - `index` - Spatial index holding the claimed points.
/// - `affected` - Points touched by [`claim_phase`] this round.
/// - `alive` - Nodes returned by [`alive_owners`].
/// - `params` - Provides the grow step.
/// - `acc` - Scratch direction buffer, resized and cleared here.
///
/// ### Returns
/// The surviving nodes, the new children, and the drop counts.
pub fn growth_phase(
    skeleton: &mut Skeleton,
    index: &SpatialIndex,
    affected: &[PointId],
    alive: &[NodeId],
    params: &GrowthParameters,
    acc: &mut InfluenceBuffer,
) -> GrowthRound {
    acc.ensure_len(skeleton.len());

    let points = index.all_points();
    for &id in affected {
        let p = &points[id];
        if let Some(owner) = p.owner {
            acc.add_toward(owner, skeleton.nodes[owner].pos, p.pos);
        }
    }

    let mut round = GrowthRound {
        survivors: Vec::with_capacity(alive.len()),
        new_ids: Vec::with_capacity(alive.len()),
        ..GrowthRound::default()
    };

    for &node in alive {
        let Some(dir) = acc.growth_dir(node) else {
            round.stalled += 1;
            continue;
        };

        let new_pos = skeleton.nodes[node].pos + dir * params.grow_step;

        // Same target as an existing child.
        if skeleton.has_child_near(node, new_pos, DUPLICATE_EPSILON) {
            round.duplicates += 1;
            continue;
        }

        round.survivors.push(node);
        round.new_ids.push(skeleton.add_child(node, new_pos));
    }

    round
}

/// Deactivates the points consumed by freshly spawned nodes.
///
/// Each new node deactivates up to `params.max_neighbors` active points
/// within `params.kill_radius`.
///
/// ### Returns
/// The number of points deactivated.
pub fn kill_phase(
    skeleton: &Skeleton,
    index: &mut SpatialIndex,
    new_ids: &[NodeId],
    params: &GrowthParameters,
    neighbors: &mut Vec<Neighbor>,
) -> usize {
    let mut killed = 0;
    for &node in new_ids {
        let found = index.query(
            skeleton.nodes[node].pos,
            params.kill_radius,
            params.max_neighbors,
            neighbors,
        );
        for n in neighbors.iter() {
            index.deactivate(n.id);
        }
        killed += found;
    }
    killed
}
