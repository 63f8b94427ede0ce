//! The growth engine: runs the iteration phases until no node can grow,
//! then finalizes the skeleton.

use crate::{
    config::GrowthParameters,
    error::GrowError,
    finalize::finalize,
    influence_buffer::InfluenceBuffer,
    phases::{self, ClaimScratch},
    skeleton::Skeleton,
    spatial_index::SpatialIndex,
    types::NodeId,
};
use glam::Vec3;

/// Lifecycle of a growth run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrowthState {
    /// Root placed, no iteration run yet.
    Seeded,
    /// At least one iteration ran and some node may still grow.
    Growing,
    /// No node is eligible to grow.
    Converged,
}

/// Counters collected over a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GrowthStats {
    /// Claim passes executed, including the final empty one.
    pub iterations: usize,
    /// Iterations that spawned at least one node.
    pub productive_iterations: usize,
    pub nodes_spawned: usize,
    /// Alive nodes dropped because their child already existed.
    pub duplicates_suppressed: usize,
    /// Alive nodes dropped because their points gave no direction.
    pub stalled: usize,
    pub points_killed: usize,
    /// Children moved onto their grandparent by finalization.
    pub reparented: usize,
}

/// An attraction point as it stood when growth converged.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointSnapshot {
    pub pos: Vec3,
    pub active: bool,
}

/// Result of [`grow`].
#[derive(Clone, Debug)]
pub struct GrowthOutput {
    pub skeleton: Skeleton,
    pub stats: GrowthStats,
}

/// Owns every piece of state of one run.
#[derive(Debug)]
pub(crate) struct Grower {
    params: GrowthParameters,
    index: SpatialIndex,
    skeleton: Skeleton,
    state: GrowthState,
    alive: Vec<NodeId>,
    scratch: ClaimScratch,
    acc: InfluenceBuffer,
    stats: GrowthStats,
}

impl Grower {
    /// Places the root at `seed` and builds the spatial index.
    ///
    /// With no points the run is converged from the start.
    pub(crate) fn new(
        points: &[Vec3],
        normals: &[Vec3],
        seed: Vec3,
        params: GrowthParameters,
    ) -> Result<Self, GrowError> {
        params.validate()?;

        let index = SpatialIndex::build(points, normals);
        let (state, alive) = if index.is_empty() {
            log::debug!("[GROW] no attraction points, skipping growth");
            (GrowthState::Converged, Vec::new())
        } else {
            (GrowthState::Seeded, vec![0])
        };

        Ok(Self {
            scratch: ClaimScratch::new(index.len(), params.max_neighbors),
            skeleton: Skeleton::new(seed),
            acc: InfluenceBuffer::with_len(1),
            stats: GrowthStats::default(),
            params,
            index,
            state,
            alive,
        })
    }

    pub(crate) fn state(&self) -> GrowthState {
        self.state
    }

    /// Runs one claim / grow / kill iteration.
    ///
    /// Does nothing once converged.
    pub(crate) fn step(&mut self) -> GrowthState {
        if self.state == GrowthState::Converged {
            return self.state;
        }

        phases::claim_phase(
            &self.skeleton,
            &mut self.index,
            &self.alive,
            &self.params,
            &mut self.scratch,
        );
        phases::alive_owners(&self.index, &self.scratch.affected, &mut self.alive);

        let round = phases::growth_phase(
            &mut self.skeleton,
            &self.index,
            &self.scratch.affected,
            &self.alive,
            &self.params,
            &mut self.acc,
        );
        let killed = phases::kill_phase(
            &self.skeleton,
            &mut self.index,
            &round.new_ids,
            &self.params,
            &mut self.scratch.neighbors,
        );

        self.stats.iterations += 1;
        if !round.new_ids.is_empty() {
            self.stats.productive_iterations += 1;
        }
        self.stats.nodes_spawned += round.new_ids.len();
        self.stats.duplicates_suppressed += round.duplicates;
        self.stats.stalled += round.stalled;
        self.stats.points_killed += killed;

        log::debug!(
            "[GROW] iteration {}: affected={} alive={} spawned={} duplicates={} \
             stalled={} killed={}",
            self.stats.iterations,
            self.scratch.affected.len(),
            self.alive.len(),
            round.new_ids.len(),
            round.duplicates,
            round.stalled,
            killed
        );

        // Survivors are sorted and every new id is larger, so the next
        // alive set stays in ascending order.
        self.alive.clear();
        self.alive.extend_from_slice(&round.survivors);
        self.alive.extend_from_slice(&round.new_ids);

        self.state = if self.alive.is_empty() {
            GrowthState::Converged
        } else {
            GrowthState::Growing
        };
        self.state
    }

    /// Iterates to convergence, then finalizes.
    ///
    /// If `diagnostics` is given it is overwritten with every attraction
    /// point and its active flag at convergence, before finalization
    /// reactivates them.
    pub(crate) fn run(mut self, diagnostics: Option<&mut Vec<PointSnapshot>>) -> GrowthOutput {
        while self.state() != GrowthState::Converged {
            self.step();
        }
        self.finish(diagnostics)
    }

    fn finish(mut self, diagnostics: Option<&mut Vec<PointSnapshot>>) -> GrowthOutput {
        if let Some(out) = diagnostics {
            out.clear();
            out.extend(self.index.all_points().iter().map(|p| PointSnapshot {
                pos: p.pos,
                active: p.active,
            }));
        }

        let remaining = self.index.active_count();
        self.stats.reparented = finalize(
            &mut self.skeleton,
            &mut self.index,
            self.params.kill_radius,
        );

        log::info!(
            "[GROW] converged after {} iterations: {} nodes, {} of {} points consumed, \
             {} re-parented",
            self.stats.iterations,
            self.skeleton.len(),
            self.index.len() - remaining,
            self.index.len(),
            self.stats.reparented
        );

        GrowthOutput {
            skeleton: self.skeleton,
            stats: self.stats,
        }
    }
}

/// Grows a skeleton from `seed` toward the attraction points.
///
/// `points` and `normals` are index aligned and in the same space as
/// `seed` and the lengths in `params`. The call runs to convergence;
/// there is no iteration cap, so `params.grow_step` and
/// `params.kill_radius` must be positive for it to terminate.
///
/// ### Returns
/// - `Ok(GrowthOutput)` whose skeleton has the root at index 0. With no
///   points, the skeleton is the root alone with an up normal.
/// - `Err(GrowError::InvalidMaxNeighbors)` if `params.max_neighbors == 0`.
///
/// ### Panics
/// Panics if `points` and `normals` differ in length.
pub fn grow(
    points: &[Vec3],
    normals: &[Vec3],
    seed: Vec3,
    params: GrowthParameters,
) -> Result<GrowthOutput, GrowError> {
    grow_with_diagnostics(points, normals, seed, params, None)
}

/// Same as [`grow`], optionally filling `diagnostics` with the final
/// active state of every attraction point.
pub fn grow_with_diagnostics(
    points: &[Vec3],
    normals: &[Vec3],
    seed: Vec3,
    params: GrowthParameters,
    diagnostics: Option<&mut Vec<PointSnapshot>>,
) -> Result<GrowthOutput, GrowError> {
    Ok(Grower::new(points, normals, seed, params)?.run(diagnostics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attractor::PointCloud;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn params(
        search_radius: f32,
        kill_radius: f32,
        grow_step: f32,
        max_neighbors: usize,
    ) -> GrowthParameters {
        GrowthParameters {
            search_radius,
            kill_radius,
            grow_step,
            max_neighbors,
        }
    }

    #[test]
    fn empty_points_converge_immediately() {
        let grower = Grower::new(&[], &[], Vec3::ONE, params(1.0, 0.1, 0.1, 4)).unwrap();
        assert_eq!(grower.state(), GrowthState::Converged);

        let out = grower.run(None);
        assert_eq!(out.skeleton.len(), 1);
        assert_eq!(out.stats.iterations, 0);
    }

    #[test]
    fn state_moves_from_seeded_through_growing_to_converged() {
        let points = [Vec3::new(1.0, 0.0, 0.0)];
        let mut grower =
            Grower::new(&points, &[Vec3::Y], Vec3::ZERO, params(2.0, 1.5, 0.5, 4)).unwrap();
        assert_eq!(grower.state(), GrowthState::Seeded);

        assert_eq!(grower.step(), GrowthState::Growing);
        assert_eq!(grower.step(), GrowthState::Converged);
        assert_eq!(grower.step(), GrowthState::Converged);
        assert_eq!(grower.stats.iterations, 2);
        assert_eq!(grower.stats.productive_iterations, 1);
    }

    #[test]
    fn diagnostics_capture_state_before_reactivation() {
        let points = [Vec3::new(1.0, 0.0, 0.0), Vec3::new(50.0, 0.0, 0.0)];
        let mut snapshot = Vec::new();

        let out = grow_with_diagnostics(
            &points,
            &[Vec3::Y; 2],
            Vec3::ZERO,
            params(2.0, 1.5, 0.5, 4),
            Some(&mut snapshot),
        )
        .unwrap();

        assert_eq!(out.skeleton.len(), 2);
        assert_eq!(snapshot.len(), 2);
        assert!(!snapshot[0].active);
        assert!(snapshot[1].active);
        assert_eq!(snapshot[1].pos, points[1]);
    }

    #[test]
    fn random_clouds_terminate_within_point_count() {
        // The cutoff holds because grow_step is on the order of the point
        // spacing; a step much smaller than kill_radius needs many more
        // iterations per consumed point.
        for seed in 0..12u64 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let cloud = PointCloud::random_in_sphere(Vec3::new(0.0, 5.0, 0.0), 4.0, 300, &mut rng);
            let p = params(3.0, 0.3, 0.2, 8);

            let mut grower = Grower::new(&cloud.positions, &cloud.normals, Vec3::ZERO, p).unwrap();
            let cutoff = cloud.len() + 1;
            let mut iterations = 0;
            while grower.step() != GrowthState::Converged {
                iterations += 1;
                assert!(
                    iterations <= cutoff,
                    "seed {seed}: no convergence after {cutoff} iterations"
                );
            }

            let out = grower.run(None);
            assert_eq!(out.skeleton.root().parent, None);
            for id in 0..out.skeleton.len() {
                assert!(out.skeleton.depth(id).is_some(), "seed {seed}: node {id} cut off");
            }
        }
    }

    #[test]
    fn each_child_appears_once_under_its_parent() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let cloud =
            PointCloud::random_in_box(Vec3::new(0.0, 3.0, 0.0), Vec3::splat(2.0), 400, &mut rng);

        let p = params(2.0, 0.2, 0.15, 10);
        let out = grow(&cloud.positions, &cloud.normals, Vec3::ZERO, p).unwrap();
        let sk = &out.skeleton;

        for (id, node) in sk.nodes.iter().enumerate().skip(1) {
            let parent = node.parent.expect("non-root node without parent");
            let hits = sk.nodes[parent].children.iter().filter(|&&c| c == id).count();
            assert_eq!(hits, 1, "node {id} listed {hits} times under {parent}");
        }
        let listed: usize = sk.nodes.iter().map(|n| n.children.len()).sum();
        assert_eq!(listed, sk.len() - 1);
    }
}
