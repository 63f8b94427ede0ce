//! Helpers a host uses to prepare a growth call.
//!
//! Hosts expose radii and step as fractions of the point cloud size and
//! place the seed in world space. These functions bring both into the
//! points' own space before [`crate::grower::grow`] is called.

use crate::config::{GrowthParameters, RelativeParameters};
use glam::{Mat4, Vec3};

/// Largest side of the axis-aligned box around `points`, or `0.0` for an
/// empty slice.
pub fn max_extent(points: &[Vec3]) -> f32 {
    let Some(&first) = points.first() else {
        return 0.0;
    };
    let (lo, hi) = points
        .iter()
        .fold((first, first), |(lo, hi), &p| (lo.min(p), hi.max(p)));
    (hi - lo).max_element()
}

/// Carries a world-space seed into the points' local space.
pub fn seed_to_local(seed_world: Vec3, world_to_local: &Mat4) -> Vec3 {
    world_to_local.transform_point3(seed_world)
}

/// Resolves `relative` against the extent of `points`.
pub fn resolve_parameters(points: &[Vec3], relative: &RelativeParameters) -> GrowthParameters {
    relative.resolve(max_extent(points))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_extent_picks_widest_axis() {
        let points = [
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(3.0, 2.0, 0.5),
            Vec3::new(0.0, -1.0, 1.0),
        ];
        assert_eq!(max_extent(&points), 4.0);
        assert_eq!(max_extent(&[]), 0.0);
        assert_eq!(max_extent(&[Vec3::ONE]), 0.0);
    }

    #[test]
    fn seed_follows_world_to_local_transform() {
        let world_to_local = Mat4::from_translation(Vec3::new(-10.0, 0.0, 0.0))
            * Mat4::from_scale(Vec3::splat(2.0));

        let local = seed_to_local(Vec3::new(1.0, 1.0, 1.0), &world_to_local);
        assert_eq!(local, Vec3::new(-8.0, 2.0, 2.0));
    }

    #[test]
    fn resolve_parameters_uses_cloud_extent() {
        let points = [Vec3::ZERO, Vec3::new(0.0, 10.0, 0.0)];
        let p = resolve_parameters(&points, &RelativeParameters::default());

        assert_eq!(p.search_radius, 5.0);
        assert!((p.kill_radius - 0.1).abs() < 1e-6);
        assert!((p.grow_step - 0.1).abs() < 1e-6);
        assert_eq!(p.max_neighbors, 10);
    }
}
