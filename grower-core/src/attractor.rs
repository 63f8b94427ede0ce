use crate::types::NodeId;
use glam::Vec3;
use rand::Rng;

/// A single attraction point and its growth bookkeeping.
///
/// `owner` and `dist` are only meaningful together: `dist` is the distance
/// from the point to `owner` at the time the claim was made.
#[derive(Clone, Debug)]
pub struct AttractionPoint {
    pub pos: Vec3,
    pub normal: Vec3,
    pub active: bool,
    pub owner: Option<NodeId>,
    pub dist: f32,
}

impl AttractionPoint {
    pub fn new(pos: Vec3, normal: Vec3) -> Self {
        Self {
            pos,
            normal,
            active: true,
            owner: None,
            dist: f32::MAX,
        }
    }

    /// Records `node` as the owner if it is strictly closer than the
    /// current one.
    ///
    /// An unowned point is always claimed. A point already owned by `node`
    /// is left untouched, and on an exact distance tie the earlier owner
    /// keeps the point.
    ///
    /// ### Returns
    /// `true` if the owner changed.
    #[inline]
    pub fn offer(&mut self, node: NodeId, dist: f32) -> bool {
        match self.owner {
            None => {
                self.owner = Some(node);
                self.dist = dist;
                true
            }
            Some(current) if current != node && dist < self.dist => {
                self.owner = Some(node);
                self.dist = dist;
                true
            }
            Some(_) => false,
        }
    }
}

/// An input point cloud: positions and their surface normals, index aligned.
#[derive(Clone, Debug, Default)]
pub struct PointCloud {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
}

impl PointCloud {
    /// Builds a cloud whose normals all point up (`Vec3::Y`).
    pub fn from_positions(positions: Vec<Vec3>) -> Self {
        let normals = vec![Vec3::Y; positions.len()];
        Self { positions, normals }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Uniform samples inside an axis-aligned box centered on `center`.
    pub fn random_in_box(
        center: Vec3,
        half_extents: Vec3,
        count: usize,
        rng: &mut impl Rng,
    ) -> Self {
        let positions = (0..count)
            .map(|_| {
                let x = rng.random_range(-half_extents.x..=half_extents.x);
                let y = rng.random_range(-half_extents.y..=half_extents.y);
                let z = rng.random_range(-half_extents.z..=half_extents.z);
                center + Vec3::new(x, y, z)
            })
            .collect();

        Self::from_positions(positions)
    }

    /// Uniform samples inside a ball, by rejection from the enclosing cube.
    ///
    /// Each normal points away from `center`, which is what a host would
    /// get when sampling a volume bounded by a sphere.
    pub fn random_in_sphere(center: Vec3, radius: f32, count: usize, rng: &mut impl Rng) -> Self {
        let mut positions = Vec::with_capacity(count);
        let mut normals = Vec::with_capacity(count);

        while positions.len() < count {
            let offset = Vec3::new(
                rng.random_range(-1.0..=1.0),
                rng.random_range(-1.0..=1.0),
                rng.random_range(-1.0..=1.0),
            );
            if offset.length_squared() > 1.0 {
                continue;
            }
            positions.push(center + offset * radius);
            normals.push(offset.normalize_or(Vec3::Y));
        }

        Self { positions, normals }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn offer_claims_unowned_point() {
        let mut p = AttractionPoint::new(Vec3::X, Vec3::Y);
        assert!(p.offer(3, 2.0));
        assert_eq!(p.owner, Some(3));
        assert_eq!(p.dist, 2.0);
    }

    #[test]
    fn offer_keeps_earlier_owner_on_tie() {
        let mut p = AttractionPoint::new(Vec3::X, Vec3::Y);
        p.offer(1, 2.0);

        assert!(!p.offer(2, 2.0));
        assert_eq!(p.owner, Some(1));

        assert!(p.offer(2, 1.5));
        assert_eq!(p.owner, Some(2));
        assert_eq!(p.dist, 1.5);
    }

    #[test]
    fn offer_from_current_owner_is_ignored() {
        let mut p = AttractionPoint::new(Vec3::X, Vec3::Y);
        p.offer(1, 2.0);

        assert!(!p.offer(1, 0.5));
        assert_eq!(p.dist, 2.0);
    }

    #[test]
    fn random_in_sphere_stays_inside_radius() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let center = Vec3::new(1.0, 2.0, 3.0);
        let cloud = PointCloud::random_in_sphere(center, 5.0, 200, &mut rng);

        assert_eq!(cloud.len(), 200);
        assert_eq!(cloud.normals.len(), 200);
        for (p, n) in cloud.positions.iter().zip(&cloud.normals) {
            assert!(p.distance(center) <= 5.0 + 1e-4);
            assert!((n.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn random_in_box_respects_extents() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let half = Vec3::new(1.0, 2.0, 0.5);
        let cloud = PointCloud::random_in_box(Vec3::ZERO, half, 100, &mut rng);

        assert!(cloud.positions.iter().all(|p| p.abs().cmple(half).all()));
        assert!(cloud.normals.iter().all(|n| *n == Vec3::Y));
    }
}
