use crate::types::NodeId;
use glam::Vec3;

/// A scratch buffer that accumulates growth directions per node.
///
/// For each `NodeId`, this buffer stores:
///
/// - The sum of all unit directions toward the points the node owns.
/// - The number of contributions that were added.
///
/// It is sized to the skeleton at the start of every grow phase and
/// cleared there, so one buffer serves the whole run.
#[derive(Debug, Default)]
pub struct InfluenceBuffer {
    /// Accumulated direction vectors for each node.
    dir: Vec<Vec3>,
    /// Number of contributions for each node.
    count: Vec<u32>,
}

impl InfluenceBuffer {
    /// Creates a new [`InfluenceBuffer`] with the given length.
    ///
    /// ### Parameters
    /// - `len` - Number of nodes this buffer can store influences for.
    pub fn with_len(len: usize) -> Self {
        Self {
            dir: vec![Vec3::ZERO; len],
            count: vec![0; len],
        }
    }

    /// Resizes the buffer to `len` entries and clears every entry.
    ///
    /// ### Parameters
    /// - `len` - Desired length of the internal buffers.
    pub fn ensure_len(&mut self, len: usize) {
        if self.dir.len() != len {
            self.dir.resize(len, Vec3::ZERO);
            self.count.resize(len, 0);
        }
        self.clear();
    }

    /// Clears all accumulated influences, keeping the length.
    pub fn clear(&mut self) {
        self.dir.fill(Vec3::ZERO);
        self.count.fill(0);
    }

    pub fn len(&self) -> usize {
        self.dir.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dir.is_empty()
    }

    /// Adds the unit direction from `from` toward `to` for node `id`.
    ///
    /// Coincident positions have no direction and are skipped.
    ///
    /// ### Returns
    /// `true` if a contribution was recorded.
    ///
    /// ### Panics
    /// Panics if `id` is out of bounds for the internal arrays.
    #[inline]
    pub fn add_toward(&mut self, id: NodeId, from: Vec3, to: Vec3) -> bool {
        let dir = (to - from).normalize_or_zero();
        if dir == Vec3::ZERO {
            return false;
        }
        self.dir[id] += dir;
        self.count[id] += 1;
        true
    }

    /// Returns the average direction for a node, or `Vec3::ZERO` if it
    /// received no contribution.
    #[inline]
    pub fn avg_dir(&self, id: NodeId) -> Vec3 {
        let c = self.count[id];
        if c == 0 {
            Vec3::ZERO
        } else {
            self.dir[id] / (c as f32)
        }
    }

    /// Returns the normalized growth direction for a node.
    ///
    /// `None` if the node received no contribution, or if its contributions
    /// cancel out exactly.
    #[inline]
    pub fn growth_dir(&self, id: NodeId) -> Option<Vec3> {
        self.avg_dir(id).try_normalize()
    }

    #[cfg(test)]
    fn is_influenced(&self, id: NodeId) -> bool {
        self.count[id] > 0
    }

    #[cfg(test)]
    fn count(&self, id: NodeId) -> u32 {
        self.count[id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeId;
    use glam::Vec3;

    #[test]
    fn with_len_initializes_zeroed_state() {
        let buf = InfluenceBuffer::with_len(5);

        assert_eq!(buf.len(), 5);
        assert!(buf.dir.iter().all(|v| *v == Vec3::ZERO));
        assert!(buf.count.iter().all(|c| *c == 0));
    }

    #[test]
    fn ensure_len_resizes_and_clears() {
        let mut buf = InfluenceBuffer::with_len(2);
        buf.add_toward(0, Vec3::ZERO, Vec3::X);

        buf.ensure_len(4);
        assert_eq!(buf.len(), 4);
        assert!(!buf.is_influenced(0));

        buf.add_toward(3, Vec3::ZERO, Vec3::Y);
        buf.ensure_len(4);
        assert!(!buf.is_influenced(3));

        buf.ensure_len(1);
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.avg_dir(0), Vec3::ZERO);
    }

    #[test]
    fn add_toward_normalizes_each_contribution() {
        let mut buf = InfluenceBuffer::with_len(2);
        let id: NodeId = 1;

        assert!(buf.add_toward(id, Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0)));
        assert!(buf.add_toward(id, Vec3::ZERO, Vec3::new(0.0, 0.5, 0.0)));

        assert_eq!(buf.count(id), 2);
        assert_eq!(buf.avg_dir(id), Vec3::new(0.5, 0.5, 0.0));

        let dir = buf.growth_dir(id).unwrap();
        assert!((dir - Vec3::new(1.0, 1.0, 0.0).normalize()).length() < 1e-6);
    }

    #[test]
    fn coincident_points_do_not_contribute() {
        let mut buf = InfluenceBuffer::with_len(1);
        let p = Vec3::new(1.0, 2.0, 3.0);

        assert!(!buf.add_toward(0, p, p));
        assert!(!buf.is_influenced(0));
        assert_eq!(buf.growth_dir(0), None);
    }

    #[test]
    fn opposite_contributions_cancel_to_no_direction() {
        let mut buf = InfluenceBuffer::with_len(1);
        buf.add_toward(0, Vec3::ZERO, Vec3::X);
        buf.add_toward(0, Vec3::ZERO, Vec3::NEG_X);

        assert!(buf.is_influenced(0));
        assert_eq!(buf.growth_dir(0), None);
    }
}
