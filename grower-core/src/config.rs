use crate::error::GrowError;
use serde::{Deserialize, Serialize};

/// Absolute growth parameters, expressed in the same units as the
/// attraction points.
///
/// - `search_radius` - How far an alive node looks for attraction points.
/// - `kill_radius` - How close a new node must be to consume a point.
/// - `grow_step` - Length of every new segment.
/// - `max_neighbors` - Cap on the points returned by any single query.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GrowthParameters {
    pub search_radius: f32,
    pub kill_radius: f32,
    pub grow_step: f32,
    pub max_neighbors: usize,
}

impl GrowthParameters {
    /// Checks the parameters before a run.
    ///
    /// Only `max_neighbors` is rejected. Non-positive lengths are a caller
    /// precondition: growth with `grow_step <= 0` or `kill_radius <= 0` may
    /// never converge, so they are reported through `log::warn!` but still
    /// accepted.
    ///
    /// ### Returns
    /// - `Ok(())` if a run may start.
    /// - `Err(GrowError::InvalidMaxNeighbors)` if `max_neighbors == 0`.
    pub fn validate(&self) -> Result<(), GrowError> {
        if self.max_neighbors == 0 {
            return Err(GrowError::InvalidMaxNeighbors(self.max_neighbors));
        }
        if self.grow_step <= 0.0 || self.kill_radius <= 0.0 {
            log::warn!(
                "[GROW] degenerate parameters: grow_step={} kill_radius={}, \
                 growth may not terminate",
                self.grow_step,
                self.kill_radius
            );
        }
        Ok(())
    }
}

/// Growth parameters given as fractions of the point cloud's largest
/// bounding-box side.
///
/// This is how a host usually exposes the settings, since the same
/// fractions then work for clouds of any scale. [`RelativeParameters::resolve`]
/// turns them into [`GrowthParameters`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelativeParameters {
    pub search_radius: f32,
    pub kill_radius: f32,
    pub grow_step: f32,
    pub max_neighbors: usize,
}

impl Default for RelativeParameters {
    fn default() -> Self {
        Self {
            search_radius: 0.5,
            kill_radius: 0.01,
            grow_step: 0.01,
            max_neighbors: 10,
        }
    }
}

impl RelativeParameters {
    /// Scales the relative lengths by `extent`.
    ///
    /// `max_neighbors` is copied unchanged.
    pub fn resolve(&self, extent: f32) -> GrowthParameters {
        GrowthParameters {
            search_radius: self.search_radius * extent,
            kill_radius: self.kill_radius * extent,
            grow_step: self.grow_step * extent,
            max_neighbors: self.max_neighbors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(max_neighbors: usize) -> GrowthParameters {
        GrowthParameters {
            search_radius: 1.0,
            kill_radius: 0.1,
            grow_step: 0.1,
            max_neighbors,
        }
    }

    #[test]
    fn validate_rejects_zero_max_neighbors() {
        assert_eq!(
            params(0).validate(),
            Err(GrowError::InvalidMaxNeighbors(0))
        );
    }

    #[test]
    fn validate_accepts_degenerate_lengths() {
        let mut p = params(4);
        p.grow_step = 0.0;
        p.kill_radius = -1.0;
        assert!(p.validate().is_ok());
    }

    #[test]
    fn resolve_scales_lengths_only() {
        let rel = RelativeParameters::default();
        let abs = rel.resolve(200.0);

        assert_eq!(abs.search_radius, 100.0);
        assert_eq!(abs.kill_radius, 2.0);
        assert_eq!(abs.grow_step, 2.0);
        assert_eq!(abs.max_neighbors, 10);
    }

    #[test]
    fn relative_parameters_fill_missing_fields_from_defaults() {
        let rel: RelativeParameters =
            serde_json::from_str(r#"{ "max_neighbors": 32 }"#).unwrap();

        assert_eq!(rel.max_neighbors, 32);
        assert_eq!(rel.search_radius, 0.5);
        assert_eq!(rel.grow_step, 0.01);
    }
}
