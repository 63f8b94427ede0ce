//! Error types for skeleton growth.

/// Errors that reject a growth call before any work is done.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GrowError {
    /// `max_neighbors` must allow at least one neighbor per query.
    #[error("max_neighbors must be positive, got {0}")]
    InvalidMaxNeighbors(usize),
}
