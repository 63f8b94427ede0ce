/// Identifier for a node in a [`crate::skeleton::Skeleton`].
///
/// This is an index into `Skeleton::nodes`. Nodes are only ever appended,
/// so an id stays valid for the lifetime of the skeleton that issued it.
pub type NodeId = usize;

/// Identifier for an attraction point held by a
/// [`crate::spatial_index::SpatialIndex`].
///
/// This is the point's position in the input arrays.
pub type PointId = usize;
