//! Core 3-D space-colonization skeleton growth library.
//!
//! Main components:
//! - [`spatial_index`] — kd-tree over attraction points with active flags.
//! - [`phases`] — claim, grow and kill phases of one iteration.
//! - [`grower`] — the growth loop and the [`grow`] entry point.
//! - [`finalize`] — normal assignment and straightening of sharp turns.
//! - [`skeleton`] — the node arena produced by growth.
//! - [`attractor`] — attraction points and point cloud generators.
//! - [`influence_buffer`] — per-node accumulation of growth directions.
//! - [`config`] — absolute and relative growth parameters.
//! - [`input`] — extent scaling and seed transform for hosts.
//! - [`error`] — errors rejected at entry.
//! - [`types`] — shared id aliases.

pub mod attractor;
pub mod config;
pub mod error;
pub mod finalize;
pub mod grower;
pub mod influence_buffer;
pub mod input;
pub mod phases;
pub mod skeleton;
pub mod spatial_index;
pub mod types;

pub use config::{GrowthParameters, RelativeParameters};
pub use error::GrowError;
pub use grower::{GrowthOutput, GrowthStats, PointSnapshot, grow, grow_with_diagnostics};
pub use skeleton::{Skeleton, SkeletonNode};
