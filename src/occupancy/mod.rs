//! Agent occupancy index over a road network
//!
//! Two cooperating indices answer "who else is on, or about to be on, my
//! part of the road":
//! - the coarse grid maps agents to the cells their path passes through
//! - the fine waypoint index maps exact road points to the agents on them
//!
//! [`OccupancyTracker`] keeps both in step for a single writer.
//! [`SharedTracker`] and [`ShardedTracker`] add the two locking disciplines
//! for parallel planning stages behind [`OccupancyIndex`].

pub mod diagnostics;
pub mod grid;
pub mod index;
pub mod sharded;
pub mod shared;
pub mod tracker;
pub mod waypoint;

pub use diagnostics::OccupancyStats;
pub use grid::GridOccupancy;
pub use index::{build_index, AnyIndex, OccupancyIndex};
pub use sharded::ShardedTracker;
pub use shared::SharedTracker;
pub use tracker::OccupancyTracker;
pub use waypoint::WaypointOverlap;
