//! Road Occupancy - grid and waypoint occupancy index for traffic agents

pub mod core;
pub mod occupancy;
pub mod path;

pub use crate::core::{AgentId, CellId, Discipline, OccupancyError, PointId, Result, TrackerConfig};
pub use crate::occupancy::{
    build_index, AnyIndex, OccupancyIndex, OccupancyStats, OccupancyTracker, ShardedTracker,
    SharedTracker,
};
pub use crate::path::{PathBuffer, PathPoint, Waypoint};
