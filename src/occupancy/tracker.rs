//! Single-writer occupancy tracker
//!
//! Owns the coarse grid and the fine waypoint tables and keeps all four in
//! step. Mutations take `&mut self`; wrap it in a [`SharedTracker`] or use a
//! [`ShardedTracker`] when planning workers run in parallel.
//!
//! [`SharedTracker`]: super::shared::SharedTracker
//! [`ShardedTracker`]: super::sharded::ShardedTracker

use ahash::{AHashMap, AHashSet};

use crate::core::config::TrackerConfig;
use crate::core::error::Result;
use crate::core::types::{AgentId, CellId, PointId};
use crate::path::{sample_offsets, PathBuffer, PathPoint};

use super::diagnostics::{check_inverse, OccupancyStats};
use super::grid::GridOccupancy;
use super::waypoint::WaypointOverlap;

#[derive(Debug, Clone)]
pub struct OccupancyTracker {
    grid: GridOccupancy,
    waypoints: WaypointOverlap,
    sample_count: usize,
}

impl Default for OccupancyTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl OccupancyTracker {
    pub fn new() -> Self {
        Self::with_config(&TrackerConfig::default())
    }

    pub fn with_config(config: &TrackerConfig) -> Self {
        Self {
            grid: GridOccupancy::new(),
            waypoints: WaypointOverlap::new(),
            sample_count: config.sample_count.max(1),
        }
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Register an agent's full path in both indices.
    ///
    /// Everything previously recorded for the agent is dropped first. Every
    /// point goes into the waypoint index and every point's cell into the
    /// grid. An empty path leaves the agent with an empty cell set.
    pub fn register_unbuffered<I>(&mut self, agent: AgentId, path: I)
    where
        I: IntoIterator,
        I::Item: PathPoint,
    {
        self.remove_agent(agent);
        self.grid.touch(agent);

        let mut count = 0usize;
        for point in path {
            self.waypoints.register(point.point_id(), agent);
            self.grid.insert(agent, point.cell_id());
            count += 1;
        }

        tracing::trace!("Registered {:?} along {} points", agent, count);
    }

    /// Register a bounded sample of a long buffer in the grid only.
    ///
    /// An empty buffer leaves every table untouched, including whatever the
    /// agent had registered before. The waypoint index is never touched here.
    pub fn register_sampled<B>(&mut self, agent: AgentId, buffer: &B)
    where
        B: PathBuffer + ?Sized,
    {
        if buffer.is_empty() {
            return;
        }

        self.grid.touch(agent);
        self.grid.clear_agent(agent);

        for offset in sample_offsets(buffer.len(), self.sample_count) {
            if let Some(point) = buffer.point_at(offset) {
                self.grid.insert(agent, point.cell_id());
            }
        }

        tracing::trace!(
            "Registered {:?} from {}-point buffer into {} cells",
            agent,
            buffer.len(),
            self.grid.cells_of(agent).len()
        );
    }

    /// Record that `agent` passes through `point`. Idempotent.
    pub fn register_point(&mut self, point: PointId, agent: AgentId) {
        self.waypoints.register(point, agent);
    }

    /// Drop one point from the agent's fine occupancy
    pub fn unregister_point(&mut self, point: PointId, agent: AgentId) {
        self.waypoints.unregister(point, agent);
    }

    /// Erase every trace of the agent from both indices.
    ///
    /// Cell keys survive with the agent withdrawn. Unknown agents are a no-op.
    pub fn remove_agent(&mut self, agent: AgentId) {
        self.grid.remove_agent(agent);
        self.waypoints.remove_agent(agent);
    }

    /// Agents sharing at least one cell with `agent`, itself included
    pub fn overlapping_agents(&self, agent: AgentId) -> AHashSet<AgentId> {
        self.grid.overlapping(agent)
    }

    pub fn agents_at_point(&self, point: PointId) -> AHashSet<AgentId> {
        self.waypoints.agents_at(point)
    }

    pub fn cells_of(&self, agent: AgentId) -> AHashSet<CellId> {
        self.grid.cells_of(agent)
    }

    pub fn points_of(&self, agent: AgentId) -> AHashSet<PointId> {
        self.waypoints.points_of(agent)
    }

    pub fn agents_in_cell(&self, cell: CellId) -> AHashSet<AgentId> {
        self.grid.agents_in(cell)
    }

    pub fn is_registered(&self, agent: AgentId) -> bool {
        self.grid.contains_agent(agent) || self.waypoints.contains_agent(agent)
    }

    /// Owned snapshot of the cell table, emptied cells included
    pub fn all_cell_assignments(&self) -> AHashMap<CellId, AHashSet<AgentId>> {
        self.grid.snapshot()
    }

    pub fn stats(&self) -> OccupancyStats {
        OccupancyStats::from_tables(
            self.grid.agent_cells(),
            self.grid.cell_agents(),
            self.waypoints.agent_points(),
            self.waypoints.point_agents(),
        )
    }

    /// Verify that both index pairs are exact inverses
    pub fn check_consistency(&self) -> Result<()> {
        check_inverse("grid", self.grid.agent_cells(), self.grid.cell_agents(), true)?;
        check_inverse(
            "waypoints",
            self.waypoints.agent_points(),
            self.waypoints.point_agents(),
            false,
        )
    }

    /// Forget everything. Used on a full simulation restart.
    pub fn reset(&mut self) {
        self.grid.clear();
        self.waypoints.clear();
        tracing::debug!("Occupancy tracker reset");
    }
}
