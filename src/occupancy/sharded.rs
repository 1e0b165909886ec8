//! Sharded discipline: per-shard agent tables, global inverse tables
//!
//! Agent -> cells and agent -> points live in `shard_count` shards picked by
//! agent id. Cell -> agents and point -> agents are shared by every shard and
//! sit behind one global lock, since one agent's path can touch cells that
//! agents of any other shard also use.
//!
//! Lock order is always shard before global, and a mutation holds exactly one
//! shard. Whole-table operations take every shard in ascending order first.

use ahash::{AHashMap, AHashSet};
use parking_lot::{RwLock, RwLockReadGuard};

use crate::core::config::TrackerConfig;
use crate::core::error::Result;
use crate::core::types::{AgentId, CellId, PointId};
use crate::path::{sample_offsets, PathBuffer, PathPoint};

use super::diagnostics::{check_inverse, OccupancyStats};
use super::index::OccupancyIndex;

/// Tables owned by the agents of one shard
#[derive(Debug, Default)]
struct AgentShard {
    cells: AHashMap<AgentId, AHashSet<CellId>>,
    points: AHashMap<AgentId, AHashSet<PointId>>,
}

/// Cross-shard inverse tables
#[derive(Debug, Default)]
struct InverseTables {
    cell_agents: AHashMap<CellId, AHashSet<AgentId>>,
    point_agents: AHashMap<PointId, AHashSet<AgentId>>,
}

impl InverseTables {
    fn withdraw_from_cells(&mut self, agent: AgentId, cells: impl IntoIterator<Item = CellId>) {
        for cell in cells {
            if let Some(agents) = self.cell_agents.get_mut(&cell) {
                agents.remove(&agent);
            }
        }
    }

    fn withdraw_from_point(&mut self, agent: AgentId, point: PointId) {
        if let Some(agents) = self.point_agents.get_mut(&point) {
            agents.remove(&agent);
            if agents.is_empty() {
                self.point_agents.remove(&point);
            }
        }
    }
}

impl AgentShard {
    /// Erase the agent from this shard and the inverse tables
    fn remove_agent(&mut self, inverse: &mut InverseTables, agent: AgentId) {
        if let Some(cells) = self.cells.remove(&agent) {
            inverse.withdraw_from_cells(agent, cells);
        }
        if let Some(points) = self.points.remove(&agent) {
            for point in points {
                inverse.withdraw_from_point(agent, point);
            }
        }
    }

    fn add_cell(&mut self, inverse: &mut InverseTables, agent: AgentId, cell: CellId) {
        self.cells.entry(agent).or_default().insert(cell);
        inverse.cell_agents.entry(cell).or_default().insert(agent);
    }

    fn add_point(&mut self, inverse: &mut InverseTables, agent: AgentId, point: PointId) {
        self.points.entry(agent).or_default().insert(point);
        inverse.point_agents.entry(point).or_default().insert(agent);
    }
}

#[derive(Debug)]
pub struct ShardedTracker {
    shards: Vec<RwLock<AgentShard>>,
    inverse: RwLock<InverseTables>,
    sample_count: usize,
}

impl Default for ShardedTracker {
    fn default() -> Self {
        Self::with_config(&TrackerConfig::default())
    }
}

impl ShardedTracker {
    pub fn new(shard_count: usize) -> Self {
        Self::with_config(&TrackerConfig {
            shard_count,
            ..TrackerConfig::default()
        })
    }

    pub fn with_config(config: &TrackerConfig) -> Self {
        let shard_count = config.shard_count.max(1);
        Self {
            shards: (0..shard_count).map(|_| RwLock::default()).collect(),
            inverse: RwLock::default(),
            sample_count: config.sample_count.max(1),
        }
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn shard_of(&self, agent: AgentId) -> &RwLock<AgentShard> {
        &self.shards[agent.0 as usize % self.shards.len()]
    }

    fn read_all_shards(&self) -> Vec<RwLockReadGuard<'_, AgentShard>> {
        self.shards.iter().map(|shard| shard.read()).collect()
    }

    /// Merge the per-shard agent tables for whole-index diagnostics
    fn merged_agent_tables(
        shards: &[RwLockReadGuard<'_, AgentShard>],
    ) -> (
        AHashMap<AgentId, AHashSet<CellId>>,
        AHashMap<AgentId, AHashSet<PointId>>,
    ) {
        let mut cells = AHashMap::new();
        let mut points = AHashMap::new();
        for shard in shards {
            cells.extend(shard.cells.iter().map(|(a, c)| (*a, c.clone())));
            points.extend(shard.points.iter().map(|(a, p)| (*a, p.clone())));
        }
        (cells, points)
    }
}

impl OccupancyIndex for ShardedTracker {
    fn register_unbuffered<I>(&self, agent: AgentId, path: I)
    where
        I: IntoIterator,
        I::Item: PathPoint,
    {
        let resolved: Vec<(PointId, CellId)> = path
            .into_iter()
            .map(|p| (p.point_id(), p.cell_id()))
            .collect();

        let mut shard = self.shard_of(agent).write();
        let mut inverse = self.inverse.write();

        shard.remove_agent(&mut inverse, agent);
        shard.cells.entry(agent).or_default();
        for (point, cell) in &resolved {
            shard.add_point(&mut inverse, agent, *point);
            shard.add_cell(&mut inverse, agent, *cell);
        }

        tracing::trace!("Registered {:?} along {} points", agent, resolved.len());
    }

    fn register_sampled<B>(&self, agent: AgentId, buffer: &B)
    where
        B: PathBuffer + ?Sized,
    {
        if buffer.is_empty() {
            return;
        }

        let sampled: Vec<CellId> = sample_offsets(buffer.len(), self.sample_count)
            .filter_map(|offset| buffer.point_at(offset).map(|p| p.cell_id()))
            .collect();

        let mut shard = self.shard_of(agent).write();
        let mut inverse = self.inverse.write();

        let previous = shard.cells.entry(agent).or_default();
        inverse.withdraw_from_cells(agent, previous.drain());
        for cell in sampled {
            shard.add_cell(&mut inverse, agent, cell);
        }

        tracing::trace!(
            "Registered {:?} from {}-point buffer",
            agent,
            buffer.len()
        );
    }

    fn register_point(&self, point: PointId, agent: AgentId) {
        let mut shard = self.shard_of(agent).write();
        let mut inverse = self.inverse.write();
        shard.add_point(&mut inverse, agent, point);
    }

    fn unregister_point(&self, point: PointId, agent: AgentId) {
        let mut shard = self.shard_of(agent).write();
        let mut inverse = self.inverse.write();

        inverse.withdraw_from_point(agent, point);
        if let Some(points) = shard.points.get_mut(&agent) {
            points.remove(&point);
            if points.is_empty() {
                shard.points.remove(&agent);
            }
        }
    }

    fn remove_agent(&self, agent: AgentId) {
        let mut shard = self.shard_of(agent).write();
        let mut inverse = self.inverse.write();
        shard.remove_agent(&mut inverse, agent);
    }

    fn overlapping_agents(&self, agent: AgentId) -> AHashSet<AgentId> {
        let shard = self.shard_of(agent).read();
        let mut overlapping = AHashSet::new();
        let Some(cells) = shard.cells.get(&agent) else {
            return overlapping;
        };

        let inverse = self.inverse.read();
        for cell in cells.iter() {
            if let Some(agents) = inverse.cell_agents.get(cell) {
                overlapping.extend(agents.iter().copied());
            }
        }
        overlapping
    }

    fn agents_at_point(&self, point: PointId) -> AHashSet<AgentId> {
        self.inverse
            .read()
            .point_agents
            .get(&point)
            .cloned()
            .unwrap_or_default()
    }

    fn cells_of(&self, agent: AgentId) -> AHashSet<CellId> {
        self.shard_of(agent)
            .read()
            .cells
            .get(&agent)
            .cloned()
            .unwrap_or_default()
    }

    fn points_of(&self, agent: AgentId) -> AHashSet<PointId> {
        self.shard_of(agent)
            .read()
            .points
            .get(&agent)
            .cloned()
            .unwrap_or_default()
    }

    fn agents_in_cell(&self, cell: CellId) -> AHashSet<AgentId> {
        self.inverse
            .read()
            .cell_agents
            .get(&cell)
            .cloned()
            .unwrap_or_default()
    }

    fn is_registered(&self, agent: AgentId) -> bool {
        let shard = self.shard_of(agent).read();
        shard.cells.contains_key(&agent) || shard.points.contains_key(&agent)
    }

    fn all_cell_assignments(&self) -> AHashMap<CellId, AHashSet<AgentId>> {
        self.inverse.read().cell_agents.clone()
    }

    fn stats(&self) -> OccupancyStats {
        let shards = self.read_all_shards();
        let inverse = self.inverse.read();
        let (agent_cells, agent_points) = Self::merged_agent_tables(&shards);
        OccupancyStats::from_tables(
            &agent_cells,
            &inverse.cell_agents,
            &agent_points,
            &inverse.point_agents,
        )
    }

    fn check_consistency(&self) -> Result<()> {
        let shards = self.read_all_shards();
        let inverse = self.inverse.read();
        let (agent_cells, agent_points) = Self::merged_agent_tables(&shards);
        check_inverse("grid", &agent_cells, &inverse.cell_agents, true)?;
        check_inverse("waypoints", &agent_points, &inverse.point_agents, false)
    }

    fn reset(&self) {
        let mut shards: Vec<_> = self.shards.iter().map(|shard| shard.write()).collect();
        let mut inverse = self.inverse.write();
        for shard in shards.iter_mut() {
            shard.cells.clear();
            shard.points.clear();
        }
        inverse.cell_agents.clear();
        inverse.point_agents.clear();
        tracing::debug!("Sharded occupancy tracker reset ({} shards)", self.shards.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Waypoint;

    #[test]
    fn test_agents_spread_over_shards() {
        let tracker = ShardedTracker::new(4);
        for i in 0..8u32 {
            tracker.register_unbuffered(AgentId(i), [Waypoint::new(1, 1)]);
        }

        for shard in &tracker.shards {
            assert_eq!(shard.read().cells.len(), 2);
        }
        assert_eq!(tracker.agents_in_cell(CellId(1)).len(), 8);
        assert_eq!(tracker.overlapping_agents(AgentId(5)).len(), 8);
    }

    #[test]
    fn test_cross_shard_removal() {
        let tracker = ShardedTracker::new(2);
        tracker.register_unbuffered(AgentId(0), [Waypoint::new(1, 10)]);
        tracker.register_unbuffered(AgentId(1), [Waypoint::new(1, 10)]);

        tracker.remove_agent(AgentId(0));
        assert_eq!(tracker.overlapping_agents(AgentId(1)).len(), 1);
        assert_eq!(tracker.agents_at_point(PointId(1)).len(), 1);
        assert!(tracker.all_cell_assignments().contains_key(&CellId(10)));
        assert!(tracker.check_consistency().is_ok());
    }

    #[test]
    fn test_sampled_keeps_points() {
        let tracker = ShardedTracker::new(3);
        tracker.register_unbuffered(AgentId(1), [Waypoint::new(1, 10)]);
        let buffer: Vec<Waypoint> = (0..30).map(|i| Waypoint::new(100 + i, 50 + i)).collect();
        tracker.register_sampled(AgentId(1), &buffer);

        let cells = tracker.cells_of(AgentId(1));
        assert!(cells.contains(&CellId(50)));
        assert!(cells.contains(&CellId(79)));
        assert!(!cells.contains(&CellId(10)));
        assert_eq!(tracker.points_of(AgentId(1)).len(), 1);
        assert!(tracker.check_consistency().is_ok());
    }

    #[test]
    fn test_unregister_point_prunes() {
        let tracker = ShardedTracker::new(2);
        tracker.register_point(PointId(4), AgentId(1));
        tracker.unregister_point(PointId(4), AgentId(1));

        assert!(!tracker.is_registered(AgentId(1)));
        assert!(tracker.agents_at_point(PointId(4)).is_empty());
        assert_eq!(tracker.stats(), OccupancyStats::default());
    }

    #[test]
    fn test_zero_shards_clamped() {
        let tracker = ShardedTracker::new(0);
        assert_eq!(tracker.shard_count(), 1);
        tracker.register_point(PointId(1), AgentId(9));
        assert!(tracker.is_registered(AgentId(9)));
    }
}
