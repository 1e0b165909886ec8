//! Exclusive-lock discipline: one RwLock guarding all four tables
//!
//! Updates are short (proportional to the cells and points touched), so a
//! single lock is usually enough. Queries share the read side.

use ahash::{AHashMap, AHashSet};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::core::config::TrackerConfig;
use crate::core::error::Result;
use crate::core::types::{AgentId, CellId, PointId};
use crate::path::{PathBuffer, PathPoint};

use super::diagnostics::OccupancyStats;
use super::index::OccupancyIndex;
use super::tracker::OccupancyTracker;

#[derive(Debug, Default)]
pub struct SharedTracker {
    inner: RwLock<OccupancyTracker>,
}

impl SharedTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &TrackerConfig) -> Self {
        Self {
            inner: RwLock::new(OccupancyTracker::with_config(config)),
        }
    }

    /// Hold the read side for a batch of queries
    pub fn read(&self) -> RwLockReadGuard<'_, OccupancyTracker> {
        self.inner.read()
    }

    /// Hold the write side for a batch of registrations
    pub fn write(&self) -> RwLockWriteGuard<'_, OccupancyTracker> {
        self.inner.write()
    }

    pub fn into_inner(self) -> OccupancyTracker {
        self.inner.into_inner()
    }
}

impl From<OccupancyTracker> for SharedTracker {
    fn from(tracker: OccupancyTracker) -> Self {
        Self {
            inner: RwLock::new(tracker),
        }
    }
}

impl OccupancyIndex for SharedTracker {
    fn register_unbuffered<I>(&self, agent: AgentId, path: I)
    where
        I: IntoIterator,
        I::Item: PathPoint,
    {
        // resolve before locking so the write section stays short
        let resolved: Vec<(PointId, CellId)> = path
            .into_iter()
            .map(|p| (p.point_id(), p.cell_id()))
            .collect();
        self.inner.write().register_unbuffered(agent, resolved);
    }

    fn register_sampled<B>(&self, agent: AgentId, buffer: &B)
    where
        B: PathBuffer + ?Sized,
    {
        self.inner.write().register_sampled(agent, buffer);
    }

    fn register_point(&self, point: PointId, agent: AgentId) {
        self.inner.write().register_point(point, agent);
    }

    fn unregister_point(&self, point: PointId, agent: AgentId) {
        self.inner.write().unregister_point(point, agent);
    }

    fn remove_agent(&self, agent: AgentId) {
        self.inner.write().remove_agent(agent);
    }

    fn overlapping_agents(&self, agent: AgentId) -> AHashSet<AgentId> {
        self.inner.read().overlapping_agents(agent)
    }

    fn agents_at_point(&self, point: PointId) -> AHashSet<AgentId> {
        self.inner.read().agents_at_point(point)
    }

    fn cells_of(&self, agent: AgentId) -> AHashSet<CellId> {
        self.inner.read().cells_of(agent)
    }

    fn points_of(&self, agent: AgentId) -> AHashSet<PointId> {
        self.inner.read().points_of(agent)
    }

    fn agents_in_cell(&self, cell: CellId) -> AHashSet<AgentId> {
        self.inner.read().agents_in_cell(cell)
    }

    fn is_registered(&self, agent: AgentId) -> bool {
        self.inner.read().is_registered(agent)
    }

    fn all_cell_assignments(&self) -> AHashMap<CellId, AHashSet<AgentId>> {
        self.inner.read().all_cell_assignments()
    }

    fn stats(&self) -> OccupancyStats {
        self.inner.read().stats()
    }

    fn check_consistency(&self) -> Result<()> {
        self.inner.read().check_consistency()
    }

    fn reset(&self) {
        self.inner.write().reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Waypoint;
    use std::sync::Arc;

    #[test]
    fn test_shared_tracker_scenario() {
        let tracker = SharedTracker::new();
        tracker.register_unbuffered(AgentId(1), [Waypoint::new(1, 10), Waypoint::new(2, 20)]);
        tracker.register_unbuffered(AgentId(2), [Waypoint::new(2, 20)]);

        assert_eq!(tracker.overlapping_agents(AgentId(1)).len(), 2);
        assert_eq!(tracker.agents_at_point(PointId(2)).len(), 2);

        tracker.remove_agent(AgentId(1));
        assert_eq!(tracker.agents_at_point(PointId(2)).len(), 1);
        assert!(tracker.check_consistency().is_ok());
    }

    #[test]
    fn test_batch_guards() {
        let tracker = SharedTracker::new();
        {
            let mut guard = tracker.write();
            for i in 0..10u32 {
                guard.register_unbuffered(AgentId(i), [Waypoint::new(u64::from(i), 0)]);
            }
        }
        let guard = tracker.read();
        assert_eq!(guard.agents_in_cell(CellId(0)).len(), 10);
    }

    #[test]
    fn test_parallel_writers_through_arc() {
        let tracker = Arc::new(SharedTracker::new());
        let handles: Vec<_> = (0..4u32)
            .map(|t| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    for i in 0..50u32 {
                        let agent = AgentId(t * 1000 + i);
                        tracker.register_unbuffered(agent, [Waypoint::new(u64::from(i), 7)]);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(tracker.agents_in_cell(CellId(7)).len(), 200);
        assert_eq!(tracker.agents_at_point(PointId(3)).len(), 4);
        assert!(tracker.check_consistency().is_ok());
    }

    #[test]
    fn test_into_inner_keeps_state() {
        let tracker = SharedTracker::from(OccupancyTracker::new());
        tracker.register_point(PointId(1), AgentId(1));
        let inner = tracker.into_inner();
        assert!(inner.is_registered(AgentId(1)));
    }
}
