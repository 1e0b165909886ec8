//! Thread-safe occupancy index interface
//!
//! Planning stages running on worker threads talk to the tracker through
//! [`OccupancyIndex`]. Which synchronization discipline sits behind it is an
//! integration decision, made once from [`TrackerConfig::discipline`].

use ahash::{AHashMap, AHashSet};

use crate::core::config::{Discipline, TrackerConfig};
use crate::core::error::Result;
use crate::core::types::{AgentId, CellId, PointId};
use crate::path::{PathBuffer, PathPoint};

use super::diagnostics::OccupancyStats;
use super::sharded::ShardedTracker;
use super::shared::SharedTracker;

/// Occupancy operations callable through a shared reference.
///
/// Every method applies fully before returning. Queries may run
/// concurrently with each other and never observe a half-applied update of
/// the agent or key they read.
pub trait OccupancyIndex: Send + Sync {
    fn register_unbuffered<I>(&self, agent: AgentId, path: I)
    where
        I: IntoIterator,
        I::Item: PathPoint;

    fn register_sampled<B>(&self, agent: AgentId, buffer: &B)
    where
        B: PathBuffer + ?Sized;

    fn register_point(&self, point: PointId, agent: AgentId);

    fn unregister_point(&self, point: PointId, agent: AgentId);

    fn remove_agent(&self, agent: AgentId);

    fn overlapping_agents(&self, agent: AgentId) -> AHashSet<AgentId>;

    fn agents_at_point(&self, point: PointId) -> AHashSet<AgentId>;

    fn cells_of(&self, agent: AgentId) -> AHashSet<CellId>;

    fn points_of(&self, agent: AgentId) -> AHashSet<PointId>;

    fn agents_in_cell(&self, cell: CellId) -> AHashSet<AgentId>;

    fn is_registered(&self, agent: AgentId) -> bool;

    fn all_cell_assignments(&self) -> AHashMap<CellId, AHashSet<AgentId>>;

    fn stats(&self) -> OccupancyStats;

    fn check_consistency(&self) -> Result<()>;

    fn reset(&self);
}

/// Either discipline, chosen at runtime from config
#[derive(Debug)]
pub enum AnyIndex {
    Exclusive(SharedTracker),
    Sharded(ShardedTracker),
}

impl AnyIndex {
    pub fn discipline(&self) -> Discipline {
        match self {
            Self::Exclusive(_) => Discipline::Exclusive,
            Self::Sharded(_) => Discipline::Sharded,
        }
    }
}

/// Build the tracker variant selected by `config.discipline`
pub fn build_index(config: &TrackerConfig) -> Result<AnyIndex> {
    config.validate()?;
    let index = match config.discipline {
        Discipline::Exclusive => AnyIndex::Exclusive(SharedTracker::with_config(config)),
        Discipline::Sharded => AnyIndex::Sharded(ShardedTracker::with_config(config)),
    };
    tracing::info!(
        "Built {:?} occupancy index (sample_count={}, shard_count={})",
        index.discipline(),
        config.sample_count,
        config.shard_count
    );
    Ok(index)
}

macro_rules! dispatch {
    ($self:ident, $index:ident => $body:expr) => {
        match $self {
            AnyIndex::Exclusive($index) => $body,
            AnyIndex::Sharded($index) => $body,
        }
    };
}

impl OccupancyIndex for AnyIndex {
    fn register_unbuffered<I>(&self, agent: AgentId, path: I)
    where
        I: IntoIterator,
        I::Item: PathPoint,
    {
        dispatch!(self, index => index.register_unbuffered(agent, path))
    }

    fn register_sampled<B>(&self, agent: AgentId, buffer: &B)
    where
        B: PathBuffer + ?Sized,
    {
        dispatch!(self, index => index.register_sampled(agent, buffer))
    }

    fn register_point(&self, point: PointId, agent: AgentId) {
        dispatch!(self, index => index.register_point(point, agent))
    }

    fn unregister_point(&self, point: PointId, agent: AgentId) {
        dispatch!(self, index => index.unregister_point(point, agent))
    }

    fn remove_agent(&self, agent: AgentId) {
        dispatch!(self, index => index.remove_agent(agent))
    }

    fn overlapping_agents(&self, agent: AgentId) -> AHashSet<AgentId> {
        dispatch!(self, index => index.overlapping_agents(agent))
    }

    fn agents_at_point(&self, point: PointId) -> AHashSet<AgentId> {
        dispatch!(self, index => index.agents_at_point(point))
    }

    fn cells_of(&self, agent: AgentId) -> AHashSet<CellId> {
        dispatch!(self, index => index.cells_of(agent))
    }

    fn points_of(&self, agent: AgentId) -> AHashSet<PointId> {
        dispatch!(self, index => index.points_of(agent))
    }

    fn agents_in_cell(&self, cell: CellId) -> AHashSet<AgentId> {
        dispatch!(self, index => index.agents_in_cell(cell))
    }

    fn is_registered(&self, agent: AgentId) -> bool {
        dispatch!(self, index => index.is_registered(agent))
    }

    fn all_cell_assignments(&self) -> AHashMap<CellId, AHashSet<AgentId>> {
        dispatch!(self, index => index.all_cell_assignments())
    }

    fn stats(&self) -> OccupancyStats {
        dispatch!(self, index => index.stats())
    }

    fn check_consistency(&self) -> Result<()> {
        dispatch!(self, index => index.check_consistency())
    }

    fn reset(&self) {
        dispatch!(self, index => index.reset())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::OccupancyError;
    use crate::path::Waypoint;

    #[test]
    fn test_build_index_follows_discipline() {
        let exclusive = build_index(&TrackerConfig::default()).unwrap();
        assert_eq!(exclusive.discipline(), Discipline::Exclusive);

        let config = TrackerConfig {
            discipline: Discipline::Sharded,
            shard_count: 4,
            ..TrackerConfig::default()
        };
        let sharded = build_index(&config).unwrap();
        assert_eq!(sharded.discipline(), Discipline::Sharded);
    }

    #[test]
    fn test_build_index_rejects_invalid_config() {
        let config = TrackerConfig {
            sample_count: 0,
            ..TrackerConfig::default()
        };
        let err = build_index(&config).unwrap_err();
        assert!(matches!(err, OccupancyError::InvalidConfig(_)));
    }

    #[test]
    fn test_both_variants_agree() {
        let sharded_config = TrackerConfig {
            discipline: Discipline::Sharded,
            shard_count: 3,
            ..TrackerConfig::default()
        };
        let indices = [
            build_index(&TrackerConfig::default()).unwrap(),
            build_index(&sharded_config).unwrap(),
        ];

        for index in &indices {
            index.register_unbuffered(AgentId(1), [Waypoint::new(1, 10), Waypoint::new(2, 20)]);
            index.register_unbuffered(AgentId(2), [Waypoint::new(2, 20)]);
            index.register_sampled(AgentId(3), &vec![Waypoint::new(5, 10)]);

            let overlap = index.overlapping_agents(AgentId(1));
            assert_eq!(overlap.len(), 3);
            assert_eq!(index.agents_at_point(PointId(2)).len(), 2);
            assert!(index.points_of(AgentId(3)).is_empty());
            assert!(index.check_consistency().is_ok());

            index.reset();
            assert_eq!(index.stats(), OccupancyStats::default());
        }
    }
}
