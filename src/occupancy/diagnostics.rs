//! Occupancy statistics and table consistency checks

use std::fmt::Debug;
use std::hash::Hash;

use ahash::{AHashMap, AHashSet};
use serde::Serialize;

use crate::core::error::{OccupancyError, Result};
use crate::core::types::{AgentId, CellId, PointId};

/// Size summary of the four occupancy tables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OccupancyStats {
    /// Agents with a coarse or fine entry
    pub agents: usize,
    /// Cell keys ever seen (includes emptied cells)
    pub cells: usize,
    /// Cells with at least one agent
    pub occupied_cells: usize,
    /// Points with at least one agent
    pub points: usize,
    /// Total agent/cell pairings
    pub cell_memberships: usize,
    /// Total agent/point pairings
    pub point_memberships: usize,
}

impl OccupancyStats {
    pub fn from_tables(
        agent_cells: &AHashMap<AgentId, AHashSet<CellId>>,
        cell_agents: &AHashMap<CellId, AHashSet<AgentId>>,
        agent_points: &AHashMap<AgentId, AHashSet<PointId>>,
        point_agents: &AHashMap<PointId, AHashSet<AgentId>>,
    ) -> Self {
        let agents: AHashSet<AgentId> = agent_cells
            .keys()
            .chain(agent_points.keys())
            .copied()
            .collect();

        Self {
            agents: agents.len(),
            cells: cell_agents.len(),
            occupied_cells: cell_agents.values().filter(|a| !a.is_empty()).count(),
            points: point_agents.len(),
            cell_memberships: agent_cells.values().map(|set| set.len()).sum(),
            point_memberships: agent_points.values().map(|set| set.len()).sum(),
        }
    }
}

/// Check that `forward` and `backward` are exact inverses of each other.
///
/// `allow_empty` says whether keys with empty value sets may stay in the
/// tables (true for the grid, false for waypoints).
pub fn check_inverse<K, V>(
    label: &str,
    forward: &AHashMap<K, AHashSet<V>>,
    backward: &AHashMap<V, AHashSet<K>>,
    allow_empty: bool,
) -> Result<()>
where
    K: Copy + Eq + Hash + Debug,
    V: Copy + Eq + Hash + Debug,
{
    for (key, values) in forward.iter() {
        if !allow_empty && values.is_empty() {
            return Err(OccupancyError::Inconsistent(format!(
                "{label}: {key:?} has an empty forward entry"
            )));
        }
        for value in values.iter() {
            let mirrored = backward.get(value).is_some_and(|keys| keys.contains(key));
            if !mirrored {
                return Err(OccupancyError::Inconsistent(format!(
                    "{label}: {key:?} -> {value:?} has no inverse entry"
                )));
            }
        }
    }

    for (value, keys) in backward.iter() {
        if !allow_empty && keys.is_empty() {
            return Err(OccupancyError::Inconsistent(format!(
                "{label}: {value:?} has an empty inverse entry"
            )));
        }
        for key in keys.iter() {
            let mirrored = forward.get(key).is_some_and(|values| values.contains(value));
            if !mirrored {
                return Err(OccupancyError::Inconsistent(format!(
                    "{label}: {value:?} -> {key:?} is dangling"
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set<T: Eq + Hash>(items: impl IntoIterator<Item = T>) -> AHashSet<T> {
        items.into_iter().collect()
    }

    #[test]
    fn test_matching_tables_pass() {
        let mut forward = AHashMap::new();
        forward.insert(AgentId(1), set([CellId(1), CellId(2)]));
        let mut backward = AHashMap::new();
        backward.insert(CellId(1), set([AgentId(1)]));
        backward.insert(CellId(2), set([AgentId(1)]));

        assert!(check_inverse("grid", &forward, &backward, true).is_ok());
        assert!(check_inverse("grid", &forward, &backward, false).is_ok());
    }

    #[test]
    fn test_missing_inverse_fails() {
        let mut forward = AHashMap::new();
        forward.insert(AgentId(1), set([CellId(1)]));
        let backward: AHashMap<CellId, AHashSet<AgentId>> = AHashMap::new();

        let err = check_inverse("grid", &forward, &backward, true).unwrap_err();
        assert!(matches!(err, OccupancyError::Inconsistent(_)));
    }

    #[test]
    fn test_dangling_inverse_fails() {
        let forward: AHashMap<PointId, AHashSet<AgentId>> = AHashMap::new();
        let mut backward = AHashMap::new();
        backward.insert(AgentId(3), set([PointId(4)]));

        assert!(check_inverse("waypoints", &forward, &backward, false).is_err());
    }

    #[test]
    fn test_empty_sets_only_allowed_when_asked() {
        let forward: AHashMap<AgentId, AHashSet<CellId>> = AHashMap::new();
        let mut backward = AHashMap::new();
        backward.insert(CellId(1), AHashSet::new());

        assert!(check_inverse("grid", &forward, &backward, true).is_ok());
        assert!(check_inverse("waypoints", &forward, &backward, false).is_err());
    }

    #[test]
    fn test_stats_from_tables() {
        let mut agent_cells = AHashMap::new();
        agent_cells.insert(AgentId(1), set([CellId(1), CellId(2)]));
        let mut cell_agents = AHashMap::new();
        cell_agents.insert(CellId(1), set([AgentId(1)]));
        cell_agents.insert(CellId(2), set([AgentId(1)]));
        cell_agents.insert(CellId(3), AHashSet::new());
        let mut agent_points = AHashMap::new();
        agent_points.insert(AgentId(2), set([PointId(5)]));
        let mut point_agents = AHashMap::new();
        point_agents.insert(PointId(5), set([AgentId(2)]));

        let stats =
            OccupancyStats::from_tables(&agent_cells, &cell_agents, &agent_points, &point_agents);
        assert_eq!(stats.agents, 2);
        assert_eq!(stats.cells, 3);
        assert_eq!(stats.occupied_cells, 2);
        assert_eq!(stats.points, 1);
        assert_eq!(stats.cell_memberships, 2);
        assert_eq!(stats.point_memberships, 1);
    }
}
