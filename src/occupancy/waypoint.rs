//! Fine waypoint overlap: which agents pass through each exact road point
//!
//! Unlike the grid, empty sets are erased on both sides, so a key present
//! in either table always has at least one member.

use ahash::{AHashMap, AHashSet};

use crate::core::types::{AgentId, PointId};

/// Point <-> agent tables, kept as exact inverses
#[derive(Debug, Clone, Default)]
pub struct WaypointOverlap {
    point_to_agents: AHashMap<PointId, AHashSet<AgentId>>,
    agent_to_points: AHashMap<AgentId, AHashSet<PointId>>,
}

impl WaypointOverlap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the agent passes through the point. Idempotent.
    pub fn register(&mut self, point: PointId, agent: AgentId) {
        self.point_to_agents.entry(point).or_default().insert(agent);
        self.agent_to_points.entry(agent).or_default().insert(point);
    }

    /// Drop one point/agent pairing, pruning emptied keys
    pub fn unregister(&mut self, point: PointId, agent: AgentId) {
        if let Some(agents) = self.point_to_agents.get_mut(&point) {
            agents.remove(&agent);
            if agents.is_empty() {
                self.point_to_agents.remove(&point);
            }
        }

        if let Some(points) = self.agent_to_points.get_mut(&agent) {
            points.remove(&point);
            if points.is_empty() {
                self.agent_to_points.remove(&agent);
            }
        }
    }

    /// Drop every point the agent occupies
    pub fn remove_agent(&mut self, agent: AgentId) {
        let Some(points) = self.agent_to_points.remove(&agent) else {
            return;
        };
        for point in points {
            if let Some(agents) = self.point_to_agents.get_mut(&point) {
                agents.remove(&agent);
                if agents.is_empty() {
                    self.point_to_agents.remove(&point);
                }
            }
        }
    }

    pub fn agents_at(&self, point: PointId) -> AHashSet<AgentId> {
        self.point_to_agents.get(&point).cloned().unwrap_or_default()
    }

    pub fn points_of(&self, agent: AgentId) -> AHashSet<PointId> {
        self.agent_to_points.get(&agent).cloned().unwrap_or_default()
    }

    pub fn contains_agent(&self, agent: AgentId) -> bool {
        self.agent_to_points.contains_key(&agent)
    }

    pub fn point_agents(&self) -> &AHashMap<PointId, AHashSet<AgentId>> {
        &self.point_to_agents
    }

    pub fn agent_points(&self) -> &AHashMap<AgentId, AHashSet<PointId>> {
        &self.agent_to_points
    }

    pub fn clear(&mut self) {
        self.point_to_agents.clear();
        self.agent_to_points.clear();
    }
}
