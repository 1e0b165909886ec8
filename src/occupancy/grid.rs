//! Coarse grid occupancy: which cells each agent's path passes through
//!
//! Cell keys are never pruned. Once a cell has been seen it stays in the
//! cell table, possibly with an empty agent set, since cells are a small
//! reusable key space and diagnostics iterate every known cell.

use ahash::{AHashMap, AHashSet};

use crate::core::types::{AgentId, CellId};

/// Agent <-> cell tables, kept as exact inverses
#[derive(Debug, Clone, Default)]
pub struct GridOccupancy {
    agent_to_cells: AHashMap<AgentId, AHashSet<CellId>>,
    cell_to_agents: AHashMap<CellId, AHashSet<AgentId>>,
}

impl GridOccupancy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the agent's entry with an empty cell set if it has none
    pub fn touch(&mut self, agent: AgentId) {
        self.agent_to_cells.entry(agent).or_default();
    }

    /// Put the agent in a cell, creating either entry on first use
    pub fn insert(&mut self, agent: AgentId, cell: CellId) {
        self.agent_to_cells.entry(agent).or_default().insert(cell);
        self.cell_to_agents.entry(cell).or_default().insert(agent);
    }

    /// Withdraw the agent from all its cells but keep its (now empty) entry
    pub fn clear_agent(&mut self, agent: AgentId) {
        let Some(cells) = self.agent_to_cells.get_mut(&agent) else {
            return;
        };
        for cell in cells.drain() {
            if let Some(agents) = self.cell_to_agents.get_mut(&cell) {
                agents.remove(&agent);
            }
        }
    }

    /// Withdraw the agent from all its cells and erase its entry
    pub fn remove_agent(&mut self, agent: AgentId) {
        let Some(cells) = self.agent_to_cells.remove(&agent) else {
            return;
        };
        for cell in cells {
            if let Some(agents) = self.cell_to_agents.get_mut(&cell) {
                agents.remove(&agent);
            }
        }
    }

    pub fn cells_of(&self, agent: AgentId) -> AHashSet<CellId> {
        self.agent_to_cells.get(&agent).cloned().unwrap_or_default()
    }

    pub fn agents_in(&self, cell: CellId) -> AHashSet<AgentId> {
        self.cell_to_agents.get(&cell).cloned().unwrap_or_default()
    }

    pub fn contains_agent(&self, agent: AgentId) -> bool {
        self.agent_to_cells.contains_key(&agent)
    }

    /// Union of the occupants of every cell the agent occupies, itself included
    pub fn overlapping(&self, agent: AgentId) -> AHashSet<AgentId> {
        let mut overlapping = AHashSet::new();
        if let Some(cells) = self.agent_to_cells.get(&agent) {
            for cell in cells.iter() {
                if let Some(agents) = self.cell_to_agents.get(cell) {
                    overlapping.extend(agents.iter().copied());
                }
            }
        }
        overlapping
    }

    /// Owned copy of the cell table
    pub fn snapshot(&self) -> AHashMap<CellId, AHashSet<AgentId>> {
        self.cell_to_agents.clone()
    }

    pub fn agent_cells(&self) -> &AHashMap<AgentId, AHashSet<CellId>> {
        &self.agent_to_cells
    }

    pub fn cell_agents(&self) -> &AHashMap<CellId, AHashSet<AgentId>> {
        &self.cell_to_agents
    }

    pub fn clear(&mut self) {
        self.agent_to_cells.clear();
        self.cell_to_agents.clear();
    }
}
