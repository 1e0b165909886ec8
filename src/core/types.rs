//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Unique identifier for a simulated agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl AgentId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Coarse spatial partition cell, assigned to road points by the map layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellId(pub u64);

impl CellId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

/// A single point (waypoint) on the road network
///
/// Distinct points may share a [`CellId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointId(pub u64);

impl PointId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Simulation tick counter
pub type Tick = u64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_id_equality() {
        let a = AgentId(1);
        let b = AgentId::new(1);
        let c = AgentId(2);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_point_and_cell_ids_hash() {
        use ahash::AHashMap;
        let mut map: AHashMap<PointId, CellId> = AHashMap::new();
        map.insert(PointId(7), CellId(3));
        map.insert(PointId(8), CellId(3));
        assert_eq!(map.get(&PointId(7)), Some(&CellId(3)));
        assert_eq!(map.get(&PointId(8)), map.get(&PointId(7)));
        assert_eq!(map.get(&PointId(9)), None);
    }

    #[test]
    fn test_ids_serialize_as_numbers() {
        let json = serde_json::to_string(&AgentId(42)).unwrap();
        assert_eq!(json, "42");
        let back: CellId = serde_json::from_str("17").unwrap();
        assert_eq!(back, CellId(17));
    }
}
