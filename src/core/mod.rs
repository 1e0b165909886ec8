pub mod config;
pub mod error;
pub mod types;

pub use config::{Discipline, TrackerConfig};
pub use error::{OccupancyError, Result};
pub use types::{AgentId, CellId, PointId, Tick};
