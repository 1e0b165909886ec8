//! Occupancy Simulation
//! Agents drive around a synthetic ring road while parallel planning stages
//! keep the occupancy index current and query it for nearby traffic.

use std::collections::{BTreeMap, VecDeque};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing_subscriber::EnvFilter;

use road_occupancy::core::types::{AgentId, PointId, Tick};
use road_occupancy::occupancy::{build_index, OccupancyIndex};
use road_occupancy::path::Waypoint;
use road_occupancy::{Result, TrackerConfig};

/// Occupancy sim - agents on a ring road sharing one occupancy index
#[derive(Parser, Debug)]
#[command(name = "occupancy_sim")]
#[command(about = "Drive agents around a ring road and report overlapping traffic")]
struct Args {
    /// Random seed for reproducible runs
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of agents
    #[arg(long, default_value_t = 500)]
    agents: u32,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 100)]
    ticks: Tick,

    /// Points on the ring road
    #[arg(long, default_value_t = 5000)]
    ring_points: u64,

    /// Consecutive road points per coarse cell
    #[arg(long, default_value_t = 25)]
    points_per_cell: u64,

    /// Points registered point-by-point ahead of each near-field agent
    #[arg(long, default_value_t = 20)]
    lookahead: u64,

    /// Length of the long buffer registered by sampled agents
    #[arg(long, default_value_t = 200)]
    buffer_len: u64,

    /// Tracker config file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the final cell assignments as JSON
    #[arg(long)]
    dump: Option<PathBuf>,
}

/// How an agent reports its path to the index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Registration {
    /// Every lookahead point, both indices
    Unbuffered,
    /// Sampled long buffer, grid only
    Sampled,
}

#[derive(Debug, Clone)]
struct SimAgent {
    id: AgentId,
    position: u64,
    speed: u64,
    registration: Registration,
}

/// Ring road: point `i` is followed by `i + 1`, wrapping around
struct RingRoad {
    points: u64,
    points_per_cell: u64,
}

impl RingRoad {
    fn waypoint(&self, index: u64) -> Waypoint {
        let point = index % self.points;
        Waypoint::new(point, point / self.points_per_cell)
    }

    fn path(&self, start: u64, len: u64) -> VecDeque<Waypoint> {
        (0..len).map(|i| self.waypoint(start + i)).collect()
    }
}

#[derive(Debug, Default)]
struct TickReport {
    agents_with_traffic: usize,
    max_overlap: usize,
    contested_points: usize,
}

fn spawn_agents(args: &Args, rng: &mut ChaCha8Rng) -> Vec<SimAgent> {
    (0..args.agents)
        .map(|i| SimAgent {
            id: AgentId(i),
            position: rng.gen_range(0..args.ring_points),
            speed: rng.gen_range(1..=4),
            registration: if rng.gen_bool(0.5) {
                Registration::Unbuffered
            } else {
                Registration::Sampled
            },
        })
        .collect()
}

fn plan_stage<I: OccupancyIndex>(index: &I, road: &RingRoad, agents: &[SimAgent], args: &Args) {
    agents.par_iter().for_each(|agent| match agent.registration {
        Registration::Unbuffered => {
            index.register_unbuffered(agent.id, road.path(agent.position, args.lookahead))
        }
        Registration::Sampled => {
            index.register_sampled(agent.id, &road.path(agent.position, args.buffer_len))
        }
    });
}

fn query_stage<I: OccupancyIndex>(index: &I, road: &RingRoad, agents: &[SimAgent]) -> TickReport {
    let overlaps: Vec<usize> = agents
        .par_iter()
        .map(|agent| index.overlapping_agents(agent.id).len())
        .collect();

    let contested_points = agents
        .par_iter()
        .filter(|agent| agent.registration == Registration::Unbuffered)
        .filter(|agent| {
            let next = road.waypoint(agent.position + 1).point;
            index.agents_at_point(next).len() > 1
        })
        .count();

    TickReport {
        agents_with_traffic: overlaps.iter().filter(|&&n| n > 1).count(),
        max_overlap: overlaps.iter().copied().max().unwrap_or(0),
        contested_points,
    }
}

fn write_dump<I: OccupancyIndex>(index: &I, path: &Path) -> Result<()> {
    let assignments: BTreeMap<u64, Vec<u32>> = index
        .all_cell_assignments()
        .into_iter()
        .map(|(cell, agents)| {
            let mut ids: Vec<u32> = agents.into_iter().map(|a| a.0).collect();
            ids.sort_unstable();
            (cell.0, ids)
        })
        .collect();

    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, &assignments)?;
    tracing::info!("Wrote {} cell assignments to {}", assignments.len(), path.display());
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("road_occupancy=info,occupancy_sim=info")),
        )
        .init();

    let args = Args::parse();
    tracing::info!("Starting occupancy sim: {:?}", args);

    let config = match &args.config {
        Some(path) => TrackerConfig::load(path)?,
        None => TrackerConfig::default(),
    };
    let index = build_index(&config)?;

    let road = RingRoad {
        points: args.ring_points.max(1),
        points_per_cell: args.points_per_cell.max(1),
    };
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let mut agents = spawn_agents(&args, &mut rng);

    for tick in 0..args.ticks {
        plan_stage(&index, &road, &agents, &args);
        let report = query_stage(&index, &road, &agents);

        tracing::info!(
            "Tick {}: {} agents near traffic, max overlap {}, {} contested next points",
            tick,
            report.agents_with_traffic,
            report.max_overlap,
            report.contested_points
        );

        for agent in agents.iter_mut() {
            agent.position = (agent.position + agent.speed) % road.points;
        }

        // agents occasionally leave the road and come back fresh
        if let Some(agent) = agents.get(rng.gen_range(0..agents.len().max(1))) {
            index.remove_agent(agent.id);
            tracing::debug!("Agent {:?} left the road at tick {}", agent.id, tick);
        }
    }

    index.check_consistency()?;
    let stats = index.stats();
    tracing::info!("Final occupancy: {:?}", stats);
    tracing::info!(
        "Agents at point 0: {}",
        index.agents_at_point(PointId(0)).len()
    );

    if let Some(path) = &args.dump {
        write_dump(&index, path)?;
    }

    Ok(())
}
