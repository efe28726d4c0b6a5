//! Continuous probabilistic arrivals
//!
//! The live arrival policy: every sampling interval, one Bernoulli trial
//! per agent class decides whether that class contributes a new agent.

use anyhow::{bail, Result};
use log::warn;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::Rng;
use rand::SeedableRng;

use super::agent::AgentSeed;
use super::planner::BatchArrivalPlanner;
use super::types::{AgentClass, AgentId, Approach, VehicleKind};

/// Per-class integer percentages, 0-100
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassPercentages {
    pub vehicle: u8,
    pub bicycle: u8,
    pub pedestrian: u8,
}

impl ClassPercentages {
    pub fn for_class(&self, class: AgentClass) -> u8 {
        match class {
            AgentClass::Vehicle => self.vehicle,
            AgentClass::Bicycle => self.bicycle,
            AgentClass::Pedestrian => self.pedestrian,
        }
    }
}

/// Default per-class spawn chance per sampling interval
pub const DEFAULT_SPAWN_PROBABILITY: ClassPercentages = ClassPercentages {
    vehicle: 30,
    bicycle: 25,
    pedestrian: 20,
};

/// Default per-class chance of obeying a non-green signal
pub const DEFAULT_RESPECT_PROBABILITY: ClassPercentages = ClassPercentages {
    vehicle: 97,
    bicycle: 95,
    pedestrian: 90,
};

/// Simulated seconds between spawn lotteries
pub const DEFAULT_SPAWN_INTERVAL: f32 = 2.0;

/// Weighted vehicle-kind table, 4 cars to 2 motorcycles
pub(super) const VEHICLE_KINDS: [VehicleKind; 6] = [
    VehicleKind::Car,
    VehicleKind::Car,
    VehicleKind::Car,
    VehicleKind::Car,
    VehicleKind::Motorcycle,
    VehicleKind::Motorcycle,
];

/// Interval-gated Bernoulli spawner
pub struct ArrivalGenerator {
    spawn_interval: f32,
    last_spawn_time: f32,
    next_agent_id: u64,
    spawn_probability: ClassPercentages,
    respect_probability: ClassPercentages,
    /// Optional seeded RNG for reproducible runs
    rng: Option<StdRng>,
}

impl Default for ArrivalGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ArrivalGenerator {
    pub fn new() -> Self {
        Self::new_internal(None)
    }

    /// Generator with a seeded RNG for reproducible arrival streams
    pub fn with_seed(seed: u64) -> Self {
        Self::new_internal(Some(StdRng::seed_from_u64(seed)))
    }

    fn new_internal(rng: Option<StdRng>) -> Self {
        Self {
            spawn_interval: DEFAULT_SPAWN_INTERVAL,
            last_spawn_time: 0.0,
            next_agent_id: 0,
            spawn_probability: DEFAULT_SPAWN_PROBABILITY,
            respect_probability: DEFAULT_RESPECT_PROBABILITY,
            rng,
        }
    }

    /// Run the spawn lottery if a full sampling interval has elapsed.
    ///
    /// Returns at most one seed per class; an empty vec when called before
    /// the interval is up.
    pub fn try_spawn(&mut self, current_sim_time: f32) -> Vec<AgentSeed> {
        let mut seeds = Vec::new();

        if current_sim_time - self.last_spawn_time < self.spawn_interval {
            return seeds;
        }
        self.last_spawn_time = current_sim_time;

        for class in AgentClass::ALL {
            let probability = f32::from(self.spawn_probability.for_class(class)) / 100.0;
            if self.roll() < probability {
                seeds.push(self.create_seed(class));
            }
        }

        seeds
    }

    fn create_seed(&mut self, class: AgentClass) -> AgentSeed {
        let id = AgentId(self.next_agent_id);
        self.next_agent_id += 1;

        let approach = *self.choose(&Approach::ALL);
        let respect = f32::from(self.respect_probability.for_class(class)) / 100.0;
        let respects_signal = self.roll() < respect;
        let kind = match class {
            AgentClass::Vehicle => Some(*self.choose(&VEHICLE_KINDS)),
            _ => None,
        };

        AgentSeed {
            id,
            class,
            kind,
            approach,
            direction: approach.direction(),
            respects_signal,
            speed: class.base_speed(),
        }
    }

    /// Set per-class spawn probabilities (clamped to 0-100)
    pub fn set_spawn_probability(&mut self, vehicle: u8, bicycle: u8, pedestrian: u8) {
        self.spawn_probability = ClassPercentages {
            vehicle: clamp_percent(vehicle, "vehicle spawn"),
            bicycle: clamp_percent(bicycle, "bicycle spawn"),
            pedestrian: clamp_percent(pedestrian, "pedestrian spawn"),
        };
    }

    /// Set per-class respect probabilities (clamped to 0-100)
    pub fn set_respect_probability(&mut self, vehicle: u8, bicycle: u8, pedestrian: u8) {
        self.respect_probability = ClassPercentages {
            vehicle: clamp_percent(vehicle, "vehicle respect"),
            bicycle: clamp_percent(bicycle, "bicycle respect"),
            pedestrian: clamp_percent(pedestrian, "pedestrian respect"),
        };
    }

    /// Change the sampling interval; non-positive intervals are rejected
    pub fn set_spawn_interval(&mut self, interval: f32) -> Result<()> {
        if interval <= 0.0 {
            bail!("spawn interval must be positive, got {}", interval);
        }
        self.spawn_interval = interval;
        Ok(())
    }

    pub fn spawn_probability(&self) -> ClassPercentages {
        self.spawn_probability
    }

    pub fn respect_probability(&self) -> ClassPercentages {
        self.respect_probability
    }

    /// Zero the sampling clock and restart the ID sequence
    pub fn reset(&mut self) {
        self.last_spawn_time = 0.0;
        self.next_agent_id = 0;
    }

    /// Uniform draw in [0, 1), using the seeded RNG if available
    fn roll(&mut self) -> f32 {
        match &mut self.rng {
            Some(rng) => rng.random_range(0.0..1.0),
            None => rand::rng().random_range(0.0..1.0),
        }
    }

    fn choose<'a, T>(&mut self, table: &'a [T]) -> &'a T {
        match &mut self.rng {
            Some(rng) => table.choose(rng),
            None => table.choose(&mut rand::rng()),
        }
        .expect("draw tables are non-empty")
    }
}

fn clamp_percent(value: u8, which: &str) -> u8 {
    if value > 100 {
        warn!("{} probability {} clamped to 100", which, value);
        100
    } else {
        value
    }
}

/// Arrival strategy driving the simulator
///
/// The continuous generator runs live; the batch planner replays a
/// precomputed arrival schedule for deterministic tests.
pub enum ArrivalPolicy {
    Continuous(ArrivalGenerator),
    Batch(BatchArrivalPlanner),
}

impl ArrivalPolicy {
    /// Seeds whose arrival is due at `now`
    pub fn poll(&mut self, now: f32) -> Vec<AgentSeed> {
        match self {
            ArrivalPolicy::Continuous(generator) => generator.try_spawn(now),
            ArrivalPolicy::Batch(planner) => planner.drain_due(now),
        }
    }

    pub fn reset(&mut self) {
        match self {
            ArrivalPolicy::Continuous(generator) => generator.reset(),
            ArrivalPolicy::Batch(planner) => planner.reset(),
        }
    }

    /// Spawn probabilities only exist for the continuous policy; the batch
    /// planner has no Bernoulli stage and ignores the call.
    pub fn set_spawn_probability(&mut self, vehicle: u8, bicycle: u8, pedestrian: u8) {
        if let ArrivalPolicy::Continuous(generator) = self {
            generator.set_spawn_probability(vehicle, bicycle, pedestrian);
        }
    }

    /// Respect probabilities apply to both policies; for the batch planner
    /// they take effect on the next `plan()`.
    pub fn set_respect_probability(&mut self, vehicle: u8, bicycle: u8, pedestrian: u8) {
        match self {
            ArrivalPolicy::Continuous(generator) => {
                generator.set_respect_probability(vehicle, bicycle, pedestrian)
            }
            ArrivalPolicy::Batch(planner) => {
                planner.set_respect_probability(vehicle, bicycle, pedestrian)
            }
        }
    }
}
