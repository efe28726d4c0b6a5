//! Precomputed batch arrivals
//!
//! The alternate arrival policy: a finite batch of agents is drawn up
//! front with exponential inter-arrival gaps and released as simulated
//! time passes each arrival. Useful for deterministic replay runs.

use anyhow::{bail, Result};
use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use rand::SeedableRng;
use sorted_vec::SortedVec;

use super::agent::AgentSeed;
use super::arrivals::{ClassPercentages, DEFAULT_RESPECT_PROBABILITY, VEHICLE_KINDS};
use super::types::{AgentClass, AgentId, Approach};

/// Per-class batch sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassCounts {
    pub vehicle: usize,
    pub pedestrian: usize,
    pub bicycle: usize,
}

impl ClassCounts {
    pub fn total(&self) -> usize {
        self.vehicle + self.pedestrian + self.bicycle
    }
}

/// Default batch composition
pub const DEFAULT_CLASS_COUNTS: ClassCounts = ClassCounts {
    vehicle: 6,
    pedestrian: 6,
    bicycle: 8,
};

/// Default exponential inter-arrival rate
pub const DEFAULT_ARRIVAL_RATE: f32 = 1.0;

/// Floor for the uniform sample so the logarithm stays finite
const MIN_UNIFORM_SAMPLE: f32 = 1e-4;

/// A seed queued for release at an absolute arrival time
#[derive(Debug, Clone)]
struct PlannedArrival {
    time: OrderedFloat<f32>,
    seed: AgentSeed,
}

impl PartialEq for PlannedArrival {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.seed.id == other.seed.id
    }
}

impl Eq for PlannedArrival {}

impl PartialOrd for PlannedArrival {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PlannedArrival {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.time, self.seed.id).cmp(&(other.time, other.seed.id))
    }
}

/// Upfront exponential-inter-arrival batch planner
pub struct BatchArrivalPlanner {
    distribution: ClassCounts,
    respect_probability: ClassPercentages,
    rate: f32,
    pending: SortedVec<PlannedArrival>,
    next_agent_id: u64,
    /// Optional seeded RNG for reproducible batches
    rng: Option<StdRng>,
}

impl Default for BatchArrivalPlanner {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchArrivalPlanner {
    pub fn new() -> Self {
        Self::new_internal(None)
    }

    /// Planner with a seeded RNG for reproducible batches
    pub fn with_seed(seed: u64) -> Self {
        Self::new_internal(Some(StdRng::seed_from_u64(seed)))
    }

    fn new_internal(rng: Option<StdRng>) -> Self {
        Self {
            distribution: DEFAULT_CLASS_COUNTS,
            respect_probability: DEFAULT_RESPECT_PROBABILITY,
            rate: DEFAULT_ARRIVAL_RATE,
            pending: SortedVec::new(),
            next_agent_id: 0,
            rng,
        }
    }

    /// Set how many agents of each class the next `plan()` draws
    pub fn set_distribution(&mut self, vehicle: usize, pedestrian: usize, bicycle: usize) {
        self.distribution = ClassCounts {
            vehicle,
            pedestrian,
            bicycle,
        };
    }

    /// Respect probabilities for seeds drawn by the next `plan()`
    pub fn set_respect_probability(&mut self, vehicle: u8, bicycle: u8, pedestrian: u8) {
        self.respect_probability = ClassPercentages {
            vehicle: vehicle.min(100),
            bicycle: bicycle.min(100),
            pedestrian: pedestrian.min(100),
        };
    }

    /// Exponential inter-arrival rate; non-positive rates are rejected
    pub fn set_rate(&mut self, rate: f32) -> Result<()> {
        if rate <= 0.0 {
            bail!("arrival rate must be positive, got {}", rate);
        }
        self.rate = rate;
        Ok(())
    }

    /// Draw the whole batch: shuffle the class multiset, accumulate
    /// exponential gaps into absolute arrival times, queue the seeds in
    /// time order. Returns the number of agents planned.
    pub fn plan(&mut self) -> usize {
        let mut classes = Vec::with_capacity(self.distribution.total());
        classes.extend(std::iter::repeat(AgentClass::Vehicle).take(self.distribution.vehicle));
        classes.extend(std::iter::repeat(AgentClass::Pedestrian).take(self.distribution.pedestrian));
        classes.extend(std::iter::repeat(AgentClass::Bicycle).take(self.distribution.bicycle));
        self.shuffle(&mut classes);

        let mut cumulative = 0.0;
        let planned = classes.len();
        for class in classes {
            cumulative += self.exponential_gap();
            let seed = self.create_seed(class);
            self.pending.insert(PlannedArrival {
                time: OrderedFloat(cumulative),
                seed,
            });
        }
        planned
    }

    /// Release every queued seed whose arrival time has passed
    pub fn drain_due(&mut self, now: f32) -> Vec<AgentSeed> {
        let mut due = Vec::new();
        while self
            .pending
            .first()
            .is_some_and(|next| next.time.into_inner() <= now)
        {
            due.push(self.pending.remove_index(0).seed);
        }
        due
    }

    /// Arrival times still queued, in order
    pub fn pending_times(&self) -> Vec<f32> {
        self.pending
            .iter()
            .map(|p| p.time.into_inner())
            .collect()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drop the queue and restart the ID sequence
    pub fn reset(&mut self) {
        self.pending.clear();
        self.next_agent_id = 0;
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

    fn exponential_gap(&mut self) -> f32 {
        let u = self.roll().max(MIN_UNIFORM_SAMPLE);
        -u.ln() / self.rate
    }

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

    fn shuffle<T>(&mut self, items: &mut [T]) {
        match &mut self.rng {
            Some(rng) => items.shuffle(rng),
            None => items.shuffle(&mut rand::rng()),
        }
    }
}
