//! Main simulator that ties everything together
//!
//! Owns the live-agent registry and runs the per-tick pipeline: arrivals,
//! movement with signal and car-following gating, perpendicular accident
//! detection, accident lifetimes, and retirement.

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use super::agent::{Agent, AgentSeed, LifecycleState};
use super::arrivals::{ArrivalGenerator, ArrivalPolicy};
use super::signal::SignalScheduler;
use super::types::{
    AgentClass, AgentId, Position, ACCIDENT_DURATION, ACCIDENT_RADIUS_SCALE,
    ACCIDENT_ZONE_RADIUS, DEFAULT_FOLLOW_LATERAL_BAND, EXIT_MARGIN, SIGNAL_GATE_DISTANCE,
    SIGNAL_VIOLATION_STOP_CHANCE, SPAWN_DISTANCE, STOP_LINE_DISTANCE,
};

/// Snapshot of aggregate simulation state for display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationStats {
    /// Live agents, including those frozen in accidents
    pub total: usize,
    /// Live agents not currently in an accident
    pub active: usize,
    pub vehicles: usize,
    pub bicycles: usize,
    pub pedestrians: usize,
    pub in_accident: usize,
    /// Cumulative accidents since the last reset
    pub accidents: u32,
}

/// A detected collision frozen at its impact site
#[derive(Debug, Clone)]
pub struct AccidentRecord {
    pub agents: (AgentId, AgentId),
    /// Midpoint between the two agents at impact
    pub position: Position,
    /// Simulated seconds since impact
    pub elapsed: f32,
    pub duration: f32,
}

impl AccidentRecord {
    /// Elapsed fraction of the accident lifetime, for transient effects
    pub fn progress(&self) -> f32 {
        (self.elapsed / self.duration).min(1.0)
    }
}

/// The junction simulator
pub struct Simulator {
    /// All live agents
    pub agents: Vec<Agent>,
    /// Accidents currently blocking the junction
    pub accidents: Vec<AccidentRecord>,
    arrivals: ArrivalPolicy,
    signals: SignalScheduler,
    accident_count: u32,
    speed_multiplier: f32,
    follow_lateral_band: f32,
    /// Agents removed during the last tick, for renderer cleanup
    retired: Vec<AgentId>,
    on_accident: Option<Box<dyn FnMut(u32)>>,
    /// Optional seeded RNG for reproducible signal-violation draws
    rng: Option<StdRng>,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulator {
    pub fn new() -> Self {
        Self::new_internal(
            ArrivalPolicy::Continuous(ArrivalGenerator::new()),
            None,
        )
    }

    /// Simulator with seeded RNGs for reproducible runs
    pub fn with_seed(seed: u64) -> Self {
        Self::new_internal(
            ArrivalPolicy::Continuous(ArrivalGenerator::with_seed(seed)),
            Some(StdRng::seed_from_u64(seed)),
        )
    }

    /// Simulator driven by the given arrival policy
    pub fn with_policy(policy: ArrivalPolicy) -> Self {
        Self::new_internal(policy, None)
    }

    fn new_internal(arrivals: ArrivalPolicy, rng: Option<StdRng>) -> Self {
        Self {
            agents: Vec::new(),
            accidents: Vec::new(),
            arrivals,
            signals: SignalScheduler::new(),
            accident_count: 0,
            speed_multiplier: 1.0,
            follow_lateral_band: DEFAULT_FOLLOW_LATERAL_BAND,
            retired: Vec::new(),
            on_accident: None,
            rng,
        }
    }

    /// Main simulation tick.
    ///
    /// Ordering is fixed: signals, arrivals, movement, accident detection,
    /// accident timers, removal. Returns the live-agent count.
    pub fn update(
        &mut self,
        elapsed_sim_time: f32,
        wall_delta: f32,
        acceleration_factor: f32,
    ) -> usize {
        let factor = acceleration_factor * self.speed_multiplier;
        self.signals.update(wall_delta, factor);

        self.retired.clear();

        for seed in self.arrivals.poll(elapsed_sim_time) {
            self.admit(seed);
        }

        let sim_delta = wall_delta * factor;
        self.step_agents(sim_delta);
        self.detect_accidents();
        self.advance_accidents(sim_delta);
        self.remove_crossed();

        self.agents.len()
    }

    /// Place a seed at its spawn edge and put it in motion
    pub fn admit(&mut self, seed: AgentSeed) {
        let mut agent = Agent::from_seed(seed);
        agent.set_state(LifecycleState::Moving);
        debug!(
            "agent {:?} ({}) entering from {:?}",
            agent.id,
            agent.class.label(),
            agent.approach
        );
        self.agents.push(agent);
    }

    /// Advance every active agent, applying signal compliance on the
    /// approach band and car-following outside the junction interior.
    fn step_agents(&mut self, sim_delta: f32) {
        let Self {
            agents,
            signals,
            rng,
            follow_lateral_band,
            ..
        } = self;

        for i in 0..agents.len() {
            if !agents[i].is_active() {
                continue;
            }

            let distance_to_center = agents[i].distance_to_center();
            let approaching = distance_to_center > STOP_LINE_DISTANCE
                && distance_to_center < SIGNAL_GATE_DISTANCE;
            let inside_junction = distance_to_center <= STOP_LINE_DISTANCE;

            let mut should_stop = false;

            if approaching && !agents[i].has_passed_stop_line {
                let green = signals.is_green(agents[i].direction);
                if agents[i].respects_signal {
                    should_stop = !green;
                } else {
                    // occasional loss of nerve, not a guaranteed run
                    should_stop = !green && roll(rng) < SIGNAL_VIOLATION_STOP_CHANCE;
                }
            }

            if !should_stop && !inside_junction {
                should_stop = leader_blocks(agents, i, *follow_lateral_band);
            }

            if inside_junction && !agents[i].has_passed_stop_line {
                agents[i].has_passed_stop_line = true;
            }

            let agent = &mut agents[i];
            if should_stop {
                agent.set_state(LifecycleState::Stopped);
                continue;
            }
            agent.set_state(LifecycleState::Moving);

            let step = agent.speed * sim_delta;
            let (dx, dz) = agent.direction.unit();
            agent.position.x += dx * step;
            agent.position.z += dz * step;

            if agent.position.x.abs() > SPAWN_DISTANCE + EXIT_MARGIN
                || agent.position.z.abs() > SPAWN_DISTANCE + EXIT_MARGIN
            {
                agent.set_state(LifecycleState::Crossed);
            }
        }
    }

    /// Pairwise scan of the junction zone for perpendicular impacts
    fn detect_accidents(&mut self) {
        let candidates: Vec<usize> = self
            .agents
            .iter()
            .enumerate()
            .filter(|(_, a)| a.is_active() && a.distance_to_center() < ACCIDENT_ZONE_RADIUS)
            .map(|(i, _)| i)
            .collect();

        for (c, &i) in candidates.iter().enumerate() {
            for &j in &candidates[c + 1..] {
                // an earlier pair this tick may already have claimed one
                if !self.agents[i].is_active() || !self.agents[j].is_active() {
                    continue;
                }

                let first = &self.agents[i];
                let second = &self.agents[j];
                if !first.direction.is_perpendicular_to(second.direction) {
                    continue;
                }

                let separation = first.position.distance(&second.position);
                let impact_radius = ACCIDENT_RADIUS_SCALE
                    * (first.class.safety_radius() + second.class.safety_radius());
                if separation < impact_radius {
                    self.record_accident(i, j);
                }
            }
        }
    }

    fn record_accident(&mut self, i: usize, j: usize) {
        let position = self.agents[i].position.midpoint(&self.agents[j].position);
        let ids = (self.agents[i].id, self.agents[j].id);
        let labels = (
            self.agents[i].class.label(),
            self.agents[j].class.label(),
        );

        self.agents[i].set_state(LifecycleState::InAccident);
        self.agents[j].set_state(LifecycleState::InAccident);
        self.accident_count += 1;

        self.accidents.push(AccidentRecord {
            agents: ids,
            position,
            elapsed: 0.0,
            duration: ACCIDENT_DURATION,
        });

        info!(
            "accident #{} between {} and {}",
            self.accident_count, labels.0, labels.1
        );

        if let Some(callback) = &mut self.on_accident {
            callback(self.accident_count);
        }
    }

    /// Age the accident list; an expired accident releases both agents as
    /// Crossed so the removal pass retires them this same tick.
    fn advance_accidents(&mut self, sim_delta: f32) {
        let Self {
            agents, accidents, ..
        } = self;

        accidents.retain_mut(|accident| {
            accident.elapsed += sim_delta;
            if accident.elapsed < accident.duration {
                return true;
            }
            for id in [accident.agents.0, accident.agents.1] {
                if let Some(agent) = agents.iter_mut().find(|a| a.id == id) {
                    agent.set_state(LifecycleState::Crossed);
                }
            }
            false
        });
    }

    fn remove_crossed(&mut self) {
        let Self {
            agents, retired, ..
        } = self;

        agents.retain(|agent| {
            if agent.state() == LifecycleState::Crossed {
                retired.push(agent.id);
                false
            } else {
                true
            }
        });
    }

    /// Clear agents and accidents and restart the arrival policy
    pub fn reset(&mut self) {
        self.agents.clear();
        self.accidents.clear();
        self.arrivals.reset();
        self.accident_count = 0;
        self.retired.clear();
    }

    pub fn stats(&self) -> SimulationStats {
        let mut stats = SimulationStats {
            accidents: self.accident_count,
            ..Default::default()
        };

        for agent in &self.agents {
            stats.total += 1;
            match agent.class {
                AgentClass::Vehicle => stats.vehicles += 1,
                AgentClass::Bicycle => stats.bicycles += 1,
                AgentClass::Pedestrian => stats.pedestrians += 1,
            }
            if agent.state() == LifecycleState::InAccident {
                stats.in_accident += 1;
            }
        }
        stats.active = stats.total - stats.in_accident;
        stats
    }

    /// Register the observer invoked synchronously per new accident
    pub fn set_on_accident(&mut self, callback: impl FnMut(u32) + 'static) {
        self.on_accident = Some(Box::new(callback));
    }

    pub fn accident_count(&self) -> u32 {
        self.accident_count
    }

    /// Agents removed during the last tick
    pub fn retired(&self) -> &[AgentId] {
        &self.retired
    }

    pub fn signals(&self) -> &SignalScheduler {
        &self.signals
    }

    pub fn signals_mut(&mut self) -> &mut SignalScheduler {
        &mut self.signals
    }

    pub fn arrival_policy_mut(&mut self) -> &mut ArrivalPolicy {
        &mut self.arrivals
    }

    /// Per-class spawn probabilities, clamped to 0-100
    pub fn set_spawn_probability(&mut self, vehicle: u8, bicycle: u8, pedestrian: u8) {
        self.arrivals
            .set_spawn_probability(vehicle, bicycle, pedestrian);
    }

    /// Per-class respect probabilities, clamped to 0-100
    pub fn set_respect_probability(&mut self, vehicle: u8, bicycle: u8, pedestrian: u8) {
        self.arrivals
            .set_respect_probability(vehicle, bicycle, pedestrian);
    }

    /// Global speed multiplier applied on top of the acceleration factor
    pub fn set_speed_multiplier(&mut self, multiplier: f32) {
        if multiplier < 0.0 {
            warn!("speed multiplier {} clamped to 0", multiplier);
        }
        self.speed_multiplier = multiplier.max(0.0);
    }

    /// Lateral band for the car-following ahead test
    pub fn set_follow_lateral_band(&mut self, band: f32) {
        if band < 0.0 {
            warn!("follow lateral band {} clamped to 0", band);
        }
        self.follow_lateral_band = band.max(0.0);
    }

    /// Print a summary of the simulation state
    pub fn print_summary(&self) {
        let stats = self.stats();
        println!("=== Junction Simulation Summary ===");
        println!(
            "Signal: {} (cycle {}, t={:.1}s)",
            self.signals.phase().name(),
            self.signals.cycle_count(),
            self.signals.current_time()
        );
        println!(
            "Agents: {} live ({} vehicles, {} bicycles, {} pedestrians)",
            stats.total, stats.vehicles, stats.bicycles, stats.pedestrians
        );
        println!(
            "Accidents: {} active, {} total",
            self.accidents.len(),
            stats.accidents
        );
    }
}

/// Uniform draw in [0, 1), using the seeded RNG if available
fn roll(rng: &mut Option<StdRng>) -> f32 {
    match rng {
        Some(rng) => rng.random_range(0.0..1.0),
        None => rand::rng().random_range(0.0..1.0),
    }
}

/// Whether any active agent sits ahead of `agents[i]` along its heading,
/// inside the lateral band and the pair's combined safety radius
fn leader_blocks(agents: &[Agent], i: usize, lateral_band: f32) -> bool {
    let agent = &agents[i];
    let my_radius = agent.class.safety_radius();

    for (j, other) in agents.iter().enumerate() {
        if j == i || !other.is_active() {
            continue;
        }

        let dx = other.position.x - agent.position.x;
        let dz = other.position.z - agent.position.z;
        let distance = (dx * dx + dz * dz).sqrt();
        let min_distance = my_radius + other.class.safety_radius();

        if distance < min_distance && agent.direction.is_ahead(dx, dz, lateral_band) {
            return true;
        }
    }
    false
}
