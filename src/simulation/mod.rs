//! Standalone junction simulation module
//!
//! This module contains all the core simulation logic, independent of any
//! rendering layer. It can be driven headless from the console without
//! booting a graphics stack.

mod agent;
mod arrivals;
mod clock;
mod planner;
mod signal;
mod simulator;
mod types;

// Re-export public types for external use
// These may not be used within this crate but are part of the public API
#[allow(unused_imports)]
pub use agent::{Agent, AgentSeed, LifecycleState};
#[allow(unused_imports)]
pub use arrivals::{
    ArrivalGenerator, ArrivalPolicy, ClassPercentages, DEFAULT_RESPECT_PROBABILITY,
    DEFAULT_SPAWN_INTERVAL, DEFAULT_SPAWN_PROBABILITY,
};
#[allow(unused_imports)]
pub use clock::{SimulationClock, DEFAULT_REAL_TOTAL, DEFAULT_SIMULATED_TOTAL};
#[allow(unused_imports)]
pub use planner::{BatchArrivalPlanner, ClassCounts, DEFAULT_ARRIVAL_RATE, DEFAULT_CLASS_COUNTS};
#[allow(unused_imports)]
pub use signal::{PhaseWindow, SignalPhase, SignalScheduler, DEFAULT_CYCLE_LENGTH};
#[allow(unused_imports)]
pub use simulator::{AccidentRecord, SimulationStats, Simulator};
#[allow(unused_imports)]
pub use types::{
    AgentClass, AgentId, Approach, Axis, Direction, Position, VehicleKind, ACCIDENT_DURATION,
    ACCIDENT_RADIUS_SCALE, ACCIDENT_ZONE_RADIUS, BIKE_LANE_OFFSET, DEFAULT_FOLLOW_LATERAL_BAND,
    EXIT_MARGIN, LANE_WIDTH, SIDEWALK_OFFSET, SIGNAL_GATE_DISTANCE, SIGNAL_VIOLATION_STOP_CHANCE,
    SPAWN_DISTANCE, STOP_LINE_DISTANCE,
};
