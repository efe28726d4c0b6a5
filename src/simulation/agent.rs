//! Agent records and the lifecycle state machine
//!
//! Standalone implementation shared by both arrival policies and the
//! simulator.

use super::types::{AgentClass, AgentId, Approach, Direction, Position, VehicleKind};

/// Lifecycle of an agent from spawn edge to removal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Created by an arrival policy, not yet placed in the world
    Spawning,
    Moving,
    Stopped,
    /// Frozen at an impact site until the accident clears
    InAccident,
    /// Terminal; removed at the end of the tick
    Crossed,
}

impl LifecycleState {
    /// Legal transitions: `Spawning → Moving ⇄ Stopped → Crossed`, with
    /// `Moving`/`Stopped → InAccident → Crossed`. Nothing leaves `Crossed`
    /// and nothing re-enters `Spawning`.
    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Spawning, Moving)
                | (Moving, Stopped)
                | (Moving, InAccident)
                | (Moving, Crossed)
                | (Stopped, Moving)
                | (Stopped, InAccident)
                | (Stopped, Crossed)
                | (InAccident, Crossed)
        )
    }
}

/// An agent descriptor produced by an arrival policy
///
/// Carries everything but a world position; the simulator places it at the
/// spawn edge when it is admitted.
#[derive(Debug, Clone, Copy)]
pub struct AgentSeed {
    pub id: AgentId,
    pub class: AgentClass,
    /// Body style, vehicles only
    pub kind: Option<VehicleKind>,
    pub approach: Approach,
    pub direction: Direction,
    pub respects_signal: bool,
    pub speed: f32,
}

/// A live agent in the junction
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: AgentId,
    pub class: AgentClass,
    pub kind: Option<VehicleKind>,
    pub approach: Approach,
    pub direction: Direction,
    pub respects_signal: bool,
    pub speed: f32,
    pub position: Position,
    state: LifecycleState,
    pub has_passed_stop_line: bool,
}

impl Agent {
    /// Place a seed at its spawn-edge position
    pub fn from_seed(seed: AgentSeed) -> Self {
        let position = seed.approach.spawn_position(seed.class.lane_offset());
        Self {
            id: seed.id,
            class: seed.class,
            kind: seed.kind,
            approach: seed.approach,
            direction: seed.direction,
            respects_signal: seed.respects_signal,
            speed: seed.speed,
            position,
            state: LifecycleState::Spawning,
            has_passed_stop_line: false,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Validating state mutator. Same-state writes are no-ops; an illegal
    /// transition is a logic defect and panics rather than being swallowed.
    pub fn set_state(&mut self, next: LifecycleState) {
        if self.state == next {
            return;
        }
        assert!(
            self.state.can_transition_to(next),
            "illegal lifecycle transition {:?} -> {:?} for agent {:?}",
            self.state,
            next,
            self.id
        );
        self.state = next;
    }

    pub fn distance_to_center(&self) -> f32 {
        self.position.distance_to_center()
    }

    /// Y-axis rotation for the renderer
    pub fn heading(&self) -> f32 {
        self.direction.heading()
    }

    /// Agents that still take part in movement and collision checks
    pub fn is_active(&self) -> bool {
        matches!(self.state, LifecycleState::Moving | LifecycleState::Stopped)
    }
}
