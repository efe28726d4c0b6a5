//! Simulator behavior validation
//!
//! These tests drive the simulator with hand-placed agents: arrival
//! probabilities are zeroed so the registry only contains what the test
//! admits.

use std::cell::RefCell;
use std::rc::Rc;

use junction_sim::simulation::{
    Agent, AgentClass, AgentId, AgentSeed, Approach, ArrivalPolicy, BatchArrivalPlanner,
    LifecycleState, Position, Simulator, VehicleKind,
};

fn seed(id: u64, class: AgentClass, approach: Approach, respects_signal: bool) -> AgentSeed {
    AgentSeed {
        id: AgentId(id),
        class,
        kind: match class {
            AgentClass::Vehicle => Some(VehicleKind::Car),
            _ => None,
        },
        approach,
        direction: approach.direction(),
        respects_signal,
        speed: class.base_speed(),
    }
}

/// Simulator that only contains what the test admits
fn quiet_simulator() -> Simulator {
    let mut sim = Simulator::new();
    sim.set_spawn_probability(0, 0, 0);
    sim
}

#[test]
fn test_admitted_agent_moves_toward_center() {
    let mut sim = quiet_simulator();
    sim.admit(seed(0, AgentClass::Vehicle, Approach::East, true));

    assert_eq!(sim.agents[0].position.x, 40.0);
    assert_eq!(sim.agents[0].position.z, -1.75);

    let live = sim.update(0.0, 0.1, 1.0);

    assert_eq!(live, 1);
    assert_eq!(sim.agents[0].state(), LifecycleState::Moving);
    assert!((sim.agents[0].position.x - 39.2).abs() < 1e-4);
    assert_eq!(sim.agents[0].position.z, -1.75);
}

#[test]
fn test_spawn_edge_positions_by_class() {
    let mut sim = quiet_simulator();
    sim.admit(seed(0, AgentClass::Pedestrian, Approach::North, true));
    sim.admit(seed(1, AgentClass::Bicycle, Approach::South, true));
    sim.admit(seed(2, AgentClass::Vehicle, Approach::West, true));

    assert_eq!(sim.agents[0].position, Position::new(11.0, -40.0));
    assert_eq!(sim.agents[1].position, Position::new(-4.25, 40.0));
    assert_eq!(sim.agents[2].position, Position::new(-40.0, 1.75));
}

#[test]
fn test_respecting_agent_stops_at_red_and_proceeds_on_green() {
    let mut sim = quiet_simulator();
    sim.signals_mut().start();
    sim.signals_mut().set_time(0.0); // NS green, EW red

    sim.admit(seed(0, AgentClass::Vehicle, Approach::East, true));
    sim.agents[0].position = Position::new(10.0, 0.0);

    sim.update(0.0, 0.1, 1.0);
    assert_eq!(sim.agents[0].state(), LifecycleState::Stopped);
    assert_eq!(sim.agents[0].position.x, 10.0);

    sim.signals_mut().set_time(10.5); // EW green
    sim.update(0.0, 0.1, 1.0);
    assert_eq!(sim.agents[0].state(), LifecycleState::Moving);
    assert!((sim.agents[0].position.x - 9.2).abs() < 1e-4);
}

#[test]
fn test_non_respecting_agent_usually_runs_the_red() {
    let mut sim = Simulator::with_seed(1234);
    sim.set_spawn_probability(0, 0, 0);
    sim.signals_mut().start();
    sim.signals_mut().set_time(0.0); // EW red for the whole test

    sim.admit(seed(0, AgentClass::Vehicle, Approach::East, false));

    let mut moved = 0;
    for _ in 0..50 {
        sim.agents[0].position = Position::new(10.0, 0.0);
        sim.update(0.0, 0.1, 1.0);
        if sim.agents[0].position.x < 10.0 {
            moved += 1;
        }
    }

    // stopping at red happens with probability 0.02 per tick
    assert!(moved >= 40, "only {} of 50 ticks moved", moved);
}

#[test]
fn test_stop_line_passage_disables_signal_gating() {
    let mut sim = quiet_simulator();
    sim.signals_mut().start();
    sim.signals_mut().set_time(0.0); // EW red

    sim.admit(seed(0, AgentClass::Vehicle, Approach::East, true));
    sim.agents[0].position = Position::new(7.5, 0.0);

    sim.update(0.0, 0.1, 1.0);
    assert!(sim.agents[0].has_passed_stop_line);
    assert_eq!(sim.agents[0].state(), LifecycleState::Moving);

    // back on the approach band, still red: the flag wins
    sim.agents[0].position = Position::new(10.0, 0.0);
    sim.update(0.0, 0.1, 1.0);
    assert_eq!(sim.agents[0].state(), LifecycleState::Moving);
    assert!((sim.agents[0].position.x - 9.2).abs() < 1e-4);
}

#[test]
fn test_car_following_stops_trailing_agent() {
    let mut sim = quiet_simulator();
    sim.admit(seed(0, AgentClass::Vehicle, Approach::East, true));
    sim.admit(seed(1, AgentClass::Vehicle, Approach::East, true));
    sim.agents[0].position = Position::new(20.0, 0.0); // leader
    sim.agents[1].position = Position::new(23.0, 0.0); // trailer, 3 apart

    sim.update(0.0, 0.1, 1.0);

    assert_eq!(sim.agents[0].state(), LifecycleState::Moving);
    assert!((sim.agents[0].position.x - 19.2).abs() < 1e-4);
    assert_eq!(sim.agents[1].state(), LifecycleState::Stopped);
    assert_eq!(sim.agents[1].position.x, 23.0);
}

#[test]
fn test_follow_lateral_band_is_configurable() {
    let mut sim = quiet_simulator();
    sim.admit(seed(0, AgentClass::Vehicle, Approach::East, true));
    sim.admit(seed(1, AgentClass::Vehicle, Approach::East, true));
    sim.agents[0].position = Position::new(20.0, -3.0);
    sim.agents[1].position = Position::new(23.0, 0.0);

    // 3 units of lateral offset clears the default 2-unit band
    sim.update(0.0, 0.1, 1.0);
    assert_eq!(sim.agents[1].state(), LifecycleState::Moving);

    sim.agents[0].position = Position::new(20.0, -3.0);
    sim.agents[1].position = Position::new(23.0, 0.0);
    sim.set_follow_lateral_band(4.0);

    sim.update(0.0, 0.1, 1.0);
    assert_eq!(sim.agents[1].state(), LifecycleState::Stopped);
}

#[test]
fn test_accident_formation_and_expiry() {
    let mut sim = quiet_simulator();

    let observed = Rc::new(RefCell::new(0u32));
    let observer = observed.clone();
    sim.set_on_accident(move |total| *observer.borrow_mut() = total);

    sim.admit(seed(0, AgentClass::Vehicle, Approach::East, false));
    sim.admit(seed(1, AgentClass::Vehicle, Approach::North, false));
    sim.agents[0].position = Position::new(1.0, 0.0);
    sim.agents[1].position = Position::new(0.0, 1.0);

    sim.update(0.0, 0.1, 1.0);

    assert_eq!(sim.accident_count(), 1);
    assert_eq!(*observed.borrow(), 1);
    assert_eq!(sim.accidents.len(), 1);
    let stats = sim.stats();
    assert_eq!(stats.in_accident, 2);
    assert_eq!(stats.active, 0);
    assert_eq!(sim.agents[0].state(), LifecycleState::InAccident);
    assert_eq!(sim.agents[1].state(), LifecycleState::InAccident);

    // frozen in place while the accident lasts
    let frozen = (sim.agents[0].position, sim.agents[1].position);
    sim.update(0.0, 0.1, 1.0);
    assert_eq!(sim.agents[0].position, frozen.0);
    assert_eq!(sim.agents[1].position, frozen.1);
    assert_eq!(sim.accident_count(), 1, "no double-counting while frozen");

    // age the accident past its 5 simulated-second lifetime
    let mut live = sim.agents.len();
    for _ in 0..6 {
        live = sim.update(0.0, 1.0, 1.0);
        if live == 0 {
            break;
        }
    }
    assert_eq!(live, 0);
    assert!(sim.accidents.is_empty());
    assert_eq!(sim.accident_count(), 1);
    assert_eq!(sim.retired().len(), 2);
    assert!(sim.retired().contains(&AgentId(0)));
    assert!(sim.retired().contains(&AgentId(1)));
}

#[test]
fn test_accidents_require_perpendicular_directions() {
    let mut sim = quiet_simulator();
    sim.admit(seed(0, AgentClass::Vehicle, Approach::East, false));
    sim.admit(seed(1, AgentClass::Vehicle, Approach::West, false));
    sim.agents[0].position = Position::new(1.0, 0.0);
    sim.agents[1].position = Position::new(0.0, 0.0);

    sim.update(0.0, 0.0, 1.0);

    assert_eq!(sim.accident_count(), 0);
    assert!(sim.accidents.is_empty());
}

#[test]
fn test_agent_joins_at_most_one_accident() {
    let mut sim = quiet_simulator();
    sim.admit(seed(0, AgentClass::Vehicle, Approach::East, false));
    sim.admit(seed(1, AgentClass::Vehicle, Approach::North, false));
    sim.admit(seed(2, AgentClass::Vehicle, Approach::South, false));
    sim.agents[0].position = Position::new(0.5, 0.0);
    sim.agents[1].position = Position::new(0.0, 0.5);
    sim.agents[2].position = Position::new(0.0, -0.5);

    sim.update(0.0, 0.0, 1.0);

    // the east-west agent collides once; the second perpendicular
    // candidate stays untouched
    assert_eq!(sim.accident_count(), 1);
    assert_eq!(sim.stats().in_accident, 2);
    assert_eq!(sim.agents[2].state(), LifecycleState::Moving);
}

#[test]
fn test_agent_removed_beyond_exit_margin() {
    let mut sim = quiet_simulator();
    sim.admit(seed(0, AgentClass::Vehicle, Approach::East, true));
    sim.agents[0].position = Position::new(-49.9, 0.0);

    let live = sim.update(0.0, 0.1, 1.0);

    assert_eq!(live, 0);
    assert_eq!(sim.retired(), &[AgentId(0)]);

    // retirement notifications only cover the last tick
    sim.update(0.0, 0.1, 1.0);
    assert!(sim.retired().is_empty());
}

#[test]
fn test_reset_clears_agents_and_accidents() {
    let mut sim = quiet_simulator();
    sim.admit(seed(0, AgentClass::Vehicle, Approach::East, false));
    sim.admit(seed(1, AgentClass::Vehicle, Approach::North, false));
    sim.agents[0].position = Position::new(1.0, 0.0);
    sim.agents[1].position = Position::new(0.0, 1.0);
    sim.update(0.0, 0.1, 1.0);
    assert_eq!(sim.accident_count(), 1);

    sim.reset();

    assert!(sim.agents.is_empty());
    assert!(sim.accidents.is_empty());
    assert_eq!(sim.accident_count(), 0);
    let live = sim.update(0.0, 0.0, 1.0);
    assert_eq!(live, 0);
    assert_eq!(sim.stats(), Default::default());
}

#[test]
fn test_stats_count_by_class() {
    let mut sim = quiet_simulator();
    sim.admit(seed(0, AgentClass::Vehicle, Approach::East, true));
    sim.admit(seed(1, AgentClass::Bicycle, Approach::North, true));
    sim.admit(seed(2, AgentClass::Pedestrian, Approach::West, true));

    let stats = sim.stats();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.active, 3);
    assert_eq!(stats.vehicles, 1);
    assert_eq!(stats.bicycles, 1);
    assert_eq!(stats.pedestrians, 1);
    assert_eq!(stats.in_accident, 0);
    assert_eq!(stats.accidents, 0);
}

#[test]
fn test_batch_policy_drives_the_simulator() {
    let mut planner = BatchArrivalPlanner::with_seed(5);
    planner.set_distribution(2, 1, 1);
    planner.plan();

    let mut sim = Simulator::with_policy(ArrivalPolicy::Batch(planner));
    let live = sim.update(1e6, 0.0, 1.0);

    assert_eq!(live, 4);
    let stats = sim.stats();
    assert_eq!(stats.vehicles, 2);
    assert_eq!(stats.pedestrians, 1);
    assert_eq!(stats.bicycles, 1);
}

#[test]
fn test_seeded_continuous_run_populates() {
    let mut sim = Simulator::with_seed(42);
    sim.set_spawn_probability(100, 100, 100);
    sim.signals_mut().start();

    let mut elapsed = 0.0;
    for _ in 0..30 {
        elapsed += 0.1;
        sim.update(elapsed, 0.1, 1.0);
    }

    // one full sampling interval passed with certain spawn probability
    assert!(sim.stats().total >= 3);
}

#[test]
fn test_lifecycle_transition_table() {
    use LifecycleState::*;

    assert!(Spawning.can_transition_to(Moving));
    assert!(Moving.can_transition_to(Stopped));
    assert!(Stopped.can_transition_to(Moving));
    assert!(Moving.can_transition_to(InAccident));
    assert!(Stopped.can_transition_to(InAccident));
    assert!(Moving.can_transition_to(Crossed));
    assert!(Stopped.can_transition_to(Crossed));
    assert!(InAccident.can_transition_to(Crossed));

    assert!(!Crossed.can_transition_to(Moving));
    assert!(!Crossed.can_transition_to(InAccident));
    assert!(!InAccident.can_transition_to(Moving));
    assert!(!Moving.can_transition_to(Spawning));
    assert!(!Spawning.can_transition_to(InAccident));
}

#[test]
#[should_panic(expected = "illegal lifecycle transition")]
fn test_crossed_is_terminal() {
    let mut agent = Agent::from_seed(seed(0, AgentClass::Vehicle, Approach::East, true));
    agent.set_state(LifecycleState::Moving);
    agent.set_state(LifecycleState::Crossed);
    agent.set_state(LifecycleState::Moving);
}
